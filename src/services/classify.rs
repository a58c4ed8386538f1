//! Upstream failure classification
//!
//! Turns an HTTP status plus error message into an [`AttemptOutcome`].
//! Status codes carry most of the signal, but some providers report quota
//! and auth problems inside 400-class bodies, so a fixed message
//! vocabulary can reclassify an ambiguous failure as credential-fatal.
//! The vocabulary and status sets come from configuration so they can be
//! tuned without touching the retry loop.

use crate::config::ClassifierConfig;
use crate::services::failover::AttemptOutcome;
use std::collections::HashSet;

/// Status/message based outcome classifier
#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    retryable_statuses: HashSet<u16>,
    credential_error_statuses: HashSet<u16>,
    /// Lowercased vocabulary for the message heuristic
    markers: Vec<String>,
}

impl OutcomeClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            retryable_statuses: config.retryable_statuses.iter().copied().collect(),
            credential_error_statuses: config
                .credential_error_statuses
                .iter()
                .copied()
                .collect(),
            markers: config
                .credential_error_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Classify a non-2xx response (2xx successes never reach this point)
    pub fn classify_failure(&self, status: u16, message: &str) -> AttemptOutcome {
        if self.credential_error_statuses.contains(&status) {
            return AttemptOutcome::FatalForCredential {
                status: Some(status),
                message: message.to_string(),
            };
        }

        if self.retryable_statuses.contains(&status) || status >= 500 {
            return AttemptOutcome::RetryableFailure {
                status: Some(status),
                message: message.to_string(),
            };
        }

        // Ambiguous status: trust the body if it smells like quota/auth
        if self.message_indicates_credential_error(message) {
            return AttemptOutcome::FatalForCredential {
                status: Some(status),
                message: message.to_string(),
            };
        }

        AttemptOutcome::FatalForRequest {
            message: message.to_string(),
        }
    }

    /// Case-insensitive match against the quota/auth vocabulary
    pub fn message_indicates_credential_error(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.markers.iter().any(|m| lowered.contains(m))
    }
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses_condemn_the_key() {
        let classifier = OutcomeClassifier::default();

        for status in [401, 403] {
            match classifier.classify_failure(status, "denied") {
                AttemptOutcome::FatalForCredential { status: s, .. } => {
                    assert_eq!(s, Some(status))
                }
                other => panic!("expected FatalForCredential, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        let classifier = OutcomeClassifier::default();

        for status in [408, 429, 500, 502, 503, 504, 599] {
            assert!(matches!(
                classifier.classify_failure(status, "try again"),
                AttemptOutcome::RetryableFailure { .. }
            ));
        }
    }

    #[test]
    fn test_quota_message_reclassifies_ambiguous_status() {
        let classifier = OutcomeClassifier::default();

        // 400 with a quota-like body is a key problem, not a request problem
        let outcome =
            classifier.classify_failure(400, "Resource has been EXHAUSTED (check quota)");
        assert!(matches!(
            outcome,
            AttemptOutcome::FatalForCredential { status: Some(400), .. }
        ));

        let outcome = classifier.classify_failure(400, "API key not valid");
        assert!(matches!(
            outcome,
            AttemptOutcome::FatalForCredential { .. }
        ));
    }

    #[test]
    fn test_plain_bad_request_is_fatal_for_request() {
        let classifier = OutcomeClassifier::default();

        let outcome = classifier.classify_failure(400, "unknown field `foo` in request body");
        assert!(matches!(outcome, AttemptOutcome::FatalForRequest { .. }));

        let outcome = classifier.classify_failure(404, "model not found");
        assert!(matches!(outcome, AttemptOutcome::FatalForRequest { .. }));
    }

    #[test]
    fn test_vocabulary_matching_is_case_insensitive() {
        let classifier = OutcomeClassifier::default();

        assert!(classifier.message_indicates_credential_error("QUOTA exceeded"));
        assert!(classifier.message_indicates_credential_error("Rate Limit hit"));
        assert!(classifier.message_indicates_credential_error("request was Forbidden"));
        assert!(!classifier.message_indicates_credential_error("temporary glitch"));
    }

    #[test]
    fn test_custom_configuration_is_honored() {
        let config = ClassifierConfig {
            retryable_statuses: vec![418],
            credential_error_statuses: vec![402],
            credential_error_markers: vec!["teapot".to_string()],
        };
        let classifier = OutcomeClassifier::new(&config);

        assert!(matches!(
            classifier.classify_failure(418, "short and stout"),
            AttemptOutcome::RetryableFailure { .. }
        ));
        assert!(matches!(
            classifier.classify_failure(402, "payment required"),
            AttemptOutcome::FatalForCredential { .. }
        ));
        assert!(matches!(
            classifier.classify_failure(400, "i am a teapot"),
            AttemptOutcome::FatalForCredential { .. }
        ));
    }
}
