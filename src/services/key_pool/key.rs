//! Opaque API key type
//!
//! Keys are identified only by their pool position. Display and Debug are
//! redacted so a key never ends up whole in a log line.

use std::fmt;

/// An opaque upstream credential
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret itself, for the authorization header
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Redacted form for logs: first 6 characters, then an ellipsis
    pub fn redacted(&self) -> String {
        if self.0.chars().count() > 8 {
            let head: String = self.0.chars().take(6).collect();
            format!("{}...", head)
        } else {
            "***".to_string()
        }
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}
