//! Base64 data URL parsing and formatting
//!
//! Inbound images arrive as `data:<mime>;base64,<payload>` strings and
//! generated images are returned the same way.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// A parsed `data:` URL with a base64 payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub data: String,
}

impl DataUrl {
    /// Parse a `data:<mime>;base64,<payload>` string.
    ///
    /// Returns `None` for anything that is not a well-formed base64 data
    /// URL, including payloads that do not decode.
    pub fn parse(input: &str) -> Option<Self> {
        let rest = input.strip_prefix("data:")?;
        let (mime_type, data) = rest.split_once(";base64,")?;

        if mime_type.is_empty() || data.is_empty() {
            return None;
        }

        // Reject corrupt payloads up front rather than upstream
        BASE64.decode(data).ok()?;

        Some(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Render back into a `data:` URL
    pub fn format(mime_type: &str, data: &str) -> String {
        format!("data:{};base64,{}", mime_type, data)
    }

    /// Whether the payload is an image of some kind
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_image() {
        // "hello" in base64
        let url = DataUrl::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.data, "aGVsbG8=");
        assert!(url.is_image());
    }

    #[test]
    fn test_parse_rejects_malformed_inputs() {
        assert!(DataUrl::parse("").is_none());
        assert!(DataUrl::parse("not a data url").is_none());
        assert!(DataUrl::parse("data:image/png").is_none());
        assert!(DataUrl::parse("data:;base64,aGVsbG8=").is_none());
        assert!(DataUrl::parse("data:image/png;base64,").is_none());
        // invalid base64 payload
        assert!(DataUrl::parse("data:image/png;base64,!!!").is_none());
    }

    #[test]
    fn test_format_round_trip() {
        let formatted = DataUrl::format("image/jpeg", "aGVsbG8=");
        let parsed = DataUrl::parse(&formatted).unwrap();
        assert_eq!(parsed.mime_type, "image/jpeg");
        assert_eq!(parsed.data, "aGVsbG8=");
    }
}
