//! Gallery image search collaborator
//!
//! Queries the public Pinterest search resource and extracts plain image
//! URLs from its deeply nested JSON response. Best-effort: records without
//! a usable URL are skipped, and the result is capped at a configured
//! limit.

use crate::config::GalleryConfig;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery search failed: {0}")]
    Fetch(String),
}

pub struct GalleryClient {
    client: Client,
    config: GalleryConfig,
}

impl GalleryClient {
    pub fn new(config: GalleryConfig) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    /// Search for images matching `query`, returning up to
    /// `result_limit` direct image URLs.
    pub async fn search(&self, query: &str) -> Result<Vec<String>, GalleryError> {
        let options = serde_json::json!({
            "options": {
                "query": query,
                "scope": "pins",
            },
            "context": {},
        });
        let source_url = format!("/search/pins/?q={}", urlencode(query));

        tracing::debug!(query = %query, "Gallery search");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("source_url", source_url.as_str()), ("data", &options.to_string())])
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| GalleryError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GalleryError::Fetch(format!(
                "search endpoint returned {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GalleryError::Fetch(e.to_string()))?;

        Ok(extract_image_urls(&body, self.config.result_limit))
    }
}

/// Pull direct image URLs out of the search response, preferring the
/// original-size rendition and falling back to the 736px one.
fn extract_image_urls(body: &Value, limit: usize) -> Vec<String> {
    let results = body
        .pointer("/resource_response/data/results")
        .and_then(Value::as_array);

    let Some(results) = results else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|item| {
            let images = item.get("images")?;
            images
                .pointer("/orig/url")
                .or_else(|| images.pointer("/736x/url"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .take(limit)
        .collect()
}

/// Minimal percent-encoding for a query string component
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_body() -> Value {
        json!({
            "resource_response": {
                "data": {
                    "results": [
                        {"images": {"orig": {"url": "https://i.example/a.jpg"}}},
                        {"images": {"736x": {"url": "https://i.example/b.jpg"}}},
                        {"title": "no images key"},
                        {"images": {"orig": {"url": "https://i.example/c.jpg"},
                                     "736x": {"url": "https://i.example/c-small.jpg"}}}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_extracts_urls_preferring_original() {
        let urls = extract_image_urls(&search_body(), 20);
        assert_eq!(
            urls,
            vec![
                "https://i.example/a.jpg",
                "https://i.example/b.jpg",
                "https://i.example/c.jpg"
            ]
        );
    }

    #[test]
    fn test_respects_result_limit() {
        let urls = extract_image_urls(&search_body(), 2);
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_unexpected_shape_yields_empty() {
        assert!(extract_image_urls(&json!({}), 20).is_empty());
        assert!(extract_image_urls(&json!({"resource_response": {"data": {}}}), 20).is_empty());
        assert!(extract_image_urls(&json!([1, 2, 3]), 20).is_empty());
    }

    #[test]
    fn test_urlencode_spaces_and_specials() {
        assert_eq!(urlencode("red neon cat"), "red%20neon%20cat");
        assert_eq!(urlencode("a&b=c"), "a%26b%3Dc");
        assert_eq!(urlencode("kitten.jpg"), "kitten.jpg");
    }
}
