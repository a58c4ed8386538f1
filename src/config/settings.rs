//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::services::key_pool::RotationStrategy;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Key rotation and retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RotationConfig {
    /// Ordering strategy for the key pool
    pub strategy: RotationStrategy,
    /// Attempts per key before moving to the next one (>= 1)
    pub max_attempts_per_key: u32,
    /// Base delay for exponential backoff between same-key retries
    pub backoff_base_ms: u64,
    /// Upper bound on any single backoff delay
    pub backoff_max_ms: u64,
    /// Add random jitter to backoff delays
    pub backoff_jitter: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::RoundRobin,
            max_attempts_per_key: 3,
            backoff_base_ms: 250,
            backoff_max_ms: 10_000,
            backoff_jitter: false,
        }
    }
}

/// Upstream outcome classification configuration
///
/// Which HTTP statuses count as transient, which indicate a bad key, and
/// which error-message substrings reclassify an ambiguous failure as a
/// key problem.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Statuses worth retrying on the same key (5xx is always included)
    pub retryable_statuses: Vec<u16>,
    /// Statuses that condemn the key itself
    pub credential_error_statuses: Vec<u16>,
    /// Case-insensitive substrings that mark a response body as a
    /// quota/auth failure regardless of status code
    pub credential_error_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            retryable_statuses: vec![408, 429, 500, 502, 503, 504],
            credential_error_statuses: vec![401, 403],
            credential_error_markers: [
                "quota",
                "rate limit",
                "resource has been exhausted",
                "exceeded",
                "api key",
                "invalid",
                "permission",
                "unauth",
                "forbidden",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Gemini upstream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// API base URL
    pub base_url: String,
    /// Model for the text/vision path
    pub text_model: String,
    /// Model for the image generation path
    pub image_model: String,
    /// Per-call timeout in seconds (bounds failover latency)
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            timeout_secs: 25,
        }
    }
}

/// Remote allow-list (Auth Gate) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllowlistConfig {
    /// Require a verified (name, ip) pair on the chat endpoint
    pub require_verification: bool,
    /// Accept requests whose claimed address differs from the observed one
    /// (development convenience, off in production)
    pub allow_ip_mismatch: bool,
    /// Gist ID holding the allow-list document
    pub gist_id: String,
    /// File name inside the gist
    pub gist_file: String,
    /// Optional GitHub token for the gist fetch
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            require_verification: false,
            allow_ip_mismatch: false,
            gist_id: String::new(),
            gist_file: "allowlist.json".to_string(),
            github_token: None,
        }
    }
}

/// Gallery search collaborator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Maximum number of image URLs returned per query
    pub result_limit: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.pinterest.com/resource/BaseSearchResource/get/".to_string(),
            result_limit: 20,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    /// The credential pool source: opaque upstream API keys, in order
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,

    // Core behavior
    pub rotation: RotationConfig,
    pub classifier: ClassifierConfig,
    pub upstream: UpstreamConfig,

    // Collaborators
    pub allowlist: AllowlistConfig,
    pub gallery: GalleryConfig,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "gemini-relay"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            api_keys: load_api_keys(),

            rotation: RotationConfig {
                strategy: RotationStrategy::from_str(&env_or_default(
                    "KEY_ROTATION_STRATEGY",
                    "round_robin",
                )),
                max_attempts_per_key: env_or_default("MAX_ATTEMPTS_PER_KEY", "3")
                    .parse()
                    .unwrap_or(3),
                backoff_base_ms: env_or_default("BACKOFF_BASE_MS", "250")
                    .parse()
                    .unwrap_or(250),
                backoff_max_ms: env_or_default("BACKOFF_MAX_MS", "10000")
                    .parse()
                    .unwrap_or(10_000),
                backoff_jitter: env_or_default("BACKOFF_JITTER", "false")
                    .parse()
                    .unwrap_or(false),
            },

            classifier: ClassifierConfig {
                retryable_statuses: env_status_list(
                    "RETRYABLE_STATUSES",
                    &ClassifierConfig::default().retryable_statuses,
                ),
                credential_error_statuses: env_status_list(
                    "CREDENTIAL_ERROR_STATUSES",
                    &ClassifierConfig::default().credential_error_statuses,
                ),
                credential_error_markers: env_string_list(
                    "CREDENTIAL_ERROR_MARKERS",
                    &ClassifierConfig::default().credential_error_markers,
                ),
            },

            upstream: UpstreamConfig {
                base_url: env_or_default(
                    "GEMINI_BASE_URL",
                    &UpstreamConfig::default().base_url,
                ),
                text_model: env_or_default("TEXT_MODEL", "gemini-2.5-flash"),
                image_model: env_or_default("IMAGE_MODEL", "gemini-2.5-flash-image"),
                timeout_secs: env_or_default("UPSTREAM_TIMEOUT_SECS", "25")
                    .parse()
                    .unwrap_or(25),
            },

            allowlist: AllowlistConfig {
                require_verification: env_or_default("REQUIRE_VERIFICATION", "false")
                    .parse()
                    .unwrap_or(false),
                allow_ip_mismatch: env_or_default("ALLOW_IP_MISMATCH", "false")
                    .parse()
                    .unwrap_or(false),
                gist_id: env_or_default("ALLOWLIST_GIST_ID", ""),
                gist_file: env_or_default("ALLOWLIST_GIST_FILE", "allowlist.json"),
                github_token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            },

            gallery: GalleryConfig {
                endpoint: env_or_default("GALLERY_ENDPOINT", &GalleryConfig::default().endpoint),
                result_limit: env_or_default("GALLERY_RESULT_LIMIT", "20")
                    .parse()
                    .unwrap_or(20),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.api_keys.is_empty() {
            anyhow::bail!("No upstream API keys configured. Set GEMINI_API_KEYS (comma-separated) or GEMINI_API_KEY");
        }

        if self.rotation.max_attempts_per_key == 0 {
            anyhow::bail!("MAX_ATTEMPTS_PER_KEY must be >= 1");
        }

        if self.allowlist.require_verification && self.allowlist.gist_id.is_empty() {
            anyhow::bail!("REQUIRE_VERIFICATION is set but ALLOWLIST_GIST_ID is empty");
        }

        if self.environment == Environment::Production && self.allowlist.allow_ip_mismatch {
            tracing::warn!("Running in production with ALLOW_IP_MISMATCH enabled");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "gemini-relay".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_keys: Vec::new(),
            rotation: RotationConfig::default(),
            classifier: ClassifierConfig::default(),
            upstream: UpstreamConfig::default(),
            allowlist: AllowlistConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

/// Load the key pool from GEMINI_API_KEYS (comma-separated), falling back
/// to a single GEMINI_API_KEY. Blank entries are dropped.
fn load_api_keys() -> Vec<String> {
    let raw = env::var("GEMINI_API_KEYS")
        .or_else(|_| env::var("GEMINI_API_KEY"))
        .unwrap_or_default();

    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a comma-separated status list from the environment, falling back
/// to the provided defaults when unset or unparseable
fn env_status_list(key: &str, default: &[u16]) -> Vec<u16> {
    match env::var(key) {
        Ok(raw) => {
            let parsed: Vec<u16> = raw
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if parsed.is_empty() {
                default.to_vec()
            } else {
                parsed
            }
        }
        Err(_) => default.to_vec(),
    }
}

/// Parse a comma-separated string list from the environment
fn env_string_list(key: &str, default: &[String]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => {
            let parsed: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if parsed.is_empty() {
                default.to_vec()
            } else {
                parsed
            }
        }
        Err(_) => default.to_vec(),
    }
}
