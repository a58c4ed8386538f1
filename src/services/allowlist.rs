//! Remote allow-list Auth Gate
//!
//! Verifies a claimed (name, ip) pair against a JSON document hosted in a
//! GitHub gist. The gate sits strictly in front of the chat handler; the
//! failover controller never sees it. The document is fetched fresh on
//! every check (with a cache-busting query parameter) so revocations take
//! effect immediately.

use crate::config::AllowlistConfig;
use crate::utils::normalize_ip;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Why a caller was denied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthDenial {
    #[error("name is missing")]
    MissingName,

    #[error("claimed IP address is missing")]
    MissingAddress,

    #[error("claimed IP address does not match the connecting address")]
    AddressMismatch { observed: String },

    #[error("name/IP pair is not on the allow list")]
    NotListed,
}

/// Allow-list errors: either a denial or a failure to reach the store
#[derive(Error, Debug)]
pub enum AllowlistError {
    #[error("{0}")]
    Denied(#[from] AuthDenial),

    #[error("allow-list fetch failed: {0}")]
    Fetch(String),
}

/// One allow-list record
#[derive(Debug, Clone, Deserialize)]
pub struct AllowlistEntry {
    pub name: String,
    pub ip: String,
}

/// The allow-list document shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllowlistDoc {
    #[serde(default)]
    pub users: Vec<AllowlistEntry>,
}

impl AllowlistDoc {
    /// Find the entry matching a normalized (name, ip) pair
    pub fn find(&self, name: &str, ip: &str) -> Option<&AllowlistEntry> {
        let name = normalize_name(name);
        let ip = normalize_ip(ip);
        self.users
            .iter()
            .find(|u| normalize_name(&u.name) == name && normalize_ip(&u.ip) == ip)
    }
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: std::collections::HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: String,
}

/// Client for the gist-backed allow-list store
pub struct AllowlistClient {
    client: Client,
    config: AllowlistConfig,
    app_name: String,
}

impl AllowlistClient {
    pub fn new(config: AllowlistConfig, app_name: String) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            config,
            app_name,
        })
    }

    /// Verify a claimed identity against the observed transport address
    /// and the remote allow-list. Returns the matched user name.
    pub async fn verify(
        &self,
        name: Option<&str>,
        claimed_ip: Option<&str>,
        observed_ip: Option<&str>,
    ) -> Result<String, AllowlistError> {
        let name = name
            .map(normalize_name)
            .filter(|n| !n.is_empty())
            .ok_or(AuthDenial::MissingName)?;
        let claimed_ip = claimed_ip
            .map(normalize_ip)
            .filter(|ip| !ip.is_empty())
            .ok_or(AuthDenial::MissingAddress)?;

        // The transport-observed address must back up the claim; a
        // mismatch means a spoof or a proxy in between
        if let Some(observed) = observed_ip.map(normalize_ip).filter(|ip| !ip.is_empty()) {
            if observed != claimed_ip && !self.config.allow_ip_mismatch {
                tracing::warn!(
                    name = %name,
                    observed = %observed,
                    "Claimed address mismatch"
                );
                return Err(AuthDenial::AddressMismatch { observed }.into());
            }
        }

        let doc = self.fetch_doc().await?;

        match doc.find(&name, &claimed_ip) {
            Some(entry) => {
                tracing::info!(user = %entry.name, "Allow-list verification passed");
                Ok(entry.name.clone())
            }
            None => Err(AuthDenial::NotListed.into()),
        }
    }

    /// Fetch and parse the allow-list document from the gist store
    async fn fetch_doc(&self) -> Result<AllowlistDoc, AllowlistError> {
        // Cache-buster: the document must never be served stale
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let url = format!(
            "https://api.github.com/gists/{}?v={}",
            self.config.gist_id, nonce
        );

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", &self.app_name);

        if let Some(token) = &self.config.github_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AllowlistError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AllowlistError::Fetch(format!(
                "GitHub API error: {}",
                response.status().as_u16()
            )));
        }

        let gist: GistResponse = response
            .json()
            .await
            .map_err(|e| AllowlistError::Fetch(e.to_string()))?;

        let file = gist.files.get(&self.config.gist_file).ok_or_else(|| {
            AllowlistError::Fetch(format!(
                "file {} not found in gist",
                self.config.gist_file
            ))
        })?;

        serde_json::from_str(&file.content)
            .map_err(|e| AllowlistError::Fetch(format!("allow-list document malformed: {e}")))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
