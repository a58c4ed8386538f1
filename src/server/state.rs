//! Shared application state

use crate::config::Settings;
use crate::services::key_pool::KeyPool;
use crate::services::{AllowlistClient, GalleryClient, GeminiService};
use std::sync::Arc;
use std::time::Instant;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gemini: Arc<GeminiService>,
    pub allowlist: Arc<AllowlistClient>,
    pub gallery: Arc<GalleryClient>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, anyhow::Error> {
        let pool = Arc::new(KeyPool::new(
            settings.api_keys.clone(),
            settings.rotation.strategy,
            settings.rotation.max_attempts_per_key,
        ));

        let gemini = Arc::new(GeminiService::new(
            &settings.upstream,
            &settings.rotation,
            &settings.classifier,
            pool,
        )?);

        let allowlist = Arc::new(AllowlistClient::new(
            settings.allowlist.clone(),
            settings.app_name.clone(),
        )?);

        let gallery = Arc::new(GalleryClient::new(settings.gallery.clone())?);

        Ok(Self {
            settings: Arc::new(settings),
            gemini,
            allowlist,
            gallery,
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
