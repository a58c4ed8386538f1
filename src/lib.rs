//! Gemini chat relay library
//!
//! A thin backend relay in front of the Google Gemini API: accepts chat-style
//! HTTP requests, optionally gates callers against a remote allow-list, and
//! forwards prompts upstream through a rotating pool of API keys with
//! per-key retry and cross-key failover.

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
