//! Utility modules
//!
//! Contains backoff policy, data URL handling, and network address helpers.

pub mod backoff;
pub mod data_url;
pub mod net;

pub use backoff::BackoffPolicy;
pub use data_url::DataUrl;
pub use net::{client_ip, normalize_ip};
