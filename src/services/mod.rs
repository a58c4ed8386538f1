// ============================================================================
// Service layer
// ============================================================================

pub mod allowlist;
pub mod classify;
pub mod failover;
pub mod gallery;
pub mod gemini;
pub mod key_pool;

pub use allowlist::{AllowlistClient, AllowlistError, AuthDenial};
pub use classify::OutcomeClassifier;
pub use failover::{AttemptOutcome, FailoverController, FailoverError, UpstreamInvoker};
pub use gallery::{GalleryClient, GalleryError};
pub use gemini::{GeminiService, GeminiServiceError};
pub use key_pool::{ApiKey, KeyPool, RequestPlan, RotationStrategy};
