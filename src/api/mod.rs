// ============================================================================
// HTTP API handlers
// ============================================================================

pub mod chat;
pub mod gallery;
pub mod health;
pub mod verify;
