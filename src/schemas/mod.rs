//! Schema module
//!
//! Request/response models for the relay's own API and for the upstream
//! Gemini wire format.

pub mod chat;
pub mod gemini;
