//! Key Pool Module
//!
//! Manages the ordered pool of upstream API keys and decides, per request,
//! the order in which they are tried. The pool owns the process-wide
//! rotation cursor; ordering itself is a pure function so it can be tested
//! in isolation.

mod key;
mod pool;
mod strategy;

pub use key::ApiKey;
pub use pool::{KeyPool, PoolError, RequestPlan};
pub use strategy::{order, RotationStrategy};
