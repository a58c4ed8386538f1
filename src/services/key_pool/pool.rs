//! Key pool and per-request planning
//!
//! The pool is read-only after startup except for the rotation cursor,
//! which is shared by every in-flight request on this process. The cursor
//! advance is a single atomic read-modify-write that wraps modulo pool
//! size, so concurrent requests never observe a torn or out-of-range value.
//! (Two concurrent requests may still pick the same primary key; that only
//! affects fairness, not correctness.)

use super::key::ApiKey;
use super::strategy::{order, RotationStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("no upstream API keys configured")]
    Empty,
}

/// The ordered keys to attempt for one request plus the per-key retry
/// budget. Built once per request, immutable afterwards.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub keys: Vec<ApiKey>,
    pub max_attempts_per_key: u32,
}

/// A pool of upstream API keys with a process-wide rotation cursor
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<ApiKey>,
    strategy: RotationStrategy,
    max_attempts_per_key: u32,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Create a pool from opaque secrets, preserving their order
    pub fn new(
        secrets: Vec<String>,
        strategy: RotationStrategy,
        max_attempts_per_key: u32,
    ) -> Self {
        let keys = secrets.into_iter().map(ApiKey::new).collect();
        Self {
            keys,
            strategy,
            max_attempts_per_key: max_attempts_per_key.max(1),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current cursor value (round-robin primary for the next request)
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Build the attempt plan for one request.
    ///
    /// Under round-robin this advances the shared cursor exactly once,
    /// before any network call happens. An empty pool fails here so the
    /// caller never reaches the wire.
    pub fn plan(&self) -> Result<RequestPlan, PoolError> {
        if self.keys.is_empty() {
            return Err(PoolError::Empty);
        }

        let cursor = match self.strategy {
            RotationStrategy::RoundRobin => {
                // fetch_update wraps modulo len, keeping 0 <= cursor < len
                let len = self.keys.len();
                self.cursor
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % len))
                    .unwrap_or(0)
            }
            RotationStrategy::Random => self.cursor.load(Ordering::SeqCst),
        };

        let (keys, _) = order(&self.keys, cursor, self.strategy);

        Ok(RequestPlan {
            keys,
            max_attempts_per_key: self.max_attempts_per_key,
        })
    }
}
