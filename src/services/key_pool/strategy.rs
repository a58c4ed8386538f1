//! Key ordering strategies
//!
//! The ordering function is pure: given the pool and the current rotation
//! cursor it returns the sequence of keys to try for one request plus the
//! new cursor value. State lives in the pool, not here.

use super::key::ApiKey;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// How the pool is ordered for each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Rotate the pool so each key takes its turn as primary (default)
    #[default]
    RoundRobin,
    /// Uniformly shuffled order, cursor untouched
    Random,
}

impl RotationStrategy {
    /// Parse from string (case-insensitive); unknown values fall back to
    /// round-robin
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "random" => Self::Random,
            "round_robin" | "roundrobin" => Self::RoundRobin,
            _ => Self::RoundRobin,
        }
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Order the pool for one request.
///
/// Returns the keys in the order they should be attempted and the cursor
/// value to persist for the next request.
///
/// - Round-robin rotates the pool so `keys[cursor]` comes first and
///   advances the cursor modulo pool size.
/// - Random returns a uniform permutation and leaves the cursor unchanged.
/// - Pools of one key (or none) come back untouched under both strategies.
pub fn order(keys: &[ApiKey], cursor: usize, strategy: RotationStrategy) -> (Vec<ApiKey>, usize) {
    if keys.len() <= 1 {
        return (keys.to_vec(), cursor);
    }

    match strategy {
        RotationStrategy::RoundRobin => {
            let start = cursor % keys.len();
            let mut ordered = Vec::with_capacity(keys.len());
            ordered.extend_from_slice(&keys[start..]);
            ordered.extend_from_slice(&keys[..start]);
            (ordered, (start + 1) % keys.len())
        }
        RotationStrategy::Random => {
            let mut shuffled = keys.to_vec();
            shuffled.shuffle(&mut rand::thread_rng());
            (shuffled, cursor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(names: &[&str]) -> Vec<ApiKey> {
        names.iter().map(|n| ApiKey::new(*n)).collect()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            RotationStrategy::from_str("round_robin"),
            RotationStrategy::RoundRobin
        );
        assert_eq!(RotationStrategy::from_str("RANDOM"), RotationStrategy::Random);
        assert_eq!(
            RotationStrategy::from_str("unknown"),
            RotationStrategy::RoundRobin
        );
    }

    #[test]
    fn test_round_robin_rotation_sequence() {
        let keys = pool(&["key-alpha", "key-beta", "key-gamma"]);

        let (first, cursor) = order(&keys, 0, RotationStrategy::RoundRobin);
        assert_eq!(first, pool(&["key-alpha", "key-beta", "key-gamma"]));
        assert_eq!(cursor, 1);

        let (second, cursor) = order(&keys, cursor, RotationStrategy::RoundRobin);
        assert_eq!(second, pool(&["key-beta", "key-gamma", "key-alpha"]));
        assert_eq!(cursor, 2);

        let (third, cursor) = order(&keys, cursor, RotationStrategy::RoundRobin);
        assert_eq!(third, pool(&["key-gamma", "key-alpha", "key-beta"]));
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_round_robin_starts_at_cursor() {
        let keys = pool(&["a", "b", "c", "d"]);

        for cursor in 0..keys.len() {
            let (ordered, next) = order(&keys, cursor, RotationStrategy::RoundRobin);
            assert_eq!(ordered[0], keys[cursor]);
            assert_eq!(ordered.len(), keys.len());
            assert_eq!(next, (cursor + 1) % keys.len());
        }
    }

    #[test]
    fn test_random_is_a_permutation_and_keeps_cursor() {
        let keys = pool(&["key-one", "key-two", "key-three", "key-four"]);

        for _ in 0..20 {
            let (ordered, cursor) = order(&keys, 2, RotationStrategy::Random);
            assert_eq!(cursor, 2);
            assert_eq!(ordered.len(), keys.len());
            for key in &keys {
                assert!(ordered.contains(key));
            }
        }
    }

    #[test]
    fn test_single_key_pool_is_a_noop() {
        let keys = pool(&["only-key-here"]);

        let (rr, cursor) = order(&keys, 0, RotationStrategy::RoundRobin);
        assert_eq!(rr, keys);
        assert_eq!(cursor, 0);

        let (random, cursor) = order(&keys, 0, RotationStrategy::Random);
        assert_eq!(random, keys);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_empty_pool_returns_empty() {
        let keys: Vec<ApiKey> = Vec::new();
        let (ordered, cursor) = order(&keys, 0, RotationStrategy::RoundRobin);
        assert!(ordered.is_empty());
        assert_eq!(cursor, 0);
    }
}
