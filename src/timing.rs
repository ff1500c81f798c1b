//! Throttling, pending-timer bookkeeping and randomness helpers.

use std::collections::BTreeMap;

/// Leading-edge throttle: lets one call through per `interval_ms`.
#[derive(Clone, Copy, Debug)]
pub struct Throttle {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl Throttle {
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms, last_ms: None }
    }

    pub fn ready(&mut self, now: f64) -> bool {
        match self.last_ms {
            Some(last) if now - last < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now);
                true
            }
        }
    }
}

/// Handles for one-shot timers still waiting to fire. Each handle gets a key
/// its callback hands back to `release` once it has run, so only pending
/// timers are held.
#[derive(Debug)]
pub struct PendingTimers<T> {
    next_key: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> Default for PendingTimers<T> {
    fn default() -> Self {
        Self { next_key: 0, pending: BTreeMap::new() }
    }
}

impl<T> PendingTimers<T> {
    /// Key the next `insert` will hand out.
    pub fn next_key(&self) -> u64 {
        self.next_key
    }

    pub fn insert(&mut self, handle: T) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.pending.insert(key, handle);
        key
    }

    pub fn release(&mut self, key: u64) -> Option<T> {
        self.pending.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Uniform-ish index in `[0, len)`.
#[cfg(feature = "rng")]
pub fn rand_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => (u64::from_le_bytes(buf) % len as u64) as usize,
        Err(_) => clock_index(len),
    }
}

#[cfg(not(feature = "rng"))]
pub fn rand_index(len: usize) -> usize {
    clock_index(len)
}

fn clock_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    // Simple linear transform of the performance clock; not crypto secure
    (crate::dom::now_ms() as u64 as usize)
        .wrapping_mul(1664525)
        .wrapping_add(1013904223)
        % len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_drops_calls_inside_interval() {
        let mut t = Throttle::new(200.0);
        assert!(t.ready(0.0));
        assert!(!t.ready(150.0));
        assert!(t.ready(200.0));
        assert!(!t.ready(399.0));
    }

    #[test]
    fn test_pending_timers_hold_only_unfired_handles() {
        let mut timers = PendingTimers::default();
        for expected in 0..3 {
            assert_eq!(timers.next_key(), expected);
            assert_eq!(timers.insert("audio"), expected);
        }
        assert_eq!(timers.release(1), Some("audio"));
        assert_eq!(timers.release(1), None);
        assert_eq!(timers.len(), 2);
        for key in [0, 2] {
            timers.release(key);
        }
        assert!(timers.is_empty());
        assert_eq!(timers.insert("notice"), 3);
    }

    #[test]
    fn test_rand_index_in_range() {
        for len in 1..20 {
            assert!(rand_index(len) < len);
        }
        assert_eq!(rand_index(0), 0);
    }
}
