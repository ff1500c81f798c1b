//! Render batching. Scheduling only marks a feature dirty; the periodic batch
//! tick drains every dirty feature once, so any number of updates inside one
//! interval collapse into a single DOM pass per feature.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A synced feature, rendered as one unit across all copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Feature {
    Language,
    Quote,
    Essence,
    PhoebeWisdom,
    Meditation,
}

impl Feature {
    /// Render order for a full pass; language first so class toggles land
    /// before the text they reveal.
    pub const ALL: [Feature; 5] =
        [Feature::Language, Feature::Quote, Feature::Essence, Feature::PhoebeWisdom, Feature::Meditation];
}

#[derive(Clone, Debug, Default)]
pub struct BatchScheduler {
    pending: BTreeSet<Feature>,
    flushes: u64,
}

impl BatchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, feature: Feature) {
        self.pending.insert(feature);
    }

    pub fn schedule_all(&mut self) {
        self.pending.extend(Feature::ALL);
    }

    pub fn is_pending(&self, feature: Feature) -> bool {
        self.pending.contains(&feature)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take every dirty feature in render order.
    pub fn drain(&mut self) -> Vec<Feature> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        self.flushes += 1;
        let mut features: Vec<Feature> = std::mem::take(&mut self.pending).into_iter().collect();
        features.sort_by_key(|f| Feature::ALL.iter().position(|g| g == f));
        features
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_schedules_coalesce() {
        let mut b = BatchScheduler::new();
        for _ in 0..10 {
            b.schedule(Feature::Quote);
        }
        b.schedule(Feature::Essence);
        assert_eq!(b.drain(), vec![Feature::Quote, Feature::Essence]);
        assert!(!b.has_pending());
        assert_eq!(b.flush_count(), 1);
    }

    #[test]
    fn test_empty_drain_is_not_a_flush() {
        let mut b = BatchScheduler::new();
        assert!(b.drain().is_empty());
        assert_eq!(b.flush_count(), 0);
    }

    #[test]
    fn test_schedule_all_drains_in_render_order() {
        let mut b = BatchScheduler::new();
        b.schedule(Feature::Meditation);
        b.schedule_all();
        assert_eq!(b.drain(), Feature::ALL.to_vec());
    }
}
