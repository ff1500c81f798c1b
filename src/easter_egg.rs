//! Click-counting easter eggs and the card egg arbiter.
//!
//! Everything here is clock-free: callers pass `now` in milliseconds, which
//! keeps the threshold and cooldown rules testable on the host.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::EggConfig;
use crate::content::{CardEggKind, EggEffect, Localized, EASTER_EGGS};
use crate::error::{Result, SiteError};
use crate::state::CardArbitration;

// --- Per-egg counter ---------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EggClick {
    /// Below threshold; `count` clicks so far in this burst.
    Counting { count: u32 },
    /// Threshold reached and the egg fired for the `trigger_count`-th time.
    Triggered { trigger_count: u32 },
    /// Threshold reached after the egg ran out of triggers; count reset silently.
    Exhausted,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EggCounter {
    pub click_count: u32,
    pub trigger_count: u32,
    pub last_click_ms: Option<f64>,
    pub triggered: bool,
}

impl EggCounter {
    /// Count one click at `now`. A gap of `reset_timeout_ms` or more since the
    /// previous click starts a new burst.
    pub fn register_click(&mut self, now: f64, threshold: u32, max_triggers: u32, reset_timeout_ms: f64) -> EggClick {
        if let Some(last) = self.last_click_ms {
            if now - last >= reset_timeout_ms {
                self.click_count = 0;
            }
        }
        self.click_count += 1;
        self.last_click_ms = Some(now);
        self.evaluate(threshold, max_triggers)
    }

    /// Apply the threshold rule to the current count.
    pub fn evaluate(&mut self, threshold: u32, max_triggers: u32) -> EggClick {
        if self.click_count < threshold {
            return EggClick::Counting { count: self.click_count };
        }
        self.click_count = 0;
        if self.trigger_count >= max_triggers {
            return EggClick::Exhausted;
        }
        self.trigger_count += 1;
        self.triggered = true;
        EggClick::Triggered { trigger_count: self.trigger_count }
    }

    /// Inactivity timer fired.
    pub fn expire(&mut self) {
        self.click_count = 0;
    }

    pub fn reset(&mut self) {
        *self = EggCounter::default();
    }
}

// --- Definitions -------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct EasterEggDefinition {
    pub id: &'static str,
    pub trigger_selector: &'static str,
    pub required_clicks: u32,
    pub audio_file: &'static str,
    pub message: Localized<&'static str>,
    pub max_triggers: u32,
    pub effect: EggEffect,
    pub effect_delay_ms: u32,
}

/// Egg definitions registered at start-up from the static table plus config limits.
#[derive(Clone, Debug)]
pub struct EggRegistry {
    definitions: Vec<EasterEggDefinition>,
    reset_timeout_ms: f64,
}

impl EggRegistry {
    pub fn new(cfg: &EggConfig) -> Self {
        let definitions = EASTER_EGGS
            .iter()
            .map(|spec| EasterEggDefinition {
                id: spec.id,
                trigger_selector: spec.selector,
                required_clicks: cfg.trigger_threshold,
                audio_file: spec.audio,
                message: spec.message,
                max_triggers: cfg.max_triggers,
                effect: spec.effect,
                effect_delay_ms: if spec.delayed { cfg.lang_toggle_delay_ms } else { 0 },
            })
            .collect();
        Self { definitions, reset_timeout_ms: f64::from(cfg.reset_timeout_ms) }
    }

    pub fn get(&self, id: &str) -> Result<&EasterEggDefinition> {
        self.definitions
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| SiteError::UnknownEasterEgg(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EasterEggDefinition> {
        self.definitions.iter()
    }

    pub fn reset_timeout_ms(&self) -> f64 {
        self.reset_timeout_ms
    }
}

// --- Card eggs ---------------------------------------------------------------

/// Short-window click burst on one essence card.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClickBurst {
    count: u32,
    last_ms: Option<f64>,
}

impl ClickBurst {
    /// Register a click; returns true once `threshold` clicks landed with gaps
    /// shorter than `window_ms`, then starts over.
    pub fn hit(&mut self, now: f64, threshold: u32, window_ms: f64) -> bool {
        match self.last_ms {
            Some(last) if now - last < window_ms => self.count += 1,
            _ => self.count = 1,
        }
        self.last_ms = Some(now);
        if self.count >= threshold {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Global arbitration for card eggs: one shared cooldown and a single card
/// that owns the trigger until `reset`.
#[derive(Clone, Copy, Debug)]
pub struct CardArbiter {
    cooldown_ms: f64,
}

impl CardArbiter {
    pub fn new(cooldown_ms: f64) -> Self {
        Self { cooldown_ms }
    }

    /// Returns true when the card egg fired. The predicate only runs once the
    /// cooldown and source checks pass.
    pub fn handle(
        &self,
        state: &mut CardArbitration,
        card_index: usize,
        kind: CardEggKind,
        predicate: impl FnOnce() -> bool,
        now: f64,
    ) -> bool {
        if let Some(last) = state.last_trigger_ms {
            if now - last < self.cooldown_ms {
                return false;
            }
        }
        if let Some(source) = state.trigger_source {
            if source != card_index {
                return false;
            }
        }
        if !predicate() {
            return false;
        }
        state.trigger_source = Some(card_index);
        state.last_kind = Some(kind);
        state.last_trigger_ms = Some(now);
        true
    }

    pub fn reset(&self, state: &mut CardArbitration) {
        state.trigger_source = None;
        state.last_kind = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(counter: &mut EggCounter, now: f64) -> EggClick {
        counter.register_click(now, 3, 3, 1000.0)
    }

    #[test]
    fn test_three_quick_clicks_trigger_once() {
        let mut c = EggCounter::default();
        assert_eq!(click(&mut c, 0.0), EggClick::Counting { count: 1 });
        assert_eq!(click(&mut c, 200.0), EggClick::Counting { count: 2 });
        assert_eq!(click(&mut c, 400.0), EggClick::Triggered { trigger_count: 1 });
        assert_eq!(c.click_count, 0);
        assert!(c.triggered);
    }

    #[test]
    fn test_spaced_clicks_never_trigger() {
        let mut c = EggCounter::default();
        for i in 0..10 {
            let outcome = click(&mut c, i as f64 * 1000.0);
            assert_eq!(outcome, EggClick::Counting { count: 1 });
        }
        assert_eq!(c.trigger_count, 0);
    }

    #[test]
    fn test_fourth_burst_is_exhausted() {
        let mut c = EggCounter::default();
        let mut t = 0.0;
        for burst in 1..=4 {
            let mut last = EggClick::Counting { count: 0 };
            for _ in 0..3 {
                last = click(&mut c, t);
                t += 100.0;
            }
            if burst <= 3 {
                assert_eq!(last, EggClick::Triggered { trigger_count: burst });
            } else {
                assert_eq!(last, EggClick::Exhausted);
            }
            t += 5000.0;
        }
        assert_eq!(c.trigger_count, 3);
        assert_eq!(c.click_count, 0);
    }

    #[test]
    fn test_expire_resets_count_only() {
        let mut c = EggCounter::default();
        click(&mut c, 0.0);
        click(&mut c, 10.0);
        c.expire();
        assert_eq!(c.click_count, 0);
        assert_eq!(click(&mut c, 20.0), EggClick::Counting { count: 1 });
    }

    #[test]
    fn test_registry_applies_config_limits() {
        let cfg = EggConfig { trigger_threshold: 5, ..EggConfig::default() };
        let registry = EggRegistry::new(&cfg);
        let lang = registry.get("langToggle").unwrap();
        assert_eq!(lang.required_clicks, 5);
        assert_eq!(lang.effect_delay_ms, 500);
        assert_eq!(registry.get("tributeClick").unwrap().effect_delay_ms, 0);
        assert!(matches!(registry.get("konami"), Err(SiteError::UnknownEasterEgg(_))));
    }

    #[test]
    fn test_click_burst_needs_tight_gaps() {
        let mut b = ClickBurst::default();
        assert!(!b.hit(0.0, 3, 1000.0));
        assert!(!b.hit(500.0, 3, 1000.0));
        assert!(b.hit(900.0, 3, 1000.0));
        assert_eq!(b.count(), 0);
        assert!(!b.hit(1000.0, 3, 1000.0));
        assert!(!b.hit(2500.0, 3, 1000.0));
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn test_arbiter_cooldown_and_single_source() {
        let arbiter = CardArbiter::new(500.0);
        let mut state = CardArbitration::default();
        assert!(arbiter.handle(&mut state, 2, CardEggKind::RoseQuote, || true, 1000.0));
        // inside the global cooldown, even the source card is refused
        assert!(!arbiter.handle(&mut state, 2, CardEggKind::RoseQuote, || true, 1200.0));
        // another card never wins while card 2 owns the trigger
        assert!(!arbiter.handle(&mut state, 0, CardEggKind::Cyberpunk, || true, 5000.0));
        assert!(arbiter.handle(&mut state, 2, CardEggKind::RoseQuote, || true, 5000.0));
        arbiter.reset(&mut state);
        assert!(arbiter.handle(&mut state, 0, CardEggKind::Cyberpunk, || true, 6000.0));
        assert_eq!(state.trigger_source, Some(0));
    }

    #[test]
    fn test_arbiter_skips_predicate_when_blocked() {
        let arbiter = CardArbiter::new(500.0);
        let mut state = CardArbitration::default();
        arbiter.handle(&mut state, 1, CardEggKind::Zote, || true, 0.0);
        let mut called = false;
        assert!(!arbiter.handle(&mut state, 3, CardEggKind::DondaWisdom, || { called = true; true }, 100.0));
        assert!(!called);
        assert!(!arbiter.handle(&mut state, 1, CardEggKind::Zote, || false, 900.0));
    }
}
