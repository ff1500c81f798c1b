//! Quote carousel: click, swipe and arrow keys step through the current
//! collection, wrapping at either end.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, KeyboardEvent, TouchEvent};

use crate::app;
use crate::content::quote_collection;
use crate::state::QuotePatch;
use crate::sync::{StateSynchronizer, Surface};

pub const CAROUSEL_SELECTOR: &str = ".quote-section";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteStep {
    Next,
    Previous,
}

pub fn step_index(current: usize, len: usize, step: QuoteStep) -> usize {
    if len == 0 {
        return 0;
    }
    match step {
        QuoteStep::Next => (current + 1) % len,
        QuoteStep::Previous => (current + len - 1) % len,
    }
}

pub fn key_step(key: &str) -> Option<QuoteStep> {
    match key {
        "ArrowRight" | "Enter" | " " => Some(QuoteStep::Next),
        "ArrowLeft" => Some(QuoteStep::Previous),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SwipeTracker {
    threshold_px: f64,
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold_px: f64) -> Self {
        Self { threshold_px, start_x: None }
    }

    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Swiping right goes back, swiping left goes forward.
    pub fn end(&mut self, x: f64) -> Option<QuoteStep> {
        let dx = x - self.start_x.take()?;
        if dx > self.threshold_px {
            Some(QuoteStep::Previous)
        } else if dx < -self.threshold_px {
            Some(QuoteStep::Next)
        } else {
            None
        }
    }
}

pub fn advance<S: Surface>(sync: &mut StateSynchronizer<S>, step: QuoteStep) -> bool {
    let quote = &sync.state().quote;
    let Some(collection) = quote_collection(&quote.section) else { return false };
    let next = step_index(quote.index, collection.len(), step);
    sync.sync_quote_state(QuotePatch::index(next))
}

/// Out-of-range indices are ignored.
pub fn set_quote_index<S: Surface>(sync: &mut StateSynchronizer<S>, index: usize) -> bool {
    sync.sync_quote_state(QuotePatch::index(index))
}

pub fn bind(container: &HtmlElement, swipe_threshold_px: f64) -> Vec<EventListener> {
    let click = EventListener::new(container, "click", |event: &Event| {
        if super::event_target_closest(event, CAROUSEL_SELECTOR).is_some() {
            app::step_quote(QuoteStep::Next);
        }
    });
    let key = EventListener::new(container, "keydown", |event: &Event| {
        if super::event_target_closest(event, CAROUSEL_SELECTOR).is_none() {
            return;
        }
        let Some(step) = event.dyn_ref::<KeyboardEvent>().and_then(|k| key_step(&k.key())) else { return };
        event.prevent_default();
        app::step_quote(step);
    });

    let tracker = Rc::new(RefCell::new(SwipeTracker::new(swipe_threshold_px)));
    let start_tracker = Rc::clone(&tracker);
    let touch_start = EventListener::new_with_options(
        container,
        "touchstart",
        EventListenerOptions { phase: EventListenerPhase::Bubble, passive: true },
        move |event: &Event| {
            if super::event_target_closest(event, CAROUSEL_SELECTOR).is_none() {
                return;
            }
            if let Some(x) = first_touch_x(event, false) {
                start_tracker.borrow_mut().start(x);
            }
        },
    );
    let touch_end = EventListener::new_with_options(
        container,
        "touchend",
        EventListenerOptions { phase: EventListenerPhase::Bubble, passive: true },
        move |event: &Event| {
            let Some(x) = first_touch_x(event, true) else { return };
            let step = tracker.borrow_mut().end(x);
            if let Some(step) = step {
                app::step_quote(step);
            }
        },
    );
    vec![click, key, touch_start, touch_end]
}

fn first_touch_x(event: &Event, changed: bool) -> Option<f64> {
    let touch = event.dyn_ref::<TouchEvent>()?;
    let list = if changed { touch.changed_touches() } else { touch.touches() };
    list.get(0).map(|t| f64::from(t.client_x()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::DEFAULT_QUOTE_INDEX;
    use crate::sync::MemorySurface;

    #[test]
    fn test_step_wraps_both_ways() {
        assert_eq!(step_index(8, 9, QuoteStep::Next), 0);
        assert_eq!(step_index(0, 9, QuoteStep::Previous), 8);
        assert_eq!(step_index(3, 0, QuoteStep::Next), 0);
    }

    #[test]
    fn test_keys() {
        assert_eq!(key_step("ArrowRight"), Some(QuoteStep::Next));
        assert_eq!(key_step(" "), Some(QuoteStep::Next));
        assert_eq!(key_step("Enter"), Some(QuoteStep::Next));
        assert_eq!(key_step("ArrowLeft"), Some(QuoteStep::Previous));
        assert_eq!(key_step("a"), None);
    }

    #[test]
    fn test_swipe_direction_and_threshold() {
        let mut s = SwipeTracker::new(50.0);
        s.start(200.0);
        assert_eq!(s.end(120.0), Some(QuoteStep::Next));
        s.start(100.0);
        assert_eq!(s.end(151.0), Some(QuoteStep::Previous));
        s.start(100.0);
        assert_eq!(s.end(140.0), None);
        // an end without a start is ignored
        assert_eq!(s.end(0.0), None);
    }

    #[test]
    fn test_advance_updates_state() {
        let mut sync = StateSynchronizer::new(&SiteConfig::default(), MemorySurface::tribute_page());
        assert!(advance(&mut sync, QuoteStep::Next));
        assert_eq!(sync.state().quote.index, (DEFAULT_QUOTE_INDEX + 1) % 9);
        assert!(!set_quote_index(&mut sync, 42));
        assert!(set_quote_index(&mut sync, 3));
        assert_eq!(sync.state().quote.index, 3);
    }
}
