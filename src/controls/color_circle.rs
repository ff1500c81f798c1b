//! Color circle clicks. Throttled, and gated so a click arriving while an
//! effect is still running is dropped rather than queued.

use gloo::events::EventListener;
use web_sys::{Element, Event};

use crate::app;
use crate::dom;
use crate::error::Result;
use crate::state::{ColorCirclePatch, ColorCircleState, Processing};
use crate::timing::Throttle;

pub const CIRCLE_SELECTOR: &str = ".color-circle";
pub const BURST_AT: u32 = 5;
pub const GLOW_AT: u32 = 10;
pub const WRAP_AT: u32 = 20;
pub const EFFECT_MS: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircleEffect {
    Burst,
    Glow,
}

impl CircleEffect {
    pub fn class(self) -> &'static str {
        match self {
            CircleEffect::Burst => "burst",
            CircleEffect::Glow => "glow",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColorCircle {
    throttle: Throttle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleClick {
    pub patch: ColorCirclePatch,
    pub effect: Option<CircleEffect>,
}

impl ColorCircle {
    pub fn new(throttle_ms: u32) -> Self {
        Self { throttle: Throttle::new(f64::from(throttle_ms)) }
    }

    /// `None` when the click is dropped. An effect leaves the circle
    /// `Processing` until `release`.
    pub fn click(&mut self, state: &ColorCircleState, now: f64) -> Option<CircleClick> {
        if state.processing == Processing::Processing || !self.throttle.ready(now) {
            return None;
        }
        let count = state.event_count + 1;
        let effect = match count {
            BURST_AT => Some(CircleEffect::Burst),
            GLOW_AT => Some(CircleEffect::Glow),
            _ => None,
        };
        let processing = if effect.is_some() { Processing::Processing } else { Processing::Idle };
        let event_count = if count >= WRAP_AT { 0 } else { count };
        Some(CircleClick { patch: ColorCirclePatch { event_count: Some(event_count), processing: Some(processing) }, effect })
    }

    pub fn release() -> ColorCirclePatch {
        ColorCirclePatch { event_count: None, processing: Some(Processing::Idle) }
    }
}

pub fn render_effect(root: &Element, effect: CircleEffect, on: bool) -> Result<()> {
    for circle in dom::subtree(root)?.iter().filter(|el| el.matches(CIRCLE_SELECTOR).unwrap_or(false)) {
        dom::set_class(circle, effect.class(), on)?;
    }
    Ok(())
}

pub fn bind(root: &Element) -> EventListener {
    EventListener::new(root, "click", |event: &Event| {
        if super::event_target_closest(event, CIRCLE_SELECTOR).is_some() {
            app::click_color_circle();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(circle: &mut ColorCircle, state: &mut ColorCircleState, now: f64) -> Option<CircleClick> {
        let click = circle.click(state, now)?;
        state.event_count = click.patch.event_count.unwrap_or(state.event_count);
        state.processing = click.patch.processing.unwrap_or(state.processing);
        Some(click)
    }

    #[test]
    fn test_effects_at_five_and_ten() {
        let mut circle = ColorCircle::new(200);
        let mut state = ColorCircleState::default();
        let mut effects = Vec::new();
        let mut now = 0.0;
        for _ in 0..10 {
            if let Some(CircleClick { effect: Some(effect), .. }) = run(&mut circle, &mut state, now) {
                effects.push(effect);
                state.processing = Processing::Idle;
            }
            now += 250.0;
        }
        assert_eq!(effects, vec![CircleEffect::Burst, CircleEffect::Glow]);
        assert_eq!(state.event_count, 10);
    }

    #[test]
    fn test_processing_drops_clicks() {
        let mut circle = ColorCircle::new(0);
        let mut state = ColorCircleState { event_count: 4, processing: Processing::Idle };
        assert!(run(&mut circle, &mut state, 0.0).is_some());
        assert_eq!(state.processing, Processing::Processing);
        assert!(run(&mut circle, &mut state, 500.0).is_none());
        assert_eq!(state.event_count, 5);
        let release = ColorCircle::release();
        assert_eq!(release.processing, Some(Processing::Idle));
    }

    #[test]
    fn test_throttle_drops_fast_clicks() {
        let mut circle = ColorCircle::new(200);
        let mut state = ColorCircleState::default();
        assert!(run(&mut circle, &mut state, 0.0).is_some());
        assert!(run(&mut circle, &mut state, 100.0).is_none());
        assert_eq!(state.event_count, 1);
    }

    #[test]
    fn test_count_wraps_at_twenty() {
        let mut circle = ColorCircle::new(0);
        let mut state = ColorCircleState { event_count: 19, processing: Processing::Idle };
        run(&mut circle, &mut state, 0.0);
        assert_eq!(state.event_count, 0);
    }
}
