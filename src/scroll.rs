//! Infinite scroll illusion over three stacked copies of height `H`.
//!
//! `ScrollIllusion` is the pure state machine: it looks at the scroll offset
//! and decides whether to teleport by one or two copy heights. The DOM
//! controller feeds it real metrics and owns the cooldown and resize timers.

use gloo::timers::callback::Timeout;
use web_sys::{Element, HtmlElement, ScrollBehavior, ScrollToOptions};

use crate::config::ScrollConfig;
use crate::error::Result;

// --- Pure model --------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    /// Height of one copy.
    pub content_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn max_scroll_top(&self) -> f64 {
        (3.0 * self.content_height - self.viewport_height).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBand {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Correction {
    #[default]
    Idle,
    /// A programmatic jump is in flight; scroll events are ignored.
    Correcting,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollAction {
    None,
    Jump { from: ScrollBand, to: f64 },
}

#[derive(Clone, Debug)]
pub struct ScrollIllusion {
    edge_guard: f64,
    correction: Correction,
    enabled: bool,
}

impl ScrollIllusion {
    pub fn new(edge_guard: f64) -> Self {
        Self { edge_guard, correction: Correction::Idle, enabled: true }
    }

    pub fn band(&self, m: &ScrollMetrics) -> ScrollBand {
        let h = m.content_height;
        if m.scroll_top <= self.edge_guard {
            ScrollBand::Top
        } else if m.scroll_top >= 3.0 * h - m.viewport_height - self.edge_guard {
            ScrollBand::Bottom
        } else {
            ScrollBand::Middle
        }
    }

    /// Decide what to do with one scroll event. A jump moves the machine into
    /// `Correcting` until `finish_correction`.
    pub fn on_scroll(&mut self, m: &ScrollMetrics) -> ScrollAction {
        if !self.enabled || self.correction == Correction::Correcting || m.content_height <= 0.0 {
            return ScrollAction::None;
        }
        let h = m.content_height;
        let from = self.band(m);
        let to = match from {
            ScrollBand::Middle => return ScrollAction::None,
            ScrollBand::Top => m.scroll_top + 2.0 * h,
            ScrollBand::Bottom => h + (m.scroll_top - 2.0 * h),
        };
        self.correction = Correction::Correcting;
        ScrollAction::Jump { from, to: to.clamp(0.0, m.max_scroll_top()) }
    }

    pub fn finish_correction(&mut self) {
        self.correction = Correction::Idle;
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.correction = Correction::Idle;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start of the middle copy.
    pub fn home_position(m: &ScrollMetrics) -> f64 {
        m.content_height
    }

    /// Offset within a single copy, whichever copy is on screen.
    pub fn offset_in_copy(m: &ScrollMetrics) -> f64 {
        if m.content_height <= 0.0 {
            return m.scroll_top.max(0.0);
        }
        m.scroll_top.rem_euclid(m.content_height)
    }

    /// The scroll offset showing the same view inside the middle copy.
    pub fn canonical_position(m: &ScrollMetrics) -> f64 {
        m.content_height.max(0.0) + Self::offset_in_copy(m)
    }

    /// Scroll offset that shows in-copy offset `p` inside the middle copy.
    pub fn position_to_scroll_top(p: f64, m: &ScrollMetrics) -> f64 {
        (m.content_height + p).clamp(0.0, m.max_scroll_top())
    }

    /// Progress through one logical copy, in `[0, 1]`.
    pub fn progress(m: &ScrollMetrics) -> f64 {
        let span = m.content_height - m.viewport_height;
        if span <= 0.0 {
            return 0.0;
        }
        (Self::offset_in_copy(m) / span).clamp(0.0, 1.0)
    }
}

// --- DOM controller ----------------------------------------------------------

pub struct ScrollIllusionController {
    container: HtmlElement,
    middle: HtmlElement,
    illusion: ScrollIllusion,
    cfg: ScrollConfig,
    cooldown: Option<Timeout>,
    resize: Option<Timeout>,
}

impl ScrollIllusionController {
    pub fn new(container: HtmlElement, middle: HtmlElement, cfg: &ScrollConfig) -> Self {
        Self {
            container,
            middle,
            illusion: ScrollIllusion::new(cfg.edge_guard_px),
            cfg: cfg.clone(),
            cooldown: None,
            resize: None,
        }
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    pub fn middle(&self) -> &HtmlElement {
        &self.middle
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: f64::from(self.container.scroll_top()),
            content_height: f64::from(self.middle.offset_height()),
            viewport_height: f64::from(self.container.client_height()),
        }
    }

    /// Place the viewport at the start of the middle copy.
    pub fn home(&mut self) {
        let m = self.metrics();
        self.container.set_scroll_top(ScrollIllusion::home_position(&m).round() as i32);
        tracing::debug!(content_height = m.content_height, "scroll homed to middle copy");
    }

    /// Handle a scroll event. On a jump the cooldown timer is armed and
    /// `release` must call `finish_correction` when it fires.
    pub fn handle_scroll(&mut self, release: impl FnOnce() + 'static) -> ScrollAction {
        let m = self.metrics();
        let action = self.illusion.on_scroll(&m);
        if let ScrollAction::Jump { from, to } = action {
            self.container.set_scroll_top(to.round() as i32);
            tracing::debug!(?from, from_top = m.scroll_top, to, "scroll correction");
            self.cooldown = Some(Timeout::new(self.cfg.jump_cooldown_ms, release));
        }
        action
    }

    pub fn finish_correction(&mut self) {
        self.cooldown = None;
        self.illusion.finish_correction();
    }

    /// Debounce a resize; `rehome` must call `home` when it fires.
    pub fn schedule_rehome(&mut self, rehome: impl FnOnce() + 'static) {
        self.resize = Some(Timeout::new(self.cfg.resize_debounce_ms, rehome));
    }

    /// Current scroll offset in middle-copy coordinates.
    pub fn current_position(&self) -> f64 {
        ScrollIllusion::canonical_position(&self.metrics())
    }

    pub fn offset_in_copy(&self) -> f64 {
        ScrollIllusion::offset_in_copy(&self.metrics())
    }

    pub fn progress(&self) -> f64 {
        ScrollIllusion::progress(&self.metrics())
    }

    pub fn scroll_to_position(&self, position: f64) {
        let m = self.metrics();
        self.container.set_scroll_top(ScrollIllusion::position_to_scroll_top(position, &m).round() as i32);
    }

    pub fn scroll_to_top(&self) {
        let m = self.metrics();
        self.smooth_scroll(ScrollIllusion::home_position(&m));
    }

    /// Smoothly bring `section` (an element of the middle copy) under the header.
    pub fn scroll_to_section(&self, section: &Element) -> Result<()> {
        let section_top = section.get_bounding_client_rect().top();
        let container_top = self.container.get_bounding_client_rect().top();
        let target = f64::from(self.container.scroll_top()) + section_top - container_top - self.cfg.header_offset_px;
        self.smooth_scroll(target.max(0.0));
        Ok(())
    }

    fn smooth_scroll(&self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.container.scroll_to_with_scroll_to_options(&options);
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.illusion.set_enabled(enabled);
        self.cooldown = None;
        self.container
            .style()
            .set_property("overflow-y", if enabled { "auto" } else { "hidden" })?;
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.illusion.is_enabled()
    }
}
