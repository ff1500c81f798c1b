//! Navigation dots and the back-to-top button.

use gloo::events::EventListener;
use web_sys::{Document, Element, Event};

use crate::app;
use crate::dom;
use crate::error::Result;
use crate::timing::Throttle;

pub const DOT_SELECTOR: &str = ".nav-dot[data-section]";
pub const BACK_TO_TOP_SELECTOR: &str = "#backToTopBtn, .back-to-top";
const SHOW_CLASS: &str = "show";
const ACTIVE_CLASS: &str = "active";

/// Vertical extent of a section, in viewport coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionBox {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

impl SectionBox {
    fn center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

/// Among sections overlapping `[view_top, view_bottom)`, the one whose center
/// is nearest the viewport center.
pub fn active_section(sections: &[SectionBox], view_top: f64, view_bottom: f64) -> Option<&str> {
    let view_center = (view_top + view_bottom) / 2.0;
    sections
        .iter()
        .filter(|s| s.bottom > view_top && s.top < view_bottom)
        .min_by(|a, b| {
            let da = (a.center() - view_center).abs();
            let db = (b.center() - view_center).abs();
            da.total_cmp(&db)
        })
        .map(|s| s.id.as_str())
}

pub fn back_to_top_visible(position: f64, threshold_px: f64) -> bool {
    position > threshold_px
}

#[derive(Clone, Debug)]
pub struct NavigationDots {
    throttle: Throttle,
    active: Option<String>,
    back_to_top: bool,
}

impl NavigationDots {
    pub fn new(throttle_ms: u32) -> Self {
        Self { throttle: Throttle::new(f64::from(throttle_ms)), active: None, back_to_top: false }
    }

    /// Whether a scroll event at `now` should recompute the dots.
    pub fn should_update(&mut self, now: f64) -> bool {
        self.throttle.ready(now)
    }

    /// Record the active section; returns it when it changed.
    pub fn update(&mut self, active: Option<&str>) -> Option<Option<String>> {
        if self.active.as_deref() == active {
            return None;
        }
        self.active = active.map(str::to_string);
        Some(self.active.clone())
    }

    /// Record back-to-top visibility; returns it when it changed.
    pub fn update_back_to_top(&mut self, visible: bool) -> Option<bool> {
        if self.back_to_top == visible {
            return None;
        }
        self.back_to_top = visible;
        Some(visible)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }
}

pub fn render_active(doc: &Document, active: Option<&str>) -> Result<()> {
    for dot in dom::query_all_in(doc, DOT_SELECTOR)? {
        let on = active.is_some() && dot.get_attribute("data-section").as_deref() == active;
        dom::set_class(&dot, ACTIVE_CLASS, on)?;
        if on {
            dot.set_attribute("aria-current", "true")?;
        } else {
            dot.remove_attribute("aria-current")?;
        }
    }
    Ok(())
}

pub fn render_back_to_top(doc: &Document, visible: bool) -> Result<()> {
    for button in dom::query_all_in(doc, BACK_TO_TOP_SELECTOR)? {
        dom::set_class(&button, SHOW_CLASS, visible)?;
        button.set_attribute("aria-hidden", if visible { "false" } else { "true" })?;
    }
    Ok(())
}

fn dot_section(event: &Event) -> Option<String> {
    super::event_target_closest(event, DOT_SELECTOR).and_then(|dot: Element| dot.get_attribute("data-section"))
}

pub fn bind(doc: &Document) -> Vec<EventListener> {
    let click = EventListener::new(doc, "click", |event: &Event| {
        if let Some(section) = dot_section(event) {
            event.prevent_default();
            app::jump_to_section(&section);
        } else if super::event_target_closest(event, BACK_TO_TOP_SELECTOR).is_some() {
            app::scroll_to_top();
        }
    });
    let key = EventListener::new(doc, "keydown", |event: &Event| {
        let Some(section) = dot_section(event) else { return };
        if super::is_activation_key(event) {
            app::jump_to_section(&section);
        }
    });
    vec![click, key]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<SectionBox> {
        vec![
            SectionBox { id: "header".into(), top: -900.0, bottom: -100.0 },
            SectionBox { id: "quote-section".into(), top: -100.0, bottom: 300.0 },
            SectionBox { id: "meditation".into(), top: 300.0, bottom: 900.0 },
            SectionBox { id: "essence".into(), top: 900.0, bottom: 1500.0 },
        ]
    }

    #[test]
    fn test_nearest_visible_center_wins() {
        assert_eq!(active_section(&boxes(), 0.0, 800.0), Some("meditation"));
        assert_eq!(active_section(&boxes(), 0.0, 200.0), Some("quote-section"));
        assert_eq!(active_section(&boxes(), 5000.0, 5800.0), None);
    }

    #[test]
    fn test_update_reports_changes_only() {
        let mut nav = NavigationDots::new(100);
        assert_eq!(nav.update(Some("essence")), Some(Some("essence".to_string())));
        assert_eq!(nav.update(Some("essence")), None);
        assert_eq!(nav.update(None), Some(None));
        assert_eq!(nav.update_back_to_top(true), Some(true));
        assert_eq!(nav.update_back_to_top(true), None);
    }

    #[test]
    fn test_updates_are_throttled() {
        let mut nav = NavigationDots::new(100);
        assert!(nav.should_update(0.0));
        assert!(!nav.should_update(50.0));
        assert!(nav.should_update(100.0));
    }

    #[test]
    fn test_back_to_top_threshold() {
        assert!(!back_to_top_visible(300.0, 300.0));
        assert!(back_to_top_visible(301.0, 300.0));
    }
}
