//! Interaction controllers. Each module keeps its decision logic pure and
//! testable; the DOM wiring lives next to it and forwards into the running
//! site through `app`.

pub mod color_circle;
pub mod essence;
pub mod language;
pub mod navigation;
pub mod quotes;

use wasm_bindgen::JsCast;
use web_sys::{Element, Event, KeyboardEvent};

/// Element matching `selector` at or above the event target.
pub(crate) fn event_target_closest(event: &Event, selector: &str) -> Option<Element> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    target.closest(selector).ok().flatten()
}

/// Enter or Space on a keyboard event; Space is swallowed so the page does
/// not scroll.
pub(crate) fn is_activation_key(event: &Event) -> bool {
    let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|k| k.key()) else { return false };
    let activate = key == "Enter" || key == " ";
    if activate {
        event.prevent_default();
    }
    activate
}
