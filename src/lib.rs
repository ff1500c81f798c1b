//! Feebea tribute page core crate.
//!
//! The page body is replicated into three copies inside the scroll container
//! so scrolling never reaches an end. Every piece of interactive state lives
//! once in `sync::StateSynchronizer` and is rendered into all three copies.
//! `start_site()` wires everything to the live document; the remaining
//! exports are the page's global operations.

use wasm_bindgen::prelude::*;

mod app;
pub mod audio;
pub mod config;
pub mod content;
pub mod controls;
mod dom;
pub mod easter_egg;
pub mod error;
pub mod fonts;
pub mod identity;
pub mod logging;
pub mod media;
pub mod replicate;
pub mod scroll;
pub mod state;
pub mod sync;
pub mod timing;
pub mod watcher;

use config::SiteConfig;
use content::Language;
use state::MeditationVariant;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
}

fn with_site<R>(f: impl FnOnce(&mut app::Site) -> error::Result<R>) -> Result<R, JsValue> {
    Ok(app::with_site(f)??)
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_site() -> Result<(), JsValue> {
    app::start(SiteConfig::default())?;
    Ok(())
}

/// Start with a partial JSON config laid over the defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_site_with_config(json: &str) -> Result<(), JsValue> {
    app::start(SiteConfig::from_json(json)?)?;
    Ok(())
}

#[wasm_bindgen]
pub fn stop_site() {
    app::stop();
}

/// Rebuild the two clones from the middle copy.
#[wasm_bindgen]
pub fn refresh_copies() -> Result<(), JsValue> {
    with_site(|site| site.refresh_copies())
}

/// Remove both clones for good; the page becomes a plain single copy.
#[wasm_bindgen]
pub fn destroy_copies() -> Result<(), JsValue> {
    with_site(|site| site.destroy_copies())
}

#[wasm_bindgen]
pub fn set_infinite_scroll(enabled: bool) -> Result<(), JsValue> {
    with_site(|site| site.set_scroll_enabled(enabled))
}

// -----------------------------------------------------------------------------
// Global operations
// -----------------------------------------------------------------------------

/// Returns false once the egg has used up its triggers.
#[wasm_bindgen]
pub fn trigger_easter_egg(name: &str) -> Result<bool, JsValue> {
    with_site(|site| site.trigger_easter_egg(name))
}

#[wasm_bindgen]
pub fn play_audio(file: &str) -> Result<(), JsValue> {
    with_site(|site| {
        site.play_audio(file);
        Ok(())
    })
}

/// `code` is "en" or "zh".
#[wasm_bindgen]
pub fn switch_language(code: &str) -> Result<(), JsValue> {
    let lang = Language::parse(code)?;
    with_site(|site| site.switch_language(lang))
}

#[wasm_bindgen]
pub fn toggle_language() -> Result<String, JsValue> {
    with_site(|site| site.toggle_language()).map(|lang| lang.code().to_string())
}

#[wasm_bindgen]
pub fn current_language() -> Result<String, JsValue> {
    with_site(|site| Ok(site.language().code().to_string()))
}

#[wasm_bindgen]
pub fn jump_to_section(id: &str) -> Result<(), JsValue> {
    with_site(|site| site.jump_to_section(id))
}

#[wasm_bindgen]
pub fn scroll_to_top() -> Result<(), JsValue> {
    with_site(|site| site.scroll_to_top())
}

/// Position within one copy, 0 at its top and 1 at its bottom.
#[wasm_bindgen]
pub fn scroll_progress() -> Result<f64, JsValue> {
    with_site(|site| Ok(site.scroll_progress()))
}

/// Scroll offset in middle-copy coordinates.
#[wasm_bindgen]
pub fn scroll_position() -> Result<f64, JsValue> {
    with_site(|site| site.scroll_position())
}

/// Returns false when `index` is outside the current collection.
#[wasm_bindgen]
pub fn set_quote_index(index: usize) -> Result<bool, JsValue> {
    with_site(|site| Ok(site.set_quote_index(index)))
}

#[wasm_bindgen]
pub fn set_meditation_variant(alternate: bool) -> Result<(), JsValue> {
    let variant = if alternate { MeditationVariant::Alternate } else { MeditationVariant::Normal };
    with_site(|site| {
        site.set_meditation_variant(variant);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn reset_card_easter_egg() -> Result<(), JsValue> {
    with_site(|site| {
        site.reset_card_easter_egg();
        Ok(())
    })
}

// -----------------------------------------------------------------------------
// Playlist
// -----------------------------------------------------------------------------

/// Returns false when a track with the same source is already listed.
#[wasm_bindgen]
pub fn add_track(name: &str, src: &str) -> Result<bool, JsValue> {
    with_site(|site| Ok(site.add_track(name, src)))
}

#[wasm_bindgen]
pub fn next_track() -> Result<(), JsValue> {
    with_site(|site| {
        site.next_track();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn previous_track() -> Result<(), JsValue> {
    with_site(|site| {
        site.previous_track();
        Ok(())
    })
}

/// Returns the new mode's label.
#[wasm_bindgen]
pub fn cycle_play_mode() -> Result<String, JsValue> {
    with_site(|site| Ok(site.cycle_play_mode().label().to_string()))
}

/// Returns the clamped volume actually applied.
#[wasm_bindgen]
pub fn set_volume(volume: f64) -> Result<f64, JsValue> {
    with_site(|site| Ok(site.set_volume(volume)))
}

// -----------------------------------------------------------------------------
// Diagnostics
// -----------------------------------------------------------------------------

#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn state_snapshot() -> Result<String, JsValue> {
    with_site(|site| site.state_snapshot())
}
