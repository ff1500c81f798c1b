//! Language toggle.

use gloo::events::EventListener;
use web_sys::{Document, Event};

use crate::app;
use crate::content::Language;
use crate::dom;
use crate::easter_egg::EggClick;
use crate::error::Result;
use crate::sync::view::{ACTIVE_CLASS, LANG_EN, LANG_ZH};
use crate::sync::{StateSynchronizer, Surface};

pub const TOGGLE_SELECTOR: &str = ".lang-toggle";
pub const TOGGLE_EGG: &str = "langToggle";

/// Flip the page language, then count the click toward the toggle egg so
/// its notice speaks the new language.
pub fn toggle<S: Surface>(sync: &mut StateSynchronizer<S>, now: f64) -> (Language, Option<EggClick>) {
    let next = sync.language().toggled();
    sync.sync_language_state(next.is_english());
    let egg = match sync.register_easter_egg_click(TOGGLE_EGG, now) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            tracing::warn!(error = %err, "language toggle egg unavailable");
            None
        }
    };
    (next, egg)
}

/// Set a language directly. Returns false when it is already active.
pub fn switch<S: Surface>(sync: &mut StateSynchronizer<S>, lang: Language) -> bool {
    if sync.language() == lang {
        return false;
    }
    sync.sync_language_state(lang.is_english());
    true
}

/// Toggle markers can sit outside the copies (a fixed header), so they are
/// updated document-wide.
pub fn render_markers(doc: &Document, lang: Language) -> Result<()> {
    for el in dom::query_all_in(doc, &format!("{TOGGLE_SELECTOR} {LANG_EN}"))? {
        dom::set_class(&el, ACTIVE_CLASS, lang == Language::En)?;
    }
    for el in dom::query_all_in(doc, &format!("{TOGGLE_SELECTOR} {LANG_ZH}"))? {
        dom::set_class(&el, ACTIVE_CLASS, lang == Language::Zh)?;
    }
    Ok(())
}

pub fn bind(doc: &Document) -> Vec<EventListener> {
    let click = EventListener::new(doc, "click", |event: &Event| {
        if super::event_target_closest(event, TOGGLE_SELECTOR).is_some() {
            app::toggle_language();
        }
    });
    let key = EventListener::new(doc, "keydown", |event: &Event| {
        if super::event_target_closest(event, TOGGLE_SELECTOR).is_some() && super::is_activation_key(event) {
            app::toggle_language();
        }
    });
    vec![click, key]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::sync::MemorySurface;

    #[test]
    fn test_toggle_flips_and_counts_egg() {
        let mut sync = StateSynchronizer::new(&SiteConfig::default(), MemorySurface::tribute_page());
        let (lang, egg) = toggle(&mut sync, 0.0);
        assert_eq!(lang, Language::Zh);
        assert_eq!(egg, Some(EggClick::Counting { count: 1 }));
        toggle(&mut sync, 100.0);
        let (lang, egg) = toggle(&mut sync, 200.0);
        assert_eq!(lang, Language::Zh);
        assert_eq!(egg, Some(EggClick::Triggered { trigger_count: 1 }));
        let delays: Vec<u32> = sync
            .take_effects()
            .into_iter()
            .map(|e| match e {
                crate::sync::Effect::PlayAudio { delay_ms, .. } | crate::sync::Effect::Notify { delay_ms, .. } => delay_ms,
            })
            .collect();
        assert_eq!(delays, vec![500, 500]);
    }

    #[test]
    fn test_toggle_egg_notice_uses_the_new_language() {
        let mut sync = StateSynchronizer::new(&SiteConfig::default(), MemorySurface::tribute_page());
        for t in [0.0, 100.0] {
            toggle(&mut sync, t);
        }
        sync.take_effects();
        let (lang, egg) = toggle(&mut sync, 200.0);
        assert_eq!((lang, egg), (Language::Zh, Some(EggClick::Triggered { trigger_count: 1 })));
        let notices: Vec<String> = sync
            .take_effects()
            .into_iter()
            .filter_map(|e| match e {
                crate::sync::Effect::Notify { message, .. } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(notices, vec!["他们不知道我们知道他们知道我们知道。".to_string()]);
    }

    #[test]
    fn test_switch_to_current_language_is_noop() {
        let mut sync = StateSynchronizer::new(&SiteConfig::default(), MemorySurface::tribute_page());
        assert!(!switch(&mut sync, Language::En));
        assert!(!sync.batch().has_pending());
        assert!(switch(&mut sync, Language::Zh));
        assert!(sync.batch().has_pending());
    }
}
