//! Essence cards: each activation shows a different random quote, and a quick
//! burst of clicks on one card sets off that card's easter egg.

use gloo::events::EventListener;
use web_sys::{Element, Event, HtmlElement};

use crate::app;
use crate::content::{essence_quote_count, Language, ESSENCE_CARD_SLOTS};
use crate::dom;
use crate::error::Result;
use crate::sync::view::ESSENCE_CARD;
use crate::sync::{StateSynchronizer, Surface};

/// Card slot of the card at `position` in document order.
pub fn card_slot(position: usize) -> usize {
    position % ESSENCE_CARD_SLOTS
}

/// Index in `[0, n)` different from `current`, drawn with `draw(n - 1)`.
/// With fewer than two quotes there is nothing to change to.
pub fn pick_different(current: usize, n: usize, draw: impl FnOnce(usize) -> usize) -> usize {
    if n < 2 {
        return current.min(n.saturating_sub(1));
    }
    let r = draw(n - 1) % (n - 1);
    if r >= current { r + 1 } else { r }
}

pub fn aria_label(slot: usize, lang: Language) -> String {
    match lang {
        Language::En => format!("Change quote for card {}", slot + 1),
        Language::Zh => format!("更换第{}张卡片的语录", slot + 1),
    }
}

/// One activation of card `slot` at `now`. Returns true when the card egg fired.
pub fn activate<S: Surface>(
    sync: &mut StateSynchronizer<S>,
    slot: usize,
    now: f64,
    draw: impl FnOnce(usize) -> usize,
) -> bool {
    let slot = card_slot(slot);
    let current = sync.state().essence[slot].quote_index;
    let next = pick_different(current, essence_quote_count(), draw);
    sync.essence_card_clicked(slot, next, now)
}

/// Make every card keyboard reachable and labelled.
pub fn prepare_cards(root: &Element, lang: Language) -> Result<usize> {
    let cards = dom::query_all(root, ESSENCE_CARD)?;
    for (position, card) in cards.iter().enumerate() {
        card.set_attribute("role", "button")?;
        card.set_attribute("tabindex", "0")?;
        card.set_attribute("aria-label", &aria_label(card_slot(position), lang))?;
    }
    Ok(cards.len())
}

fn slot_of(root: &Element, card: &Element) -> Option<usize> {
    let cards = dom::query_all(root, ESSENCE_CARD).ok()?;
    cards.iter().position(|c| c == card).map(card_slot)
}

pub fn bind(container: &HtmlElement) -> Vec<EventListener> {
    let root: Element = container.clone().into();
    let click_root = root.clone();
    let click = EventListener::new(container, "click", move |event: &Event| {
        let Some(card) = super::event_target_closest(event, ESSENCE_CARD) else { return };
        if let Some(slot) = slot_of(&click_root, &card) {
            app::activate_essence_card(slot);
        }
    });
    let key = EventListener::new(container, "keydown", move |event: &Event| {
        let Some(card) = super::event_target_closest(event, ESSENCE_CARD) else { return };
        if super::is_activation_key(event) {
            if let Some(slot) = slot_of(&root, &card) {
                app::activate_essence_card(slot);
            }
        }
    });
    vec![click, key]
}
