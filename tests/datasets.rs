// Integration tests for bilingual content invariants.
// These tests are native-friendly and avoid wasm/browser APIs.

use std::collections::HashSet;

use feebea::config::SiteConfig;
use feebea::content::{
    essence_quote, essence_quote_count, CardEggKind, EASTER_EGGS, ESSENCE_CARD_SLOTS, MEDITATION_LINES, NAV_SECTIONS,
    QUOTE_COLLECTIONS, ZOTE_PRECEPTS,
};
use feebea::easter_egg::EggRegistry;

#[test]
fn quote_collections_have_parallel_translations() {
    for collection in QUOTE_COLLECTIONS {
        assert!(!collection.is_empty(), "empty quote collection '{}'", collection.id);
        assert_eq!(
            collection.quotes.en.len(),
            collection.quotes.zh.len(),
            "collection '{}' has mismatched translations",
            collection.id
        );
        for i in 0..collection.len() {
            let quote = collection.quote(i).unwrap();
            assert!(!quote.en.text.trim().is_empty(), "blank en quote {} in '{}'", i, collection.id);
            assert!(!quote.zh.text.trim().is_empty(), "blank zh quote {} in '{}'", i, collection.id);
        }
    }
}

#[test]
fn essence_quotes_cover_every_card() {
    assert!(essence_quote_count() > ESSENCE_CARD_SLOTS);
    let mut titles = HashSet::new();
    for i in 0..essence_quote_count() {
        let quote = essence_quote(i).unwrap();
        assert!(!quote.en.title.is_empty() && !quote.zh.title.is_empty(), "essence quote {} lacks a title", i);
        assert!(titles.insert(quote.en.title), "duplicate essence title '{}'", quote.en.title);
    }
}

#[test]
fn easter_egg_ids_are_unique() {
    let mut seen = HashSet::new();
    for egg in EASTER_EGGS {
        assert!(seen.insert(egg.id), "duplicate easter egg id '{}'", egg.id);
        assert!(egg.audio.ends_with(".mp3"), "egg '{}' audio '{}' is not an mp3", egg.id, egg.audio);
        assert!(!egg.message.en.is_empty() && !egg.message.zh.is_empty());
    }
    for slot in 0..ESSENCE_CARD_SLOTS {
        let kind = CardEggKind::for_slot(slot);
        assert!(seen.insert(kind.id()), "card egg id '{}' collides", kind.id());
    }
    let registry = EggRegistry::new(&SiteConfig::default().eggs);
    assert_eq!(registry.iter().count(), EASTER_EGGS.len());
}

#[test]
fn sections_and_precepts_are_numbered_once() {
    let ids: HashSet<&str> = NAV_SECTIONS.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), NAV_SECTIONS.len());
    let numbers: Vec<u32> = ZOTE_PRECEPTS.iter().map(|(n, _)| *n).collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]), "precept numbers out of order: {:?}", numbers);
    assert!(MEDITATION_LINES.iter().all(|line| !line.en.is_empty() && !line.zh.is_empty()));
}
