//! In-memory three-copy page for host tests and headless use.

use std::collections::{BTreeMap, BTreeSet};

use crate::content::{Language, Localized, ESSENCE_CARD_SLOTS};
use crate::error::Result;
use crate::replicate::COPY_COUNT;

use super::surface::{ElementWrite, Surface, WriteValue};
use super::view;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemElement {
    pub classes: BTreeSet<String>,
    pub text: String,
    pub html: String,
    pub styles: BTreeMap<String, String>,
    /// Language of the enclosing `.content-en` / `.content-zh` block.
    pub block: Option<Language>,
    pub data: Option<Localized<String>>,
    /// Owning group class and its document-order position in the copy.
    pub group: Option<(&'static str, usize)>,
}

impl MemElement {
    pub fn with_class(class: &str) -> Self {
        Self { classes: BTreeSet::from([class.to_string()]), ..Default::default() }
    }

    pub fn in_block(mut self, lang: Language) -> Self {
        self.block = Some(lang);
        self
    }

    pub fn in_group(mut self, group: &'static str, position: usize) -> Self {
        self.group = Some((group, position));
        self
    }

    pub fn with_data(mut self, en: &str, zh: &str) -> Self {
        self.data = Some(Localized::new(en.to_string(), zh.to_string()));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    /// Supports `.class` and `[data-en]`, the selector forms render passes use.
    fn matches(&self, selector: &str) -> bool {
        if selector == view::LANG_DATA {
            return self.data.is_some();
        }
        selector.strip_prefix('.').is_some_and(|class| self.has_class(class))
    }
}

#[derive(Clone, Debug)]
pub struct MemorySurface {
    copies: Vec<Vec<MemElement>>,
    root_classes: BTreeSet<String>,
    compact: bool,
    writes: usize,
}

impl MemorySurface {
    pub fn new(copies: Vec<Vec<MemElement>>) -> Self {
        Self { copies, root_classes: BTreeSet::new(), compact: false, writes: 0 }
    }

    /// Three copies of the tribute page's synced markup.
    pub fn tribute_page() -> Self {
        Self::new((0..COPY_COUNT).map(|_| tribute_copy()).collect())
    }

    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
    }

    pub fn copies(&self) -> &[Vec<MemElement>] {
        &self.copies
    }

    pub fn find(&self, copy: usize, class: &str) -> Vec<&MemElement> {
        self.copies
            .get(copy)
            .map(|els| els.iter().filter(|el| el.has_class(class)).collect())
            .unwrap_or_default()
    }

    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.contains(class)
    }

    /// Writes applied so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

fn tribute_copy() -> Vec<MemElement> {
    let mut els = vec![
        MemElement::with_class("content-en").in_block(Language::En),
        MemElement::with_class("meditation-text").in_block(Language::En),
        MemElement::with_class("content-zh").in_block(Language::Zh),
        MemElement::with_class("meditation-text").in_block(Language::Zh),
        MemElement::with_class("lang-en"),
        MemElement::with_class("lang-zh"),
        MemElement::with_class("section-label").with_data("Essence", "精华"),
        MemElement::with_class("quote-text"),
        MemElement::with_class("phoebe-title"),
        MemElement::with_class("phoebe-quote"),
        MemElement::with_class("phoebe-author"),
    ];
    for slot in 0..ESSENCE_CARD_SLOTS {
        els.push(MemElement::with_class("essence-card").in_group("essence-card", slot));
        els.push(MemElement::with_class("essence-title").in_group("essence-card", slot));
        els.push(MemElement::with_class("essence-desc").in_group("essence-card", slot));
    }
    els
}

impl Surface for MemorySurface {
    fn apply(&mut self, write: &ElementWrite) -> Result<usize> {
        let mut touched = 0;
        for copy in &mut self.copies {
            for el in copy.iter_mut() {
                if !el.matches(write.target.selector) {
                    continue;
                }
                if let Some(slot) = write.target.slot {
                    let group = slot.group.trim_start_matches('.');
                    match el.group {
                        Some((g, position)) if g == group && slot.matches(position) => {}
                        _ => continue,
                    }
                }
                let lang = write.language_for(el.block);
                match &write.value {
                    WriteValue::Text(text) => el.text = text.get(lang).clone(),
                    WriteValue::Html(html) => el.html = html.get(lang).clone(),
                    WriteValue::Style { property, value } => {
                        el.styles.insert(property.to_string(), value.get(lang).clone());
                    }
                    WriteValue::Class { name, on } => {
                        if *on {
                            el.classes.insert(name.to_string());
                        } else {
                            el.classes.remove(*name);
                        }
                    }
                    WriteValue::LangData => {
                        if let Some(data) = &el.data {
                            el.text = data.get(lang).clone();
                        }
                    }
                }
                touched += 1;
            }
        }
        self.writes += 1;
        Ok(touched)
    }

    fn set_root_class(&mut self, class: &str, on: bool) -> Result<()> {
        if on {
            self.root_classes.insert(class.to_string());
        } else {
            self.root_classes.remove(class);
        }
        Ok(())
    }

    fn is_compact(&self) -> bool {
        self.compact
    }

    fn copy_count(&self) -> usize {
        self.copies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::surface::Target;

    #[test]
    fn test_slot_writes_hit_one_card_per_copy() {
        let mut surface = MemorySurface::tribute_page();
        let write = ElementWrite::new(
            Target::in_slot(view::ESSENCE_TITLE, view::ESSENCE_CARD, 2, ESSENCE_CARD_SLOTS),
            WriteValue::Text(Localized::new("a".into(), "b".into())),
            Language::En,
        );
        assert_eq!(surface.apply(&write).unwrap(), COPY_COUNT);
        for copy in 0..COPY_COUNT {
            let titles = surface.find(copy, "essence-title");
            assert_eq!(titles[2].text, "a");
            assert!(titles[1].text.is_empty());
        }
    }

    #[test]
    fn test_block_language_selects_text() {
        let mut surface = MemorySurface::tribute_page();
        let write = ElementWrite::new(
            Target::all(view::MEDITATION_TEXT),
            WriteValue::Html(Localized::new("en".into(), "zh".into())),
            Language::En,
        );
        surface.apply(&write).unwrap();
        let blocks: Vec<&str> = surface.find(0, "meditation-text").iter().map(|e| e.html.as_str()).collect();
        assert_eq!(blocks, vec!["en", "zh"]);
    }
}
