//! What a render pass writes, and where.
//!
//! A `Surface` is anything holding the three copies: the live DOM in the
//! browser, or `MemorySurface` on the host. Writes name their targets by class
//! selector and are applied to every copy.

use crate::content::{Language, Localized};
use crate::error::Result;

/// Restricts a write to targets inside the `index`-th member (modulo
/// `modulo`) of a repeated group, counted in document order per copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub group: &'static str,
    pub index: usize,
    pub modulo: usize,
}

impl Slot {
    pub fn matches(&self, position: usize) -> bool {
        self.modulo > 0 && position % self.modulo == self.index
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub selector: &'static str,
    pub slot: Option<Slot>,
}

impl Target {
    pub const fn all(selector: &'static str) -> Self {
        Self { selector, slot: None }
    }

    pub const fn in_slot(selector: &'static str, group: &'static str, index: usize, modulo: usize) -> Self {
        Self { selector, slot: Some(Slot { group, index, modulo }) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteValue {
    Text(Localized<String>),
    Html(Localized<String>),
    Style { property: &'static str, value: Localized<String> },
    Class { name: &'static str, on: bool },
    /// Text taken from the element's own `data-en` / `data-zh` attribute.
    LangData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementWrite {
    pub target: Target,
    pub value: WriteValue,
    /// Page language; used for elements outside any language block.
    pub language: Language,
}

impl ElementWrite {
    pub fn new(target: Target, value: WriteValue, language: Language) -> Self {
        Self { target, value, language }
    }

    /// Language for one element, given the language of its nearest
    /// `.content-en` / `.content-zh` ancestor, if any.
    pub fn language_for(&self, block: Option<Language>) -> Language {
        block.unwrap_or(self.language)
    }
}

pub trait Surface {
    /// Apply one write to every copy; returns the number of elements touched.
    fn apply(&mut self, write: &ElementWrite) -> Result<usize>;

    /// Toggle a class on the page root (`<body>`).
    fn set_root_class(&mut self, class: &str, on: bool) -> Result<()>;

    /// True at or below the mobile breakpoint.
    fn is_compact(&self) -> bool;

    fn copy_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_matches_modulo() {
        let slot = Slot { group: ".essence-card", index: 1, modulo: 4 };
        assert!(slot.matches(1));
        assert!(slot.matches(5));
        assert!(!slot.matches(2));
        assert!(!Slot { modulo: 0, ..slot }.matches(1));
    }

    #[test]
    fn test_block_language_wins_over_page_language() {
        let w = ElementWrite::new(Target::all(".x"), WriteValue::LangData, Language::En);
        assert_eq!(w.language_for(Some(Language::Zh)), Language::Zh);
        assert_eq!(w.language_for(None), Language::En);
    }
}
