//! Derived values for each synced feature.
//!
//! Pure functions from `CanonicalState` to the writes a render pass applies,
//! so every copy receives exactly the same values.

use crate::content::{
    essence_quote, quote_collection, EssenceQuote, Language, Localized, Quote, DONDA_PANEL,
    ESSENCE_CARD_SLOTS, MEDITATION_LINES, PHOEBE_PANEL, ZOTE_AUTHOR, ZOTE_PRECEPTS, ZOTE_TITLE,
};
use crate::error::{Result, SiteError};
use crate::fonts;
use crate::state::{CanonicalState, MeditationVariant, PhoebeMode};

use super::batch::Feature;
use super::surface::{ElementWrite, Target, WriteValue};

pub const CONTENT_EN: &str = ".content-en";
pub const CONTENT_ZH: &str = ".content-zh";
pub const LANG_EN: &str = ".lang-en";
pub const LANG_ZH: &str = ".lang-zh";
pub const LANG_DATA: &str = "[data-en]";
pub const QUOTE_TEXT: &str = ".quote-text";
pub const ESSENCE_CARD: &str = ".essence-card";
pub const ESSENCE_TITLE: &str = ".essence-title";
pub const ESSENCE_DESC: &str = ".essence-desc";
pub const MEDITATION_TEXT: &str = ".meditation-text";
pub const PHOEBE_TITLE: &str = ".phoebe-title";
pub const PHOEBE_QUOTE: &str = ".phoebe-quote";
pub const PHOEBE_AUTHOR: &str = ".phoebe-author";

pub const HIDDEN_CLASS: &str = "hidden";
pub const ACTIVE_CLASS: &str = "active";
pub const CHINESE_ROOT_CLASS: &str = "chinese";

pub fn writes_for(feature: Feature, state: &CanonicalState, compact: bool) -> Result<Vec<ElementWrite>> {
    match feature {
        Feature::Language => Ok(language_writes(state.language)),
        Feature::Quote => quote_writes(state, compact),
        Feature::Essence => essence_writes(state, compact),
        Feature::PhoebeWisdom => Ok(phoebe_writes(state)),
        Feature::Meditation => Ok(meditation_writes(state)),
    }
}

// --- Language ----------------------------------------------------------------

fn language_writes(lang: Language) -> Vec<ElementWrite> {
    let class = |selector, name, on| ElementWrite::new(Target::all(selector), WriteValue::Class { name, on }, lang);
    vec![
        class(CONTENT_EN, HIDDEN_CLASS, lang != Language::En),
        class(CONTENT_ZH, HIDDEN_CLASS, lang != Language::Zh),
        class(LANG_EN, ACTIVE_CLASS, lang == Language::En),
        class(LANG_ZH, ACTIVE_CLASS, lang == Language::Zh),
        ElementWrite::new(Target::all(LANG_DATA), WriteValue::LangData, lang),
    ]
}

// --- Quote carousel ----------------------------------------------------------

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn quote_html(quote: &Quote) -> String {
    format!(
        "\"{}\" <span class=\"quote-author\">— {}</span>",
        escape_html(quote.text),
        escape_html(quote.author)
    )
}

/// The quote as the reader sees it; its length drives the font size.
pub fn quote_plain(quote: &Quote) -> String {
    format!("\"{}\" — {}", quote.text, quote.author)
}

fn quote_writes(state: &CanonicalState, compact: bool) -> Result<Vec<ElementWrite>> {
    let lang = state.language;
    let collection = quote_collection(&state.quote.section)
        .ok_or_else(|| SiteError::UnknownSection(state.quote.section.clone()))?;
    let quote = collection.quote(state.quote.index).ok_or(SiteError::IndexOutOfRange {
        what: "quote",
        index: state.quote.index,
        len: collection.len(),
    })?;
    let target = Target::all(QUOTE_TEXT);
    Ok(vec![
        ElementWrite::new(target, WriteValue::Html(quote.map(quote_html)), lang),
        ElementWrite::new(
            target,
            WriteValue::Style {
                property: "font-size",
                value: quote.map(|q| fonts::quote_font_size(&quote_plain(q), compact).to_string()),
            },
            lang,
        ),
    ])
}

// --- Essence cards -----------------------------------------------------------

fn card_content(state: &CanonicalState, slot: usize) -> Result<Localized<EssenceQuote>> {
    let card = &state.essence[slot];
    if let Some(content) = card.override_content {
        return Ok(content);
    }
    essence_quote(card.quote_index).ok_or(SiteError::IndexOutOfRange {
        what: "essence quote",
        index: card.quote_index,
        len: crate::content::essence_quote_count(),
    })
}

fn essence_writes(state: &CanonicalState, compact: bool) -> Result<Vec<ElementWrite>> {
    let lang = state.language;
    let mut writes = Vec::with_capacity(ESSENCE_CARD_SLOTS * 4);
    for slot in 0..ESSENCE_CARD_SLOTS {
        let content = card_content(state, slot)?;
        let title = Target::in_slot(ESSENCE_TITLE, ESSENCE_CARD, slot, ESSENCE_CARD_SLOTS);
        let desc = Target::in_slot(ESSENCE_DESC, ESSENCE_CARD, slot, ESSENCE_CARD_SLOTS);
        writes.push(ElementWrite::new(title, WriteValue::Text(content.map(|c| c.title.to_string())), lang));
        writes.push(ElementWrite::new(
            title,
            WriteValue::Style {
                property: "font-size",
                value: content.map(|c| fonts::essence_title_font_size(c.title, compact).to_string()),
            },
            lang,
        ));
        writes.push(ElementWrite::new(desc, WriteValue::Text(content.map(|c| c.desc.to_string())), lang));
        writes.push(ElementWrite::new(
            desc,
            WriteValue::Style {
                property: "font-size",
                value: content.map(|c| fonts::essence_desc_font_size(c.desc, compact).to_string()),
            },
            lang,
        ));
    }
    Ok(writes)
}

// --- Phoebe panel ------------------------------------------------------------

pub fn zote_precept_text(precept: usize) -> Localized<String> {
    let (number, text) = ZOTE_PRECEPTS[precept % ZOTE_PRECEPTS.len()];
    Localized::new(format!("Precept {number}: {}", text.en), format!("箴言{number}：{}", text.zh))
}

fn phoebe_writes(state: &CanonicalState) -> Vec<ElementWrite> {
    let lang = state.language;
    let (title, quote, author) = match state.phoebe.mode {
        PhoebeMode::Normal => (
            PHOEBE_PANEL.map(|p| p.title.to_string()),
            state
                .phoebe
                .quote_override
                .map(|q| q.to_owned_pair())
                .unwrap_or_else(|| PHOEBE_PANEL.map(|p| p.quote.to_string())),
            PHOEBE_PANEL.map(|p| p.author.to_string()),
        ),
        PhoebeMode::Zote { precept } => {
            (ZOTE_TITLE.to_owned_pair(), zote_precept_text(precept), ZOTE_AUTHOR.to_owned_pair())
        }
        PhoebeMode::Donda => (
            DONDA_PANEL.map(|p| p.title.to_string()),
            DONDA_PANEL.map(|p| p.quote.to_string()),
            DONDA_PANEL.map(|p| p.author.to_string()),
        ),
    };
    vec![
        ElementWrite::new(Target::all(PHOEBE_TITLE), WriteValue::Text(title), lang),
        ElementWrite::new(Target::all(PHOEBE_QUOTE), WriteValue::Text(quote), lang),
        ElementWrite::new(Target::all(PHOEBE_AUTHOR), WriteValue::Text(author), lang),
    ]
}

// --- Meditation --------------------------------------------------------------

/// Meditation text for a block rendered in `lang`. The alternate variant
/// interleaves both languages, `lang` first on each line.
pub fn meditation_html(variant: MeditationVariant, lang: Language) -> String {
    let lines: Vec<String> = match variant {
        MeditationVariant::Normal => MEDITATION_LINES.iter().map(|l| escape_html(l.get(lang))).collect(),
        MeditationVariant::Alternate => MEDITATION_LINES
            .iter()
            .flat_map(|l| [escape_html(l.get(lang)), escape_html(l.get(lang.toggled()))])
            .collect(),
    };
    lines.join("<br />")
}

fn meditation_writes(state: &CanonicalState) -> Vec<ElementWrite> {
    let html = Localized::new(
        meditation_html(state.meditation, Language::En),
        meditation_html(state.meditation, Language::Zh),
    );
    vec![ElementWrite::new(Target::all(MEDITATION_TEXT), WriteValue::Html(html), state.language)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::QuotePatch;

    #[test]
    fn test_quote_html_escapes_and_wraps_author() {
        let q = Quote { text: "a < b", author: "Ted" };
        assert_eq!(quote_html(&q), "\"a &lt; b\" <span class=\"quote-author\">— Ted</span>");
    }

    #[test]
    fn test_quote_font_size_uses_rendered_length() {
        let state = CanonicalState::default();
        let writes = writes_for(Feature::Quote, &state, false).unwrap();
        let WriteValue::Style { property, value } = &writes[1].value else { panic!("expected style") };
        assert_eq!(*property, "font-size");
        assert_eq!(value.en, "1.3rem");
        assert_eq!(value.zh, "1.4rem");
    }

    #[test]
    fn test_unknown_section_is_an_error() {
        let mut state = CanonicalState::default();
        state.apply_quote(QuotePatch { section: Some("friends".into()), index: None });
        assert!(matches!(writes_for(Feature::Quote, &state, false), Err(SiteError::UnknownSection(_))));
    }

    #[test]
    fn test_essence_writes_target_each_slot() {
        let state = CanonicalState::default();
        let writes = writes_for(Feature::Essence, &state, false).unwrap();
        assert_eq!(writes.len(), ESSENCE_CARD_SLOTS * 4);
        let slots: Vec<usize> = writes.iter().filter_map(|w| w.target.slot.map(|s| s.index)).collect();
        assert_eq!(&slots[..5], &[0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_phoebe_panel_modes() {
        let mut state = CanonicalState::default();
        let quote_of = |state: &CanonicalState| match &phoebe_writes(state)[1].value {
            WriteValue::Text(t) => t.en.clone(),
            _ => String::new(),
        };
        assert_eq!(quote_of(&state), PHOEBE_PANEL.en.quote);
        state.phoebe.mode = PhoebeMode::Zote { precept: 5 };
        assert!(quote_of(&state).starts_with("Precept 57: "));
        state.phoebe.mode = PhoebeMode::Donda;
        assert_eq!(quote_of(&state), DONDA_PANEL.en.quote);
    }

    #[test]
    fn test_meditation_alternate_interleaves() {
        let normal = meditation_html(MeditationVariant::Normal, Language::Zh);
        assert_eq!(normal.split("<br />").count(), MEDITATION_LINES.len());
        let alt = meditation_html(MeditationVariant::Alternate, Language::En);
        let lines: Vec<&str> = alt.split("<br />").collect();
        assert_eq!(lines.len(), MEDITATION_LINES.len() * 2);
        assert_eq!(lines[1], escape_html(MEDITATION_LINES[0].zh));
    }

    #[test]
    fn test_language_writes_flip_visibility() {
        let writes = language_writes(Language::Zh);
        assert_eq!(writes[0].value, WriteValue::Class { name: HIDDEN_CLASS, on: true });
        assert_eq!(writes[1].value, WriteValue::Class { name: HIDDEN_CLASS, on: false });
        assert_eq!(writes[3].value, WriteValue::Class { name: ACTIVE_CLASS, on: true });
    }
}
