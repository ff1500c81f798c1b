//! Canonical page state and the patches that shallow-merge into it.
//!
//! Controllers never write DOM directly for synced features. They build a
//! patch, hand it to the synchronizer, and the synchronizer re-renders every
//! copy from this record.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::content::{
    CardEggKind, ESSENCE_CARD_SLOTS, EssenceQuote, Language, Localized, DEFAULT_QUOTE_INDEX,
    DEFAULT_QUOTE_SECTION,
};
use crate::easter_egg::EggCounter;

// --- Quote -------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuoteState {
    pub section: String,
    pub index: usize,
}

impl Default for QuoteState {
    fn default() -> Self {
        Self { section: DEFAULT_QUOTE_SECTION.to_string(), index: DEFAULT_QUOTE_INDEX }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuotePatch {
    pub section: Option<String>,
    pub index: Option<usize>,
}

impl QuotePatch {
    pub fn index(index: usize) -> Self {
        Self { section: None, index: Some(index) }
    }
}

// --- Essence cards -----------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EssenceCardState {
    pub quote_index: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub override_content: Option<Localized<EssenceQuote>>,
}

impl EssenceCardState {
    pub fn is_easter_egg_override(&self) -> bool {
        self.override_content.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EssencePatch {
    pub quote_index: Option<usize>,
    /// `Some(None)` clears an override, `None` leaves it alone.
    pub override_content: Option<Option<Localized<EssenceQuote>>>,
}

impl EssencePatch {
    /// A fresh quote for the card; any egg override is dropped.
    pub fn quote(index: usize) -> Self {
        Self { quote_index: Some(index), override_content: Some(None) }
    }

    pub fn overridden(content: Localized<EssenceQuote>) -> Self {
        Self { quote_index: None, override_content: Some(Some(content)) }
    }
}

// --- Phoebe panel ------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PhoebeMode {
    #[default]
    Normal,
    /// Index into `ZOTE_PRECEPTS`.
    Zote { precept: usize },
    Donda,
}

impl PhoebeMode {
    /// Zote outranks Donda, which outranks the normal panel.
    pub fn rank(self) -> u8 {
        match self {
            PhoebeMode::Normal => 0,
            PhoebeMode::Donda => 1,
            PhoebeMode::Zote { .. } => 2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PhoebeState {
    pub mode: PhoebeMode,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub quote_override: Option<Localized<&'static str>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhoebePatch {
    pub mode: Option<PhoebeMode>,
    pub quote_override: Option<Option<Localized<&'static str>>>,
}

// --- Meditation --------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeditationVariant {
    #[default]
    Normal,
    /// Both languages interleaved line by line.
    Alternate,
}

// --- Color circle ------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Processing {
    #[default]
    Idle,
    Processing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorCircleState {
    pub event_count: u32,
    pub processing: Processing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorCirclePatch {
    pub event_count: Option<u32>,
    pub processing: Option<Processing>,
}

// --- Audio -------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlayMode {
    #[default]
    Stop,
    RepeatOne,
    RepeatAll,
}

impl PlayMode {
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Stop => PlayMode::RepeatOne,
            PlayMode::RepeatOne => PlayMode::RepeatAll,
            PlayMode::RepeatAll => PlayMode::Stop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Stop => "stop",
            PlayMode::RepeatOne => "repeat-one",
            PlayMode::RepeatAll => "repeat-all",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    pub name: String,
    pub src: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioState {
    pub playlist: Vec<Track>,
    pub current_index: usize,
    pub is_playing: bool,
    pub play_mode: PlayMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioPatch {
    pub playlist: Option<Vec<Track>>,
    pub current_index: Option<usize>,
    pub is_playing: Option<bool>,
    pub play_mode: Option<PlayMode>,
}

// --- Card arbitration --------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CardArbitration {
    pub trigger_source: Option<usize>,
    pub last_kind: Option<CardEggKind>,
    pub last_trigger_ms: Option<f64>,
}

// --- Canonical record --------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CanonicalState {
    pub language: Language,
    pub quote: QuoteState,
    pub essence: [EssenceCardState; ESSENCE_CARD_SLOTS],
    pub easter_eggs: BTreeMap<String, EggCounter>,
    pub meditation: MeditationVariant,
    pub color_circle: ColorCircleState,
    pub audio: AudioState,
    pub phoebe: PhoebeState,
    pub cards: CardArbitration,
}

impl Default for CanonicalState {
    fn default() -> Self {
        Self {
            language: Language::En,
            quote: QuoteState::default(),
            essence: std::array::from_fn(|slot| EssenceCardState { quote_index: slot, override_content: None }),
            easter_eggs: BTreeMap::new(),
            meditation: MeditationVariant::Normal,
            color_circle: ColorCircleState::default(),
            audio: AudioState::default(),
            phoebe: PhoebeState::default(),
            cards: CardArbitration::default(),
        }
    }
}

impl CanonicalState {
    pub fn apply_quote(&mut self, patch: QuotePatch) {
        if let Some(section) = patch.section {
            self.quote.section = section;
        }
        if let Some(index) = patch.index {
            self.quote.index = index;
        }
    }

    pub fn apply_essence(&mut self, slot: usize, patch: EssencePatch) {
        let Some(card) = self.essence.get_mut(slot) else { return };
        if let Some(index) = patch.quote_index {
            card.quote_index = index;
        }
        if let Some(content) = patch.override_content {
            card.override_content = content;
        }
    }

    pub fn apply_phoebe(&mut self, patch: PhoebePatch) {
        if let Some(mode) = patch.mode {
            self.phoebe.mode = mode;
        }
        if let Some(quote) = patch.quote_override {
            self.phoebe.quote_override = quote;
        }
    }

    pub fn apply_color_circle(&mut self, patch: ColorCirclePatch) {
        if let Some(count) = patch.event_count {
            self.color_circle.event_count = count;
        }
        if let Some(processing) = patch.processing {
            self.color_circle.processing = processing;
        }
    }

    pub fn apply_audio(&mut self, patch: AudioPatch) {
        if let Some(playlist) = patch.playlist {
            self.audio.playlist = playlist;
        }
        if let Some(index) = patch.current_index {
            self.audio.current_index = index;
        }
        if let Some(playing) = patch.is_playing {
            self.audio.is_playing = playing;
        }
        if let Some(mode) = patch.play_mode {
            self.audio.play_mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cards_show_first_four_quotes() {
        let state = CanonicalState::default();
        let indices: Vec<usize> = state.essence.iter().map(|c| c.quote_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(state.essence.iter().all(|c| !c.is_easter_egg_override()));
    }

    #[test]
    fn test_patches_merge_only_present_fields() {
        let mut state = CanonicalState::default();
        state.apply_quote(QuotePatch::index(2));
        assert_eq!(state.quote.section, DEFAULT_QUOTE_SECTION);
        assert_eq!(state.quote.index, 2);

        state.apply_color_circle(ColorCirclePatch { event_count: Some(4), processing: None });
        state.apply_color_circle(ColorCirclePatch { event_count: None, processing: Some(Processing::Processing) });
        assert_eq!(state.color_circle, ColorCircleState { event_count: 4, processing: Processing::Processing });

        state.apply_audio(AudioPatch { play_mode: Some(PlayMode::RepeatAll), ..Default::default() });
        assert_eq!(state.audio.play_mode, PlayMode::RepeatAll);
        assert!(state.audio.playlist.is_empty());
    }

    #[test]
    fn test_essence_patch_clears_override_on_new_quote() {
        let mut state = CanonicalState::default();
        let content = CardEggKind::Cyberpunk.card_override().unwrap();
        state.apply_essence(0, EssencePatch::overridden(content));
        assert!(state.essence[0].is_easter_egg_override());
        state.apply_essence(0, EssencePatch::quote(7));
        assert_eq!(state.essence[0].quote_index, 7);
        assert!(!state.essence[0].is_easter_egg_override());
        // out of range slots are ignored
        state.apply_essence(9, EssencePatch::quote(1));
    }

    #[test]
    fn test_play_mode_cycles_through_three_states() {
        let mode = PlayMode::Stop;
        assert_eq!(mode.cycle(), PlayMode::RepeatOne);
        assert_eq!(mode.cycle().cycle(), PlayMode::RepeatAll);
        assert_eq!(mode.cycle().cycle().cycle(), PlayMode::Stop);
    }

    #[test]
    fn test_zote_outranks_donda() {
        assert!(PhoebeMode::Zote { precept: 0 }.rank() > PhoebeMode::Donda.rank());
        assert!(PhoebeMode::Donda.rank() > PhoebeMode::Normal.rank());
    }
}
