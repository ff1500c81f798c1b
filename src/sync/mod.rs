//! Cross-copy state synchronizer.
//!
//! Every synced feature follows mutate-then-broadcast: a `sync_*` call merges
//! a patch into `CanonicalState` and marks the feature dirty, and the batch
//! tick re-renders each dirty feature into all copies through a `Surface`.
//! Side effects that leave the page (audio, notifications) are queued as
//! `Effect`s for the caller to carry out.

pub mod batch;
pub mod dom;
pub mod memory;
pub mod surface;
pub mod view;

use crate::config::{EggConfig, SiteConfig};
use crate::content::{
    essence_quote_count, CardEggKind, EggEffect, Language, ESSENCE_CARD_SLOTS, ZOTE_PRECEPTS,
};
use crate::easter_egg::{CardArbiter, ClickBurst, EasterEggDefinition, EggClick, EggRegistry};
use crate::error::{Result, SiteError};
use crate::state::{
    AudioPatch, CanonicalState, ColorCirclePatch, EssencePatch, MeditationVariant, PhoebeMode,
    PhoebePatch, QuotePatch,
};

pub use batch::{BatchScheduler, Feature};
pub use memory::{MemElement, MemorySurface};
pub use surface::{ElementWrite, Surface, Target, WriteValue};

/// Work the synchronizer asks its owner to perform outside the copies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    PlayAudio { file: String, delay_ms: u32 },
    Notify { message: String, delay_ms: u32 },
}

pub struct StateSynchronizer<S: Surface> {
    state: CanonicalState,
    surface: S,
    batch: BatchScheduler,
    eggs: EggRegistry,
    arbiter: CardArbiter,
    bursts: [ClickBurst; ESSENCE_CARD_SLOTS],
    egg_cfg: EggConfig,
    effects: Vec<Effect>,
    failures: u64,
}

impl<S: Surface> StateSynchronizer<S> {
    pub fn new(cfg: &SiteConfig, surface: S) -> Self {
        Self {
            state: CanonicalState::default(),
            surface,
            batch: BatchScheduler::new(),
            eggs: EggRegistry::new(&cfg.eggs),
            arbiter: CardArbiter::new(f64::from(cfg.eggs.card_cooldown_ms)),
            bursts: Default::default(),
            egg_cfg: cfg.eggs.clone(),
            effects: Vec::new(),
            failures: 0,
        }
    }

    pub fn state(&self) -> &CanonicalState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn language(&self) -> Language {
        self.state.language
    }

    pub fn batch(&self) -> &BatchScheduler {
        &self.batch
    }

    pub fn registry(&self) -> &EggRegistry {
        &self.eggs
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Render and sync failures swallowed so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    // --- Feature syncs ---------------------------------------------------------

    /// Re-renders every feature, since all of them carry localized text.
    pub fn sync_language_state(&mut self, is_english: bool) {
        self.state.language = Language::from_is_english(is_english);
        self.batch.schedule_all();
        tracing::debug!(language = self.state.language.code(), "language synced");
    }

    /// Returns false, leaving state untouched, when the patch points outside
    /// the quote collections.
    pub fn sync_quote_state(&mut self, patch: QuotePatch) -> bool {
        let section = patch.section.clone().unwrap_or_else(|| self.state.quote.section.clone());
        let index = patch.index.unwrap_or(self.state.quote.index);
        let Some(collection) = crate::content::quote_collection(&section) else {
            self.swallow(SiteError::UnknownSection(section));
            return false;
        };
        if index >= collection.len() {
            self.swallow(SiteError::IndexOutOfRange { what: "quote", index, len: collection.len() });
            return false;
        }
        self.state.apply_quote(patch);
        self.batch.schedule(Feature::Quote);
        true
    }

    pub fn sync_essence_state(&mut self, slot: usize, patch: EssencePatch) -> bool {
        if slot >= ESSENCE_CARD_SLOTS {
            self.swallow(SiteError::IndexOutOfRange { what: "essence card", index: slot, len: ESSENCE_CARD_SLOTS });
            return false;
        }
        if let Some(index) = patch.quote_index.filter(|i| *i >= essence_quote_count()) {
            self.swallow(SiteError::IndexOutOfRange { what: "essence quote", index, len: essence_quote_count() });
            return false;
        }
        self.state.apply_essence(slot, patch);
        self.batch.schedule(Feature::Essence);
        true
    }

    pub fn sync_phoebe_wisdom_state(&mut self, patch: PhoebePatch) {
        self.state.apply_phoebe(patch);
        self.batch.schedule(Feature::PhoebeWisdom);
    }

    pub fn sync_meditation_state(&mut self, variant: MeditationVariant) {
        self.state.meditation = variant;
        self.batch.schedule(Feature::Meditation);
    }

    /// Viewport width changed; font sizes depend on it.
    pub fn refresh_layout(&mut self) {
        self.batch.schedule(Feature::Quote);
        self.batch.schedule(Feature::Essence);
    }

    /// State only; the color circle owns its own DOM.
    pub fn sync_color_circle_state(&mut self, patch: ColorCirclePatch) {
        self.state.apply_color_circle(patch);
    }

    /// State only; the audio player owns its own DOM.
    pub fn sync_audio_state(&mut self, patch: AudioPatch) {
        self.state.apply_audio(patch);
    }

    // --- Easter eggs -----------------------------------------------------------

    pub fn sync_easter_egg_state(&mut self, id: &str, click_count: u32) {
        self.state.easter_eggs.entry(id.to_string()).or_default().click_count = click_count;
    }

    /// Apply the threshold rule to the egg's synced click count, firing its
    /// effects on a trigger.
    pub fn check_easter_egg_trigger(&mut self, id: &str, click_count: u32) -> Result<EggClick> {
        let def = self.eggs.get(id)?.clone();
        let counter = self.state.easter_eggs.entry(id.to_string()).or_default();
        counter.click_count = click_count;
        let outcome = counter.evaluate(def.required_clicks, def.max_triggers);
        self.on_egg_outcome(&def, outcome);
        Ok(outcome)
    }

    /// One click on an egg's trigger at `now`.
    pub fn register_easter_egg_click(&mut self, id: &str, now: f64) -> Result<EggClick> {
        let def = self.eggs.get(id)?.clone();
        let reset_timeout_ms = self.eggs.reset_timeout_ms();
        let counter = self.state.easter_eggs.entry(id.to_string()).or_default();
        let outcome = counter.register_click(now, def.required_clicks, def.max_triggers, reset_timeout_ms);
        self.on_egg_outcome(&def, outcome);
        Ok(outcome)
    }

    /// Inactivity timer for `id` fired.
    pub fn expire_easter_egg(&mut self, id: &str) {
        if let Some(counter) = self.state.easter_eggs.get_mut(id) {
            counter.expire();
        }
    }

    /// Fire an egg as if its threshold was just reached; the trigger limit
    /// still applies.
    pub fn trigger_easter_egg(&mut self, id: &str) -> Result<EggClick> {
        let required = self.eggs.get(id)?.required_clicks;
        self.check_easter_egg_trigger(id, required)
    }

    fn on_egg_outcome(&mut self, def: &EasterEggDefinition, outcome: EggClick) {
        match outcome {
            EggClick::Triggered { trigger_count } => {
                tracing::info!(egg = def.id, trigger_count, "easter egg triggered");
                self.queue_egg_effects(def.audio_file, def.message.get(self.state.language), def.effect_delay_ms);
                if let EggEffect::PhoebeQuote(quote) = def.effect {
                    self.sync_phoebe_wisdom_state(PhoebePatch { mode: None, quote_override: Some(Some(quote)) });
                }
            }
            EggClick::Exhausted => tracing::debug!(egg = def.id, "easter egg exhausted"),
            EggClick::Counting { .. } => {}
        }
    }

    fn queue_egg_effects(&mut self, audio: &str, message: &str, delay_ms: u32) {
        self.effects.push(Effect::PlayAudio { file: audio.to_string(), delay_ms });
        self.effects.push(Effect::Notify { message: message.to_string(), delay_ms });
    }

    // --- Card eggs -------------------------------------------------------------

    /// Run card arbitration; on success the card egg's effects are applied.
    pub fn handle_card_easter_egg(
        &mut self,
        card_index: usize,
        kind: CardEggKind,
        predicate: impl FnOnce() -> bool,
        now: f64,
    ) -> bool {
        if !self.arbiter.handle(&mut self.state.cards, card_index, kind, predicate, now) {
            return false;
        }
        self.apply_card_egg(card_index, kind);
        true
    }

    /// A click on essence card `slot`. A quick burst of clicks fires the
    /// slot's card egg; any other click shows `next_quote`. Returns true when
    /// the egg fired.
    pub fn essence_card_clicked(&mut self, slot: usize, next_quote: usize, now: f64) -> bool {
        let slot = slot % ESSENCE_CARD_SLOTS;
        let kind = CardEggKind::for_slot(slot);
        let threshold = self.egg_cfg.trigger_threshold;
        let window_ms = f64::from(self.egg_cfg.reset_timeout_ms);
        let burst = &mut self.bursts[slot];
        let fired = self.arbiter.handle(&mut self.state.cards, slot, kind, || burst.hit(now, threshold, window_ms), now);
        if fired {
            self.apply_card_egg(slot, kind);
        } else {
            self.sync_essence_state(slot, EssencePatch::quote(next_quote));
        }
        fired
    }

    fn apply_card_egg(&mut self, card_index: usize, kind: CardEggKind) {
        tracing::info!(card = card_index, egg = kind.id(), "card easter egg triggered");
        self.queue_egg_effects(kind.audio(), kind.message().get(self.state.language), 0);
        if let Some(content) = kind.card_override() {
            self.sync_essence_state(card_index, EssencePatch::overridden(content));
        }
        let mode = match (kind, self.state.phoebe.mode) {
            (CardEggKind::Zote, PhoebeMode::Zote { precept }) => {
                Some(PhoebeMode::Zote { precept: (precept + 1) % ZOTE_PRECEPTS.len() })
            }
            (CardEggKind::Zote, _) => Some(PhoebeMode::Zote { precept: 0 }),
            (CardEggKind::DondaWisdom, current) if current.rank() <= PhoebeMode::Donda.rank() => {
                Some(PhoebeMode::Donda)
            }
            _ => None,
        };
        if let Some(mode) = mode {
            self.sync_phoebe_wisdom_state(PhoebePatch { mode: Some(mode), quote_override: None });
        }
    }

    /// Release the trigger source and put every card and the Phoebe panel
    /// back to normal.
    pub fn reset_card_easter_egg(&mut self) {
        self.arbiter.reset(&mut self.state.cards);
        for slot in 0..ESSENCE_CARD_SLOTS {
            self.state.apply_essence(slot, EssencePatch { quote_index: None, override_content: Some(None) });
        }
        self.state.apply_phoebe(PhoebePatch { mode: Some(PhoebeMode::Normal), quote_override: None });
        self.batch.schedule(Feature::Essence);
        self.batch.schedule(Feature::PhoebeWisdom);
        tracing::debug!("card easter eggs reset");
    }

    // --- Rendering -------------------------------------------------------------

    /// Batch tick: render every dirty feature once from the latest state.
    /// Returns the number of features rendered.
    pub fn flush(&mut self) -> usize {
        let features = self.batch.drain();
        for feature in &features {
            self.render(*feature);
        }
        features.len()
    }

    /// Render every feature now, bypassing the batch; used when a new copy
    /// appears.
    pub fn full_resync(&mut self) {
        self.batch.clear();
        for feature in Feature::ALL {
            self.render(feature);
        }
        tracing::debug!(copies = self.surface.copy_count(), "full resync");
    }

    /// One feature's render is its own failure boundary.
    fn render(&mut self, feature: Feature) {
        if feature == Feature::Language {
            let chinese = self.state.language == Language::Zh;
            if let Err(err) = self.surface.set_root_class(view::CHINESE_ROOT_CLASS, chinese) {
                self.swallow(err);
            }
        }
        let writes = match view::writes_for(feature, &self.state, self.surface.is_compact()) {
            Ok(writes) => writes,
            Err(err) => {
                tracing::error!(?feature, error = %err, "render skipped");
                self.failures += 1;
                return;
            }
        };
        for write in &writes {
            if let Err(err) = self.surface.apply(write) {
                tracing::warn!(?feature, selector = write.target.selector, error = %err, "write failed");
                self.failures += 1;
            }
        }
    }

    fn swallow(&mut self, err: SiteError) {
        tracing::warn!(error = %err, "sync ignored");
        self.failures += 1;
    }
}
