//! The running site.
//!
//! One `Site` lives in a thread-local slot from `start` until `stop`. Event
//! listeners, timers and the wasm exports all reach it through `with_site`;
//! a callback that fires while the slot is already borrowed is logged and
//! dropped instead of panicking.

use std::cell::RefCell;
use std::collections::BTreeMap;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement};

use crate::audio::{AudioPlayer, EndAction, Playlist};
use crate::config::SiteConfig;
use crate::content::{Language, NAV_SECTIONS};
use crate::controls::color_circle::{self, CircleEffect, ColorCircle, EFFECT_MS};
use crate::controls::navigation::{self, NavigationDots, SectionBox};
use crate::controls::quotes::{self, QuoteStep};
use crate::controls::{essence, language};
use crate::dom;
use crate::easter_egg::EggClick;
use crate::error::{Result, SiteError};
use crate::identity::{DuplicateIdentityResolver, ResolveReport};
use crate::logging;
use crate::media::MediaValidator;
use crate::replicate::{ContentReplicator, CopyEvent, CopySet, MIDDLE_COPY};
use crate::scroll::ScrollIllusionController;
use crate::state::{MeditationVariant, PlayMode, Track};
use crate::sync::dom::DomSurface;
use crate::sync::{Effect, StateSynchronizer};
use crate::timing::{rand_index, PendingTimers};
use crate::watcher::{MutationWatcher, WatchPlan, WatchTarget};

const NOTIFICATION_CLASS: &str = "easter-egg-notification";

thread_local! {
    static SITE: RefCell<Option<Site>> = RefCell::new(None);
}

pub fn with_site<R>(f: impl FnOnce(&mut Site) -> R) -> Result<R> {
    SITE.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| SiteError::Busy)?;
        let site = slot.as_mut().ok_or(SiteError::NotStarted)?;
        Ok(f(site))
    })
}

/// Run `f` against the site from a listener or timer, logging any failure.
fn run(action: &'static str, f: impl FnOnce(&mut Site) -> Result<()>) {
    match with_site(f) {
        Ok(Ok(())) => {}
        Ok(Err(err)) | Err(err) => tracing::warn!(action, error = %err, "action failed"),
    }
}

pub fn start(cfg: SiteConfig) -> Result<()> {
    stop();
    if cfg.verbose_logging {
        logging::set_max_level(tracing::Level::DEBUG);
    }
    let (site, events) = Site::new(cfg)?;
    SITE.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| SiteError::Busy)?;
        *slot = Some(site);
        Ok::<(), SiteError>(())
    })?;
    with_site(|site| site.boot(&events))??;
    tracing::info!("site started");
    Ok(())
}

/// Tear the site down; dropping it cancels every timer and listener it owns.
pub fn stop() {
    let site = SITE.with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if site.is_some() {
        drop(site);
        tracing::info!("site stopped");
    }
}

// --- Listener entry points ---------------------------------------------------

pub fn toggle_language() {
    run("toggle language", |site| site.toggle_language().map(|_| ()));
}

pub fn step_quote(step: QuoteStep) {
    run("step quote", |site| {
        site.step_quote(step);
        Ok(())
    });
}

pub fn activate_essence_card(slot: usize) {
    run("essence card", |site| {
        site.activate_essence_card(slot);
        Ok(())
    });
}

pub fn jump_to_section(id: &str) {
    run("jump to section", |site| site.jump_to_section(id));
}

pub fn scroll_to_top() {
    run("scroll to top", |site| site.scroll_to_top());
}

pub fn click_color_circle() {
    run("color circle", |site| site.click_color_circle());
}

// --- Watcher target ----------------------------------------------------------

struct CopyTarget<'a> {
    resolver: &'a mut DuplicateIdentityResolver,
    copies: Option<&'a CopySet>,
    sync: &'a mut StateSynchronizer<DomSurface>,
}

impl WatchTarget for CopyTarget<'_> {
    fn resolve_identities(&mut self) -> Result<ResolveReport> {
        let Some(copies) = self.copies else { return Ok(ResolveReport::default()) };
        Ok(self.resolver.resolve_all(&copies.subtrees()?))
    }

    fn resync_all(&mut self) {
        self.sync.full_resync();
    }
}

fn copy_elements(copies: Option<&CopySet>) -> Vec<Element> {
    copies.map(|set| set.copies().iter().map(|c| c.clone().into()).collect()).unwrap_or_default()
}

// --- Site --------------------------------------------------------------------

pub struct Site {
    cfg: SiteConfig,
    doc: Document,
    root: Element,
    replicator: ContentReplicator,
    copies: Option<CopySet>,
    resolver: DuplicateIdentityResolver,
    scroll: Option<ScrollIllusionController>,
    sync: StateSynchronizer<DomSurface>,
    watcher: MutationWatcher,
    media: MediaValidator,
    playlist: Playlist,
    music: Option<AudioPlayer>,
    sfx: Option<AudioPlayer>,
    nav: NavigationDots,
    circle: ColorCircle,
    egg_timers: BTreeMap<&'static str, Timeout>,
    delayed: PendingTimers<Timeout>,
    notification: Option<Timeout>,
    circle_timer: Option<Timeout>,
    tick: Option<Interval>,
    listeners: Vec<EventListener>,
}

impl Site {
    fn new(cfg: SiteConfig) -> Result<(Self, Vec<CopyEvent>)> {
        let doc = dom::document()?;
        let replicator = ContentReplicator::new(&cfg.selectors);
        let mut events = Vec::new();
        let copies = match replicator.replicate(&doc, &mut events) {
            Ok(set) => Some(set),
            Err(err) => {
                tracing::warn!(error = %err, "infinite scroll disabled");
                None
            }
        };
        let root: Element = match (&copies, doc.body()) {
            (Some(set), _) => set.container().clone().into(),
            (None, Some(body)) => body.into(),
            (None, None) => return Err(SiteError::MissingElement("body".into())),
        };
        let scroll = copies.as_ref().and_then(|set| {
            let middle = set.middle()?.clone();
            Some(ScrollIllusionController::new(set.container().clone(), middle, &cfg.scroll))
        });
        let surface = DomSurface::new(copy_elements(copies.as_ref()), cfg.interaction.mobile_breakpoint_px)?;
        let sync = StateSynchronizer::new(&cfg, surface);
        let site = Site {
            doc,
            root,
            replicator,
            copies,
            resolver: DuplicateIdentityResolver::new(),
            scroll,
            sync,
            watcher: MutationWatcher::new(&cfg.media),
            media: MediaValidator::new(cfg.media.max_retries),
            playlist: Playlist::new(cfg.audio.default_volume),
            music: None,
            sfx: None,
            nav: NavigationDots::new(cfg.interaction.nav_throttle_ms),
            circle: ColorCircle::new(cfg.interaction.color_circle_throttle_ms),
            egg_timers: BTreeMap::new(),
            delayed: PendingTimers::default(),
            notification: None,
            circle_timer: None,
            tick: None,
            listeners: Vec::new(),
            cfg,
        };
        Ok((site, events))
    }

    /// Start-up order: ids and state into the copies first, then the scroll
    /// position, then everything that reacts to the user.
    fn boot(&mut self, events: &[CopyEvent]) -> Result<()> {
        if events.is_empty() {
            let mut target = self.copy_target();
            if let Err(err) = target.resolve_identities() {
                tracing::warn!(error = %err, "id resolution failed");
            }
            target.resync_all();
        } else {
            self.consume(events);
        }
        if let Some(scroll) = self.scroll.as_mut() {
            scroll.home();
        }
        let lang = self.sync.language();
        language::render_markers(&self.doc, lang)?;
        essence::prepare_cards(&self.root, lang)?;

        self.sfx = self.player(|| {});
        self.music = self.player(|| {
            run("track ended", |site| {
                site.on_track_ended();
                Ok(())
            })
        });
        self.install_listeners()?;
        self.tick = Some(Interval::new(self.cfg.sync.update_interval_ms, || {
            run("batch tick", |site| {
                site.tick();
                Ok(())
            })
        }));
        Ok(())
    }

    fn player(&self, on_ended: impl Fn() + 'static) -> Option<AudioPlayer> {
        AudioPlayer::new(&self.cfg.audio, on_ended)
            .map_err(|err| tracing::warn!(error = %err, "audio unavailable"))
            .ok()
    }

    fn install_listeners(&mut self) -> Result<()> {
        let window = dom::window()?;
        let mut listeners = Vec::new();

        if let Some(scroll) = &self.scroll {
            listeners.push(EventListener::new_with_options(
                scroll.container(),
                "scroll",
                EventListenerOptions { phase: EventListenerPhase::Bubble, passive: true },
                |_| {
                    run("scroll", |site| {
                        site.on_scroll();
                        Ok(())
                    })
                },
            ));
            let container = scroll.container().clone();
            self.watcher.watch_images(&container, || {
                run("media changed", |site| {
                    site.consume(&[CopyEvent::MediaChanged]);
                    Ok(())
                })
            });
            self.watcher.start_sweep(|| run("media sweep", |site| site.revalidate_media()));
        }
        listeners.push(EventListener::new(&window, "resize", |_| {
            run("resize", |site| {
                site.on_resize();
                Ok(())
            })
        }));
        listeners.push(EventListener::new(&window, "beforeunload", |_| stop()));

        for def in self.sync.registry().iter().filter(|d| d.id != language::TOGGLE_EGG) {
            let (id, selector) = (def.id, def.trigger_selector);
            listeners.push(EventListener::new(&self.doc, "click", move |event: &Event| {
                let hit = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest(selector).ok().flatten());
                if hit.is_some() {
                    run("easter egg", |site| site.click_easter_egg(id));
                }
            }));
        }

        listeners.extend(language::bind(&self.doc));
        listeners.extend(navigation::bind(&self.doc));
        if let Some(root) = self.root.dyn_ref::<HtmlElement>() {
            listeners.extend(quotes::bind(root, self.cfg.interaction.swipe_threshold_px));
            listeners.extend(essence::bind(root));
        }
        listeners.push(color_circle::bind(&self.root));
        self.listeners = listeners;
        Ok(())
    }

    fn copy_target(&mut self) -> CopyTarget<'_> {
        CopyTarget { resolver: &mut self.resolver, copies: self.copies.as_ref(), sync: &mut self.sync }
    }

    fn consume(&mut self, events: &[CopyEvent]) -> WatchPlan {
        let mut target = CopyTarget { resolver: &mut self.resolver, copies: self.copies.as_ref(), sync: &mut self.sync };
        self.watcher.consume(events, &mut target, || run("media revalidation", |site| site.revalidate_media()))
    }

    pub fn revalidate_media(&mut self) -> Result<()> {
        if let Some(copies) = &self.copies {
            self.media.revalidate(copies)?;
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.sync.flush();
        self.drain_effects();
    }

    // --- Effects ---------------------------------------------------------------

    fn drain_effects(&mut self) {
        for effect in self.sync.take_effects() {
            match effect {
                Effect::PlayAudio { file, delay_ms: 0 } => self.play_audio(&file),
                Effect::PlayAudio { file, delay_ms } => self.delay(delay_ms, "delayed audio", move |site| {
                    site.play_audio(&file);
                    Ok(())
                }),
                Effect::Notify { message, delay_ms: 0 } => {
                    if let Err(err) = self.notify(&message) {
                        tracing::warn!(error = %err, "notification failed");
                    }
                }
                Effect::Notify { message, delay_ms } => {
                    self.delay(delay_ms, "delayed notification", move |site| site.notify(&message))
                }
            }
        }
    }

    /// Run `f` after `delay_ms`; the timer drops its own handle once it fires.
    fn delay(&mut self, delay_ms: u32, action: &'static str, f: impl FnOnce(&mut Site) -> Result<()> + 'static) {
        let key = self.delayed.next_key();
        let timer = Timeout::new(delay_ms, move || {
            run(action, move |site| {
                site.delayed.release(key);
                f(site)
            })
        });
        self.delayed.insert(timer);
    }

    pub fn play_audio(&mut self, file: &str) {
        match &self.sfx {
            Some(player) => player.play_file(file),
            None => tracing::debug!(file, "no audio player"),
        }
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        let el = match self.doc.query_selector(&format!(".{NOTIFICATION_CLASS}"))? {
            Some(el) => el,
            None => {
                let el = self.doc.create_element("div")?;
                el.set_class_name(NOTIFICATION_CLASS);
                el.set_attribute("role", "status")?;
                self.doc.body().ok_or(SiteError::MissingElement("body".into()))?.append_child(&el)?;
                el
            }
        };
        el.set_text_content(Some(message));
        dom::set_class(&el, "show", true)?;
        self.notification = Some(Timeout::new(self.cfg.eggs.notification_ms, move || {
            if let Err(err) = dom::set_class(&el, "show", false) {
                tracing::debug!(error = %err, "notification hide failed");
            }
        }));
        Ok(())
    }

    // --- Easter eggs -----------------------------------------------------------

    fn after_egg_click(&mut self, id: &'static str, outcome: EggClick) {
        match outcome {
            EggClick::Counting { .. } => {
                let timer = Timeout::new(self.cfg.eggs.reset_timeout_ms, move || {
                    run("egg expiry", move |site| {
                        site.sync.expire_easter_egg(id);
                        site.egg_timers.remove(id);
                        Ok(())
                    })
                });
                self.egg_timers.insert(id, timer);
            }
            EggClick::Triggered { .. } | EggClick::Exhausted => {
                self.egg_timers.remove(id);
            }
        }
        self.drain_effects();
    }

    pub fn click_easter_egg(&mut self, id: &'static str) -> Result<()> {
        let outcome = self.sync.register_easter_egg_click(id, dom::now_ms())?;
        self.after_egg_click(id, outcome);
        Ok(())
    }

    /// Fire an egg by name; false once it has used up its triggers.
    pub fn trigger_easter_egg(&mut self, id: &str) -> Result<bool> {
        let outcome = self.sync.trigger_easter_egg(id)?;
        self.drain_effects();
        Ok(matches!(outcome, EggClick::Triggered { .. }))
    }

    pub fn reset_card_easter_egg(&mut self) {
        self.sync.reset_card_easter_egg();
    }

    // --- Language --------------------------------------------------------------

    pub fn language(&self) -> Language {
        self.sync.language()
    }

    pub fn toggle_language(&mut self) -> Result<Language> {
        let (lang, egg) = language::toggle(&mut self.sync, dom::now_ms());
        if let Some(outcome) = egg {
            self.after_egg_click(language::TOGGLE_EGG, outcome);
        }
        self.language_changed(lang)?;
        Ok(lang)
    }

    pub fn switch_language(&mut self, lang: Language) -> Result<()> {
        if language::switch(&mut self.sync, lang) {
            self.language_changed(lang)?;
        }
        Ok(())
    }

    fn language_changed(&mut self, lang: Language) -> Result<()> {
        language::render_markers(&self.doc, lang)?;
        essence::prepare_cards(&self.root, lang)?;
        Ok(())
    }

    // --- Content controllers ---------------------------------------------------

    pub fn step_quote(&mut self, step: QuoteStep) {
        quotes::advance(&mut self.sync, step);
    }

    pub fn set_quote_index(&mut self, index: usize) -> bool {
        quotes::set_quote_index(&mut self.sync, index)
    }

    pub fn activate_essence_card(&mut self, slot: usize) {
        essence::activate(&mut self.sync, slot, dom::now_ms(), rand_index);
        self.drain_effects();
    }

    pub fn set_meditation_variant(&mut self, variant: MeditationVariant) {
        self.sync.sync_meditation_state(variant);
    }

    pub fn click_color_circle(&mut self) -> Result<()> {
        let state = self.sync.state().color_circle;
        let Some(click) = self.circle.click(&state, dom::now_ms()) else { return Ok(()) };
        self.sync.sync_color_circle_state(click.patch);
        if let Some(effect) = click.effect {
            color_circle::render_effect(&self.root, effect, true)?;
            self.circle_timer = Some(Timeout::new(EFFECT_MS, move || {
                run("color circle release", move |site| site.release_color_circle(effect))
            }));
        }
        Ok(())
    }

    fn release_color_circle(&mut self, effect: CircleEffect) -> Result<()> {
        self.circle_timer = None;
        self.sync.sync_color_circle_state(ColorCircle::release());
        color_circle::render_effect(&self.root, effect, false)
    }

    // --- Scrolling -------------------------------------------------------------

    fn on_scroll(&mut self) {
        if let Some(scroll) = self.scroll.as_mut() {
            scroll.handle_scroll(|| {
                run("scroll correction", |site| {
                    if let Some(scroll) = site.scroll.as_mut() {
                        scroll.finish_correction();
                    }
                    Ok(())
                })
            });
        }
        if self.nav.should_update(dom::now_ms()) {
            if let Err(err) = self.update_navigation() {
                tracing::debug!(error = %err, "navigation update failed");
            }
        }
    }

    fn on_resize(&mut self) {
        if let Some(scroll) = self.scroll.as_mut() {
            scroll.schedule_rehome(|| {
                run("rehome", |site| {
                    if let Some(scroll) = site.scroll.as_mut() {
                        scroll.home();
                    }
                    Ok(())
                })
            });
        }
        self.sync.refresh_layout();
    }

    /// A section as shown in the middle copy, where navigation happens.
    fn section_element(&self, id: &str) -> Option<Element> {
        let id = match &self.copies {
            Some(_) => self.resolver.map().id_in_copy(id, MIDDLE_COPY + 1),
            None => id.to_string(),
        };
        self.doc.get_element_by_id(&id)
    }

    fn update_navigation(&mut self) -> Result<()> {
        let (view_top, view_bottom, position) = match &self.scroll {
            Some(scroll) => {
                let rect = scroll.container().get_bounding_client_rect();
                (rect.top(), rect.bottom(), scroll.offset_in_copy())
            }
            None => {
                let window = dom::window()?;
                let height = window.inner_height()?.as_f64().unwrap_or(0.0);
                (0.0, height, window.scroll_y()?)
            }
        };
        let boxes: Vec<SectionBox> = NAV_SECTIONS
            .iter()
            .filter_map(|section| {
                let rect = self.section_element(section.id)?.get_bounding_client_rect();
                Some(SectionBox { id: section.id.to_string(), top: rect.top(), bottom: rect.bottom() })
            })
            .collect();
        if let Some(active) = self.nav.update(navigation::active_section(&boxes, view_top, view_bottom)) {
            navigation::render_active(&self.doc, active.as_deref())?;
        }
        let visible = navigation::back_to_top_visible(position, self.cfg.interaction.back_to_top_threshold_px);
        if let Some(visible) = self.nav.update_back_to_top(visible) {
            navigation::render_back_to_top(&self.doc, visible)?;
        }
        Ok(())
    }

    pub fn jump_to_section(&mut self, id: &str) -> Result<()> {
        let section = self.section_element(id).ok_or_else(|| SiteError::UnknownSection(id.to_string()))?;
        match &self.scroll {
            Some(scroll) => scroll.scroll_to_section(&section)?,
            None => section.scroll_into_view(),
        }
        tracing::debug!(section = id, "jumped to section");
        Ok(())
    }

    pub fn scroll_to_top(&mut self) -> Result<()> {
        match &self.scroll {
            Some(scroll) => scroll.scroll_to_top(),
            None => dom::window()?.scroll_to_with_x_and_y(0.0, 0.0),
        }
        Ok(())
    }

    pub fn scroll_progress(&self) -> f64 {
        self.scroll.as_ref().map(|s| s.progress()).unwrap_or(0.0)
    }

    pub fn scroll_position(&self) -> Result<f64> {
        match &self.scroll {
            Some(scroll) => Ok(scroll.current_position()),
            None => Ok(dom::window()?.scroll_y()?),
        }
    }

    pub fn set_scroll_enabled(&mut self, enabled: bool) -> Result<()> {
        match self.scroll.as_mut() {
            Some(scroll) => scroll.set_enabled(enabled),
            None => Err(SiteError::MissingElement(self.cfg.selectors.scroll_container.clone())),
        }
    }

    /// Rebuild both clones from the middle copy, keeping the reader's place.
    pub fn refresh_copies(&mut self) -> Result<()> {
        let middle = self.copies.as_ref().and_then(|set| set.middle().cloned());
        let Some(middle) = middle else {
            return Err(SiteError::MissingElement(self.cfg.selectors.content_root.clone()));
        };
        let position = self.scroll.as_ref().map(|s| s.offset_in_copy());
        self.resolver.restore_copy(MIDDLE_COPY + 1, &dom::subtree(&middle)?);
        self.resolver.reset();

        let mut events = Vec::new();
        let refreshed = match self.copies.as_mut() {
            Some(set) => self.replicator.refresh(set, &mut events),
            None => Ok(()),
        };
        self.sync.surface_mut().set_copies(copy_elements(self.copies.as_ref()));
        refreshed?;
        self.consume(&events);
        if let (Some(scroll), Some(position)) = (&self.scroll, position) {
            scroll.scroll_to_position(position);
        }
        Ok(())
    }

    /// Drop both clones and fall back to a plain page scrolled to the top.
    pub fn destroy_copies(&mut self) -> Result<()> {
        let Some(set) = self.copies.take() else { return Ok(()) };
        if let Some(middle) = set.middle() {
            self.resolver.restore_copy(MIDDLE_COPY + 1, &dom::subtree(middle)?);
        }
        self.resolver.reset();
        self.scroll = None;
        self.watcher.stop();
        let root = self.replicator.destroy(set)?;
        self.sync.surface_mut().set_copies(vec![root.into()]);
        self.sync.full_resync();
        Ok(())
    }

    // --- Audio -----------------------------------------------------------------

    fn publish_audio(&mut self) {
        self.sync.sync_audio_state(self.playlist.patch());
    }

    fn play_current(&mut self) {
        let Some(src) = self.playlist.current().map(|t| t.src.clone()) else { return };
        if let Some(music) = &self.music {
            music.play_src(&src);
            self.playlist.set_playing(true);
        }
        self.publish_audio();
    }

    pub fn add_track(&mut self, name: &str, src: &str) -> bool {
        let added = self.playlist.add(Track { name: name.to_string(), src: src.to_string() });
        self.publish_audio();
        added
    }

    pub fn next_track(&mut self) {
        if self.playlist.next().is_some() {
            self.play_current();
        }
    }

    pub fn previous_track(&mut self) {
        if self.playlist.previous().is_some() {
            self.play_current();
        }
    }

    pub fn cycle_play_mode(&mut self) -> PlayMode {
        let mode = self.playlist.cycle_mode();
        self.publish_audio();
        mode
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        let volume = self.playlist.set_volume(volume);
        for player in [&self.music, &self.sfx].into_iter().flatten() {
            player.set_volume(volume);
        }
        volume
    }

    fn on_track_ended(&mut self) {
        match self.playlist.on_track_ended() {
            EndAction::Stop => self.publish_audio(),
            EndAction::Replay => {
                if let Some(music) = &self.music {
                    music.replay();
                }
            }
            EndAction::Advance(_) => self.play_current(),
        }
    }

    #[cfg(feature = "serde_json")]
    pub fn state_snapshot(&self) -> Result<String> {
        serde_json::to_string(self.sync.state()).map_err(|e| SiteError::Js(e.to_string()))
    }
}
