//! Audio: the playlist model, asset path probing and the `<audio>` player.
//!
//! The player tries each candidate path in turn, moving on after an `error`
//! event or a load timeout, and starts playback on the first
//! `canplaythrough`. Starting a new file bumps the load generation so late
//! events from an abandoned source are ignored.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use web_sys::HtmlAudioElement;

use crate::config::AudioConfig;
use crate::error::{Result, SiteError};
use crate::state::{AudioPatch, PlayMode, Track};

// --- Playlist ----------------------------------------------------------------

/// What to do when the current track finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndAction {
    Stop,
    Replay,
    Advance(usize),
}

#[derive(Clone, Debug)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: usize,
    mode: PlayMode,
    volume: f64,
    playing: bool,
}

impl Playlist {
    pub fn new(volume: f64) -> Self {
        Self { tracks: Vec::new(), current: 0, mode: PlayMode::Stop, volume: volume.clamp(0.0, 1.0), playing: false }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    pub fn play_mode(&self) -> PlayMode {
        self.mode
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Append a track; a source already in the list is not added twice.
    pub fn add(&mut self, track: Track) -> bool {
        if self.tracks.iter().any(|t| t.src == track.src) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove a track, keeping `current` on a valid index.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let track = self.tracks.remove(index);
        if index < self.current || self.current >= self.tracks.len() {
            self.current = self.current.saturating_sub(1);
        }
        Some(track)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = 0;
        self.playing = false;
    }

    pub fn select(&mut self, index: usize) -> Result<&Track> {
        let len = self.tracks.len();
        let track = self.tracks.get(index).ok_or(SiteError::IndexOutOfRange { what: "track", index, len })?;
        self.current = index;
        Ok(track)
    }

    pub fn next(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.tracks.len();
        self.tracks.get(self.current)
    }

    pub fn previous(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = (self.current + self.tracks.len() - 1) % self.tracks.len();
        self.tracks.get(self.current)
    }

    pub fn cycle_mode(&mut self) -> PlayMode {
        self.mode = self.mode.cycle();
        self.mode
    }

    pub fn on_track_ended(&mut self) -> EndAction {
        let action = match self.mode {
            _ if self.tracks.is_empty() => EndAction::Stop,
            PlayMode::Stop => EndAction::Stop,
            PlayMode::RepeatOne => EndAction::Replay,
            PlayMode::RepeatAll => EndAction::Advance((self.current + 1) % self.tracks.len()),
        };
        match action {
            EndAction::Stop => self.playing = false,
            EndAction::Advance(index) => self.current = index,
            EndAction::Replay => {}
        }
        action
    }

    /// Snapshot for the synchronizer's audio state.
    pub fn patch(&self) -> AudioPatch {
        AudioPatch {
            playlist: Some(self.tracks.clone()),
            current_index: Some(self.current),
            is_playing: Some(self.playing),
            play_mode: Some(self.mode),
        }
    }
}

// --- Asset paths -------------------------------------------------------------

/// Paths probed for `file`: each folder with and without `./`, then the bare name.
pub fn candidate_paths(file: &str, folders: &[String]) -> Vec<String> {
    if file.contains('/') {
        return vec![file.to_string()];
    }
    let mut paths: Vec<String> = folders
        .iter()
        .flat_map(|folder| [format!("./{folder}/{file}"), format!("{folder}/{file}")])
        .collect();
    paths.push(file.to_string());
    paths
}

fn same_source(current_src: &str, candidate: &str) -> bool {
    let candidate = candidate.trim_start_matches("./").trim_start_matches('/');
    current_src == candidate || current_src.ends_with(&format!("/{candidate}"))
}

// --- Load tracking -----------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading { generation: u64, candidate: usize },
    Ready,
    Failed,
}

/// Walks one file's candidate list; clock- and DOM-free.
#[derive(Clone, Debug, Default)]
pub struct LoadTracker {
    generation: u64,
    candidates: Vec<String>,
    next: usize,
    state: LoadState,
}

impl LoadTracker {
    /// Start a new load, abandoning any in flight. Returns its generation.
    pub fn begin(&mut self, candidates: Vec<String>) -> u64 {
        self.generation += 1;
        self.candidates = candidates;
        self.next = 0;
        self.state = LoadState::Idle;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn next_source(&mut self) -> Option<(u64, String)> {
        match self.candidates.get(self.next) {
            Some(src) => {
                self.state = LoadState::Loading { generation: self.generation, candidate: self.next };
                self.next += 1;
                Some((self.generation, src.clone()))
            }
            None => {
                self.state = LoadState::Failed;
                None
            }
        }
    }

    /// The element reported it can play `current_src`. False for stale
    /// events from a source that is no longer loading.
    pub fn ready(&mut self, current_src: &str) -> bool {
        let LoadState::Loading { candidate, .. } = self.state else { return false };
        let matches = self.candidates.get(candidate).is_some_and(|c| same_source(current_src, c));
        if matches {
            self.state = LoadState::Ready;
        }
        matches
    }

    /// The load of `generation` failed. True when that load is still the
    /// current one and the next candidate should be tried.
    pub fn fail(&mut self, generation: u64) -> bool {
        matches!(self.state, LoadState::Loading { generation: g, .. } if g == generation)
    }
}

// --- Player ------------------------------------------------------------------

struct PlayerInner {
    element: HtmlAudioElement,
    tracker: LoadTracker,
    load_timeout_ms: u32,
    timeout: Option<Timeout>,
}

pub struct AudioPlayer {
    inner: Rc<RefCell<PlayerInner>>,
    folders: Vec<String>,
    _listeners: Vec<EventListener>,
}

impl AudioPlayer {
    pub fn new(cfg: &AudioConfig, on_ended: impl Fn() + 'static) -> Result<Self> {
        let element = HtmlAudioElement::new()?;
        element.set_volume(cfg.default_volume.clamp(0.0, 1.0));
        element.set_preload("auto");
        let inner = Rc::new(RefCell::new(PlayerInner {
            element: element.clone(),
            tracker: LoadTracker::default(),
            load_timeout_ms: cfg.load_timeout_ms,
            timeout: None,
        }));

        let weak = Rc::downgrade(&inner);
        let ready = EventListener::new(&element, "canplaythrough", move |_| {
            if let Some(inner) = weak.upgrade() {
                on_ready(&inner);
            }
        });
        let weak = Rc::downgrade(&inner);
        let error = EventListener::new(&element, "error", move |_| {
            if let Some(inner) = weak.upgrade() {
                let generation = inner.borrow().tracker.generation();
                on_failure(&inner, generation);
            }
        });
        let ended = EventListener::new(&element, "ended", move |_| on_ended());

        Ok(Self { inner, folders: cfg.asset_folders.clone(), _listeners: vec![ready, error, ended] })
    }

    /// Probe the asset folders for `file` and play the first that loads.
    pub fn play_file(&self, file: &str) {
        self.start(candidate_paths(file, &self.folders));
    }

    pub fn play_src(&self, src: &str) {
        self.start(vec![src.to_string()]);
    }

    fn start(&self, candidates: Vec<String>) {
        let generation = self.inner.borrow_mut().tracker.begin(candidates);
        tracing::debug!(generation, "audio load started");
        try_next(&self.inner);
    }

    pub fn replay(&self) {
        let inner = self.inner.borrow();
        inner.element.set_current_time(0.0);
        play(&inner.element);
    }

    pub fn pause(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.timeout = None;
        if let Err(err) = inner.element.pause() {
            tracing::warn!(?err, "audio pause failed");
        }
    }

    pub fn set_volume(&self, volume: f64) {
        self.inner.borrow().element.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn is_playing(&self) -> bool {
        !self.inner.borrow().element.paused()
    }
}

fn play(element: &HtmlAudioElement) {
    if let Err(err) = element.play() {
        tracing::warn!(?err, "audio play rejected");
    }
}

fn try_next(inner_rc: &Rc<RefCell<PlayerInner>>) {
    let mut inner = inner_rc.borrow_mut();
    let Some((generation, src)) = inner.tracker.next_source() else {
        inner.timeout = None;
        tracing::warn!("audio not found in any asset folder");
        return;
    };
    inner.element.set_src(&src);
    inner.element.load();
    let weak: Weak<RefCell<PlayerInner>> = Rc::downgrade(inner_rc);
    inner.timeout = Some(Timeout::new(inner.load_timeout_ms, move || {
        if let Some(inner) = weak.upgrade() {
            tracing::debug!(generation, "audio load timed out");
            on_failure(&inner, generation);
        }
    }));
}

fn on_ready(inner_rc: &Rc<RefCell<PlayerInner>>) {
    let mut inner = inner_rc.borrow_mut();
    let current = inner.element.current_src();
    if !inner.tracker.ready(&current) {
        return;
    }
    inner.timeout = None;
    play(&inner.element);
    tracing::debug!(src = %current, "audio playing");
}

fn on_failure(inner_rc: &Rc<RefCell<PlayerInner>>, generation: u64) {
    if !inner_rc.borrow_mut().tracker.fail(generation) {
        return;
    }
    try_next(inner_rc);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> Track {
        Track { name: name.into(), src: format!("audio/{name}.mp3") }
    }

    #[test]
    fn test_add_dedups_by_source() {
        let mut p = Playlist::new(0.7);
        assert!(p.add(track("a")));
        assert!(!p.add(Track { name: "other name".into(), src: "audio/a.mp3".into() }));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut p = Playlist::new(0.7);
        for n in ["a", "b", "c"] {
            p.add(track(n));
        }
        assert_eq!(p.previous().unwrap().name, "c");
        assert_eq!(p.next().unwrap().name, "a");
        assert_eq!(p.next().unwrap().name, "b");
        assert!(Playlist::new(0.7).next().is_none());
    }

    #[test]
    fn test_remove_clamps_current() {
        let mut p = Playlist::new(0.7);
        for n in ["a", "b", "c"] {
            p.add(track(n));
        }
        p.select(2).unwrap();
        p.remove(2);
        assert_eq!(p.current_index(), 1);
        p.remove(0);
        assert_eq!(p.current().unwrap().name, "b");
        assert!(p.remove(7).is_none());
        p.clear();
        assert_eq!(p.current_index(), 0);
        assert!(p.select(0).is_err());
    }

    #[test]
    fn test_end_of_track_follows_mode() {
        let mut p = Playlist::new(0.7);
        p.add(track("a"));
        p.add(track("b"));
        p.set_playing(true);
        assert_eq!(p.on_track_ended(), EndAction::Stop);
        assert_eq!(p.cycle_mode(), PlayMode::RepeatOne);
        assert_eq!(p.on_track_ended(), EndAction::Replay);
        assert_eq!(p.cycle_mode(), PlayMode::RepeatAll);
        assert_eq!(p.on_track_ended(), EndAction::Advance(1));
        assert_eq!(p.on_track_ended(), EndAction::Advance(0));
        assert_eq!(p.cycle_mode(), PlayMode::Stop);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut p = Playlist::new(3.0);
        assert_eq!(p.volume(), 1.0);
        assert_eq!(p.set_volume(-0.5), 0.0);
        assert_eq!(p.set_volume(0.4), 0.4);
    }

    #[test]
    fn test_candidate_paths_order() {
        let folders = vec!["phoebe".to_string(), "audio".to_string()];
        assert_eq!(
            candidate_paths("boss.mp3", &folders),
            vec!["./phoebe/boss.mp3", "phoebe/boss.mp3", "./audio/boss.mp3", "audio/boss.mp3", "boss.mp3"]
        );
        assert_eq!(candidate_paths("music/x.mp3", &folders), vec!["music/x.mp3"]);
    }

    #[test]
    fn test_tracker_walks_candidates_until_exhausted() {
        let mut t = LoadTracker::default();
        let generation = t.begin(vec!["./phoebe/a.mp3".into(), "a.mp3".into()]);
        assert_eq!(t.next_source(), Some((generation, "./phoebe/a.mp3".into())));
        assert!(t.fail(generation));
        assert_eq!(t.next_source(), Some((generation, "a.mp3".into())));
        assert!(t.fail(generation));
        assert_eq!(t.next_source(), None);
        assert_eq!(t.state(), LoadState::Failed);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let mut t = LoadTracker::default();
        let old = t.begin(vec!["./phoebe/old.mp3".into()]);
        t.next_source();
        let new = t.begin(vec!["./phoebe/new.mp3".into()]);
        t.next_source();
        assert!(!t.fail(old));
        assert!(!t.ready("http://localhost/phoebe/old.mp3"));
        assert!(t.ready("http://localhost/phoebe/new.mp3"));
        assert_eq!(t.state(), LoadState::Ready);
        assert!(!t.fail(new));
    }
}
