//! Reacts to copy lifecycle events.
//!
//! New copies get their ids resolved and every synced feature re-rendered at
//! once. Media changes are debounced into one re-validation pass, and a slow
//! periodic sweep catches images that broke without an `error` event.

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, HtmlImageElement};

use crate::config::MediaConfig;
use crate::error::Result;
use crate::identity::ResolveReport;
use crate::replicate::CopyEvent;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchPlan {
    /// Copies (0-based) that appeared since the last batch of events.
    pub new_copies: Vec<usize>,
    pub full_resync: bool,
    pub revalidate_media: bool,
}

impl WatchPlan {
    pub fn is_empty(&self) -> bool {
        self.new_copies.is_empty() && !self.full_resync && !self.revalidate_media
    }
}

pub fn plan(events: &[CopyEvent]) -> WatchPlan {
    let mut plan = WatchPlan::default();
    for event in events {
        match *event {
            CopyEvent::CopyCreated { index } => {
                if !plan.new_copies.contains(&index) {
                    plan.new_copies.push(index);
                }
                plan.full_resync = true;
            }
            CopyEvent::MediaChanged => plan.revalidate_media = true,
        }
    }
    plan
}

/// What the watcher drives when copies appear.
pub trait WatchTarget {
    fn resolve_identities(&mut self) -> Result<ResolveReport>;
    fn resync_all(&mut self);
}

pub struct MutationWatcher {
    debounce_ms: u32,
    sweep_interval_ms: u32,
    pending_media: Option<Timeout>,
    sweep: Option<Interval>,
    listeners: Vec<EventListener>,
}

impl MutationWatcher {
    pub fn new(cfg: &MediaConfig) -> Self {
        Self {
            debounce_ms: cfg.debounce_ms,
            sweep_interval_ms: cfg.sweep_interval_ms,
            pending_media: None,
            sweep: None,
            listeners: Vec::new(),
        }
    }

    /// Handle a batch of events. Media work is deferred to `revalidate`,
    /// called once after the debounce window.
    pub fn consume(
        &mut self,
        events: &[CopyEvent],
        target: &mut impl WatchTarget,
        revalidate: impl FnOnce() + 'static,
    ) -> WatchPlan {
        let plan = plan(events);
        if !plan.new_copies.is_empty() {
            match target.resolve_identities() {
                Ok(report) => tracing::debug!(
                    copies = ?plan.new_copies,
                    renamed = report.renamed,
                    references = report.references,
                    "ids resolved for new copies"
                ),
                Err(err) => tracing::warn!(error = %err, "id resolution failed"),
            }
        }
        if plan.full_resync {
            target.resync_all();
        }
        if plan.revalidate_media {
            self.debounce_media(revalidate);
        }
        plan
    }

    /// Re-arming drops, and so cancels, the previous timer.
    pub fn debounce_media(&mut self, revalidate: impl FnOnce() + 'static) {
        self.pending_media = Some(Timeout::new(self.debounce_ms, revalidate));
    }

    pub fn media_pending(&self) -> bool {
        self.pending_media.is_some()
    }

    /// Image load failures inside `container` do not bubble, so listen in the
    /// capture phase.
    pub fn watch_images(&mut self, container: &HtmlElement, on_media_changed: impl Fn() + 'static) {
        let listener = EventListener::new_with_options(
            container,
            "error",
            EventListenerOptions { phase: EventListenerPhase::Capture, passive: true },
            move |event: &Event| {
                let is_image = event.target().is_some_and(|t| t.dyn_ref::<HtmlImageElement>().is_some());
                if is_image {
                    on_media_changed();
                }
            },
        );
        self.listeners.push(listener);
    }

    pub fn start_sweep(&mut self, sweep: impl FnMut() + 'static) {
        self.sweep = Some(Interval::new(self.sweep_interval_ms, sweep));
    }

    /// Cancel every timer and listener.
    pub fn stop(&mut self) {
        self.pending_media = None;
        self.sweep = None;
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        resolved: usize,
        resynced: usize,
    }

    impl WatchTarget for Recorder {
        fn resolve_identities(&mut self) -> Result<ResolveReport> {
            self.resolved += 1;
            Ok(ResolveReport::default())
        }

        fn resync_all(&mut self) {
            self.resynced += 1;
        }
    }

    #[test]
    fn test_plan_merges_events() {
        let p = plan(&[
            CopyEvent::CopyCreated { index: 0 },
            CopyEvent::MediaChanged,
            CopyEvent::CopyCreated { index: 2 },
            CopyEvent::CopyCreated { index: 0 },
            CopyEvent::MediaChanged,
        ]);
        assert_eq!(p.new_copies, vec![0, 2]);
        assert!(p.full_resync);
        assert!(p.revalidate_media);
        assert!(plan(&[]).is_empty());
    }

    #[test]
    fn test_new_copies_resolve_then_resync_once() {
        let mut watcher = MutationWatcher::new(&MediaConfig::default());
        let mut target = Recorder::default();
        let events = [CopyEvent::CopyCreated { index: 0 }, CopyEvent::CopyCreated { index: 2 }];
        let p = watcher.consume(&events, &mut target, || {});
        assert_eq!(p.new_copies.len(), 2);
        assert_eq!(target.resolved, 1);
        assert_eq!(target.resynced, 1);
        assert!(!watcher.media_pending());
    }
}
