//! Console logging through `tracing`.
//!
//! `ConsoleLayer` forwards every event to the matching `console.*` method with a
//! `[feebea]` prefix, the event target, the message, then `key=value` fields.
//! The maximum level is held in an atomic so a config applied after start-up
//! can change it without reinstalling the subscriber.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const PREFIX: &str = "feebea";

// INFO
static MAX_LEVEL: AtomicU8 = AtomicU8::new(3);

fn level_rank(level: Level) -> u8 {
    match level {
        Level::ERROR => 1,
        Level::WARN => 2,
        Level::INFO => 3,
        Level::DEBUG => 4,
        _ => 5,
    }
}

pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level_rank(level), Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level_rank(level) <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Install the console subscriber. Safe to call more than once; later calls
/// only adjust the level.
pub fn init(max_level: Level) {
    set_max_level(max_level);
    let _ = tracing_subscriber::registry().with(ConsoleLayer).try_init();
}

pub struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = *metadata.level();
        if !enabled(level) {
            return;
        }
        let mut visitor = ConsoleVisitor::default();
        event.record(&mut visitor);
        let line = visitor.render(metadata.target());
        emit(level, &line);
    }
}

#[derive(Default)]
struct ConsoleVisitor {
    message: String,
    fields: String,
}

impl ConsoleVisitor {
    fn render(&self, target: &str) -> String {
        let target = target.strip_prefix("feebea::").unwrap_or(target);
        let mut line = format!("[{PREFIX}] {target}: {}", self.message);
        line.push_str(&self.fields);
        line
    }
}

impl Visit for ConsoleVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(&mut self.message, "{value:?}");
        } else {
            let _ = write!(&mut self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(&mut self.fields, " {}={}", field.name(), value);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;
    let value = JsValue::from_str(line);
    match level {
        Level::ERROR => console::error_1(&value),
        Level::WARN => console::warn_1(&value),
        Level::INFO => console::info_1(&value),
        _ => console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(level: Level, line: &str) {
    eprintln!("{level:>5} {line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ranks_are_ordered_by_verbosity() {
        assert!(level_rank(Level::ERROR) < level_rank(Level::WARN));
        assert!(level_rank(Level::INFO) < level_rank(Level::DEBUG));
        assert!(level_rank(Level::DEBUG) < level_rank(Level::TRACE));
    }

    #[test]
    fn test_render_strips_crate_prefix_and_appends_fields() {
        let visitor = ConsoleVisitor { message: "flushed".into(), fields: " feature=Quote writes=9".into() };
        assert_eq!(visitor.render("feebea::sync"), "[feebea] sync: flushed feature=Quote writes=9");
        assert_eq!(visitor.render("other"), "[feebea] other: flushed feature=Quote writes=9");
    }
}
