//! Runtime tunables. `SiteConfig::default()` carries the stock values; with the
//! `serde_json` feature a partial JSON object can override any of them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Selectors {
    pub scroll_container: String,
    pub content_root: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            scroll_container: "#infinite-scroll-container".into(),
            content_root: ".container".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ScrollConfig {
    /// Distance from either end of the three-copy strip that triggers a jump.
    pub edge_guard_px: f64,
    pub jump_cooldown_ms: u32,
    pub resize_debounce_ms: u32,
    pub header_offset_px: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { edge_guard_px: 3.0, jump_cooldown_ms: 30, resize_debounce_ms: 100, header_offset_px: 100.0 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SyncConfig {
    pub update_interval_ms: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { update_interval_ms: 100 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EggConfig {
    pub trigger_threshold: u32,
    pub max_triggers: u32,
    pub reset_timeout_ms: u32,
    pub card_cooldown_ms: u32,
    /// Delay before the language toggle egg plays its effect.
    pub lang_toggle_delay_ms: u32,
    pub notification_ms: u32,
}

impl Default for EggConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 3,
            max_triggers: 3,
            reset_timeout_ms: 1000,
            card_cooldown_ms: 500,
            lang_toggle_delay_ms: 500,
            notification_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MediaConfig {
    pub debounce_ms: u32,
    pub sweep_interval_ms: u32,
    pub max_retries: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { debounce_ms: 500, sweep_interval_ms: 5000, max_retries: 3 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AudioConfig {
    pub load_timeout_ms: u32,
    pub default_volume: f64,
    /// Folders probed in order, each with and without a leading `./`.
    pub asset_folders: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 3000,
            default_volume: 0.7,
            asset_folders: vec!["phoebe".into(), "audio".into()],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct InteractionConfig {
    pub swipe_threshold_px: f64,
    pub mobile_breakpoint_px: f64,
    pub back_to_top_threshold_px: f64,
    pub nav_throttle_ms: u32,
    pub color_circle_throttle_ms: u32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_px: 50.0,
            mobile_breakpoint_px: 768.0,
            back_to_top_threshold_px: 300.0,
            nav_throttle_ms: 100,
            color_circle_throttle_ms: 200,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SiteConfig {
    pub selectors: Selectors,
    pub scroll: ScrollConfig,
    pub sync: SyncConfig,
    pub eggs: EggConfig,
    pub media: MediaConfig,
    pub audio: AudioConfig,
    pub interaction: InteractionConfig,
    /// Lowers the console log level from INFO to DEBUG.
    pub verbose_logging: bool,
}

impl SiteConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::SiteError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_timings() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.sync.update_interval_ms, 100);
        assert_eq!(cfg.eggs.trigger_threshold, 3);
        assert_eq!(cfg.eggs.max_triggers, 3);
        assert_eq!(cfg.eggs.reset_timeout_ms, 1000);
        assert_eq!(cfg.eggs.card_cooldown_ms, 500);
        assert_eq!(cfg.scroll.jump_cooldown_ms, 30);
        assert_eq!(cfg.media.max_retries, 3);
        assert!((cfg.audio.default_volume - 0.7).abs() < f64::EPSILON);
        assert_eq!(cfg.selectors.content_root, ".container");
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn test_partial_json_overrides_defaults() {
        let cfg = SiteConfig::from_json(r#"{"eggs":{"max_triggers":5},"verbose_logging":true}"#).unwrap();
        assert_eq!(cfg.eggs.max_triggers, 5);
        assert_eq!(cfg.eggs.trigger_threshold, 3);
        assert!(cfg.verbose_logging);
        assert_eq!(cfg.scroll, ScrollConfig::default());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn test_malformed_json_is_config_error() {
        let err = SiteConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::error::SiteError::Config(_)));
    }
}
