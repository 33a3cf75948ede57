//! Overlay settings loaded from the external key-value store
//!
//! The options page (an external collaborator) writes these flags; the
//! overlay reads them exactly once at startup and treats them as immutable
//! for the page session. Reloading requires a page refresh.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Boolean feature flags recognized by the overlay.
///
/// Every flag defaults to `true` except `showHourPoints`, which is opt-in.
/// Unknown keys written by other versions of the options page are retained
/// in `extra` so a round-trip through the store does not drop them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub show_card_numbers: bool,

    #[serde(default = "default_true")]
    pub show_story_points: bool,

    #[serde(default = "default_true")]
    pub show_post_points: bool,

    /// Hour estimates are rarely used, so they are off by default.
    #[serde(default)]
    pub show_hour_points: bool,

    #[serde(default = "default_true")]
    pub show_column_totals: bool,

    #[serde(default = "default_true")]
    pub show_board_totals: bool,

    #[serde(default = "default_true")]
    pub show_picker: bool,

    /// Additional untyped fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_card_numbers: true,
            show_story_points: true,
            show_post_points: true,
            show_hour_points: false,
            show_column_totals: true,
            show_board_totals: true,
            show_picker: true,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from a raw key-value map as handed out by the store.
    pub fn from_map(map: HashMap<String, Value>) -> Result<Self, CoreError> {
        let value = Value::Object(map.into_iter().collect());
        serde_json::from_value(value).map_err(|e| CoreError::SettingsParse {
            message: e.to_string(),
            source: e,
        })
    }

    /// Load settings from the store, falling back to defaults on any parse
    /// error (graceful degradation - a broken store must not kill the
    /// overlay).
    pub fn load(store: &dyn SettingsStore) -> Self {
        match Self::from_map(store.get_all()) {
            Ok(settings) => {
                debug!(?settings, "Loaded overlay settings");
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse stored settings, using defaults");
                Self::default()
            }
        }
    }
}

/// External key-value store interface.
///
/// Mirrors the persisted-storage API the options page writes through. The
/// overlay only ever calls `get_all` (once, at startup); `set` exists for
/// the external settings collaborator.
pub trait SettingsStore {
    /// Fetch every persisted option.
    fn get_all(&self) -> HashMap<String, Value>;

    /// Persist the given options, merging over existing ones.
    fn set(&mut self, values: HashMap<String, Value>);
}

/// In-memory store, used in tests and as the default when no persistence
/// layer is wired in.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

impl SettingsStore for MemoryStore {
    fn get_all(&self) -> HashMap<String, Value> {
        self.values.clone()
    }

    fn set(&mut self, values: HashMap<String, Value>) {
        self.values.extend(values);
    }
}
