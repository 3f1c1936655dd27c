//! Global reminder configuration and its persistence choke point.
//!
//! The configuration is a typed struct with a compile-time-checked default
//! for every field; unknown stored fields are ignored and missing ones fall
//! back per field, so an old blob always deserializes into a full config.
//!
//! Stored as JSON under the `"reminderConfig"` key.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::notify::materializer::{ScheduleMaterializer, ScheduleOutcome};
use crate::reminder::{ClockTime, Importance, ReminderCategory};
use crate::storage::KeyValueStore;

/// Storage key for the global configuration blob.
pub const CONFIG_KEY: &str = "reminderConfig";

/// Global toggles gating materialization, plus delivery defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Master switch. When off, nothing is materialized regardless of
    /// individual rule flags.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Subscribed categories; rules outside this set are skipped during
    /// materialization.
    #[serde(default = "default_categories")]
    pub categories: BTreeSet<ReminderCategory>,
    /// Default delivery time for quick-added reminders.
    #[serde(default = "default_daily_time")]
    pub daily_time: ClockTime,
    /// Default delivery importance.
    #[serde(default)]
    pub importance: Importance,
    /// Default notification sound.
    #[serde(default = "default_sound")]
    pub sound_name: String,
}

fn default_true() -> bool {
    true
}

fn default_categories() -> BTreeSet<ReminderCategory> {
    ReminderCategory::ALL.into_iter().collect()
}

fn default_daily_time() -> ClockTime {
    ClockTime { hour: 9, minute: 0 }
}

fn default_sound() -> String {
    "default".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: default_categories(),
            daily_time: default_daily_time(),
            importance: Importance::Default,
            sound_name: default_sound(),
        }
    }
}

/// Load the persisted configuration, falling back to defaults when absent
/// or corrupt.
pub(crate) fn load_config(store: &dyn KeyValueStore) -> GlobalConfig {
    let raw = match store.get(CONFIG_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return GlobalConfig::default(),
        Err(e) => {
            warn!("failed to read reminder config: {e}");
            return GlobalConfig::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!("discarding corrupt reminder config: {e}");
            GlobalConfig::default()
        }
    }
}

/// Owns configuration persistence.
///
/// [`ConfigService::save`] is the single choke point that keeps the live
/// schedule in step with the configuration: stale settings never outlive a
/// save.
pub struct ConfigService {
    store: Arc<dyn KeyValueStore>,
    materializer: Arc<ScheduleMaterializer>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn KeyValueStore>, materializer: Arc<ScheduleMaterializer>) -> Self {
        Self {
            store,
            materializer,
        }
    }

    /// Current configuration, or defaults if never persisted.
    pub fn get(&self) -> GlobalConfig {
        load_config(self.store.as_ref())
    }

    /// Persist and reconcile. When `config.enabled` is false the reconcile
    /// pass is the cancel-all path.
    pub fn save(&self, config: &GlobalConfig) -> Result<ScheduleOutcome> {
        let raw = serde_json::to_string(config)?;
        self.store.set(CONFIG_KEY, &raw)?;
        Ok(self.materializer.reschedule_all())
    }
}
