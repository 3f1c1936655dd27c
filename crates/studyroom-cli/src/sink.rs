//! Local notification sink: a pending-trigger registry in the key-value
//! store plus desktop delivery.
//!
//! Stands in for a mobile platform scheduler. Scheduling registers the
//! trigger under the `"pendingTriggers"` key; `dispatch_due` delivers every
//! trigger whose instant has passed as a desktop notification and removes
//! it. Late triggers are delivered on catch-up, never silently dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use notify_rust::Notification;
use serde::{Deserialize, Serialize};
use tracing::warn;

use studyroom_core::{
    KeyValueStore, NotificationPayload, NotificationSink, ScheduledInstance, SinkError,
};

/// Storage key for the pending-trigger registry.
pub const PENDING_KEY: &str = "pendingTriggers";

/// One registered trigger awaiting delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub trigger_id: String,
    pub fires_at: NaiveDateTime,
    pub payload: NotificationPayload,
}

pub struct LocalSink {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSink {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All pending triggers ordered by fire time.
    pub fn pending(&self) -> Result<Vec<PendingTrigger>, SinkError> {
        let mut triggers: Vec<PendingTrigger> = self.load()?.into_values().collect();
        triggers.sort_by_key(|t| t.fires_at);
        Ok(triggers)
    }

    /// Deliver every due trigger as a desktop notification and drop it from
    /// the registry. Returns the delivered triggers.
    pub fn dispatch_due(&self, now: NaiveDateTime) -> Result<Vec<PendingTrigger>, SinkError> {
        let mut registry = self.load()?;
        let due: Vec<String> = registry
            .iter()
            .filter(|(_, t)| t.fires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        let mut delivered = Vec::new();
        for id in due {
            let Some(trigger) = registry.remove(&id) else {
                continue;
            };
            match deliver(&trigger.payload) {
                Ok(()) => delivered.push(trigger),
                Err(e) => {
                    // Keep the trigger for the next dispatch attempt.
                    warn!("delivery failed for {}: {e}", trigger.trigger_id);
                    registry.insert(id, trigger);
                }
            }
        }
        self.persist(&registry)?;
        Ok(delivered)
    }

    fn load(&self) -> Result<BTreeMap<String, PendingTrigger>, SinkError> {
        let raw = self
            .store
            .get(PENDING_KEY)
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        let Some(raw) = raw else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                warn!("discarding corrupt pending-trigger registry: {e}");
                Ok(BTreeMap::new())
            }
        }
    }

    fn persist(&self, registry: &BTreeMap<String, PendingTrigger>) -> Result<(), SinkError> {
        let raw = serde_json::to_string(registry)
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        self.store
            .set(PENDING_KEY, &raw)
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}

fn deliver(payload: &NotificationPayload) -> Result<(), SinkError> {
    let mut notification = Notification::new();
    notification.summary(&payload.title).body(&payload.message);
    if let Some(sound) = &payload.sound {
        notification.sound_name(sound);
    }
    notification
        .show()
        .map(|_| ())
        .map_err(|e| SinkError::Unavailable(e.to_string()))
}

impl NotificationSink for LocalSink {
    fn schedule(&self, instance: &ScheduledInstance) -> Result<(), SinkError> {
        let mut registry = self.load()?;
        registry.insert(
            instance.trigger_id.clone(),
            PendingTrigger {
                trigger_id: instance.trigger_id.clone(),
                fires_at: instance.fires_at,
                payload: instance.payload.clone(),
            },
        );
        self.persist(&registry)
    }

    fn cancel(&self, trigger_id: &str) -> Result<(), SinkError> {
        let mut registry = self.load()?;
        registry.remove(trigger_id);
        self.persist(&registry)
    }

    fn cancel_prefix(&self, prefix: &str) -> Result<(), SinkError> {
        let mut registry = self.load()?;
        registry.retain(|id, _| !id.starts_with(prefix));
        self.persist(&registry)
    }

    fn deliver_now(&self, payload: &NotificationPayload) -> Result<(), SinkError> {
        deliver(payload)
    }
}
