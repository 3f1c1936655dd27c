//! Platform notification sink boundary and trigger identity.
//!
//! Trigger ids are structured composite strings under a reserved namespace,
//! so cancellation can be scoped to this subsystem without disturbing
//! notifications owned by other app features, and so the same rule and
//! occurrence always derive the same id (no lossy hashing).

pub mod materializer;

pub use materializer::{ScheduleMaterializer, ScheduleOutcome};

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::reminder::{Importance, ReminderRule};

/// Reserved trigger-id namespace for this subsystem.
pub const TRIGGER_NAMESPACE: &str = "studyroom.reminder";

/// Trigger id for one occurrence of a rule.
pub fn trigger_id(rule_id: &str, index: u32) -> String {
    format!("{TRIGGER_NAMESPACE}/{rule_id}/{index}")
}

/// Prefix shared by every trigger id this subsystem creates.
pub fn namespace_prefix() -> String {
    format!("{TRIGGER_NAMESPACE}/")
}

/// Prefix shared by all of one rule's trigger ids.
pub fn rule_prefix(rule_id: &str) -> String {
    format!("{TRIGGER_NAMESPACE}/{rule_id}/")
}

/// Extract the owning rule id from a trigger id in our namespace.
pub fn trigger_rule_id(trigger_id: &str) -> Option<&str> {
    let rest = trigger_id.strip_prefix(TRIGGER_NAMESPACE)?.strip_prefix('/')?;
    let (rule_id, index) = rest.rsplit_once('/')?;
    if rule_id.is_empty() || index.parse::<u32>().is_err() {
        return None;
    }
    Some(rule_id)
}

/// Delivery payload copied from the owning rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    pub sound: Option<String>,
    pub vibration: bool,
    pub priority: Importance,
}

impl NotificationPayload {
    pub fn from_rule(rule: &ReminderRule) -> Self {
        Self {
            title: rule.title.clone(),
            message: rule.message.clone(),
            sound: rule.sound.clone(),
            vibration: rule.vibration,
            priority: rule.priority,
        }
    }
}

/// One concrete scheduled delivery, fully derived from its rule and
/// disposable at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstance {
    pub trigger_id: String,
    /// Wall-clock instant, device-local.
    pub fires_at: NaiveDateTime,
    pub payload: NotificationPayload,
}

/// Platform notification scheduler.
///
/// Implementations guarantee at least one delivery attempt at or after
/// `fires_at`; exact delivery timing is the platform's concern, not this
/// crate's.
pub trait NotificationSink: Send + Sync {
    /// Whether notification permission has been granted. A denied
    /// permission is not an error: scheduling proceeds, deliveries simply
    /// never happen.
    fn permission_granted(&self) -> bool {
        true
    }

    /// Register one pending delivery.
    fn schedule(&self, instance: &ScheduledInstance) -> Result<(), SinkError>;

    /// Cancel one pending delivery. Unknown ids are a no-op.
    fn cancel(&self, trigger_id: &str) -> Result<(), SinkError>;

    /// Cancel every pending delivery whose trigger id starts with `prefix`.
    fn cancel_prefix(&self, prefix: &str) -> Result<(), SinkError>;

    /// Deliver immediately, outside any schedule (test-fire path).
    fn deliver_now(&self, payload: &NotificationPayload) -> Result<(), SinkError>;
}

/// In-memory sink for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    pending: Mutex<BTreeMap<String, ScheduledInstance>>,
    delivered: Mutex<Vec<NotificationPayload>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending instances ordered by trigger id.
    pub fn pending(&self) -> Vec<ScheduledInstance> {
        self.pending
            .lock()
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Payloads handed to `deliver_now`, in order.
    pub fn delivered(&self) -> Vec<NotificationPayload> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn schedule(&self, instance: &ScheduledInstance) -> Result<(), SinkError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))?;
        pending.insert(instance.trigger_id.clone(), instance.clone());
        Ok(())
    }

    fn cancel(&self, trigger_id: &str) -> Result<(), SinkError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))?;
        pending.remove(trigger_id);
        Ok(())
    }

    fn cancel_prefix(&self, prefix: &str) -> Result<(), SinkError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))?;
        pending.retain(|id, _| !id.starts_with(prefix));
        Ok(())
    }

    fn deliver_now(&self, payload: &NotificationPayload) -> Result<(), SinkError> {
        let mut delivered = self
            .delivered
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))?;
        delivered.push(payload.clone());
        Ok(())
    }
}
