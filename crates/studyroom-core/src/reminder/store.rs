//! Persistence and CRUD for reminder definitions.
//!
//! The whole collection lives as one JSON array under the `"customReminders"`
//! key; every mutation is a full read-modify-write cycle (single-user,
//! single-process model). Absent or corrupt data reads as an empty
//! collection and the next successful save repairs it.
//!
//! Mutations keep the platform sink in step: `create` incrementally
//! schedules the new rule, `update`/`toggle` drive a full reconciliation
//! pass, and `delete` cancels the rule's pending instances.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::notify::materializer::ScheduleMaterializer;
use crate::reminder::{validate_title, ReminderDraft, ReminderPatch, ReminderRule};
use crate::storage::KeyValueStore;

/// Storage key for the reminder collection.
pub const REMINDERS_KEY: &str = "customReminders";

/// Load the persisted collection, treating absent or corrupt data as empty.
pub(crate) fn load_rules(store: &dyn KeyValueStore) -> Vec<ReminderRule> {
    let raw = match store.get(REMINDERS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("failed to read reminders: {e}");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(rules) => rules,
        Err(e) => {
            warn!("discarding corrupt reminder data: {e}");
            Vec::new()
        }
    }
}

/// CRUD over the persisted reminder collection.
pub struct ReminderStore {
    store: Arc<dyn KeyValueStore>,
    materializer: Arc<ScheduleMaterializer>,
}

impl ReminderStore {
    pub fn new(store: Arc<dyn KeyValueStore>, materializer: Arc<ScheduleMaterializer>) -> Self {
        Self {
            store,
            materializer,
        }
    }

    /// All persisted rules. Never fails: corrupt storage reads as empty.
    pub fn load_all(&self) -> Vec<ReminderRule> {
        load_rules(self.store.as_ref())
    }

    /// Look up one rule by id.
    pub fn find(&self, id: &str) -> Option<ReminderRule> {
        self.load_all().into_iter().find(|r| r.id == id)
    }

    /// Create a reminder from a draft.
    ///
    /// Assigns a fresh collision-free id, stamps `created_at`, persists, and
    /// if the rule is enabled immediately materializes just this rule. The
    /// next full reconciliation pass covers it as well.
    pub fn create(&self, draft: ReminderDraft) -> Result<ReminderRule> {
        validate_title(&draft.title)?;
        let recurrence = draft.recurrence.validated()?;

        let rule = ReminderRule {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            message: draft.message,
            time: draft.time,
            recurrence,
            enabled: draft.enabled,
            category: draft.category,
            sound: draft.sound,
            vibration: draft.vibration,
            priority: draft.priority,
            created_at: Utc::now(),
            last_triggered: None,
        };

        let mut rules = self.load_all();
        rules.push(rule.clone());
        self.persist(&rules)?;

        if rule.enabled {
            self.materializer.schedule_rule(&rule);
        }
        Ok(rule)
    }

    /// Merge a patch into an existing rule.
    ///
    /// Returns `Ok(false)` if the id is unknown. On success the stale
    /// instances are cancelled and the schedule rebuilt (the rule is
    /// rescheduled only if still enabled).
    pub fn update(&self, id: &str, patch: ReminderPatch) -> Result<bool> {
        let mut rules = self.load_all();
        let Some(rule) = rules.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        patch.apply(rule)?;
        self.persist(&rules)?;
        self.materializer.reschedule_all();
        Ok(true)
    }

    /// Remove a rule and cancel its pending instances.
    ///
    /// Returns `Ok(false)` if the id is unknown.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut rules = self.load_all();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Ok(false);
        }
        self.persist(&rules)?;
        self.materializer.cancel_rule(id);
        Ok(true)
    }

    /// Flip a rule's `enabled` flag.
    pub fn toggle(&self, id: &str) -> Result<bool> {
        let Some(rule) = self.find(id) else {
            return Ok(false);
        };
        self.update(
            id,
            ReminderPatch {
                enabled: Some(!rule.enabled),
                ..Default::default()
            },
        )
    }

    /// Delivery-feedback entry point: record that a rule fired.
    ///
    /// Persistence only, never touches the schedule.
    pub fn record_trigger(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut rules = self.load_all();
        let Some(rule) = rules.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        rule.last_triggered = Some(at);
        self.persist(&rules)?;
        Ok(true)
    }

    fn persist(&self, rules: &[ReminderRule]) -> Result<()> {
        let raw = serde_json::to_string(rules)?;
        self.store.set(REMINDERS_KEY, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{rule_prefix, MemorySink};
    use crate::reminder::{ClockTime, Importance, Recurrence, ReminderCategory};
    use crate::storage::MemoryKv;

    fn fixture() -> (Arc<MemoryKv>, Arc<MemorySink>, ReminderStore) {
        let kv = Arc::new(MemoryKv::new());
        let sink = Arc::new(MemorySink::new());
        let materializer = Arc::new(ScheduleMaterializer::new(kv.clone(), sink.clone()));
        let store = ReminderStore::new(kv.clone(), materializer);
        (kv, sink, store)
    }

    fn draft(title: &str, recurrence: Recurrence) -> ReminderDraft {
        ReminderDraft {
            title: title.to_string(),
            message: "Back to the books".to_string(),
            time: ClockTime::new(9, 0).unwrap(),
            recurrence,
            enabled: true,
            category: ReminderCategory::Study,
            sound: None,
            vibration: true,
            priority: Importance::Default,
        }
    }

    #[test]
    fn create_assigns_unique_ids_and_persists() {
        let (_, _, store) = fixture();
        let a = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();
        let b = store.create(draft("Flashcards", Recurrence::Daily)).unwrap();
        assert_ne!(a.id, b.id);

        let all = store.load_all();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.id == a.id));
        assert!(all.iter().any(|r| r.id == b.id));
    }

    #[test]
    fn create_enabled_rule_schedules_instances() {
        let (_, sink, store) = fixture();
        let rule = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();
        let prefix = rule_prefix(&rule.id);
        let pending = sink.pending();
        assert_eq!(pending.len(), 30);
        assert!(pending.iter().all(|i| i.trigger_id.starts_with(&prefix)));
    }

    #[test]
    fn create_disabled_rule_schedules_nothing() {
        let (_, sink, store) = fixture();
        let mut d = draft("Morning pages", Recurrence::Daily);
        d.enabled = false;
        store.create(d).unwrap();
        assert!(sink.pending().is_empty());
    }

    #[test]
    fn create_rejects_empty_weekly_days() {
        let (_, _, store) = fixture();
        let result = store.create(draft("Review", Recurrence::Weekly { days: vec![] }));
        assert!(result.is_err());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn create_rejects_blank_title() {
        let (_, _, store) = fixture();
        assert!(store.create(draft("   ", Recurrence::Daily)).is_err());
    }

    #[test]
    fn load_all_treats_corrupt_data_as_empty() {
        let (kv, _, store) = fixture();
        kv.set(REMINDERS_KEY, "not json at all").unwrap();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn update_unknown_id_returns_false() {
        let (_, _, store) = fixture();
        let patch = ReminderPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(!store.update("no-such-id", patch).unwrap());
    }

    #[test]
    fn update_merges_and_reschedules() {
        let (_, sink, store) = fixture();
        let rule = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();

        let patch = ReminderPatch {
            recurrence: Some(Recurrence::Once),
            ..Default::default()
        };
        assert!(store.update(&rule.id, patch).unwrap());

        let updated = store.find(&rule.id).unwrap();
        assert_eq!(updated.recurrence, Recurrence::Once);
        // Full reschedule replaced the 30 daily instances with a single one.
        assert_eq!(sink.pending().len(), 1);
    }

    #[test]
    fn delete_removes_rule_and_cancels_instances() {
        let (_, sink, store) = fixture();
        let keep = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();
        let gone = store.create(draft("Flashcards", Recurrence::Once)).unwrap();
        assert_eq!(sink.pending().len(), 31);

        assert!(store.delete(&gone.id).unwrap());
        assert!(!store.delete(&gone.id).unwrap());

        let pending = sink.pending();
        assert_eq!(pending.len(), 30);
        let keep_prefix = rule_prefix(&keep.id);
        assert!(pending.iter().all(|i| i.trigger_id.starts_with(&keep_prefix)));
        assert_eq!(store.load_all().len(), 1);
    }

    #[test]
    fn toggle_flips_enabled_and_clears_schedule() {
        let (_, sink, store) = fixture();
        let rule = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();
        assert_eq!(sink.pending().len(), 30);

        assert!(store.toggle(&rule.id).unwrap());
        assert!(!store.find(&rule.id).unwrap().enabled);
        assert!(sink.pending().is_empty());

        assert!(store.toggle(&rule.id).unwrap());
        assert!(store.find(&rule.id).unwrap().enabled);
        assert_eq!(sink.pending().len(), 30);
    }

    #[test]
    fn record_trigger_sets_last_triggered_only() {
        let (_, sink, store) = fixture();
        let rule = store.create(draft("Morning pages", Recurrence::Daily)).unwrap();
        let before = sink.pending();

        let now = Utc::now();
        assert!(store.record_trigger(&rule.id, now).unwrap());
        assert!(!store.record_trigger("no-such-id", now).unwrap());

        assert_eq!(store.find(&rule.id).unwrap().last_triggered, Some(now));
        assert_eq!(sink.pending(), before);
    }
}
