//! Expansion of reminder rules into concrete scheduled instances.
//!
//! `reschedule_all` is the single reconciliation pass: cancel everything in
//! our trigger namespace, then recreate from the persisted state. Passes are
//! serialized by an internal mutex so overlapping calls cannot interleave
//! their cancel/schedule sequences -- the later call's state wins.
//!
//! A pass never fails: sink rejections are logged per instance and counted,
//! and total sink or permission loss degrades to "zero effective
//! deliveries", reported through [`ScheduleOutcome`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::load_config;
use crate::error::SinkError;
use crate::notify::{
    namespace_prefix, rule_prefix, trigger_id, NotificationPayload, NotificationSink,
    ScheduledInstance,
};
use crate::reminder::recurrence::{expand, Horizon};
use crate::reminder::store::load_rules;
use crate::reminder::{Recurrence, ReminderRule};
use crate::storage::KeyValueStore;

/// Lookahead horizons per rule kind. Far-future instances would be stale by
/// the time they matter, and platform schedulers cap pending requests.
const DAILY_LOOKAHEAD_DAYS: usize = 30;
const WEEKLY_LOOKAHEAD_WEEKS: usize = 12;
const MONTHLY_LOOKAHEAD_MONTHS: usize = 12;

/// Storage key for materialization diagnostics.
pub const DIAGNOSTICS_KEY: &str = "scheduleDiagnostics";

/// Result of one materialization pass.
///
/// A pass always ends in a consistent state; a degraded pass reports how
/// instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// Instances handed to the sink.
    pub scheduled: usize,
    /// Rules skipped because they are disabled or their category is not
    /// subscribed.
    pub skipped_rules: usize,
    /// Individual sink rejections (logged, batch continued).
    pub failed: usize,
    /// Notification permission was missing; nothing will actually fire.
    pub permission_denied: bool,
    /// The sink could not be reached at all.
    pub sink_unavailable: bool,
}

impl ScheduleOutcome {
    /// Whether the pass left zero effective deliveries for a reason the UI
    /// should warn about.
    pub fn degraded(&self) -> bool {
        self.permission_denied || self.sink_unavailable
    }
}

/// Materialization diagnostics persisted for the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDiagnostics {
    pub last_scheduled: DateTime<Utc>,
    pub outcome: ScheduleOutcome,
}

/// Expands enabled reminder rules into concrete trigger instants and keeps
/// the platform sink reconciled with the persisted state.
pub struct ScheduleMaterializer {
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn NotificationSink>,
    /// Serializes reconciliation passes.
    pass: Mutex<()>,
}

impl ScheduleMaterializer {
    pub fn new(store: Arc<dyn KeyValueStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            sink,
            pass: Mutex::new(()),
        }
    }

    /// Cancel-then-recreate reconciliation against the device-local clock.
    pub fn reschedule_all(&self) -> ScheduleOutcome {
        self.reschedule_all_at(Local::now().naive_local())
    }

    /// Reconcile against an explicit "now".
    pub fn reschedule_all_at(&self, now: NaiveDateTime) -> ScheduleOutcome {
        let _guard = lock_pass(&self.pass);
        let mut outcome = ScheduleOutcome::default();

        if let Err(e) = self.sink.cancel_prefix(&namespace_prefix()) {
            warn!("cancel pass failed, leaving sink untouched: {e}");
            outcome.sink_unavailable = true;
            return outcome;
        }

        let config = load_config(self.store.as_ref());
        if !config.enabled {
            // Master switch off: the empty schedule is the desired state.
            self.record_diagnostics(&outcome);
            return outcome;
        }

        if !self.sink.permission_granted() {
            outcome.permission_denied = true;
        }

        for rule in load_rules(self.store.as_ref()) {
            if !rule.enabled || !config.categories.contains(&rule.category) {
                outcome.skipped_rules += 1;
                continue;
            }
            self.schedule_instances(&rule, now, &mut outcome);
        }

        debug!(
            scheduled = outcome.scheduled,
            skipped = outcome.skipped_rules,
            failed = outcome.failed,
            "materialization pass complete"
        );
        self.record_diagnostics(&outcome);
        outcome
    }

    /// Incremental path used when a single rule is created: adds that rule's
    /// instances without touching the rest of the schedule.
    pub fn schedule_rule(&self, rule: &ReminderRule) -> ScheduleOutcome {
        self.schedule_rule_at(rule, Local::now().naive_local())
    }

    /// Incremental scheduling against an explicit "now".
    pub fn schedule_rule_at(&self, rule: &ReminderRule, now: NaiveDateTime) -> ScheduleOutcome {
        let _guard = lock_pass(&self.pass);
        let mut outcome = ScheduleOutcome::default();

        let config = load_config(self.store.as_ref());
        if !config.enabled || !rule.enabled || !config.categories.contains(&rule.category) {
            outcome.skipped_rules = 1;
            return outcome;
        }
        if !self.sink.permission_granted() {
            outcome.permission_denied = true;
        }
        self.schedule_instances(rule, now, &mut outcome);
        outcome
    }

    /// Scoped cancellation of one rule's pending instances.
    pub fn cancel_rule(&self, rule_id: &str) {
        let _guard = lock_pass(&self.pass);
        if let Err(e) = self.sink.cancel_prefix(&rule_prefix(rule_id)) {
            warn!("failed to cancel instances for {rule_id}: {e}");
        }
    }

    /// Immediate one-off delivery, bypassing the schedule.
    pub fn send_test(&self, rule: &ReminderRule) -> Result<(), SinkError> {
        self.sink.deliver_now(&NotificationPayload::from_rule(rule))
    }

    /// Diagnostics recorded by the most recent pass, if any.
    pub fn diagnostics(&self) -> Option<ScheduleDiagnostics> {
        let raw = self.store.get(DIAGNOSTICS_KEY).ok()??;
        serde_json::from_str(&raw).ok()
    }

    fn schedule_instances(
        &self,
        rule: &ReminderRule,
        now: NaiveDateTime,
        outcome: &mut ScheduleOutcome,
    ) {
        let payload = NotificationPayload::from_rule(rule);
        for occurrence in expand(rule, now, rule_horizon(&rule.recurrence)) {
            let instance = ScheduledInstance {
                trigger_id: trigger_id(&rule.id, occurrence.index),
                fires_at: occurrence.fires_at,
                payload: payload.clone(),
            };
            match self.sink.schedule(&instance) {
                Ok(()) => outcome.scheduled += 1,
                Err(SinkError::PermissionDenied) => {
                    outcome.permission_denied = true;
                    outcome.failed += 1;
                }
                Err(e) => {
                    warn!("sink rejected {}: {e}", instance.trigger_id);
                    outcome.failed += 1;
                }
            }
        }
    }

    fn record_diagnostics(&self, outcome: &ScheduleOutcome) {
        let diagnostics = ScheduleDiagnostics {
            last_scheduled: Utc::now(),
            outcome: outcome.clone(),
        };
        match serde_json::to_string(&diagnostics) {
            Ok(raw) => {
                if let Err(e) = self.store.set(DIAGNOSTICS_KEY, &raw) {
                    warn!("failed to record schedule diagnostics: {e}");
                }
            }
            Err(e) => warn!("failed to encode schedule diagnostics: {e}"),
        }
    }
}

fn lock_pass(pass: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    match pass.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn rule_horizon(recurrence: &Recurrence) -> Horizon {
    match recurrence {
        Recurrence::Once => Horizon::Count(1),
        Recurrence::Daily => Horizon::Count(DAILY_LOOKAHEAD_DAYS),
        Recurrence::Weekly { days } => {
            Horizon::Count(WEEKLY_LOOKAHEAD_WEEKS * days.len().max(1))
        }
        Recurrence::Monthly { .. } => Horizon::Count(MONTHLY_LOOKAHEAD_MONTHS),
    }
}
