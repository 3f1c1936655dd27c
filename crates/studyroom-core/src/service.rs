//! Process-wide service wiring.
//!
//! One [`Services`] context is constructed at process start and passed by
//! reference to whatever needs it -- no module-level singletons, no hidden
//! initialization flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ConfigService;
use crate::notify::materializer::{ScheduleMaterializer, ScheduleOutcome};
use crate::notify::NotificationSink;
use crate::reminder::ReminderStore;
use crate::storage::KeyValueStore;

/// The service context: reminder CRUD, configuration, and the materializer,
/// all sharing one store and one sink.
pub struct Services {
    pub reminders: ReminderStore,
    pub config: ConfigService,
    pub materializer: Arc<ScheduleMaterializer>,
    initialized: AtomicBool,
}

impl Services {
    pub fn new(store: Arc<dyn KeyValueStore>, sink: Arc<dyn NotificationSink>) -> Self {
        let materializer = Arc::new(ScheduleMaterializer::new(store.clone(), sink));
        Self {
            reminders: ReminderStore::new(store.clone(), materializer.clone()),
            config: ConfigService::new(store, materializer.clone()),
            materializer,
            initialized: AtomicBool::new(false),
        }
    }

    /// Run the boot reconciliation pass once.
    ///
    /// A guarded no-op on every later call: returns `None` without touching
    /// the schedule.
    pub fn initialize(&self) -> Option<ScheduleOutcome> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.materializer.reschedule_all())
    }
}
