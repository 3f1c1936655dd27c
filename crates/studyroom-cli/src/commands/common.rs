//! Shared service wiring for CLI commands.

use std::sync::Arc;

use studyroom_core::{ScheduleOutcome, Services, SqliteKv};

use crate::sink::LocalSink;

/// Open the on-disk store and build the service context every command uses.
///
/// The concrete sink is returned alongside the services for commands that
/// inspect or dispatch the pending-trigger registry directly.
pub fn services() -> Result<(Services, Arc<LocalSink>), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteKv::open_default()?);
    let sink = Arc::new(LocalSink::new(store.clone()));
    Ok((Services::new(store, sink.clone()), sink))
}

/// One-line summary of a materialization pass, with degradation warnings.
pub fn print_outcome(outcome: &ScheduleOutcome) {
    println!(
        "scheduled {} notification(s), skipped {} rule(s)",
        outcome.scheduled, outcome.skipped_rules
    );
    if outcome.failed > 0 {
        eprintln!("warning: {} instance(s) were rejected by the sink", outcome.failed);
    }
    if outcome.permission_denied {
        eprintln!("warning: notification permission missing; nothing will be delivered");
    }
    if outcome.sink_unavailable {
        eprintln!("warning: notification sink unavailable; schedule left empty");
    }
}
