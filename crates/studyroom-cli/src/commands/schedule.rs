use clap::Subcommand;
use chrono::{Local, Utc};

use studyroom_core::{expand, notify::trigger_rule_id, Horizon};

use super::common;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Show the next occurrences of each enabled reminder
    Preview {
        /// Occurrences per reminder
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Rebuild the notification schedule from stored state
    Sync,
    /// List pending scheduled notifications
    Pending,
    /// Deliver all due notifications (catches up missed triggers)
    Dispatch,
    /// Show the last materialization pass
    Status,
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let (services, sink) = common::services()?;
    match action {
        ScheduleAction::Preview { count } => {
            let now = Local::now().naive_local();
            for rule in services.reminders.load_all() {
                if !rule.enabled {
                    continue;
                }
                println!("{}  {}", rule.title, rule.recurrence);
                for occurrence in expand(&rule, now, Horizon::Count(count)) {
                    println!("  {}", occurrence.fires_at);
                }
            }
        }
        ScheduleAction::Sync => {
            let outcome = services.materializer.reschedule_all();
            common::print_outcome(&outcome);
        }
        ScheduleAction::Pending => {
            for trigger in sink.pending()? {
                println!(
                    "{}  {}  {}",
                    trigger.fires_at, trigger.trigger_id, trigger.payload.title
                );
            }
        }
        ScheduleAction::Dispatch => {
            let delivered = sink.dispatch_due(Local::now().naive_local())?;
            for trigger in &delivered {
                if let Some(rule_id) = trigger_rule_id(&trigger.trigger_id) {
                    services.reminders.record_trigger(rule_id, Utc::now())?;
                }
            }
            println!("delivered {} notification(s)", delivered.len());
        }
        ScheduleAction::Status => match services.materializer.diagnostics() {
            Some(diagnostics) => {
                println!("last pass: {}", diagnostics.last_scheduled);
                common::print_outcome(&diagnostics.outcome);
            }
            None => println!("no materialization pass recorded yet"),
        },
    }
    Ok(())
}
