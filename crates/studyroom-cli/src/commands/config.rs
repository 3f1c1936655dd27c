use clap::Subcommand;

use studyroom_core::{ClockTime, Importance, ReminderCategory};

use super::common;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Enable all reminder notifications
    Enable,
    /// Disable all reminder notifications (cancels the schedule)
    Disable,
    /// Subscribe a category
    Subscribe {
        /// Category: study, break, goal, motivation, custom
        category: ReminderCategory,
    },
    /// Unsubscribe a category (its reminders stop being scheduled)
    Unsubscribe {
        /// Category: study, break, goal, motivation, custom
        category: ReminderCategory,
    },
    /// Set the default delivery time (HH:mm)
    SetTime { time: ClockTime },
    /// Set the default delivery importance
    SetImportance {
        /// low, default or high
        importance: Importance,
    },
    /// Set the default notification sound
    SetSound { name: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let (services, _) = common::services()?;
    let mut config = services.config.get();

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigAction::Enable => config.enabled = true,
        ConfigAction::Disable => config.enabled = false,
        ConfigAction::Subscribe { category } => {
            config.categories.insert(category);
        }
        ConfigAction::Unsubscribe { category } => {
            config.categories.remove(&category);
        }
        ConfigAction::SetTime { time } => config.daily_time = time,
        ConfigAction::SetImportance { importance } => config.importance = importance,
        ConfigAction::SetSound { name } => config.sound_name = name,
    }

    let outcome = services.config.save(&config)?;
    common::print_outcome(&outcome);
    Ok(())
}
