use clap::Subcommand;

use studyroom_core::{
    next_occurrence, ClockTime, Importance, Recurrence, ReminderCategory, ReminderDraft,
    ReminderPatch,
};

use super::common;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Create a reminder
    Add {
        /// Short title shown in the notification
        title: String,
        /// Notification body
        #[arg(long, default_value = "")]
        message: String,
        /// Delivery time (HH:mm, device-local); defaults to the configured
        /// daily time
        #[arg(long)]
        time: Option<ClockTime>,
        /// Recurrence: "once", "daily", "weekly:0,3" (0 = Sunday), "monthly:15"
        #[arg(long, default_value = "daily", value_parser = parse_recurrence)]
        repeat: Recurrence,
        /// Category: study, break, goal, motivation, custom
        #[arg(long, default_value = "study")]
        category: ReminderCategory,
        /// Priority: low, default, high
        #[arg(long)]
        priority: Option<Importance>,
        /// Notification sound name
        #[arg(long)]
        sound: Option<String>,
        /// Create the reminder disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List reminders
    List,
    /// Update fields on a reminder
    Update {
        /// Reminder id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// Delivery time (HH:mm)
        #[arg(long)]
        time: Option<ClockTime>,
        /// Recurrence: "once", "daily", "weekly:0,3", "monthly:15"
        #[arg(long, value_parser = parse_recurrence)]
        repeat: Option<Recurrence>,
        #[arg(long)]
        category: Option<ReminderCategory>,
        #[arg(long)]
        priority: Option<Importance>,
    },
    /// Delete a reminder
    Delete {
        /// Reminder id
        id: String,
    },
    /// Enable or disable a reminder
    Toggle {
        /// Reminder id
        id: String,
    },
    /// Fire a reminder immediately as a test
    Test {
        /// Reminder id
        id: String,
    },
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let (services, _) = common::services()?;
    match action {
        ReminderAction::Add {
            title,
            message,
            time,
            repeat,
            category,
            priority,
            sound,
            disabled,
        } => {
            let config = services.config.get();
            let draft = ReminderDraft {
                title,
                message,
                time: time.unwrap_or(config.daily_time),
                recurrence: repeat,
                enabled: !disabled,
                category,
                sound: sound.or_else(|| Some(config.sound_name.clone())),
                vibration: true,
                priority: priority.unwrap_or(config.importance),
            };
            let rule = services.reminders.create(draft)?;
            println!("created {}", rule.id);
            let now = chrono::Local::now().naive_local();
            if let Some(next) = next_occurrence(&rule, now) {
                println!("next: {next}");
            }
        }
        ReminderAction::List => {
            let now = chrono::Local::now().naive_local();
            for rule in services.reminders.load_all() {
                let state = if rule.enabled { "on" } else { "off" };
                let next = next_occurrence(&rule, now)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  [{state:>3}] {:<10} {}  {:<22} next {next}  {}",
                    rule.id, rule.category, rule.time, rule.recurrence, rule.title
                );
            }
        }
        ReminderAction::Update {
            id,
            title,
            message,
            time,
            repeat,
            category,
            priority,
        } => {
            let patch = ReminderPatch {
                title,
                message,
                time,
                recurrence: repeat,
                category,
                priority,
                ..Default::default()
            };
            if services.reminders.update(&id, patch)? {
                println!("ok");
            } else {
                return Err(format!("unknown reminder: {id}").into());
            }
        }
        ReminderAction::Delete { id } => {
            if services.reminders.delete(&id)? {
                println!("deleted {id}");
            } else {
                return Err(format!("unknown reminder: {id}").into());
            }
        }
        ReminderAction::Toggle { id } => {
            if services.reminders.toggle(&id)? {
                let rule = services.reminders.find(&id);
                let state = rule.map(|r| r.enabled).unwrap_or(false);
                println!("{}", if state { "enabled" } else { "disabled" });
            } else {
                return Err(format!("unknown reminder: {id}").into());
            }
        }
        ReminderAction::Test { id } => {
            let Some(rule) = services.reminders.find(&id) else {
                return Err(format!("unknown reminder: {id}").into());
            };
            services.materializer.send_test(&rule)?;
            println!("test notification sent");
        }
    }
    Ok(())
}

fn parse_recurrence(s: &str) -> Result<Recurrence, String> {
    let (kind, arg) = match s.split_once(':') {
        Some((kind, arg)) => (kind, Some(arg)),
        None => (s, None),
    };
    match (kind, arg) {
        ("once", None) => Ok(Recurrence::Once),
        ("daily", None) => Ok(Recurrence::Daily),
        ("weekly", Some(days)) => {
            let days = days
                .split(',')
                .map(|d| d.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("invalid weekday list: {e}"))?;
            Ok(Recurrence::Weekly { days })
        }
        ("monthly", Some(day)) => {
            let day_of_month = day
                .trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid day of month: {e}"))?;
            Ok(Recurrence::Monthly { day_of_month })
        }
        _ => Err(format!(
            "unknown recurrence '{s}' (expected once, daily, weekly:<days>, monthly:<day>)"
        )),
    }
}
