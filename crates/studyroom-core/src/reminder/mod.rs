//! Reminder definitions: recurrence rules, categories, validation.
//!
//! A [`ReminderRule`] pairs a display payload with a wall-clock delivery time
//! and a [`Recurrence`]. Weekday numbering follows the device convention:
//! 0 = Sunday .. 6 = Saturday.

pub mod recurrence;
pub mod store;

pub use recurrence::{expand, next_occurrence, Horizon, Occurrence};
pub use store::ReminderStore;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Wall-clock time of day, interpreted in device-local time at evaluation.
///
/// Serialized as "HH:mm".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidClockTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub(crate) fn to_naive(self) -> NaiveTime {
        // hour/minute are validated at the parse boundary
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime(s.to_string());
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// The abstract schedule attached to a reminder, independent of any
/// concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recurrence {
    /// Fires a single time at the next upcoming instant of the reminder time.
    Once,
    /// Fires every day.
    Daily,
    /// Fires on each selected weekday. 0 = Sunday .. 6 = Saturday.
    Weekly { days: Vec<u8> },
    /// Fires once a month, clamped to the last day of shorter months.
    Monthly { day_of_month: u8 },
}

impl Recurrence {
    /// Validate and normalize (weekly days sorted, deduplicated).
    ///
    /// An empty weekday set is rejected: a rule that can never fire is a
    /// configuration mistake, not a schedule.
    pub fn validated(self) -> Result<Self, ValidationError> {
        match self {
            Recurrence::Weekly { mut days } => {
                if days.is_empty() {
                    return Err(ValidationError::EmptyWeekdays);
                }
                if let Some(&bad) = days.iter().find(|&&d| d > 6) {
                    return Err(ValidationError::InvalidWeekday(bad));
                }
                days.sort_unstable();
                days.dedup();
                Ok(Recurrence::Weekly { days })
            }
            Recurrence::Monthly { day_of_month } => {
                if !(1..=31).contains(&day_of_month) {
                    return Err(ValidationError::InvalidDayOfMonth(day_of_month));
                }
                Ok(Recurrence::Monthly { day_of_month })
            }
            other => Ok(other),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Once => write!(f, "once"),
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly { days } => {
                let names: Vec<&str> = days
                    .iter()
                    .map(|&d| WEEKDAY_NAMES[usize::from(d) % 7])
                    .collect();
                write!(f, "weekly on {}", names.join(","))
            }
            Recurrence::Monthly { day_of_month } => write!(f, "monthly on day {day_of_month}"),
        }
    }
}

/// Category label for filtering and display. Not used by scheduling math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderCategory {
    Study,
    Break,
    Goal,
    Motivation,
    Custom,
}

impl ReminderCategory {
    pub const ALL: [ReminderCategory; 5] = [
        ReminderCategory::Study,
        ReminderCategory::Break,
        ReminderCategory::Goal,
        ReminderCategory::Motivation,
        ReminderCategory::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReminderCategory::Study => "study",
            ReminderCategory::Break => "break",
            ReminderCategory::Goal => "goal",
            ReminderCategory::Motivation => "motivation",
            ReminderCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for ReminderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReminderCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "category".to_string(),
                message: format!("unknown category '{s}'"),
            })
    }
}

/// Delivery importance hint passed through to the platform sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Default,
    High,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Default => "default",
            Importance::High => "high",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Importance::Low),
            "default" => Ok(Importance::Default),
            "high" => Ok(Importance::High),
            _ => Err(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!("unknown priority '{s}'"),
            }),
        }
    }
}

/// A user-defined reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRule {
    /// Opaque unique id, assigned at creation, stable for the rule's lifetime.
    pub id: String,
    pub title: String,
    pub message: String,
    /// Wall-clock delivery time, device-local.
    pub time: ClockTime,
    pub recurrence: Recurrence,
    pub enabled: bool,
    pub category: ReminderCategory,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default)]
    pub priority: Importance,
    pub created_at: DateTime<Utc>,
    /// Set by delivery feedback, never by scheduling.
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

/// Input for creating a reminder. Identity and timestamps are assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub time: ClockTime,
    pub recurrence: Recurrence,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub category: ReminderCategory,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default)]
    pub priority: Importance,
}

/// Field-by-field patch for [`ReminderStore::update`]. `None` leaves the
/// field untouched; `sound: Some(None)` clears the sound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time: Option<ClockTime>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub category: Option<ReminderCategory>,
    #[serde(default)]
    pub sound: Option<Option<String>>,
    #[serde(default)]
    pub vibration: Option<bool>,
    #[serde(default)]
    pub priority: Option<Importance>,
}

impl ReminderPatch {
    /// Merge into an existing rule. Validation happens before any field is
    /// written, so a rejected patch leaves the rule untouched.
    pub fn apply(self, rule: &mut ReminderRule) -> Result<(), ValidationError> {
        let recurrence = self.recurrence.map(Recurrence::validated).transpose()?;
        if let Some(title) = &self.title {
            validate_title(title)?;
        }

        if let Some(recurrence) = recurrence {
            rule.recurrence = recurrence;
        }
        if let Some(title) = self.title {
            rule.title = title;
        }
        if let Some(message) = self.message {
            rule.message = message;
        }
        if let Some(time) = self.time {
            rule.time = time;
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(category) = self.category {
            rule.category = category;
        }
        if let Some(sound) = self.sound {
            rule.sound = sound;
        }
        if let Some(vibration) = self.vibration {
            rule.vibration = vibration;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        Ok(())
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".to_string(),
            message: "title must not be empty".to_string(),
        });
    }
    Ok(())
}

fn default_true() -> bool {
    true
}
