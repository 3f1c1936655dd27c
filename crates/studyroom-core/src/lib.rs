//! # Studyroom Core Library
//!
//! This library provides the core business logic for Studyroom, a personal
//! study-tracking app: reminder definitions, recurrence math, and local
//! notification scheduling. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI shell
//! expected to stay a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Recurrence**: pure next-occurrence/expansion math over wall-clock
//!   instants -- no side effects, no storage access
//! - **Storage**: an opaque string-keyed store (SQLite-backed by default)
//!   holding reminders and configuration as JSON blobs under fixed keys
//! - **Materialization**: cancel-then-recreate reconciliation of recurrence
//!   rules into concrete trigger instants handed to a platform sink
//!
//! ## Key Components
//!
//! - [`ReminderStore`]: reminder CRUD with schedule upkeep
//! - [`ScheduleMaterializer`]: the reconciliation pass
//! - [`ConfigService`]: configuration persistence choke point
//! - [`NotificationSink`]: platform scheduler boundary

pub mod config;
pub mod error;
pub mod notify;
pub mod reminder;
pub mod service;
pub mod storage;

pub use config::{ConfigService, GlobalConfig};
pub use error::{CoreError, Result, SinkError, StorageError, ValidationError};
pub use notify::{
    MemorySink, NotificationPayload, NotificationSink, ScheduleMaterializer, ScheduleOutcome,
    ScheduledInstance,
};
pub use reminder::{
    expand, next_occurrence, ClockTime, Horizon, Importance, Occurrence, Recurrence,
    ReminderCategory, ReminderDraft, ReminderPatch, ReminderRule, ReminderStore,
};
pub use service::Services;
pub use storage::{data_dir, KeyValueStore, MemoryKv, SqliteKv};
