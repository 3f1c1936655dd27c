//! Opaque key-value storage for reminder and configuration state.
//!
//! Everything this subsystem persists is JSON serialized into single string
//! values under fixed keys. The store itself is a boundary trait so the core
//! never cares whether it is backed by SQLite, a mobile preference store, or
//! memory.

mod kv;

pub use kv::{MemoryKv, SqliteKv};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/studyroom[-dev]/` based on STUDYROOM_ENV.
///
/// Set STUDYROOM_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyroom-dev")
    } else {
        base_dir.join("studyroom")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Flat string-keyed storage.
///
/// `get` returns `None` for absent keys; `remove` of an absent key is a
/// no-op. Values are opaque to the store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
