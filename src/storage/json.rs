//! JSON document storage.
//!
//! Every write goes to a sibling `.tmp` file first and is renamed into
//! place, so readers never observe a half-written document.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::calculate::build_member_table;
use crate::models::{ReportTable, SeasonIndex, SeasonSnapshot};

/// Output style for a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    Compact,
    Pretty,
}

/// Write a JSON document atomically, creating parent directories.
pub fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    style: JsonStyle,
) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let body = match style {
        JsonStyle::Compact => serde_json::to_string(value)?,
        JsonStyle::Pretty => serde_json::to_string_pretty(value)?,
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;

    debug!("Wrote {:?}", path);
    Ok(())
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Read a JSON document, falling back to `default` when it is missing or
/// unreadable.
pub fn read_json_or<T: DeserializeOwned>(path: &Path, default: T) -> T {
    match read_json(path) {
        Ok(value) => value,
        Err(StorageError::PathNotFound(_)) => default,
        Err(e) => {
            warn!("Ignoring unreadable {:?}: {}", path, e);
            default
        }
    }
}

/// Create the data, history and table directories.
pub fn ensure_layout(config: &StorageConfig) -> Result<(), StorageError> {
    fs::create_dir_all(&config.data_dir)?;
    fs::create_dir_all(config.history_dir())?;
    fs::create_dir_all(config.tables_dir())?;
    Ok(())
}

/// Create an empty season index if none exists yet.
pub fn ensure_index(config: &StorageConfig, now: DateTime<Utc>) -> Result<(), StorageError> {
    let path = config.index_path();
    if !path.exists() {
        write_json(&path, &SeasonIndex::empty(now), JsonStyle::Compact)?;
    }
    Ok(())
}

/// Load the season index; an absent or corrupt file yields an empty index.
pub fn load_index(config: &StorageConfig, now: DateTime<Utc>) -> SeasonIndex {
    read_json_or(&config.index_path(), SeasonIndex::empty(now))
}

/// Add or replace a season in the index.
pub fn upsert_index(
    config: &StorageConfig,
    season_key: &str,
    title: &str,
    now: DateTime<Utc>,
) -> Result<SeasonIndex, StorageError> {
    let mut index = load_index(config, now);
    index.upsert(season_key, title, now);
    write_json(&config.index_path(), &index, JsonStyle::Compact)?;
    info!("Index now lists {} seasons", index.seasons.len());
    Ok(index)
}

/// Write the current snapshot.
pub fn write_current(
    config: &StorageConfig,
    snapshot: &SeasonSnapshot,
) -> Result<(), StorageError> {
    write_json(&config.current_path(), snapshot, JsonStyle::Compact)?;
    info!("Wrote current snapshot to {:?}", config.current_path());
    Ok(())
}

/// Read a stored history snapshot.
pub fn read_history(
    config: &StorageConfig,
    season_key: &str,
) -> Result<SeasonSnapshot, StorageError> {
    read_json(&config.history_path(season_key))
}

/// Render and write the member table for a snapshot.
pub fn write_member_table(
    config: &StorageConfig,
    snapshot: &SeasonSnapshot,
) -> Result<Option<ReportTable>, StorageError> {
    let Some(season_key) = snapshot.season_key.as_deref() else {
        return Ok(None);
    };
    let table = build_member_table(snapshot);
    let path = config.table_path(season_key);
    write_json(&path, &table, JsonStyle::Pretty)?;
    info!("Wrote member table to {:?}", path);
    Ok(Some(table))
}

/// Persist a final snapshot to history and render its table. Non-final
/// snapshots are left alone; returns whether anything was written.
pub fn write_history_if_final(
    config: &StorageConfig,
    snapshot: &SeasonSnapshot,
) -> Result<bool, StorageError> {
    if !snapshot.is_final {
        return Ok(false);
    }
    let Some(season_key) = snapshot.season_key.as_deref() else {
        return Ok(false);
    };

    let path = config.history_path(season_key);
    write_json(&path, snapshot, JsonStyle::Compact)?;
    info!("Wrote final season {} to {:?}", season_key, path);

    write_member_table(config, snapshot)?;
    Ok(true)
}
