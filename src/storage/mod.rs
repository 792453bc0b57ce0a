//! Filesystem layout and JSON persistence.
//!
//! ```text
//! data/
//!   cwl_current.json                         latest snapshot
//!   cwl_index.json                           season index
//!   cwl_history/{season}.json                final snapshots
//!   cwl_tables/{season}_member_overview.table.json
//! ```

mod json;

pub use json::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn current_path(&self) -> PathBuf {
        self.data_dir.join("cwl_current.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("cwl_index.json")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("cwl_history")
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.data_dir.join("cwl_tables")
    }

    pub fn history_path(&self, season_key: &str) -> PathBuf {
        self.history_dir().join(format!("{}.json", season_key))
    }

    pub fn table_path(&self, season_key: &str) -> PathBuf {
        self.tables_dir()
            .join(format!("{}_member_overview.table.json", season_key))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.current_path(), PathBuf::from("/data/cwl_current.json"));
        assert_eq!(config.index_path(), PathBuf::from("/data/cwl_index.json"));
        assert_eq!(config.history_dir(), PathBuf::from("/data/cwl_history"));
        assert_eq!(
            config.history_path("2025-06"),
            PathBuf::from("/data/cwl_history/2025-06.json")
        );
        assert_eq!(
            config.table_path("2025-06"),
            PathBuf::from("/data/cwl_tables/2025-06_member_overview.table.json")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
