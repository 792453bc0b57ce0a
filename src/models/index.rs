//! Cross-season index of stored snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::iso_timestamp;

pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// One season listed in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub season_key: String,
    pub title: String,
}

/// All known seasons, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonIndex {
    pub schema_version: u32,
    #[serde(default)]
    pub seasons: Vec<IndexEntry>,
    pub updated_at: String,
}

impl SeasonIndex {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            seasons: Vec::new(),
            updated_at: iso_timestamp(now),
        }
    }

    /// Insert or replace the entry for `season_key`, keeping the list sorted
    /// descending by key.
    pub fn upsert(&mut self, season_key: &str, title: &str, now: DateTime<Utc>) {
        self.seasons.retain(|s| s.season_key != season_key);
        self.seasons.push(IndexEntry {
            season_key: season_key.to_string(),
            title: title.to_string(),
        });
        self.seasons.sort_by(|a, b| b.season_key.cmp(&a.season_key));
        self.updated_at = iso_timestamp(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upsert_sorts_descending() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut index = SeasonIndex::empty(now);

        index.upsert("2025-04", "2025 April CWL", now);
        index.upsert("2025-06", "2025 June CWL", now);
        index.upsert("2024-12", "2024 December CWL", now);

        let keys: Vec<&str> = index.seasons.iter().map(|s| s.season_key.as_str()).collect();
        assert_eq!(keys, vec!["2025-06", "2025-04", "2024-12"]);
    }

    #[test]
    fn test_upsert_replaces_title() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let mut index = SeasonIndex::empty(now);

        index.upsert("2025-06", "old", now);
        index.upsert("2025-06", "2025 June CWL", later);

        assert_eq!(index.seasons.len(), 1);
        assert_eq!(index.seasons[0].title, "2025 June CWL");
        assert_eq!(index.updated_at, "2025-06-02T00:00:00Z");
    }
}
