//! Season updater.
//!
//! One update run:
//! 1. Ensure the data layout and season index exist
//! 2. Fetch the tracked team's league group
//! 3. Aggregate every round into a season snapshot
//! 4. Write the current snapshot, the index, and history once final

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::calculate::{aggregate_season, WarCache};
use crate::config::{AppConfig, ConfigError};
use crate::fetch::{ApiClient, WarSource};
use crate::models::{
    season_key_and_title, ApiLeagueGroup, SeasonSnapshot, SnapshotState, FALLBACK_LEAGUE_NAME,
};
use crate::storage::{self, StorageConfig};

/// Errors that can occur during an update.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration for update runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Canonical tracked team tag
    pub team_tag: String,

    /// Competition name used in titles
    pub competition_name: String,

    /// Build the snapshot but don't write anything
    pub dry_run: bool,

    /// Interval for periodic updates
    pub interval: Duration,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            team_tag: String::new(),
            competition_name: "CWL".to_string(),
            dry_run: false,
            interval: Duration::from_secs(3600),
            storage: StorageConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Build from a validated application config.
    pub fn from_app(app: &AppConfig) -> Result<Self, ConfigError> {
        app.validate()?;
        Ok(Self {
            team_tag: app.team_tag(),
            competition_name: app.team.competition_name.trim().to_string(),
            storage: StorageConfig::new(app.data_dir.clone()),
            ..Default::default()
        })
    }
}

/// Result of an update run.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub snapshot: SeasonSnapshot,
    pub wars_fetched: usize,
    pub history_written: bool,
    pub duration: Duration,
}

/// Drives one season update against a war source.
pub struct SeasonUpdater {
    config: SyncConfig,
    source: Arc<dyn WarSource>,
    cancel_token: Arc<RwLock<bool>>,
}

impl SeasonUpdater {
    pub fn new(config: SyncConfig, source: Arc<dyn WarSource>) -> Self {
        Self {
            config,
            source,
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    /// Updater backed by the live API.
    pub fn connect(app: &AppConfig, config: SyncConfig) -> Result<Self, SyncError> {
        let client = ApiClient::new(app.api.client_config()?)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Stop a periodic run before its next tick.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Run updates at the configured interval until cancelled. A failed
    /// run is logged and retried on the next tick.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.config.interval);

        info!("Starting periodic update every {:?}", self.config.interval);

        loop {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                info!("Periodic update stopped");
                break;
            }

            match self.run_once().await {
                Ok(result) => {
                    info!(
                        "Periodic update completed: {} (final: {})",
                        result.snapshot.title, result.snapshot.is_final
                    );
                }
                Err(e) => {
                    error!("Periodic update failed: {}", e);
                }
            }
        }
    }

    /// Run a single update with the current clock.
    pub async fn run_once(&self) -> Result<SyncResult, SyncError> {
        self.run_once_at(Utc::now()).await
    }

    /// Run a single update as of `now`.
    ///
    /// Every fetch happens before the first write, so a transport failure
    /// leaves the stored files untouched.
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<SyncResult, SyncError> {
        let start = Instant::now();
        let team_tag = self.config.team_tag.as_str();
        info!("Updating season for {}", team_tag);

        let mut cache = WarCache::new(self.source.as_ref());
        let snapshot = match self.source.league_group(team_tag).await? {
            Some(group) => self.active_snapshot(&group, &mut cache, now).await?,
            None => {
                info!("{} is not in a league group", team_tag);
                let league_name = self.league_name(None).await;
                SeasonSnapshot::not_in_competition(&self.config.competition_name, league_name, now)
            }
        };
        let wars_fetched = cache.fetched();

        let history_written = if self.config.dry_run {
            info!(
                "Dry run: {} ({}), final: {}, {} teams, {} members; nothing written",
                snapshot.title,
                snapshot.league_name,
                snapshot.is_final,
                snapshot.team_standings.len(),
                snapshot.member_overview.len()
            );
            false
        } else {
            self.persist(&snapshot, now)?
        };

        let result = SyncResult {
            snapshot,
            wars_fetched,
            history_written,
            duration: start.elapsed(),
        };
        info!(
            "Update complete in {:?}: {} wars fetched, history written: {}",
            result.duration, result.wars_fetched, result.history_written
        );
        Ok(result)
    }

    async fn active_snapshot(
        &self,
        group: &ApiLeagueGroup,
        cache: &mut WarCache<'_>,
        now: DateTime<Utc>,
    ) -> Result<SeasonSnapshot, SyncError> {
        info!(
            "League group {} with {} rounds",
            group.season.as_deref().unwrap_or("(no season)"),
            group.rounds.len()
        );

        let aggregate = aggregate_season(group, &self.config.team_tag, cache).await?;
        let (season_key, title) =
            season_key_and_title(group.season.as_deref(), now, &self.config.competition_name);
        let league_name = self.league_name(Some(group)).await;

        Ok(aggregate.into_snapshot(season_key, title, league_name, now))
    }

    /// League name from the group, then the team profile, then a fallback.
    async fn league_name(&self, group: Option<&ApiLeagueGroup>) -> String {
        if let Some(name) = group.and_then(ApiLeagueGroup::league_name) {
            return name;
        }
        match self.source.team_profile(&self.config.team_tag).await {
            Ok(profile) => profile
                .league_name()
                .unwrap_or_else(|| FALLBACK_LEAGUE_NAME.to_string()),
            Err(e) => {
                warn!("Failed to fetch team profile for league name: {}", e);
                FALLBACK_LEAGUE_NAME.to_string()
            }
        }
    }

    fn persist(&self, snapshot: &SeasonSnapshot, now: DateTime<Utc>) -> Result<bool, SyncError> {
        let storage = &self.config.storage;
        storage::ensure_layout(storage)?;
        storage::ensure_index(storage, now)?;
        storage::write_current(storage, snapshot)?;

        if snapshot.state != SnapshotState::Active {
            return Ok(false);
        }
        if let Some(season_key) = snapshot.season_key.as_deref() {
            storage::upsert_index(storage, season_key, &snapshot.title, now)?;
        }
        Ok(storage::write_history_if_final(storage, snapshot)?)
    }
}
