use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cwl_tracker::config::AppConfig;
use cwl_tracker::parse_duration;
use cwl_tracker::storage::{self, StorageConfig};
use cwl_tracker::sync::{SeasonUpdater, SyncConfig};

#[derive(Parser)]
#[command(name = "cwl-tracker")]
#[command(about = "Clan War League season tracker")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the current season and update the stored snapshots
    Update {
        /// Tracked team tag (overrides config)
        #[arg(long)]
        team: Option<String>,

        /// Build the snapshot but don't write anything
        #[arg(long)]
        dry_run: bool,

        /// Keep running, updating at the interval
        #[arg(long)]
        watch: bool,

        /// Update interval for --watch (e.g., "1h", "30m")
        #[arg(long, default_value = "1h")]
        interval: String,
    },

    /// Re-render the member table of a stored season
    Report {
        /// Season key (YYYY-MM)
        #[arg(long)]
        season: String,
    },

    /// Print the stored season index
    Index,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting cwl-tracker v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Update {
            team,
            dry_run,
            watch,
            interval,
        } => {
            if let Some(team) = team {
                config.team.tag = team;
            }

            let mut sync_config = SyncConfig::from_app(&config)?;
            sync_config.dry_run = dry_run;
            sync_config.interval =
                parse_duration(&interval).unwrap_or(Duration::from_secs(3600));

            let updater = SeasonUpdater::connect(&config, sync_config)?;

            if watch {
                tracing::info!("Running periodic update (interval: {})...", interval);
                let updater = Arc::new(updater);
                tokio::select! {
                    _ = Arc::clone(&updater).run_periodic() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping");
                        updater.cancel().await;
                    }
                }
                return Ok(());
            }

            let result = updater.run_once().await?;
            let snapshot = &result.snapshot;
            let meta = snapshot.meta;

            println!("\n=== Update Results ===");
            println!("Season:           {}", snapshot.title);
            println!("League:           {}", snapshot.league_name);
            println!(
                "Rounds completed: {}{}",
                meta.rounds_completed,
                if snapshot.is_final { " (final)" } else { "" }
            );
            if let Some(active) = meta.active_round {
                println!("Active round:     {}", active);
            }
            println!("Teams:            {}", snapshot.team_standings.len());
            println!("Members:          {}", snapshot.member_overview.len());
            println!("Wars fetched:     {}", result.wars_fetched);
            println!("Duration:         {:?}", result.duration);
            if result.history_written {
                println!("\nSeason archived to history");
            }
            if dry_run {
                println!("\n(dry run - no data written to disk)");
            }
        }
        Commands::Report { season } => {
            let pattern = Regex::new(r"^\d{4}-\d{2}$").unwrap();
            if !pattern.is_match(&season) {
                bail!("Invalid --season (expected YYYY-MM): {}", season);
            }

            let snapshot = storage::read_history(&storage, &season)
                .with_context(|| format!("no stored history for {}", season))?;
            match storage::write_member_table(&storage, &snapshot)? {
                Some(table) => {
                    println!(
                        "Wrote {} rows to {}",
                        table.rows.len(),
                        storage.table_path(&season).display()
                    );
                }
                None => {
                    eprintln!("Season {} has no season key; nothing rendered", season);
                }
            }
        }
        Commands::Index => {
            let index = storage::load_index(&storage, Utc::now());
            if index.seasons.is_empty() {
                println!("No seasons recorded yet.");
            } else {
                println!("{:<10} TITLE", "SEASON");
                for entry in &index.seasons {
                    println!("{:<10} {}", entry.season_key, entry.title);
                }
            }
        }
    }

    Ok(())
}
