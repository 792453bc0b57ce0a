//! Season snapshot written for the current season and kept as history.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of rounds in a league season.
pub const MAX_ROUNDS: u32 = 7;

/// Snapshot schema version.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 2;

/// League name used when neither the group nor the team profile has one.
pub const FALLBACK_LEAGUE_NAME: &str = "—";

/// Opponent name used when a resolved war's opposing side has no name.
pub const FALLBACK_OPPONENT_NAME: &str = "—";

/// Whether the team is currently in a league season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotState {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "notInCompetition", alias = "notInCwl")]
    NotInCompetition,
}

/// Progress helpers for consumers computing per-round denominators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonMeta {
    /// Best-effort current round (1..=7); absent when not in a season
    #[serde(alias = "activeWarDay")]
    pub active_round: Option<u32>,

    /// Rounds whose tracked-team war has ended
    #[serde(alias = "warsCompleted", default)]
    pub rounds_completed: u32,
}

/// One team's standing in the league group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub rank: u32,
    pub tag: String,
    pub name: String,
    pub wins: u32,
    pub bonus_stars: u32,
    pub stars_with_bonus: u32,

    /// Raw stars earned, without win bonus
    pub stars_total: u32,
    pub stars_no_bonus_total: u32,

    /// Stars conceded to opponents
    pub stars_against_total: u32,

    /// Sum of destruction percentages across counted wars
    pub destruction_total: f64,

    pub wars_completed: u32,
}

/// A member's result in one round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWar {
    pub war: u32,
    pub opponent_clan: Option<String>,
    pub team_size: Option<u32>,

    /// True rank of the attacked base in the opponent's lineup
    pub defender_pos: Option<u32>,
    pub defender_name: Option<String>,
    pub stars: Option<u32>,
    pub destruction: Option<f64>,
}

impl MemberWar {
    /// Placeholder for a round the member did not take part in.
    pub fn empty(war: u32) -> Self {
        Self {
            war,
            ..Default::default()
        }
    }

    pub fn has_outcome(&self) -> bool {
        self.stars.is_some() || self.destruction.is_some()
    }

    pub fn has_target(&self) -> bool {
        self.defender_pos.is_some() && self.defender_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Season totals for one tracked-team member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberOverview {
    pub name: String,
    pub tag: String,

    /// Mean true rank of attacked bases; `None` when no target resolved
    pub avg_rank_attacked: Option<f64>,

    /// Reserved; not computed by the aggregator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_def_rank: Option<f64>,

    pub total_stars: u32,
    pub total_destruction: f64,
    pub attacks_made: u32,

    /// Rounds in lineup whose war is active or ended; `None` in snapshots
    /// written without it
    #[serde(default)]
    pub wars_in_lineup: Option<u32>,

    pub avg_stars: f64,
    pub avg_destruction: f64,

    #[serde(default)]
    pub wars: Vec<MemberWar>,
}

/// Metadata for one of the tracked team's resolved wars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarMeta {
    pub war: u32,
    pub war_tag: String,
    pub opponent_clan: String,
    pub opponent_tag: String,
    pub team_size: Option<u32>,
    pub state: String,
}

/// The full season payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSnapshot {
    pub schema_version: u32,
    pub season_key: Option<String>,
    pub title: String,
    pub league_name: String,
    pub state: SnapshotState,
    pub generated_at: String,
    pub is_final: bool,
    pub team_size: Option<u32>,

    #[serde(default)]
    pub meta: SeasonMeta,

    /// Opponent name per round; empty where unknown
    #[serde(alias = "warOpponents", default)]
    pub round_opponents: [String; MAX_ROUNDS as usize],

    #[serde(alias = "leagueOverview", default)]
    pub team_standings: Vec<TeamStanding>,

    #[serde(default)]
    pub member_overview: Vec<MemberOverview>,

    #[serde(default)]
    pub wars_meta: Vec<WarMeta>,
}

impl SeasonSnapshot {
    /// Snapshot for a team that is not currently in a league season.
    pub fn not_in_competition(
        competition_name: &str,
        league_name: String,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            season_key: None,
            title: competition_name.to_string(),
            league_name,
            state: SnapshotState::NotInCompetition,
            generated_at: iso_timestamp(generated_at),
            is_final: false,
            team_size: None,
            meta: SeasonMeta {
                active_round: None,
                rounds_completed: 0,
            },
            round_opponents: Default::default(),
            team_standings: Vec::new(),
            member_overview: Vec::new(),
            wars_meta: Vec::new(),
        }
    }
}

/// Format a timestamp as ISO-8601 UTC with seconds precision, e.g.
/// `2025-06-11T08:00:00Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// English month name for 1..=12.
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    match month {
        1..=12 => NAMES[(month - 1) as usize],
        _ => "Unknown",
    }
}

/// Derive the season key (`YYYY-MM`) and display title.
///
/// Uses the first seven characters of `season` when it starts with a
/// year-dash-month; otherwise falls back to the current UTC month.
pub fn season_key_and_title(
    season: Option<&str>,
    now: DateTime<Utc>,
    competition_name: &str,
) -> (String, String) {
    let pattern = Regex::new(r"^(\d{4})-(\d{2})").expect("valid season regex");

    if let Some(caps) = season.and_then(|s| pattern.captures(s.trim())) {
        let year = &caps[1];
        let month: u32 = caps[2].parse().unwrap_or(0);
        let key = format!("{}-{}", year, &caps[2]);
        let title = format!("{} {} {}", year, month_name(month), competition_name);
        return (key, title);
    }

    let key = format!("{}-{:02}", now.year(), now.month());
    let title = format!("{} {} {}", now.year(), month_name(now.month()), competition_name);
    (key, title)
}
