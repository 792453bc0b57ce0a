//! Reconciliation and aggregation engine.
//!
//! - [`roster`]: true lineup ranks independent of declared slots
//! - [`selector`]: the tracked team's war in each round
//! - [`season`]: standings, member records and season finality
//! - [`report`]: the member overview table

pub mod report;
pub mod roster;
pub mod season;
pub mod selector;

pub use report::{attack_denominator, build_member_table, member_overview_columns};
pub use roster::RosterRanking;
pub use season::{
    aggregate_season, compute_winner, season_progress, MemberTable, RoundWar, SeasonAggregate,
    SeasonProgress, StandingsTable, WarOutcome, WIN_BONUS_STARS,
};
pub use selector::{is_placeholder, select_team_war, SelectedWar, WarCache, PLACEHOLDER_WAR_TAG};
