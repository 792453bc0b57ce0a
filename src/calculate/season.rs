//! Season aggregation.
//!
//! One pass over a league group:
//! 1. select the tracked team's war in each round,
//! 2. decide whether the season is final and which round is active,
//! 3. fold every war in the group into team standings,
//! 4. fold the tracked team's wars into per-member records.
//!
//! All accumulation happens in tables owned by the pass; derived values
//! (bonus stars, ranks, averages) are computed once in `finish`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::roster::RosterRanking;
use super::selector::{is_placeholder, select_team_war, WarCache};
use crate::fetch::FetchError;
use crate::models::{
    iso_timestamp, ApiLeagueGroup, MemberOverview, MemberWar, SeasonMeta, SeasonSnapshot,
    SnapshotState, TeamStanding, War, WarMeta, FALLBACK_OPPONENT_NAME, MAX_ROUNDS,
    SNAPSHOT_SCHEMA_VERSION,
};
use crate::normalize::round2;

/// Bonus stars credited per war won.
pub const WIN_BONUS_STARS: u32 = 10;

/// The tracked team's war in one round.
#[derive(Debug, Clone)]
pub struct RoundWar {
    /// 1-based round number
    pub round: u32,
    pub war_tag: String,
    pub war: Arc<War>,
}

/// Season completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonProgress {
    pub is_final: bool,
    pub rounds_completed: u32,
    pub active_round: u32,
}

/// Compute finality and the active round from the per-round selection.
///
/// Completed rounds count only the tracked team's resolved `warEnded` wars
/// (one per round), not every ended war in the group.
///
/// Final iff there is at least one round and every round resolved to a war
/// that has ended. The active round is 7 once final, otherwise one past the
/// completed rounds, clamped to 1..=7.
pub fn season_progress(rounds: &[Option<RoundWar>]) -> SeasonProgress {
    let rounds_completed = rounds
        .iter()
        .flatten()
        .filter(|r| r.war.state.is_ended())
        .count() as u32;

    let is_final = !rounds.is_empty()
        && rounds
            .iter()
            .all(|r| r.as_ref().is_some_and(|r| r.war.state.is_ended()));

    let active_round = if is_final {
        MAX_ROUNDS
    } else {
        (rounds_completed + 1).clamp(1, MAX_ROUNDS)
    };

    SeasonProgress {
        is_final,
        rounds_completed,
        active_round,
    }
}

/// Result of an ended war.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarOutcome {
    Home,
    Away,
    Tie,
}

/// More stars wins; equal stars fall to destruction; equal on both is a tie.
pub fn compute_winner(
    home_stars: u32,
    home_destruction: f64,
    away_stars: u32,
    away_destruction: f64,
) -> WarOutcome {
    if home_stars != away_stars {
        return if home_stars > away_stars {
            WarOutcome::Home
        } else {
            WarOutcome::Away
        };
    }
    if home_destruction > away_destruction {
        WarOutcome::Home
    } else if away_destruction > home_destruction {
        WarOutcome::Away
    } else {
        WarOutcome::Tie
    }
}

#[derive(Debug, Clone)]
struct StandingTally {
    tag: String,
    name: String,
    stars: u32,
    stars_against: u32,
    destruction: f64,
    wins: u32,
}

/// Accumulates team standings across every war in the group.
#[derive(Debug, Default)]
pub struct StandingsTable {
    teams: Vec<StandingTally>,
    index: HashMap<String, usize>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn team(&mut self, tag: &str, name: &str) -> &mut StandingTally {
        let idx = match self.index.get(tag) {
            Some(&idx) => idx,
            None => {
                self.teams.push(StandingTally {
                    tag: tag.to_string(),
                    name: if name.is_empty() { tag } else { name }.to_string(),
                    stars: 0,
                    stars_against: 0,
                    destruction: 0.0,
                    wins: 0,
                });
                self.index.insert(tag.to_string(), self.teams.len() - 1);
                self.teams.len() - 1
            }
        };
        &mut self.teams[idx]
    }

    /// Fold one war. Wars in preparation or of unknown state are ignored;
    /// wins are only credited once a war has ended.
    pub fn record(&mut self, war: &War) {
        if !war.state.is_counted() {
            return;
        }
        let (home, away) = (&war.home, &war.away);

        if !home.tag.is_empty() {
            let team = self.team(&home.tag, &home.name);
            team.stars = team.stars.saturating_add(home.stars);
            team.stars_against = team.stars_against.saturating_add(away.stars);
            team.destruction += home.destruction;
        }
        if !away.tag.is_empty() {
            let team = self.team(&away.tag, &away.name);
            team.stars = team.stars.saturating_add(away.stars);
            team.stars_against = team.stars_against.saturating_add(home.stars);
            team.destruction += away.destruction;
        }

        if war.state.is_ended() {
            let winner = match compute_winner(
                home.stars,
                home.destruction,
                away.stars,
                away.destruction,
            ) {
                WarOutcome::Home => &home.tag,
                WarOutcome::Away => &away.tag,
                WarOutcome::Tie => return,
            };
            if let Some(&idx) = self.index.get(winner.as_str()) {
                self.teams[idx].wins += 1;
            }
        }
    }

    /// Derive bonus stars and assign ranks. Ordered by stars with bonus,
    /// then destruction, then name.
    pub fn finish(self, rounds_completed: u32) -> Vec<TeamStanding> {
        let mut standings: Vec<TeamStanding> = self
            .teams
            .into_iter()
            .map(|t| {
                let bonus_stars = t.wins.saturating_mul(WIN_BONUS_STARS);
                TeamStanding {
                    rank: 0,
                    tag: t.tag,
                    name: t.name,
                    wins: t.wins,
                    bonus_stars,
                    stars_with_bonus: t.stars.saturating_add(bonus_stars),
                    stars_total: t.stars,
                    stars_no_bonus_total: t.stars,
                    stars_against_total: t.stars_against,
                    destruction_total: round2(t.destruction),
                    wars_completed: rounds_completed,
                }
            })
            .collect();

        standings.sort_by(|a, b| {
            b.stars_with_bonus
                .cmp(&a.stars_with_bonus)
                .then_with(|| b.destruction_total.total_cmp(&a.destruction_total))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        for (i, standing) in standings.iter_mut().enumerate() {
            standing.rank = i as u32 + 1;
        }
        standings
    }
}

#[derive(Debug, Clone)]
struct MemberTally {
    name: String,
    tag: String,
    total_stars: u32,
    total_destruction: f64,
    attacks_made: u32,
    wars_in_lineup: u32,
    rank_sum: u32,
    rank_count: u32,
    wars: BTreeMap<u32, MemberWar>,
}

/// Accumulates the tracked team's member performance round by round.
#[derive(Debug, Default)]
pub struct MemberTable {
    members: Vec<MemberTally>,
    index: HashMap<String, usize>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn member(&mut self, tag: &str, name: &str) -> &mut MemberTally {
        let idx = match self.index.get(tag) {
            Some(&idx) => idx,
            None => {
                self.members.push(MemberTally {
                    name: if name.is_empty() { tag } else { name }.to_string(),
                    tag: tag.to_string(),
                    total_stars: 0,
                    total_destruction: 0.0,
                    attacks_made: 0,
                    wars_in_lineup: 0,
                    rank_sum: 0,
                    rank_count: 0,
                    wars: BTreeMap::new(),
                });
                self.index.insert(tag.to_string(), self.members.len() - 1);
                self.members.len() - 1
            }
        };
        &mut self.members[idx]
    }

    /// Fold the tracked team's war for one round.
    pub fn record(&mut self, round: u32, war: &War, team_tag: &str) {
        let Some((ours, theirs)) = war.sides_for(team_tag) else {
            return;
        };

        let counts_for_lineup = war.state.is_counted();
        let team_size = Some(war.team_size).filter(|&n| n > 0);
        let opponent_name = if theirs.name.is_empty() {
            FALLBACK_OPPONENT_NAME.to_string()
        } else {
            theirs.name.clone()
        };
        let opponents = RosterRanking::build(&theirs.members);

        for m in ours.members.iter().filter(|m| !m.tag.is_empty()) {
            let tally = self.member(&m.tag, &m.name);
            if counts_for_lineup {
                tally.wars_in_lineup += 1;
            }

            let mut entry = MemberWar {
                war: round,
                opponent_clan: Some(opponent_name.clone()),
                team_size,
                ..Default::default()
            };

            if let Some(attack) = m.real_attack() {
                let defender_pos = opponents.rank_of(&attack.defender_tag);
                let defender_name = opponents
                    .member(&attack.defender_tag)
                    .map(|d| d.name.clone())
                    .filter(|n| !n.is_empty());
                let stars = attack.stars.unwrap_or(0);
                let destruction = attack.destruction.unwrap_or(0.0);

                tally.attacks_made += 1;
                tally.total_stars = tally.total_stars.saturating_add(stars);
                tally.total_destruction += destruction;
                if let Some(pos) = defender_pos {
                    tally.rank_sum = tally.rank_sum.saturating_add(pos);
                    tally.rank_count += 1;
                }

                entry.defender_pos = defender_pos;
                entry.defender_name = defender_name;
                entry.stars = Some(stars);
                entry.destruction = Some(destruction);
            }

            tally.wars.insert(round, entry);
        }
    }

    /// Derive averages and lay out the fixed seven-round detail.
    pub fn finish(self) -> Vec<MemberOverview> {
        self.members
            .into_iter()
            .map(|t| {
                let (avg_stars, avg_destruction) = if t.attacks_made > 0 {
                    (
                        round2(f64::from(t.total_stars) / f64::from(t.attacks_made)),
                        round2(t.total_destruction / f64::from(t.attacks_made)),
                    )
                } else {
                    (0.0, 0.0)
                };
                let avg_rank_attacked = (t.rank_count > 0)
                    .then(|| round2(f64::from(t.rank_sum) / f64::from(t.rank_count)));

                let mut wars = t.wars;
                let wars = (1..=MAX_ROUNDS)
                    .map(|n| wars.remove(&n).unwrap_or_else(|| MemberWar::empty(n)))
                    .collect();

                MemberOverview {
                    name: t.name,
                    tag: t.tag,
                    avg_rank_attacked,
                    avg_def_rank: None,
                    total_stars: t.total_stars,
                    total_destruction: round2(t.total_destruction),
                    attacks_made: t.attacks_made,
                    wars_in_lineup: Some(t.wars_in_lineup),
                    avg_stars,
                    avg_destruction,
                    wars,
                }
            })
            .collect()
    }
}

/// Everything derived from one league group.
#[derive(Debug, Clone)]
pub struct SeasonAggregate {
    /// Per round (index = round - 1); `None` where no war resolved
    pub rounds: Vec<Option<RoundWar>>,
    pub progress: SeasonProgress,
    pub standings: Vec<TeamStanding>,
    pub members: Vec<MemberOverview>,
    pub wars_meta: Vec<WarMeta>,
    pub round_opponents: [String; MAX_ROUNDS as usize],

    /// Largest declared team size across the tracked team's wars
    pub team_size: Option<u32>,
}

/// Run the full aggregation pass for `team_tag` over a league group.
///
/// Any fetch failure aborts the pass.
pub async fn aggregate_season(
    group: &ApiLeagueGroup,
    team_tag: &str,
    wars: &mut WarCache<'_>,
) -> Result<SeasonAggregate, FetchError> {
    let mut rounds = Vec::with_capacity(group.rounds.len());
    for (idx, round) in group.rounds.iter().enumerate() {
        let number = idx as u32 + 1;
        match select_team_war(&round.war_tags, team_tag, wars).await? {
            Some(selected) => {
                debug!(
                    "Round {}: war {} ({})",
                    number, selected.war_tag, selected.war.state
                );
                rounds.push(Some(RoundWar {
                    round: number,
                    war_tag: selected.war_tag,
                    war: selected.war,
                }));
            }
            None => {
                debug!("Round {}: no war for {}", number, team_tag);
                rounds.push(None);
            }
        }
    }

    let progress = season_progress(&rounds);

    let mut standings = StandingsTable::new();
    let mut seen = HashSet::new();
    for round in &group.rounds {
        for war_tag in round.war_tags.iter().flatten().map(|t| t.trim()) {
            if is_placeholder(Some(war_tag)) || !seen.insert(war_tag.to_string()) {
                continue;
            }
            let war = wars.get(war_tag).await?;
            standings.record(&war);
        }
    }

    let mut members = MemberTable::new();
    let mut wars_meta = Vec::new();
    let mut round_opponents: [String; MAX_ROUNDS as usize] = Default::default();
    let mut team_size = 0;

    for round in rounds.iter().flatten() {
        let Some((_, theirs)) = round.war.sides_for(team_tag) else {
            continue;
        };
        let opponent_name = if theirs.name.is_empty() {
            FALLBACK_OPPONENT_NAME
        } else {
            theirs.name.as_str()
        };

        team_size = team_size.max(round.war.team_size);
        wars_meta.push(WarMeta {
            war: round.round,
            war_tag: round.war_tag.clone(),
            opponent_clan: opponent_name.to_string(),
            opponent_tag: theirs.tag.clone(),
            team_size: Some(round.war.team_size).filter(|&n| n > 0),
            state: round.war.state.to_string(),
        });
        if (1..=MAX_ROUNDS).contains(&round.round) {
            round_opponents[(round.round - 1) as usize] = opponent_name.to_string();
        }

        members.record(round.round, &round.war, team_tag);
    }

    let aggregate = SeasonAggregate {
        progress,
        standings: standings.finish(progress.rounds_completed),
        members: members.finish(),
        wars_meta,
        round_opponents,
        team_size: Some(team_size).filter(|&n| n > 0),
        rounds,
    };

    info!(
        "Aggregated {} rounds ({} completed, final: {}), {} teams, {} members, {} wars fetched",
        aggregate.rounds.len(),
        progress.rounds_completed,
        progress.is_final,
        aggregate.standings.len(),
        aggregate.members.len(),
        wars.fetched()
    );
    Ok(aggregate)
}

impl SeasonAggregate {
    /// Assemble the season snapshot.
    pub fn into_snapshot(
        self,
        season_key: String,
        title: String,
        league_name: String,
        generated_at: DateTime<Utc>,
    ) -> SeasonSnapshot {
        SeasonSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            season_key: Some(season_key),
            title,
            league_name,
            state: SnapshotState::Active,
            generated_at: iso_timestamp(generated_at),
            is_final: self.progress.is_final,
            team_size: self.team_size,
            meta: SeasonMeta {
                active_round: Some(self.progress.active_round),
                rounds_completed: self.progress.rounds_completed,
            },
            round_opponents: self.round_opponents,
            team_standings: self.standings,
            member_overview: self.members,
            wars_meta: self.wars_meta,
        }
    }
}
