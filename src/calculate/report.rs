//! Member overview table.
//!
//! Reshapes a season snapshot into fixed columns: a summary block followed
//! by three cells per round. Rendering only reads the snapshot, so the same
//! snapshot always produces the same table.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::models::{
    Align, Column, MemberOverview, MemberWar, ReportRow, ReportTable, SeasonSnapshot,
    DEFAULT_TEAM_SIZE, MAX_ROUNDS, MEMBER_OVERVIEW_TABLE_ID, NO_DATA,
};

/// Column layout of the member overview.
pub fn member_overview_columns() -> Vec<Column> {
    let mut columns = vec![
        Column::new("name", "Name", Align::Left),
        Column::new("atk_rk", "🗡️RK", Align::Right).one_decimal(),
        Column::new("def_rk", "🛡️RK", Align::Right).one_decimal(),
        Column::new("ttl_stars", "TTL★", Align::Right),
        Column::new("ttl_pct", "TTL%", Align::Right).one_decimal(),
        Column::new("avg_stars", "Avg★", Align::Right).one_decimal(),
        Column::new("avg_pct", "Avg%", Align::Right).one_decimal(),
        Column::new("atk_frac", "Atk", Align::Right),
    ];

    for round in 1..=MAX_ROUNDS {
        columns.push(Column::new(format!("war{}_opp", round), "⚔️", Align::Left));
        columns.push(Column::new(format!("war{}_stars", round), "⭐", Align::Right));
        columns.push(Column::new(format!("war{}_pct", round), "🎯", Align::Right).one_decimal());
    }
    columns
}

/// Denominator for the attacks fraction.
///
/// Capped at the completed rounds when lineup count is known, and never
/// below the attacks actually made.
pub fn attack_denominator(
    attacks_made: u32,
    wars_in_lineup: Option<u32>,
    rounds_completed: u32,
) -> u32 {
    let target = match wars_in_lineup {
        Some(in_lineup) => in_lineup.min(rounds_completed),
        None => rounds_completed,
    };
    target.max(attacks_made)
}

/// The three cells of one round: label, stars, destruction.
fn round_cells(entry: Option<&MemberWar>) -> (Value, Value, Value) {
    match entry {
        Some(e) if e.has_target() && e.has_outcome() => {
            let label = format!(
                "{}. {}",
                e.defender_pos.unwrap_or_default(),
                e.defender_name.as_deref().unwrap_or_default()
            );
            (
                Value::from(label),
                e.stars.map(Value::from).unwrap_or(Value::Null),
                e.destruction.map(Value::from).unwrap_or(Value::Null),
            )
        }
        _ => (Value::from(NO_DATA), Value::Null, Value::Null),
    }
}

fn member_row(member: &MemberOverview, rounds_completed: u32) -> ReportRow {
    let denominator =
        attack_denominator(member.attacks_made, member.wars_in_lineup, rounds_completed);

    let by_round: HashMap<u32, &MemberWar> = member
        .wars
        .iter()
        .filter(|w| (1..=MAX_ROUNDS).contains(&w.war))
        .map(|w| (w.war, w))
        .collect();

    let mut rounds = BTreeMap::new();
    for round in 1..=MAX_ROUNDS {
        let (opp, stars, pct) = round_cells(by_round.get(&round).copied());
        rounds.insert(format!("war{}_opp", round), opp);
        rounds.insert(format!("war{}_stars", round), stars);
        rounds.insert(format!("war{}_pct", round), pct);
    }

    ReportRow {
        name: member.name.clone(),
        tag: member.tag.clone(),
        atk_rk: member.avg_rank_attacked,
        def_rk: member.avg_def_rank,
        ttl_stars: member.total_stars,
        ttl_pct: member.total_destruction,
        avg_stars: member.avg_stars,
        avg_pct: member.avg_destruction,
        atk_frac: format!("{}/{}", member.attacks_made, denominator),
        rounds,
    }
}

/// Build the member overview table for a snapshot.
pub fn build_member_table(snapshot: &SeasonSnapshot) -> ReportTable {
    let rounds_completed = snapshot.meta.rounds_completed;

    ReportTable {
        table_id: MEMBER_OVERVIEW_TABLE_ID.to_string(),
        season_key: snapshot.season_key.clone(),
        generated_at: snapshot.generated_at.clone(),
        team_size: snapshot.team_size.unwrap_or(DEFAULT_TEAM_SIZE),
        meta: snapshot.meta,
        columns: member_overview_columns(),
        rows: snapshot
            .member_overview
            .iter()
            .map(|m| member_row(m, rounds_completed))
            .collect(),
    }
}
