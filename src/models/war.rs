//! Typed war model.
//!
//! Built once from [`ApiWar`] at the normalizer boundary. Tags are
//! canonical, numbers are defaulted, and each member carries at most one
//! attack (league wars allow a single attack per member).

use serde::{Deserialize, Serialize};

use super::api::{ApiAttack, ApiWar, ApiWarMember, ApiWarSide};
use crate::normalize::{coerce_count, coerce_float, coerce_int, normalize_name, normalize_tag};

/// Lifecycle state of a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarState {
    Preparation,
    InWar,
    WarEnded,
    Unknown,
}

impl WarState {
    pub fn from_api(state: Option<&str>) -> Self {
        match state.map(str::trim) {
            Some("preparation") | Some("preparing") => WarState::Preparation,
            Some("inWar") => WarState::InWar,
            Some("warEnded") => WarState::WarEnded,
            _ => WarState::Unknown,
        }
    }

    /// Active or finished wars count toward totals and lineup denominators.
    pub fn is_counted(&self) -> bool {
        matches!(self, WarState::InWar | WarState::WarEnded)
    }

    pub fn is_ended(&self) -> bool {
        *self == WarState::WarEnded
    }
}

impl std::fmt::Display for WarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarState::Preparation => write!(f, "preparation"),
            WarState::InWar => write!(f, "inWar"),
            WarState::WarEnded => write!(f, "warEnded"),
            WarState::Unknown => write!(f, "unknown"),
        }
    }
}

/// The single attack slot of a member.
#[derive(Debug, Clone, PartialEq)]
pub struct Attack {
    pub defender_tag: String,
    pub stars: Option<u32>,
    pub destruction: Option<f64>,
}

impl Attack {
    fn from_api(raw: &ApiAttack) -> Self {
        let stars = raw
            .stars
            .as_ref()
            .filter(|v| !v.is_null())
            .map(|v| coerce_count(Some(v), 0));
        let destruction = raw
            .destruction_percentage
            .as_ref()
            .filter(|v| !v.is_null())
            .map(|v| coerce_float(Some(v), 0.0));

        Self {
            defender_tag: normalize_tag(raw.defender_tag.as_deref()),
            stars,
            destruction,
        }
    }

    /// An attack only counts once it carries an outcome. A record with
    /// neither stars nor destruction is treated as no attack.
    pub fn is_real(&self) -> bool {
        self.stars.is_some() || self.destruction.is_some()
    }
}

/// A member in one side's lineup.
#[derive(Debug, Clone, PartialEq)]
pub struct WarMember {
    pub tag: String,
    pub name: String,

    /// Declared lineup slot, if the API sent a usable one
    pub map_position: Option<u32>,

    pub attack: Option<Attack>,
}

impl WarMember {
    fn from_api(raw: &ApiWarMember) -> Self {
        let map_position = raw
            .map_position
            .as_ref()
            .filter(|v| !v.is_null())
            .map(|v| coerce_int(Some(v), -1))
            .and_then(|p| u32::try_from(p).ok());

        Self {
            tag: normalize_tag(raw.tag.as_deref()),
            name: normalize_name(raw.name.as_deref()),
            map_position,
            attack: raw.attacks.first().map(Attack::from_api),
        }
    }

    /// The attack, if one with an outcome was made.
    pub fn real_attack(&self) -> Option<&Attack> {
        self.attack.as_ref().filter(|a| a.is_real())
    }
}

/// One side of a war.
#[derive(Debug, Clone, PartialEq)]
pub struct WarSide {
    pub tag: String,
    pub name: String,
    pub stars: u32,
    pub destruction: f64,
    pub members: Vec<WarMember>,
}

impl WarSide {
    fn from_api(raw: Option<&ApiWarSide>) -> Self {
        match raw {
            Some(side) => Self {
                tag: normalize_tag(side.tag.as_deref()),
                name: normalize_name(side.name.as_deref()),
                stars: coerce_count(side.stars.as_ref(), 0),
                destruction: coerce_float(side.destruction_percentage.as_ref(), 0.0),
                members: side.members.iter().map(WarMember::from_api).collect(),
            },
            None => Self {
                tag: String::new(),
                name: String::new(),
                stars: 0,
                destruction: 0.0,
                members: Vec::new(),
            },
        }
    }
}

/// A league war between `home` (API `clan`) and `away` (API `opponent`).
#[derive(Debug, Clone, PartialEq)]
pub struct War {
    pub state: WarState,
    pub team_size: u32,
    pub home: WarSide,
    pub away: WarSide,
}

impl From<&ApiWar> for War {
    fn from(raw: &ApiWar) -> Self {
        Self {
            state: WarState::from_api(raw.state.as_deref()),
            team_size: coerce_count(raw.team_size.as_ref(), 0),
            home: WarSide::from_api(raw.clan.as_ref()),
            away: WarSide::from_api(raw.opponent.as_ref()),
        }
    }
}

impl War {
    /// Split into `(ours, theirs)` for the given team.
    ///
    /// Resolves only when exactly one side carries the tag; a war where
    /// neither or both sides match is not the team's war.
    pub fn sides_for(&self, team_tag: &str) -> Option<(&WarSide, &WarSide)> {
        if team_tag.is_empty() {
            return None;
        }
        match (self.home.tag == team_tag, self.away.tag == team_tag) {
            (true, false) => Some((&self.home, &self.away)),
            (false, true) => Some((&self.away, &self.home)),
            _ => None,
        }
    }

    pub fn involves(&self, team_tag: &str) -> bool {
        self.sides_for(team_tag).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_war(value: serde_json::Value) -> War {
        let api: ApiWar = serde_json::from_value(value).unwrap();
        War::from(&api)
    }

    #[test]
    fn test_war_state_from_api() {
        assert_eq!(WarState::from_api(Some("preparation")), WarState::Preparation);
        assert_eq!(WarState::from_api(Some("preparing")), WarState::Preparation);
        assert_eq!(WarState::from_api(Some("inWar")), WarState::InWar);
        assert_eq!(WarState::from_api(Some("warEnded")), WarState::WarEnded);
        assert_eq!(WarState::from_api(Some("notInWar")), WarState::Unknown);
        assert_eq!(WarState::from_api(None), WarState::Unknown);
    }

    #[test]
    fn test_war_state_counted() {
        assert!(WarState::InWar.is_counted());
        assert!(WarState::WarEnded.is_counted());
        assert!(!WarState::Preparation.is_counted());
        assert!(!WarState::Unknown.is_counted());
    }

    #[test]
    fn test_war_from_api_normalizes() {
        let war = raw_war(json!({
            "state": "inWar",
            "teamSize": "15",
            "clan": {
                "tag": " #aaa ",
                "name": " Home ",
                "stars": "12",
                "destructionPercentage": 45.5,
                "members": [{
                    "tag": "#p1",
                    "name": "One",
                    "mapPosition": "2",
                    "attacks": [
                        {"defenderTag": "#q1", "stars": 2, "destructionPercentage": 80},
                        {"defenderTag": "#q2", "stars": 3, "destructionPercentage": 100}
                    ]
                }]
            },
            "opponent": {"tag": "#BBB", "name": "Away"}
        }));

        assert_eq!(war.state, WarState::InWar);
        assert_eq!(war.team_size, 15);
        assert_eq!(war.home.tag, "#AAA");
        assert_eq!(war.home.name, "Home");
        assert_eq!(war.home.stars, 12);

        let member = &war.home.members[0];
        assert_eq!(member.tag, "#P1");
        assert_eq!(member.map_position, Some(2));
        // only the first attack slot is kept
        let attack = member.attack.as_ref().unwrap();
        assert_eq!(attack.defender_tag, "#Q1");
        assert_eq!(attack.stars, Some(2));
    }

    #[test]
    fn test_missing_side_defaults() {
        let war = raw_war(json!({"state": "warEnded"}));
        assert_eq!(war.home.tag, "");
        assert!(war.away.members.is_empty());
        assert_eq!(war.team_size, 0);
    }

    #[test]
    fn test_null_outcome_is_not_real_attack() {
        let war = raw_war(json!({
            "clan": {"tag": "#A", "members": [{
                "tag": "#P1",
                "attacks": [{"defenderTag": "#Q1", "stars": null, "destructionPercentage": null}]
            }]}
        }));
        let member = &war.home.members[0];
        assert!(member.attack.is_some());
        assert!(member.real_attack().is_none());
    }

    #[test]
    fn test_bad_map_position_is_none() {
        let war = raw_war(json!({
            "clan": {"tag": "#A", "members": [
                {"tag": "#P1", "mapPosition": "first"},
                {"tag": "#P2", "mapPosition": -3},
                {"tag": "#P3"}
            ]}
        }));
        assert!(war.home.members.iter().all(|m| m.map_position.is_none()));
    }

    #[test]
    fn test_sides_for() {
        let war = raw_war(json!({
            "clan": {"tag": "#A"},
            "opponent": {"tag": "#B"}
        }));
        let (ours, theirs) = war.sides_for("#B").unwrap();
        assert_eq!(ours.tag, "#B");
        assert_eq!(theirs.tag, "#A");
        assert!(war.sides_for("#C").is_none());
        assert!(war.sides_for("").is_none());
    }

    #[test]
    fn test_sides_for_both_sides_match_is_unresolved() {
        let war = raw_war(json!({
            "clan": {"tag": "#A"},
            "opponent": {"tag": "#a"}
        }));
        assert!(!war.involves("#A"));
    }
}
