//! Raw war API response records.
//!
//! Every field is optional and numbers are kept as raw JSON values; the
//! typed models in [`super::war`] are built from these through the
//! normalizer. Nothing outside the model layer reads these directly.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a collection that may be absent or `null` as empty.
fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let maybe: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(maybe.unwrap_or_default())
}

/// The league a team is placed in for the season.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiWarLeague {
    pub name: Option<String>,
}

/// One round of the league group: the war tags of every pairing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRound {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub war_tags: Vec<Option<String>>,
}

/// Response of `/clans/{tag}/currentwar/leaguegroup`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLeagueGroup {
    pub state: Option<String>,

    /// Season string, normally `YYYY-MM`
    pub season: Option<String>,

    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub rounds: Vec<ApiRound>,

    pub war_league: Option<ApiWarLeague>,
}

/// A single attack made by a member.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttack {
    pub attacker_tag: Option<String>,
    pub defender_tag: Option<String>,
    pub stars: Option<Value>,
    pub destruction_percentage: Option<Value>,
}

/// A member in a war lineup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWarMember {
    pub tag: Option<String>,
    pub name: Option<String>,

    /// Declared lineup slot; unreliable as an ordering
    pub map_position: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub attacks: Vec<ApiAttack>,
}

/// One side (`clan` or `opponent`) of a war.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWarSide {
    pub tag: Option<String>,
    pub name: Option<String>,
    pub stars: Option<Value>,
    pub destruction_percentage: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub members: Vec<ApiWarMember>,
}

/// Response of `/clanwarleagues/wars/{warTag}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWar {
    pub state: Option<String>,
    pub team_size: Option<Value>,
    pub clan: Option<ApiWarSide>,
    pub opponent: Option<ApiWarSide>,
}

/// Response of `/clans/{tag}`; only the league is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTeamProfile {
    pub war_league: Option<ApiWarLeague>,
}

impl ApiTeamProfile {
    pub fn league_name(&self) -> Option<String> {
        self.war_league
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

impl ApiLeagueGroup {
    pub fn league_name(&self) -> Option<String> {
        self.war_league
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_group_deserialize() {
        let json = r##"{
            "state": "inWar",
            "season": "2025-06",
            "clans": [],
            "rounds": [
                {"warTags": ["#8YQ2", "#0", null]},
                {"warTags": null}
            ],
            "warLeague": {"id": 48000012, "name": "Crystal League I"}
        }"##;

        let group: ApiLeagueGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.season.as_deref(), Some("2025-06"));
        assert_eq!(group.rounds.len(), 2);
        assert_eq!(group.rounds[0].war_tags.len(), 3);
        assert!(group.rounds[0].war_tags[2].is_none());
        assert!(group.rounds[1].war_tags.is_empty());
        assert_eq!(group.league_name().as_deref(), Some("Crystal League I"));
    }

    #[test]
    fn test_war_deserialize_loose_numbers() {
        let json = r##"{
            "state": "warEnded",
            "teamSize": "15",
            "clan": {
                "tag": "#AAA",
                "name": "Home",
                "stars": 30,
                "destructionPercentage": "88.5",
                "members": [
                    {"tag": "#P1", "name": "One", "mapPosition": 1,
                     "attacks": [{"defenderTag": "#Q1", "stars": 3, "destructionPercentage": 100}]}
                ]
            },
            "opponent": {"tag": "#BBB", "name": "Away", "members": null}
        }"##;

        let war: ApiWar = serde_json::from_str(json).unwrap();
        let clan = war.clan.unwrap();
        assert_eq!(clan.members.len(), 1);
        assert_eq!(clan.members[0].attacks.len(), 1);
        assert!(war.opponent.unwrap().members.is_empty());
    }

    #[test]
    fn test_team_profile_blank_league_is_none() {
        let profile: ApiTeamProfile =
            serde_json::from_str(r#"{"warLeague": {"name": "  "}}"#).unwrap();
        assert!(profile.league_name().is_none());
    }
}
