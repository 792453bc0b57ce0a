//! Per-round war selection.
//!
//! A league round holds one war per pairing in the group. Only one of them
//! involves the tracked team; this module finds it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::fetch::{FetchError, WarSource};
use crate::models::War;

/// War tag the API uses for a pairing that has not been drawn yet.
pub const PLACEHOLDER_WAR_TAG: &str = "#0";

/// Whether a war tag slot is empty or a not-yet-drawn placeholder.
pub fn is_placeholder(war_tag: Option<&str>) -> bool {
    match war_tag.map(str::trim) {
        None | Some("") => true,
        Some(tag) => tag == PLACEHOLDER_WAR_TAG,
    }
}

/// Wars fetched during one aggregation pass, keyed by war tag.
///
/// A war tag may appear in more than one place (round selection and the
/// standings sweep); each is fetched from the source at most once.
pub struct WarCache<'s> {
    source: &'s dyn WarSource,
    wars: HashMap<String, Arc<War>>,
}

impl<'s> WarCache<'s> {
    pub fn new(source: &'s dyn WarSource) -> Self {
        Self {
            source,
            wars: HashMap::new(),
        }
    }

    /// Fetch and normalize a war, or return the cached copy.
    pub async fn get(&mut self, war_tag: &str) -> Result<Arc<War>, FetchError> {
        if let Some(war) = self.wars.get(war_tag) {
            return Ok(Arc::clone(war));
        }
        let raw = self.source.war(war_tag).await?;
        let war = Arc::new(War::from(&raw));
        self.wars.insert(war_tag.to_string(), Arc::clone(&war));
        Ok(war)
    }

    /// Number of distinct wars fetched so far.
    pub fn fetched(&self) -> usize {
        self.wars.len()
    }
}

/// The tracked team's war in a round.
#[derive(Debug, Clone)]
pub struct SelectedWar {
    pub war_tag: String,
    pub war: Arc<War>,
}

/// Find the war in `war_tags` that involves `team_tag`.
///
/// The first matching war wins; if the API ever listed the team in two
/// pairings of one round, later ones are ignored. Returns `None` when no
/// candidate matches, including when every slot is a placeholder.
pub async fn select_team_war(
    war_tags: &[Option<String>],
    team_tag: &str,
    wars: &mut WarCache<'_>,
) -> Result<Option<SelectedWar>, FetchError> {
    for war_tag in war_tags {
        if is_placeholder(war_tag.as_deref()) {
            continue;
        }
        let Some(war_tag) = war_tag.as_deref().map(str::trim) else {
            continue;
        };

        let war = wars.get(war_tag).await?;
        if war.involves(team_tag) {
            debug!("War {} involves {}", war_tag, team_tag);
            return Ok(Some(SelectedWar {
                war_tag: war_tag.to_string(),
                war,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::models::{ApiLeagueGroup, ApiTeamProfile, ApiWar};

    /// In-memory war source that counts war fetches.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub group: Option<Value>,
        pub wars: HashMap<String, Value>,
        pub league_name: Option<String>,
        pub fail_profile: bool,
        pub war_fetches: Mutex<Vec<String>>,
    }

    impl MemorySource {
        pub fn with_war(mut self, war_tag: &str, war: Value) -> Self {
            self.wars.insert(war_tag.to_string(), war);
            self
        }

        pub fn fetch_count(&self, war_tag: &str) -> usize {
            self.war_fetches
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.as_str() == war_tag)
                .count()
        }
    }

    #[async_trait]
    impl WarSource for MemorySource {
        async fn league_group(
            &self,
            _team_tag: &str,
        ) -> Result<Option<ApiLeagueGroup>, FetchError> {
            match &self.group {
                Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
                None => Ok(None),
            }
        }

        async fn war(&self, war_tag: &str) -> Result<ApiWar, FetchError> {
            self.war_fetches.lock().unwrap().push(war_tag.to_string());
            match self.wars.get(war_tag) {
                Some(v) => Ok(serde_json::from_value(v.clone())?),
                None => Err(FetchError::HttpStatus {
                    status: 500,
                    message: format!("no war {}", war_tag),
                }),
            }
        }

        async fn team_profile(&self, _team_tag: &str) -> Result<ApiTeamProfile, FetchError> {
            if self.fail_profile {
                return Err(FetchError::HttpStatus {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
            Ok(serde_json::from_value(
                json!({"warLeague": {"name": self.league_name}}),
            )?)
        }
    }

    fn pairing(home: &str, away: &str) -> Value {
        json!({
            "state": "inWar",
            "teamSize": 15,
            "clan": {"tag": home, "name": home},
            "opponent": {"tag": away, "name": away}
        })
    }

    fn tags(list: &[Option<&str>]) -> Vec<Option<String>> {
        list.iter().map(|t| t.map(str::to_string)).collect()
    }

    #[tokio::test]
    async fn test_selects_matching_war() {
        let source = MemorySource::default()
            .with_war("#W1", pairing("#X", "#Y"))
            .with_war("#W2", pairing("#Z", "#US"));
        let mut cache = WarCache::new(&source);

        let selected = select_team_war(&tags(&[Some("#W1"), Some("#W2")]), "#US", &mut cache)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(selected.war_tag, "#W2");
        assert_eq!(selected.war.away.tag, "#US");
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let source = MemorySource::default()
            .with_war("#W1", pairing("#X", "#Y"))
            .with_war("#W2", pairing("#Z", "#Q"));
        let mut cache = WarCache::new(&source);

        let selected = select_team_war(&tags(&[Some("#W1"), Some("#W2")]), "#US", &mut cache)
            .await
            .unwrap();
        assert!(selected.is_none());
    }

    #[test]
    fn test_placeholders_only_returns_none_without_fetching() {
        let source = MemorySource::default();
        let mut cache = WarCache::new(&source);

        let selected = tokio_test::block_on(select_team_war(
            &tags(&[Some("#0"), None, Some("  ")]),
            "#US",
            &mut cache,
        ))
        .unwrap();

        assert!(selected.is_none());
        assert!(source.war_fetches.lock().unwrap().is_empty());

        let empty = tokio_test::block_on(select_team_war(&[], "#US", &mut cache)).unwrap();
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let source = MemorySource::default()
            .with_war("#W1", pairing("#US", "#Y"))
            .with_war("#W2", pairing("#Z", "#US"));
        let mut cache = WarCache::new(&source);

        let selected = select_team_war(&tags(&[Some("#W1"), Some("#W2")]), "#US", &mut cache)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(selected.war_tag, "#W1");
        // search stops at the first match
        assert_eq!(source.fetch_count("#W2"), 0);
    }

    #[tokio::test]
    async fn test_cache_fetches_once() {
        let source = MemorySource::default().with_war("#W1", pairing("#X", "#Y"));
        let mut cache = WarCache::new(&source);

        cache.get("#W1").await.unwrap();
        cache.get("#W1").await.unwrap();

        assert_eq!(source.fetch_count("#W1"), 1);
        assert_eq!(cache.fetched(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let source = MemorySource::default();
        let mut cache = WarCache::new(&source);

        let result = select_team_war(&tags(&[Some("#MISSING")]), "#US", &mut cache).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder(None));
        assert!(is_placeholder(Some("")));
        assert!(is_placeholder(Some("#0")));
        assert!(!is_placeholder(Some("#8YQ2PL")));
    }
}
