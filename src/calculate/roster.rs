//! True lineup ranking for one side of a war.
//!
//! The API's `mapPosition` can skip or repeat slot numbers, so it is only
//! used as a sort key. Members are ordered by declared slot (missing slots
//! last), then case-insensitive name, and the 1-based index in that order
//! is the member's rank.

use std::collections::HashMap;

use crate::models::WarMember;

/// Sort key for members without a declared slot.
const MISSING_POSITION: u32 = u32::MAX;

/// Rank and member lookups for one side's lineup.
#[derive(Debug, Clone, Default)]
pub struct RosterRanking<'a> {
    rank_by_tag: HashMap<&'a str, u32>,
    member_by_tag: HashMap<&'a str, &'a WarMember>,
}

impl<'a> RosterRanking<'a> {
    /// Rank a lineup. Members with an empty tag are skipped.
    pub fn build(members: &'a [WarMember]) -> Self {
        let mut rows: Vec<(u32, String, &'a WarMember)> = members
            .iter()
            .filter(|m| !m.tag.is_empty())
            .map(|m| {
                (
                    m.map_position.unwrap_or(MISSING_POSITION),
                    m.name.to_lowercase(),
                    m,
                )
            })
            .collect();

        // stable: equal (slot, name) keep their original order
        rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut ranking = Self::default();
        for (idx, (_, _, member)) in rows.into_iter().enumerate() {
            ranking.rank_by_tag.insert(member.tag.as_str(), idx as u32 + 1);
            ranking.member_by_tag.insert(member.tag.as_str(), member);
        }
        ranking
    }

    pub fn rank_of(&self, tag: &str) -> Option<u32> {
        self.rank_by_tag.get(tag).copied()
    }

    pub fn member(&self, tag: &str) -> Option<&'a WarMember> {
        self.member_by_tag.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.rank_by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rank_by_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tag: &str, name: &str, pos: Option<u32>) -> WarMember {
        WarMember {
            tag: tag.to_string(),
            name: name.to_string(),
            map_position: pos,
            attack: None,
        }
    }

    fn ranks(ranking: &RosterRanking<'_>, tags: &[&str]) -> Vec<Option<u32>> {
        tags.iter().map(|t| ranking.rank_of(t)).collect()
    }

    #[test]
    fn test_ranks_follow_declared_position() {
        let members = vec![
            member("#C", "Carl", Some(3)),
            member("#A", "Anna", Some(1)),
            member("#B", "Ben", Some(2)),
        ];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranks(&ranking, &["#A", "#B", "#C"]), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_skipped_positions_close_gaps() {
        let members = vec![
            member("#A", "Anna", Some(2)),
            member("#B", "Ben", Some(7)),
            member("#C", "Carl", Some(30)),
        ];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranks(&ranking, &["#A", "#B", "#C"]), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_duplicate_positions_break_on_name_case_insensitive() {
        let members = vec![
            member("#Z", "zed", Some(1)),
            member("#Y", "Bob", Some(1)),
            member("#X", "alice", Some(1)),
        ];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranks(&ranking, &["#X", "#Y", "#Z"]), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let members = vec![
            member("#FIRST", "Same", Some(4)),
            member("#SECOND", "same", Some(4)),
        ];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranking.rank_of("#FIRST"), Some(1));
        assert_eq!(ranking.rank_of("#SECOND"), Some(2));
    }

    #[test]
    fn test_missing_position_sorts_last() {
        let members = vec![
            member("#N", "Nobody", None),
            member("#A", "Zack", Some(15)),
            member("#B", "Amy", None),
        ];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranks(&ranking, &["#A", "#B", "#N"]), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_ranks_are_permutation() {
        let members: Vec<WarMember> = (0..15)
            .map(|i| {
                let pos = match i % 4 {
                    0 => None,
                    1 => Some(3),
                    2 => Some(i * 7),
                    _ => Some(1),
                };
                member(&format!("#T{}", i), &format!("m{}", 15 - i), pos)
            })
            .collect();

        let ranking = RosterRanking::build(&members);
        let mut all: Vec<u32> = members.iter().filter_map(|m| ranking.rank_of(&m.tag)).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=15).collect::<Vec<u32>>());
    }

    #[test]
    fn test_empty_tag_skipped() {
        let members = vec![member("", "Ghost", Some(1)), member("#A", "Anna", Some(2))];
        let ranking = RosterRanking::build(&members);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.rank_of("#A"), Some(1));
        assert_eq!(ranking.member("#A").unwrap().name, "Anna");
        assert!(ranking.member("#B").is_none());
    }
}
