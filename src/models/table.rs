//! Column-described member report table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SeasonMeta;

/// Identifier stamped on member overview tables.
pub const MEMBER_OVERVIEW_TABLE_ID: &str = "cwl_member_overview";

/// Placeholder rendered in a cell with no data.
pub const NO_DATA: &str = "—";

/// Team size assumed when the snapshot does not declare one.
pub const DEFAULT_TEAM_SIZE: u32 = 15;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

/// Description of one table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,

    /// Number format hint, e.g. `1dp`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    pub align: Align,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>, align: Align) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            format: None,
            align,
        }
    }

    pub fn one_decimal(mut self) -> Self {
        self.format = Some("1dp".to_string());
        self
    }
}

/// One member row. Summary cells are named fields; the per-round cells
/// (`war{N}_opp`, `war{N}_stars`, `war{N}_pct`) live in `rounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub tag: String,
    pub atk_rk: Option<f64>,
    pub def_rk: Option<f64>,
    pub ttl_stars: u32,
    pub ttl_pct: f64,
    pub avg_stars: f64,
    pub avg_pct: f64,

    /// `"{attacks}/{denominator}"`
    pub atk_frac: String,

    #[serde(flatten)]
    pub rounds: BTreeMap<String, serde_json::Value>,
}

/// The rendered member overview for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub table_id: String,
    pub season_key: Option<String>,
    pub generated_at: String,
    pub team_size: u32,
    pub meta: SeasonMeta,
    pub columns: Vec<Column>,
    pub rows: Vec<ReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_serialization() {
        let col = Column::new("ttl_pct", "TTL%", Align::Right).one_decimal();
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["format"], "1dp");
        assert_eq!(json["align"], "right");

        let plain = serde_json::to_value(Column::new("name", "Name", Align::Left)).unwrap();
        assert!(plain.get("format").is_none());
    }

    #[test]
    fn test_row_flattens_round_cells() {
        let mut rounds = BTreeMap::new();
        rounds.insert("war1_opp".to_string(), serde_json::json!("1. Base"));
        let row = ReportRow {
            name: "One".to_string(),
            tag: "#P1".to_string(),
            atk_rk: None,
            def_rk: None,
            ttl_stars: 3,
            ttl_pct: 100.0,
            avg_stars: 3.0,
            avg_pct: 100.0,
            atk_frac: "1/1".to_string(),
            rounds,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["war1_opp"], "1. Base");
        assert!(json["atk_rk"].is_null());
    }
}
