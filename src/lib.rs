//! # CWL Tracker
//!
//! Reconciles a Clan War League season from the war API into a season
//! snapshot, a season index, and per-member report tables.
//!
//! ## Architecture
//!
//! - **models**: API records, normalized wars, snapshot and table documents
//! - **normalize**: tag, name and number coercion for loosely typed input
//! - **fetch**: war API client behind the `WarSource` trait
//! - **calculate**: roster ranking, war selection, season aggregation, reports
//! - **storage**: filesystem layout and atomic JSON writes
//! - **sync**: the season updater
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse an update interval such as "1h", "30m" or "90s". A bare number
/// is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(multiplier)?))
}
