//! Data models: raw API records, the typed war model, and the season
//! artifacts (snapshot, index, report table).

mod api;
mod index;
mod snapshot;
mod table;
mod war;

pub use api::*;
pub use index::*;
pub use snapshot::*;
pub use table::*;
pub use war::*;
