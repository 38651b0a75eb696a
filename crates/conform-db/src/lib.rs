//! Conform DB - persistent record of every shot from every parsed edit
//!
//! The store is a hierarchical JSON file keyed project → shot → edit. On top
//! of it sit the cross-version comparator, the shot restorer and the
//! max-source-range computation.

pub mod compare;
pub mod report;
pub mod restore;
pub mod store;

pub use compare::{compare, Category, ComparisonEntry, ComparisonOutcome, EditSelection};
pub use report::render_table;
pub use restore::{max_source_ranges, restore_shots, Marker, RestoreOutcome};
pub use store::{EditDatabase, ShotEditRecord};
