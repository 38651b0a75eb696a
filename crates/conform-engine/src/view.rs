//! Host timeline views.
//!
//! Duplicate detection needs to know which clip names already sit on the
//! host NLE timeline. The engine only sees this through a trait so tests
//! and headless runs can supply a canned view while a front-end binds the
//! real session.

use std::collections::HashSet;

use conform_core::{Result, TrackRange};

/// A read-only view of the host NLE timeline.
pub trait TimelineView {
    /// Clip names present on the given tracks carrying the given extension.
    fn clip_names(&self, tracks: TrackRange, extension: &str) -> Result<HashSet<String>>;
}

/// A fixed set of clip names, independent of track or extension.
#[derive(Debug, Clone, Default)]
pub struct StaticTimelineView {
    names: HashSet<String>,
}

impl StaticTimelineView {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl TimelineView for StaticTimelineView {
    fn clip_names(&self, _tracks: TrackRange, _extension: &str) -> Result<HashSet<String>> {
        Ok(self.names.clone())
    }
}
