//! Cross-edit comparison.
//!
//! Classifies every shot of two edit selections into seven categories by
//! comparing source windows `(src_in, src_out_full)`. The Less/More
//! boundaries are asymmetric when exactly one delta is zero; the asymmetry
//! is part of the established workflow and is preserved exactly.

use std::collections::BTreeMap;

use conform_core::{ConformError, FrameRate, Result};
use conform_edl::EdlRecord;

use crate::store::{EditDatabase, ShotEditRecord};

/// Which records of a project to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditSelection {
    /// A named edit.
    Edit(String),
    /// The per-shot actual records.
    Actual,
}

impl EditSelection {
    fn resolve<'a>(
        &self,
        db: &'a EditDatabase,
        project: &str,
    ) -> BTreeMap<String, &'a ShotEditRecord> {
        match self {
            Self::Edit(name) => db.query_by_edit(project, name),
            Self::Actual => db.query_by_actual(project),
        }
    }
}

/// Comparison classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    NoChanges,
    Less,
    More,
    Leave,
    New,
    PhaseChanged,
    TakeChanged,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::NoChanges,
        Self::Less,
        Self::More,
        Self::Leave,
        Self::New,
        Self::PhaseChanged,
        Self::TakeChanged,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoChanges => "No changes",
            Self::Less => "Less",
            Self::More => "More",
            Self::Leave => "Leave",
            Self::New => "New",
            Self::PhaseChanged => "Phase changed",
            Self::TakeChanged => "Take changed",
        }
    }
}

/// One classified shot. Deltas are present only for the interval-comparable
/// categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonEntry {
    pub shot: String,
    pub start_diff: Option<i64>,
    pub end_diff: Option<i64>,
}

impl ComparisonEntry {
    fn bare(shot: &str) -> Self {
        Self {
            shot: shot.to_string(),
            start_diff: None,
            end_diff: None,
        }
    }

    fn with_deltas(shot: &str, start_diff: i64, end_diff: i64) -> Self {
        Self {
            shot: shot.to_string(),
            start_diff: Some(start_diff),
            end_diff: Some(end_diff),
        }
    }
}

/// The comparator's two artifacts: classified entries and per-category EDL
/// fragments reconstructed from the stored records.
#[derive(Debug, Clone, Default)]
pub struct ComparisonOutcome {
    pub categories: BTreeMap<Category, Vec<ComparisonEntry>>,
    pub fragments: BTreeMap<Category, Vec<EdlRecord>>,
}

impl ComparisonOutcome {
    fn push(&mut self, category: Category, entry: ComparisonEntry, fragment: EdlRecord) {
        self.categories.entry(category).or_default().push(entry);
        self.fragments.entry(category).or_default().push(fragment);
    }

    /// Entries of one category; empty when nothing classified there.
    pub fn entries(&self, category: Category) -> &[ComparisonEntry] {
        self.categories.get(&category).map_or(&[], Vec::as_slice)
    }
}

/// Compare a base selection against a target selection.
pub fn compare(
    db: &EditDatabase,
    project: &str,
    base: &EditSelection,
    target: &EditSelection,
    rate: FrameRate,
) -> Result<ComparisonOutcome> {
    let base_shots = base.resolve(db, project);
    let target_shots = target.resolve(db, project);
    if base_shots.is_empty() {
        return Err(ConformError::Database(format!(
            "base selection matches no shots in {project}"
        )));
    }

    let mut outcome = ComparisonOutcome::default();

    for (shot, base_record) in &base_shots {
        match target_shots.get(shot) {
            None => outcome.push(
                Category::Leave,
                ComparisonEntry::bare(shot),
                base_record.to_edl(shot),
            ),
            Some(target_record) => {
                let (category, entry) = classify(shot, base_record, target_record, rate);
                outcome.push(category, entry, base_record.to_edl(shot));
            }
        }
    }
    for (shot, target_record) in &target_shots {
        if !base_shots.contains_key(shot) {
            outcome.push(
                Category::New,
                ComparisonEntry::bare(shot),
                target_record.to_edl(shot),
            );
        }
    }
    Ok(outcome)
}

fn classify(
    shot: &str,
    base: &ShotEditRecord,
    target: &ShotEditRecord,
    rate: FrameRate,
) -> (Category, ComparisonEntry) {
    if base.source_name != target.source_name {
        return (Category::TakeChanged, ComparisonEntry::bare(shot));
    }

    let base_in = base.source_in.to_frames(rate);
    let base_out = base.source_out_full.to_frames(rate);
    let target_in = target.source_in.to_frames(rate);
    let target_out = target.source_out_full.to_frames(rate);

    let disjoint = target_out < base_in || target_in > base_out;
    if disjoint {
        return (Category::PhaseChanged, ComparisonEntry::bare(shot));
    }

    let start_diff = target_in - base_in;
    let end_diff = target_out - base_out;
    let entry = ComparisonEntry::with_deltas(shot, start_diff, end_diff);

    let category = if start_diff == 0 && end_diff == 0 {
        Category::NoChanges
    } else if (start_diff > 0 && end_diff <= 0) || (start_diff >= 0 && end_diff < 0) {
        Category::Less
    } else {
        Category::More
    };
    (category, entry)
}
