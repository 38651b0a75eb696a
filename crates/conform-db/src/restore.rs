//! Shot restoration and max-source-range computation.
//!
//! Restoration restamps a raw target EDL with the shot names of a base edit
//! wherever source ranges overlap, so a fresh cut can be conformed against
//! named deliveries. Max-range finds, per shot, the widest source window
//! used across a set of edits.

use std::fmt::Write as _;
use std::path::Path;

use conform_core::{FrameRate, Result, Timecode};
use conform_edl::EdlRecord;
use tracing::debug;

use crate::compare::EditSelection;
use crate::store::EditDatabase;

/// One restored match, marking the midpoint of the record window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub shot: String,
    pub timecode: Timecode,
}

/// Output of a restoration run.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// The target records, shot names rewritten where a base match exists.
    pub records: Vec<EdlRecord>,
    /// One marker per rewritten record.
    pub markers: Vec<Marker>,
}

impl RestoreOutcome {
    /// Render the marker companion file, one line per match.
    pub fn marker_file(&self) -> String {
        let mut out = String::new();
        for marker in &self.markers {
            let _ = writeln!(out, "{} {}", marker.timecode, marker.shot);
        }
        out
    }

    pub fn write_marker_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.marker_file())?;
        Ok(())
    }
}

/// Restamp `target` records with base shot names on source-range overlap.
pub fn restore_shots(
    db: &EditDatabase,
    project: &str,
    base: &EditSelection,
    target: &[EdlRecord],
    rate: FrameRate,
) -> RestoreOutcome {
    let base_shots = match base {
        EditSelection::Edit(name) => db.query_by_edit(project, name),
        EditSelection::Actual => db.query_by_actual(project),
    };

    let mut records = target.to_vec();
    let mut markers = Vec::new();

    for record in &mut records {
        let target_in = record.source_in.to_frames(rate);
        let target_out = record.source_out.to_frames(rate);
        let matched = base_shots.iter().find(|(_, base_record)| {
            if base_record.source_name != record.source_name {
                return false;
            }
            let base_in = base_record.source_in.to_frames(rate);
            let base_out = base_record.source_out_full.to_frames(rate);
            target_in <= base_out && target_out >= base_in
        });
        if let Some((shot, _)) = matched {
            debug!("event {} restored to {shot}", record.id);
            record.shot_name = shot.clone();
            let midpoint =
                (record.record_in.to_frames(rate) + record.record_out.to_frames(rate)) / 2;
            markers.push(Marker {
                shot: shot.clone(),
                timecode: Timecode::from_frames(midpoint, rate),
            });
        }
    }
    RestoreOutcome { records, markers }
}

/// Per base shot, the widest source window across the comparison edits,
/// record-chained end-to-end on a virtual output reel.
pub fn max_source_ranges(
    db: &EditDatabase,
    project: &str,
    base_edit: &str,
    comparison_edits: &[&str],
    rate: FrameRate,
) -> Vec<EdlRecord> {
    let base_shots = db.query_by_edit(project, base_edit);
    let comparisons = db.query_by_edits(project, comparison_edits);

    // Base order on the virtual reel follows the base edit's record order.
    let mut ordered: Vec<_> = base_shots.iter().collect();
    ordered.sort_by_key(|(_, record)| record.record_in.to_frames(rate));

    let mut cursor = ordered
        .first()
        .map(|(_, record)| record.record_in.hour_origin().to_frames(rate))
        .unwrap_or(0);

    let mut out = Vec::with_capacity(ordered.len());
    for (shot, base_record) in ordered {
        let mut min_in = base_record.source_in.to_frames(rate);
        let mut max_out = base_record.source_out_full.to_frames(rate);

        if let Some(records) = comparisons.get(shot) {
            for record in records {
                if record.source_name != base_record.source_name {
                    continue;
                }
                let source_in = record.source_in.to_frames(rate);
                let source_out = record.source_out_full.to_frames(rate);
                // Only records reaching beyond the base window widen it.
                if source_in < min_in {
                    min_in = source_in;
                }
                if source_out > max_out {
                    max_out = source_out;
                }
            }
        }

        let duration = max_out - min_in;
        let mut record = base_record.to_edl(shot);
        record.source_in = Timecode::from_frames(min_in, rate);
        record.source_out = Timecode::from_frames(max_out, rate);
        record.source_out_full = record.source_out;
        record.record_in = Timecode::from_frames(cursor, rate);
        record.record_out = Timecode::from_frames(cursor + duration, rate);
        record.retime = false;
        cursor += duration;
        out.push(record);
    }
    out
}
