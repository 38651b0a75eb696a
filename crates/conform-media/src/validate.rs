//! Per-shot validation.
//!
//! Checks run in a fixed order and short-circuit on the first fatal result:
//! duplicate-against-host-timeline, frame continuity, frame rate, then the
//! advisory size-anomaly scan. Movies only participate in the duplicate
//! check; their frames are not individually inspectable.

use std::collections::HashSet;

use conform_core::FrameRate;
use tracing::debug;

use crate::candidate::{SequenceCandidate, ShotCandidate};
use crate::probe::ProbeInfo;

/// A frame whose size is below this fraction of the running maximum is
/// reported as an anomaly.
const SIZE_ANOMALY_RATIO: f64 = 0.10;

/// Non-fatal findings attached to a valid shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotWarning {
    /// A frame is suspiciously small next to its neighbours.
    SizeAnomaly { file_name: String },
}

impl std::fmt::Display for ShotWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SizeAnomaly { file_name } => {
                write!(f, "frame {file_name} is under 10% of the sequence maximum")
            }
        }
    }
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Usable, possibly with advisory warnings.
    Valid(Vec<ShotWarning>),
    /// Already on the host timeline; skipped without a warning.
    Duplicate,
    /// Fatal defect; candidate is skipped with one warning line.
    Invalid(String),
}

/// Validator configured once per job.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    project_rate: FrameRate,
    /// Clip names currently on the host timeline; `None` disables the
    /// duplicate check.
    on_timeline: Option<HashSet<String>>,
}

impl Validator {
    pub fn new(project_rate: FrameRate, on_timeline: Option<HashSet<String>>) -> Self {
        Self {
            project_rate,
            on_timeline,
        }
    }

    /// Run the check suite for one probed candidate.
    pub fn validate(&self, candidate: &ShotCandidate, probe: &ProbeInfo) -> Validation {
        if let Some(on_timeline) = &self.on_timeline {
            if on_timeline.contains(&candidate.name()) {
                debug!("{} already on timeline, skipped", candidate.name());
                return Validation::Duplicate;
            }
        }

        match candidate {
            ShotCandidate::Movie(_) => Validation::Valid(Vec::new()),
            ShotCandidate::Sequence(seq) => self.validate_sequence(seq, probe),
        }
    }

    fn validate_sequence(&self, seq: &SequenceCandidate, probe: &ProbeInfo) -> Validation {
        if let Some(defect) = continuity_defect(seq) {
            return Validation::Invalid(defect);
        }

        if let Some(media_rate) = probe.media_rate {
            let media_fps = media_rate.round() as i64;
            if media_fps != self.project_rate.fps() {
                return Validation::Invalid(format!(
                    "{}: frame rate {media_fps} does not match project {}",
                    seq.name(),
                    self.project_rate.fps()
                ));
            }
        }

        Validation::Valid(size_anomalies(seq))
    }
}

/// Frame numbers must advance by exactly one.
fn continuity_defect(seq: &SequenceCandidate) -> Option<String> {
    for pair in seq.frames.windows(2) {
        if pair[1].number != pair[0].number + 1 {
            return Some(format!(
                "{}: frame gap between {} and {}",
                seq.name(),
                pair[0].number,
                pair[1].number
            ));
        }
    }
    None
}

/// Advisory scan: any frame under 10% of the running maximum size.
fn size_anomalies(seq: &SequenceCandidate) -> Vec<ShotWarning> {
    let mut warnings = Vec::new();
    let mut max_size = 0u64;
    for frame in &seq.frames {
        let Ok(meta) = std::fs::metadata(seq.dir.join(&frame.file_name)) else {
            continue;
        };
        let size = meta.len();
        max_size = max_size.max(size);
        if max_size > 0 && (size as f64) < (max_size as f64) * SIZE_ANOMALY_RATIO {
            warnings.push(ShotWarning::SizeAnomaly {
                file_name: frame.file_name.clone(),
            });
        }
    }
    warnings
}
