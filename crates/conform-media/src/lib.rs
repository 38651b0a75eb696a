//! Conform Media - delivered shot discovery and inspection
//!
//! This crate handles:
//! - Walking a media root and indexing candidates by shot name
//! - EXR header reading (start timecode, frame rate) without decoding pixels
//! - Movie container probing through ffprobe
//! - Per-shot validation (continuity, rate, size anomalies, duplicates)

pub mod candidate;
pub mod exr;
pub mod probe;
pub mod scanner;
pub mod validate;

pub use candidate::{MovieCandidate, SequenceCandidate, ShotCandidate};
pub use probe::{probe_candidate, ProbeInfo};
pub use scanner::ShotIndex;
pub use validate::{ShotWarning, Validation, Validator};
