//! Job configuration.
//!
//! One `JobConfig` describes one conform job: which EDL to read, where the
//! delivered media lives, where the OTIO document goes, and which placement
//! policy to apply. Loadable from JSON so front-ends can hand the engine a
//! single object.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConformError, Result};
use crate::timecode::FrameRate;

/// How clip source ranges are reconciled against the EDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlesLogic {
    /// Ignore the EDL source range; anchor at the media start plus a UI
    /// supplied offset (typically a 3-frame slate).
    FromStartFrame,
    /// Anchor at the EDL source-in when the EDL window fits the media.
    FromEdlStart,
    /// Full overlap analysis between media range and EDL window.
    FullLogic,
}

impl Default for HandlesLogic {
    fn default() -> Self {
        Self::FullLogic
    }
}

/// Host timeline track span used for duplicate detection, inclusive 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRange {
    pub first: u32,
    pub last: u32,
}

impl Default for TrackRange {
    fn default() -> Self {
        Self { first: 1, last: 10 }
    }
}

/// Configuration for a single conform job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Path to the EDL file.
    pub edl_path: PathBuf,
    /// Root of the delivered media tree.
    pub shots_folder: PathBuf,
    /// Where the OTIO timeline document is written.
    pub otio_path: PathBuf,
    /// Clip extension to scan for (e.g. "exr", "mov").
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Project frame rate; integer rates only.
    #[serde(default)]
    pub frame_rate: FrameRate,
    /// Skip shots already present on the host timeline.
    #[serde(default)]
    pub ignore_duplicates: bool,
    /// Placement policy.
    #[serde(default)]
    pub handles_logic: HandlesLogic,
    /// Frame offset applied under `FromStartFrame` (slate offset).
    #[serde(default = "default_start_frame_ui")]
    pub start_frame_ui: i64,
    /// Drop the first movie frame as a slate, keeping it as handle.
    #[serde(default)]
    pub include_slate: bool,
    /// Host timeline tracks inspected for duplicates.
    #[serde(default)]
    pub track_range: TrackRange,
}

fn default_extension() -> String {
    "exr".to_string()
}

fn default_start_frame_ui() -> i64 {
    3
}

impl JobConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data)
            .map_err(|e| ConformError::Serialization(format!("invalid job config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate.0 == 0 {
            return Err(ConformError::InvalidParameter(
                "frame rate must be positive".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(ConformError::InvalidParameter(
                "clip extension must not be empty".to_string(),
            ));
        }
        if self.track_range.first == 0 || self.track_range.last < self.track_range.first {
            return Err(ConformError::InvalidParameter(format!(
                "invalid track range {}..{}",
                self.track_range.first, self.track_range.last
            )));
        }
        Ok(())
    }
}
