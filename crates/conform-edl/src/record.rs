//! EDL record value types.

use conform_core::{FrameRate, Timecode};
use serde::{Deserialize, Serialize};

/// Track column of a CMX-3600 event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Both,
}

impl TrackKind {
    /// Parse the track column. Audio channels like `A2` or `AA` collapse to
    /// `Audio`; anything unrecognized is rejected.
    pub fn parse(token: &str) -> Option<Self> {
        match token.chars().next()? {
            'V' | 'v' => Some(Self::Video),
            'A' | 'a' => Some(Self::Audio),
            'B' | 'b' => Some(Self::Both),
            _ => None,
        }
    }

    /// CMX-3600 column code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Video => "V",
            Self::Audio => "A",
            Self::Both => "B",
        }
    }
}

/// One event from an EDL, after dialect resolution and retime normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdlRecord {
    /// Event id column (kept as text to preserve zero padding).
    pub id: String,
    /// Shot name resolved per dialect (source column, `*LOC` token, or
    /// `*FROM CLIP NAME:` value).
    pub shot_name: String,
    /// Source/reel column of the event line.
    pub source_name: String,
    pub track: TrackKind,
    /// Transition code column (`C`, `D`, ...).
    pub transition: String,
    pub source_in: Timecode,
    /// Source out after retime normalization; equals the raw value for
    /// non-retimed events.
    pub source_out: Timecode,
    /// The raw source out as written in the EDL, inclusive of any retime
    /// tail. Stored in the edit database.
    pub source_out_full: Timecode,
    pub record_in: Timecode,
    pub record_out: Timecode,
    /// Set by an `M2` line or inferred from a duration mismatch.
    pub retime: bool,
    /// `*FROM CLIP NAME:` value when present alongside another dialect.
    pub clip_name: Option<String>,
    /// `TITLE:` header of the EDL, when present.
    pub title: Option<String>,
}

impl EdlRecord {
    /// Duration of the record window in frames.
    pub fn record_duration(&self, rate: FrameRate) -> i64 {
        self.record_out.diff_frames(self.record_in, rate)
    }

    /// Duration of the (normalized) source window in frames.
    pub fn source_duration(&self, rate: FrameRate) -> i64 {
        self.source_out.diff_frames(self.source_in, rate)
    }
}
