//! Timecode and frame arithmetic.
//!
//! All timeline math in the engine happens in integer frames at an integer
//! project rate. `Timecode` is the `HH:MM:SS:FF` boundary representation used
//! by EDLs, EXR headers and movie containers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConformError, Result};

/// An integer frame rate (frames per second).
///
/// Drop-frame rates (23.976, 29.97) are deliberately not representable; they
/// are rejected when a job configuration is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate(pub u32);

impl FrameRate {
    /// Film rate, the project default.
    pub const FPS_24: Self = Self(24);
    pub const FPS_25: Self = Self(25);
    pub const FPS_30: Self = Self(30);

    /// Create a rate, rejecting zero.
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(ConformError::InvalidParameter(
                "frame rate must be positive".to_string(),
            ));
        }
        Ok(Self(fps))
    }

    /// Frames per second as i64 for frame math.
    #[inline]
    pub fn fps(self) -> i64 {
        self.0 as i64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// An `HH:MM:SS:FF` timecode.
///
/// Serializes as its display string so EDL records and database entries stay
/// human-readable. The frame field must be below the rate it is evaluated
/// at; this is checked at conversion time, not at parse time, because an EDL
/// does not carry its rate inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

impl Timecode {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// Parse an `HH:MM:SS:FF` string.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 4 {
            return Err(ConformError::InvalidTimecode(s.to_string()));
        }
        let field = |p: &str| -> Result<u32> {
            p.parse::<u32>()
                .map_err(|_| ConformError::InvalidTimecode(s.to_string()))
        };
        let tc = Self {
            hours: field(parts[0])?,
            minutes: field(parts[1])?,
            seconds: field(parts[2])?,
            frames: field(parts[3])?,
        };
        if tc.minutes > 59 || tc.seconds > 59 {
            return Err(ConformError::InvalidTimecode(s.to_string()));
        }
        Ok(tc)
    }

    /// Total frame count at the given rate.
    #[inline]
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        let secs = self.hours as i64 * 3600 + self.minutes as i64 * 60 + self.seconds as i64;
        secs * rate.fps() + self.frames as i64
    }

    /// Build a timecode from a non-negative frame count at the given rate.
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        let frames = frames.max(0);
        let fps = rate.fps();
        let total_secs = frames / fps;
        Self {
            hours: (total_secs / 3600) as u32,
            minutes: ((total_secs / 60) % 60) as u32,
            seconds: (total_secs % 60) as u32,
            frames: (frames % fps) as u32,
        }
    }

    /// Add a (possibly negative) frame offset.
    pub fn add_frames(self, frames: i64, rate: FrameRate) -> Self {
        Self::from_frames(self.to_frames(rate) + frames, rate)
    }

    /// Signed frame distance `self - other`.
    pub fn diff_frames(self, other: Self, rate: FrameRate) -> i64 {
        self.to_frames(rate) - other.to_frames(rate)
    }

    /// Timecode at the start of this timecode's hour. The record hour names
    /// the reel, so gaps on a track are measured from here.
    pub fn hour_origin(self) -> Self {
        Self {
            hours: self.hours,
            minutes: 0,
            seconds: 0,
            frames: 0,
        }
    }
}

impl FromStr for Timecode {
    type Err = ConformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

impl Serialize for Timecode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
