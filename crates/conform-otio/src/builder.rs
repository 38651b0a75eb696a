//! Timeline document assembly.

use std::path::Path;

use conform_core::{ConformError, FrameRate, Result};

use crate::schema::{OtioClip, OtioGap, OtioTimeline, OtioTrack, TrackChild};

/// Fixed number of parallel video tracks. Version k of a shot lands on
/// track k, so the pool bounds how many versions one record may resolve to.
pub const TRACK_POOL: usize = 10;

/// Builds the output timeline: a fixed pool of video tracks receiving clips
/// and gaps in record order.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    name: String,
    rate: FrameRate,
    tracks: Vec<OtioTrack>,
}

impl TimelineBuilder {
    pub fn new(name: impl Into<String>, rate: FrameRate) -> Self {
        let tracks = (1..=TRACK_POOL)
            .map(|i| OtioTrack::video(format!("Video{i}")))
            .collect();
        Self {
            name: name.into(),
            rate,
            tracks,
        }
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Append a gap to a 1-based track. Non-positive durations are ignored.
    pub fn append_gap(&mut self, track: usize, duration: i64) -> Result<()> {
        if duration <= 0 {
            return Ok(());
        }
        let rate = self.rate;
        let track = self.track_mut(track)?;
        track
            .children
            .push(TrackChild::Gap(OtioGap::new(duration, rate)));
        Ok(())
    }

    /// Append a clip to a 1-based track.
    pub fn append_clip(&mut self, track: usize, clip: OtioClip) -> Result<()> {
        let track = self.track_mut(track)?;
        track.children.push(TrackChild::Clip(clip));
        Ok(())
    }

    fn track_mut(&mut self, track: usize) -> Result<&mut OtioTrack> {
        if track == 0 || track > self.tracks.len() {
            return Err(ConformError::InvalidParameter(format!(
                "track {track} outside pool of {}",
                self.tracks.len()
            )));
        }
        Ok(&mut self.tracks[track - 1])
    }

    /// Total clips across all tracks.
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(OtioTrack::clip_count).sum()
    }

    /// Finish the document.
    pub fn build(self) -> OtioTimeline {
        OtioTimeline::new(self.name, self.tracks)
    }

    /// Serialize and write the document to `path`.
    pub fn write(self, path: &Path) -> Result<OtioTimeline> {
        let timeline = self.build();
        let data = serde_json::to_vec_pretty(&timeline)
            .map_err(|e| ConformError::Serialization(format!("otio serialize: {e}")))?;
        std::fs::write(path, data)?;
        Ok(timeline)
    }
}
