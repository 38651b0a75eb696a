//! OTIO JSON schema types.
//!
//! Field names and `OTIO_SCHEMA` tags follow the OpenTimelineIO JSON format
//! so the emitted document imports directly into any OTIO-aware NLE.

use conform_core::FrameRate;
use serde::{Deserialize, Serialize};

fn schema_tag(tag: &str) -> String {
    tag.to_string()
}

/// `RationalTime.1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioRationalTime {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub rate: f64,
    pub value: f64,
}

impl OtioRationalTime {
    pub fn new(value: i64, rate: FrameRate) -> Self {
        Self {
            schema: schema_tag("RationalTime.1"),
            rate: rate.fps() as f64,
            value: value as f64,
        }
    }
}

/// `TimeRange.1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioTimeRange {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub duration: OtioRationalTime,
    pub start_time: OtioRationalTime,
}

impl OtioTimeRange {
    pub fn new(start: i64, duration: i64, rate: FrameRate) -> Self {
        Self {
            schema: schema_tag("TimeRange.1"),
            duration: OtioRationalTime::new(duration, rate),
            start_time: OtioRationalTime::new(start, rate),
        }
    }
}

/// `ExternalReference.1` - a movie file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReference {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub target_url: String,
    pub available_range: Option<OtioTimeRange>,
}

/// `ImageSequenceReference.1` - a numbered frame sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSequenceReference {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub target_url_base: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub start_frame: i64,
    pub frame_step: i64,
    pub rate: f64,
    pub frame_zero_padding: i64,
    /// Always `"error"`: a hole in the sequence must fail the import, not
    /// silently show black.
    pub missing_frame_policy: String,
    pub available_range: Option<OtioTimeRange>,
}

/// Media reference payload of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaReference {
    External(ExternalReference),
    ImageSequence(ImageSequenceReference),
}

impl MediaReference {
    /// Movie reference with its intrinsic range.
    pub fn movie(target_url: impl Into<String>, available_range: OtioTimeRange) -> Self {
        Self::External(ExternalReference {
            schema: schema_tag("ExternalReference.1"),
            target_url: target_url.into(),
            available_range: Some(available_range),
        })
    }

    /// Image sequence reference; zero padding follows the on-disk digits.
    #[allow(clippy::too_many_arguments)]
    pub fn image_sequence(
        target_url_base: impl Into<String>,
        name_prefix: impl Into<String>,
        name_suffix: impl Into<String>,
        start_frame: i64,
        frame_zero_padding: i64,
        rate: FrameRate,
        available_range: OtioTimeRange,
    ) -> Self {
        Self::ImageSequence(ImageSequenceReference {
            schema: schema_tag("ImageSequenceReference.1"),
            target_url_base: target_url_base.into(),
            name_prefix: name_prefix.into(),
            name_suffix: name_suffix.into(),
            start_frame,
            frame_step: 1,
            rate: rate.fps() as f64,
            frame_zero_padding,
            missing_frame_policy: "error".to_string(),
            available_range: Some(available_range),
        })
    }
}

/// `Clip.1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioClip {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub name: String,
    pub source_range: OtioTimeRange,
    pub media_reference: MediaReference,
}

impl OtioClip {
    pub fn new(
        name: impl Into<String>,
        source_range: OtioTimeRange,
        media_reference: MediaReference,
    ) -> Self {
        Self {
            schema: schema_tag("Clip.1"),
            name: name.into(),
            source_range,
            media_reference,
        }
    }
}

/// `Gap.1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioGap {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub name: String,
    pub source_range: OtioTimeRange,
}

impl OtioGap {
    pub fn new(duration: i64, rate: FrameRate) -> Self {
        Self {
            schema: schema_tag("Gap.1"),
            name: String::new(),
            source_range: OtioTimeRange::new(0, duration, rate),
        }
    }
}

/// An item on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackChild {
    Clip(OtioClip),
    Gap(OtioGap),
}

impl TrackChild {
    /// Duration in frames of this item.
    pub fn duration(&self) -> i64 {
        let range = match self {
            Self::Clip(clip) => &clip.source_range,
            Self::Gap(gap) => &gap.source_range,
        };
        range.duration.value as i64
    }
}

/// `Track.1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioTrack {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub name: String,
    pub kind: String,
    pub children: Vec<TrackChild>,
}

impl OtioTrack {
    pub fn video(name: impl Into<String>) -> Self {
        Self {
            schema: schema_tag("Track.1"),
            name: name.into(),
            kind: "Video".to_string(),
            children: Vec::new(),
        }
    }

    /// Number of clips (gaps excluded).
    pub fn clip_count(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c, TrackChild::Clip(_)))
            .count()
    }

    /// Total duration of all items in frames.
    pub fn duration(&self) -> i64 {
        self.children.iter().map(TrackChild::duration).sum()
    }
}

/// `Stack.1` holding the parallel tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioStack {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub name: String,
    pub children: Vec<OtioTrack>,
}

/// `Timeline.1` - the document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtioTimeline {
    #[serde(rename = "OTIO_SCHEMA")]
    pub schema: String,
    pub name: String,
    pub global_start_time: Option<OtioRationalTime>,
    pub tracks: OtioStack,
}

impl OtioTimeline {
    pub fn new(name: impl Into<String>, tracks: Vec<OtioTrack>) -> Self {
        Self {
            schema: schema_tag("Timeline.1"),
            name: name.into(),
            global_start_time: None,
            tracks: OtioStack {
                schema: schema_tag("Stack.1"),
                name: "tracks".to_string(),
                children: tracks,
            },
        }
    }
}
