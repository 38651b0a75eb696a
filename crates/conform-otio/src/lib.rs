//! Conform OTIO - OpenTimelineIO-compatible output document
//!
//! Models just enough of the OTIO JSON schema for a conform: a timeline of
//! parallel video tracks whose children are gaps and clips referencing
//! either movie files or image sequences.

pub mod builder;
pub mod schema;

pub use builder::{TimelineBuilder, TRACK_POOL};
pub use schema::{
    ExternalReference, ImageSequenceReference, MediaReference, OtioClip, OtioGap, OtioTimeRange,
    OtioTimeline, OtioTrack, TrackChild,
};
