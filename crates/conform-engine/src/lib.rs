//! Conform Engine - the conform decision core
//!
//! For every EDL record: locate media versions, probe and validate them,
//! reconcile the media's intrinsic range with the EDL's requested range
//! under the selected placement policy, and emit clips and gaps onto the
//! output timeline. Long jobs run on a background worker reporting through
//! progress/warning/result channels with cooperative cancellation.

pub mod engine;
pub mod job;
pub mod place;
pub mod view;

pub use engine::{run_conform, EngineEvent, JobSummary};
pub use job::{CancelToken, ConformJob, JobHandle, JobProgress};
pub use place::{compute_gap, place, ClipWindow, EdlWindow, Placement};
pub use view::{StaticTimelineView, TimelineView};
