//! Placement math.
//!
//! Pure functions reconciling a media source window with an EDL record
//! window. Two one-frame compensations run through everything here:
//! `resolve_compensation_tc` turns an intrinsic frame index into the host
//! NLE's inclusive source reference, and `resolve_compensation_edl` turns
//! the EDL's exclusive source-out into an inclusive bound before any
//! comparison. Both are part of the import protocol and must stay
//! bit-exact.

use conform_core::{FrameRate, HandlesLogic, Timecode};
use tracing::info;

/// The media's own source window in raw (uncompensated) frames at project
/// rate: `source_in = to_frames(header timecode)`, `source_out = source_in +
/// duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub source_in: i64,
    pub duration: i64,
}

impl ClipWindow {
    pub fn source_out(&self) -> i64 {
        self.source_in + self.duration
    }
}

/// The EDL record's windows in raw frames at project rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdlWindow {
    pub source_in: i64,
    /// Exclusive upper bound, as the EDL convention stores it.
    pub source_out: i64,
    pub record_in: i64,
    pub record_out: i64,
    pub retime: bool,
}

impl EdlWindow {
    /// Requested length on the output timeline.
    pub fn timeline_duration(&self) -> i64 {
        self.record_out - self.record_in
    }
}

/// Where one clip goes on its track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Gap before the clip; non-positive values are omitted downstream.
    pub pre_gap: i64,
    /// Gap after the clip holding the unfilled tail of the EDL window.
    pub post_gap: i64,
    /// NLE source frame the clip starts at; `None` means the clip plays
    /// from its own head with no intra-clip offset.
    pub source_start: Option<i64>,
    /// Clip duration on the timeline.
    pub duration: i64,
    /// Advisory findings; placement proceeds regardless.
    pub warnings: Vec<String>,
}

/// Intrinsic frame index → NLE inclusive source reference.
#[inline]
pub fn resolve_compensation_tc(frame: i64) -> i64 {
    frame - 1
}

/// EDL exclusive source-out → inclusive comparison bound.
#[inline]
pub fn resolve_compensation_edl(frame: i64) -> i64 {
    frame - 1
}

/// Gap between the previous clip on a track and this record. With no
/// previous clip the gap runs from the record hour origin (the hour names
/// the reel).
pub fn compute_gap(record_in: Timecode, last_record_out: Option<i64>, rate: FrameRate) -> i64 {
    let record_in_frames = record_in.to_frames(rate);
    match last_record_out {
        Some(last) => record_in_frames - last,
        None => record_in_frames - record_in.hour_origin().to_frames(rate),
    }
}

/// Resolve one candidate against one EDL record.
///
/// `base_gap` is the track gap computed by [`compute_gap`]; overlap cases
/// that trim the clip head widen it. `slate_trim` applies to movies when
/// the job keeps the slate frame as handle.
pub fn place(
    policy: HandlesLogic,
    clip: ClipWindow,
    edl: EdlWindow,
    ui_start_frame: i64,
    slate_trim: bool,
    base_gap: i64,
) -> Placement {
    let mut placement = match policy {
        HandlesLogic::FromStartFrame => place_from_start_frame(clip, edl, ui_start_frame, base_gap),
        HandlesLogic::FromEdlStart => place_from_edl_start(clip, edl, base_gap),
        HandlesLogic::FullLogic => place_full_logic(clip, edl, ui_start_frame, base_gap),
    };
    if slate_trim {
        placement.source_start = placement.source_start.map(|s| s + 1);
    }
    placement
}

/// Policy A: anchor at the media start plus the UI slate offset, ignoring
/// the EDL source range.
fn place_from_start_frame(
    clip: ClipWindow,
    edl: EdlWindow,
    ui_start_frame: i64,
    base_gap: i64,
) -> Placement {
    let duration = edl.timeline_duration();
    let mut warnings = Vec::new();
    if clip.duration < duration {
        warnings.push("shot shorter than EDL".to_string());
    }
    Placement {
        pre_gap: base_gap,
        post_gap: 0,
        source_start: Some(resolve_compensation_tc(clip.source_in) + ui_start_frame),
        duration,
        warnings,
    }
}

/// Policy B: anchor at the EDL source-in when the EDL window fits inside
/// the media; otherwise honor the timeline window with no intra-clip
/// offset.
fn place_from_edl_start(clip: ClipWindow, edl: EdlWindow, base_gap: i64) -> Placement {
    let duration = edl.timeline_duration();
    let edl_out = resolve_compensation_edl(edl.source_out);
    let mut warnings = Vec::new();
    if clip.duration < duration {
        warnings.push("shot shorter than EDL".to_string());
    }
    let source_start = if edl.source_in >= clip.source_in && edl_out <= clip.source_out() {
        Some(resolve_compensation_tc(edl.source_in))
    } else {
        None
    };
    Placement {
        pre_gap: base_gap,
        post_gap: 0,
        source_start,
        duration,
        warnings,
    }
}

/// Policy C: full overlap analysis, five disjoint cases.
fn place_full_logic(
    clip: ClipWindow,
    edl: EdlWindow,
    ui_start_frame: i64,
    base_gap: i64,
) -> Placement {
    let timeline_duration = edl.timeline_duration();
    let src_in = clip.source_in;
    let src_out = clip.source_out();
    let edl_in = edl.source_in;
    let edl_out = resolve_compensation_edl(edl.source_out);

    // No overlap at all: fall back to policy A.
    if src_out < edl_in || src_in > edl_out {
        let mut placement = place_from_start_frame(clip, edl, ui_start_frame, base_gap);
        placement
            .warnings
            .push("no range intersection between shot and EDL".to_string());
        return placement;
    }

    let placement = if edl_in >= src_in && edl_out <= src_out {
        // EDL window fully inside the source (boundaries inclusive).
        Placement {
            pre_gap: base_gap,
            post_gap: 0,
            source_start: Some(resolve_compensation_tc(edl_in)),
            duration: timeline_duration,
            warnings: if clip.duration < timeline_duration {
                vec!["shot shorter than EDL".to_string()]
            } else {
                Vec::new()
            },
        }
    } else if edl_in >= src_in && edl_out > src_out {
        // Source covers the head of the EDL window but ends inside it; the
        // tail of the window is held by a post gap.
        let tail = edl_out - src_out;
        Placement {
            pre_gap: base_gap,
            post_gap: tail,
            source_start: Some(resolve_compensation_tc(edl_in)),
            duration: timeline_duration - tail,
            warnings: vec!["shot shorter than EDL at end".to_string()],
        }
    } else if edl_in < src_in && edl_out <= src_out {
        // Source starts inside the EDL window and extends past it.
        let lead = src_in - edl_in;
        Placement {
            pre_gap: base_gap + lead,
            post_gap: 0,
            source_start: Some(resolve_compensation_tc(src_in)),
            duration: timeline_duration - lead,
            warnings: vec!["shot shorter than EDL at start".to_string()],
        }
    } else {
        // Source fully inside the EDL window.
        let lead = src_in - edl_in;
        let tail = edl_out - src_out;
        Placement {
            pre_gap: base_gap + lead,
            post_gap: tail,
            source_start: Some(resolve_compensation_tc(src_in)),
            duration: timeline_duration - lead - tail,
            warnings: vec!["shot shorter than EDL at start and end".to_string()],
        }
    };

    if edl.retime && !placement.warnings.is_empty() {
        info!("retimed record placed with partial overlap; placement math unchanged");
    }
    placement
}
