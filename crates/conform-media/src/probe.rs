//! Candidate probing.
//!
//! Extracts the intrinsic start frame and duration for a candidate. Image
//! sequences are read through their first frame's EXR header; movies go
//! through ffprobe (spawned via ffmpeg-sidecar, no FFmpeg headers needed).
//!
//! Start frames carry a `-1` offset compensating the host NLE's inclusive
//! frame convention. The offset is part of the import protocol, not a fudge
//! factor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use conform_core::{ConformError, FrameRate, Result, Timecode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::candidate::{MovieCandidate, SequenceCandidate, ShotCandidate};
use crate::exr;

/// Intrinsic media properties of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeInfo {
    /// Start frame at project rate, NLE-compensated (`to_frames(tc) - 1`).
    pub start_frame: i64,
    /// Duration in frames.
    pub duration: i64,
    /// Frame rate reported by the media itself, when present.
    pub media_rate: Option<f64>,
}

impl ProbeInfo {
    /// Last usable source frame, exclusive.
    pub fn end_frame(&self) -> i64 {
        self.start_frame + self.duration
    }
}

/// Probe a candidate at the project rate.
///
/// A sequence without a header timecode degrades to a `00:00:00:00` start
/// (soft failure); a movie without a container timecode is a hard probe
/// failure, the caller skips the candidate.
pub fn probe_candidate(candidate: &ShotCandidate, rate: FrameRate) -> Result<ProbeInfo> {
    match candidate {
        ShotCandidate::Sequence(seq) => probe_sequence(seq, rate),
        ShotCandidate::Movie(movie) => probe_movie(movie, rate),
    }
}

fn probe_sequence(seq: &SequenceCandidate, rate: FrameRate) -> Result<ProbeInfo> {
    let header = if seq.extension.eq_ignore_ascii_case("exr") {
        match exr::read_header(&seq.first_frame_path()) {
            Ok(header) => header,
            Err(e) => {
                warn!("{}: header unreadable ({e}), assuming zero start", seq.name());
                exr::ExrHeader::default()
            }
        }
    } else {
        exr::ExrHeader::default()
    };

    let start_tc = header.timecode.unwrap_or(Timecode::ZERO);
    Ok(ProbeInfo {
        start_frame: start_tc.to_frames(rate) - 1,
        duration: seq.frames.len() as i64,
        media_rate: header.frame_rate,
    })
}

fn probe_movie(movie: &MovieCandidate, rate: FrameRate) -> Result<ProbeInfo> {
    let report = ffprobe_report(&movie.path)?;
    let Some(tc) = report.timecode()? else {
        return Err(ConformError::Probe(format!(
            "{}: container carries no start timecode",
            movie.name()
        )));
    };
    let seconds = report.duration_seconds().ok_or_else(|| {
        ConformError::Probe(format!("{}: container reports no duration", movie.name()))
    })?;
    let duration = (seconds * rate.fps() as f64).floor() as i64 - 1;
    if duration < 1 {
        return Err(ConformError::Probe(format!(
            "{}: shorter than one frame",
            movie.name()
        )));
    }
    Ok(ProbeInfo {
        start_frame: tc.to_frames(rate) - 1,
        duration,
        media_rate: report.frame_rate(),
    })
}

// ── ffprobe plumbing ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FfprobeReport {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    avg_frame_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl FfprobeReport {
    /// Container start timecode: format tags first, then stream tags (the
    /// `tmcd` track lands there for QuickTime).
    fn timecode(&self) -> Result<Option<Timecode>> {
        let tag = self
            .format
            .as_ref()
            .and_then(|f| f.tags.get("timecode"))
            .or_else(|| self.streams.iter().find_map(|s| s.tags.get("timecode")));
        match tag {
            Some(text) => Timecode::parse(text).map(Some),
            None => Ok(None),
        }
    }

    fn duration_seconds(&self) -> Option<f64> {
        self.format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse().ok())
    }

    fn frame_rate(&self) -> Option<f64> {
        let raw = self.streams.iter().find_map(|s| s.avg_frame_rate.as_deref())?;
        match raw.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                (den != 0.0).then(|| num / den)
            }
            None => raw.parse().ok(),
        }
    }
}

fn ffprobe_binary() -> Result<PathBuf> {
    let sidecar = ffmpeg_sidecar::paths::sidecar_dir()
        .map(|dir| dir.join("ffprobe"))
        .ok()
        .filter(|p| p.exists());
    match sidecar {
        Some(path) => Ok(path),
        None => which::which("ffprobe")
            .map_err(|e| ConformError::Probe(format!("ffprobe not found: {e}"))),
    }
}

fn ffprobe_report(path: &Path) -> Result<FfprobeReport> {
    let binary = ffprobe_binary()?;
    debug!("probing {} with {}", path.display(), binary.display());
    let output = Command::new(binary)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()?;
    if !output.status.success() {
        return Err(ConformError::Probe(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    serde_json::from_slice(&output.stdout)
        .map_err(|e| ConformError::Probe(format!("unreadable ffprobe output: {e}")))
}
