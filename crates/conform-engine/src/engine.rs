//! Conform run.
//!
//! Drives one job end to end: parse the EDL, index the delivery tree, then
//! walk the records in order resolving each shot name to media versions and
//! emitting clips and gaps onto the output timeline. Version k of a shot
//! lands on track k. A record that resolves to nothing degrades to a
//! warning; only the EDL itself and the output document are fatal.

use std::path::{Path, PathBuf};

use conform_core::{ConformError, FrameRate, JobConfig, Result};
use conform_edl::{EdlParser, EdlRecord, TrackKind};
use conform_media::{probe_candidate, ProbeInfo, ShotCandidate, ShotIndex, Validation, Validator};
use conform_otio::{MediaReference, OtioClip, OtioTimeRange, TimelineBuilder, TRACK_POOL};
use tracing::{debug, info};

use crate::job::CancelToken;
use crate::place::{self, ClipWindow, EdlWindow};
use crate::view::TimelineView;

/// Progress and advisory traffic emitted while a run is underway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// One record finished processing.
    Progress {
        done: usize,
        total: usize,
        shot: String,
    },
    /// A non-fatal finding; the run continues.
    Warning(String),
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    /// Clips placed across all tracks.
    pub clips_placed: usize,
    /// Records that produced no clip at all.
    pub records_skipped: usize,
    /// Where the timeline document was written.
    pub otio_path: PathBuf,
}

/// Run one conform job, reporting through `sink`.
///
/// `view` supplies the host timeline clip names for duplicate detection;
/// without one, `ignore_duplicates` has nothing to check against and is
/// inert. Cancellation is honored between records.
pub fn run_conform(
    config: &JobConfig,
    view: Option<&dyn TimelineView>,
    cancel: &CancelToken,
    sink: &mut dyn FnMut(EngineEvent),
) -> Result<JobSummary> {
    config.validate()?;
    let rate = config.frame_rate;

    let records = EdlParser::new(rate).parse_file(&config.edl_path)?;
    info!(
        "conforming {} records from {}",
        records.len(),
        config.edl_path.display()
    );

    let index = ShotIndex::scan(&config.shots_folder, &config.extension)?;
    if index.is_empty() {
        sink(EngineEvent::Warning(format!(
            "no {} media found under {}",
            config.extension,
            config.shots_folder.display()
        )));
    }

    let on_timeline = match (config.ignore_duplicates, view) {
        (true, Some(view)) => Some(view.clip_names(config.track_range, &config.extension)?),
        _ => None,
    };
    let validator = Validator::new(rate, on_timeline);

    let name = timeline_name(&records, &config.otio_path);
    let mut builder = TimelineBuilder::new(name, rate);
    let mut last_record_out: [Option<i64>; TRACK_POOL] = [None; TRACK_POOL];
    let mut records_skipped = 0usize;
    let total = records.len();

    for (done, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ConformError::Cancelled);
        }
        let placed = conform_record(
            record,
            &index,
            &validator,
            config,
            &mut builder,
            &mut last_record_out,
            sink,
        )?;
        if placed == 0 {
            records_skipped += 1;
        }
        sink(EngineEvent::Progress {
            done: done + 1,
            total,
            shot: record.shot_name.clone(),
        });
    }

    let clips_placed = builder.clip_count();
    builder.write(&config.otio_path)?;
    if clips_placed == 0 {
        sink(EngineEvent::Warning(
            "no clips were placed; the timeline is empty".to_string(),
        ));
    }
    info!(
        "wrote {} clips to {}",
        clips_placed,
        config.otio_path.display()
    );
    Ok(JobSummary {
        clips_placed,
        records_skipped,
        otio_path: config.otio_path.clone(),
    })
}

/// Process one record; returns the number of clips placed for it.
fn conform_record(
    record: &EdlRecord,
    index: &ShotIndex,
    validator: &Validator,
    config: &JobConfig,
    builder: &mut TimelineBuilder,
    last_record_out: &mut [Option<i64>; TRACK_POOL],
    sink: &mut dyn FnMut(EngineEvent),
) -> Result<usize> {
    let rate = config.frame_rate;
    if record.track == TrackKind::Audio {
        debug!("event {}: audio-only, skipped", record.id);
        return Ok(0);
    }

    let versions = index.find(&record.shot_name)?;
    if versions.is_empty() {
        sink(EngineEvent::Warning(format!(
            "{}: no media found", record.shot_name
        )));
        return Ok(0);
    }
    if versions.len() > TRACK_POOL {
        sink(EngineEvent::Warning(format!(
            "{}: {} versions found, only the first {TRACK_POOL} placed",
            record.shot_name,
            versions.len()
        )));
    }

    let mut placed = 0usize;
    for (version, candidate) in versions.iter().take(TRACK_POOL).enumerate() {
        let track = version + 1;

        let probe = match probe_candidate(candidate, rate) {
            Ok(probe) => probe,
            Err(e) => {
                sink(EngineEvent::Warning(format!("{}: {e}", candidate.name())));
                continue;
            }
        };
        match validator.validate(candidate, &probe) {
            Validation::Valid(warnings) => {
                for warning in warnings {
                    sink(EngineEvent::Warning(format!(
                        "{}: {warning}",
                        candidate.name()
                    )));
                }
            }
            Validation::Duplicate => continue,
            Validation::Invalid(defect) => {
                sink(EngineEvent::Warning(defect));
                continue;
            }
        }

        let base_gap = place::compute_gap(record.record_in, last_record_out[track - 1], rate);
        let clip = ClipWindow {
            // Undo the NLE compensation; placement math runs on raw frames.
            source_in: probe.start_frame + 1,
            duration: probe.duration,
        };
        let edl = EdlWindow {
            source_in: record.source_in.to_frames(rate),
            source_out: record.source_out.to_frames(rate),
            record_in: record.record_in.to_frames(rate),
            record_out: record.record_out.to_frames(rate),
            retime: record.retime,
        };
        let slate_trim = config.include_slate && candidate.is_movie();
        let placement = place::place(
            config.handles_logic,
            clip,
            edl,
            config.start_frame_ui,
            slate_trim,
            base_gap,
        );
        for warning in &placement.warnings {
            sink(EngineEvent::Warning(format!(
                "{}: {warning}",
                candidate.name()
            )));
        }

        builder.append_gap(track, placement.pre_gap)?;
        builder.append_clip(track, make_clip(candidate, &probe, &placement, rate))?;
        builder.append_gap(track, placement.post_gap)?;
        last_record_out[track - 1] = Some(record.record_out.to_frames(rate));
        placed += 1;
    }
    Ok(placed)
}

fn timeline_name(records: &[EdlRecord], otio_path: &Path) -> String {
    records
        .iter()
        .find_map(|r| r.title.clone())
        .or_else(|| {
            otio_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "conform".to_string())
}

fn make_clip(
    candidate: &ShotCandidate,
    probe: &ProbeInfo,
    placement: &place::Placement,
    rate: FrameRate,
) -> OtioClip {
    let available_range = OtioTimeRange::new(probe.start_frame, probe.duration, rate);
    let source_start = placement.source_start.unwrap_or(probe.start_frame);
    let source_range = OtioTimeRange::new(source_start, placement.duration, rate);
    let reference = match candidate {
        ShotCandidate::Movie(movie) => {
            MediaReference::movie(file_url(&movie.path), available_range)
        }
        ShotCandidate::Sequence(seq) => MediaReference::image_sequence(
            format!("{}/", file_url(&seq.dir)),
            seq.prefix.clone(),
            format!(".{}", seq.extension),
            seq.first_frame(),
            seq.padding as i64,
            rate,
            available_range,
        ),
    };
    OtioClip::new(candidate.name(), source_range, reference)
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::StaticTimelineView;
    use conform_core::{HandlesLogic, TrackRange};
    use std::fs;

    fn write_frames(dir: &Path, prefix: &str, range: std::ops::RangeInclusive<i64>) {
        fs::create_dir_all(dir).unwrap();
        for n in range {
            fs::write(dir.join(format!("{prefix}.{n:04}.exr")), b"x").unwrap();
        }
    }

    fn config(root: &Path, edl: &Path, otio: &Path) -> JobConfig {
        JobConfig {
            edl_path: edl.to_path_buf(),
            shots_folder: root.to_path_buf(),
            otio_path: otio.to_path_buf(),
            extension: "exr".to_string(),
            frame_rate: FrameRate::FPS_24,
            ignore_duplicates: false,
            handles_logic: HandlesLogic::FromStartFrame,
            start_frame_ui: 3,
            include_slate: false,
            track_range: TrackRange::default(),
        }
    }

    fn run(config: &JobConfig, view: Option<&dyn TimelineView>) -> (JobSummary, Vec<EngineEvent>) {
        let mut events = Vec::new();
        let summary = run_conform(config, view, &CancelToken::new(), &mut |e| events.push(e))
            .expect("run succeeds");
        (summary, events)
    }

    fn warnings(events: &[EngineEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Warning(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_conform_places_clips_per_version() {
        let tmp = tempfile::tempdir().unwrap();
        let shots = tmp.path().join("shots");
        write_frames(&shots.join("a/sh010_v001"), "sh010_v001", 1001..=1096);
        write_frames(&shots.join("b/sh010_v002"), "sh010_v002", 1001..=1096);

        let edl_path = tmp.path().join("cut.edl");
        fs::write(
            &edl_path,
            "TITLE: ep101_cut01\n\
             001  reelA  V  C  00:00:41:16 00:00:45:16 01:00:00:00 01:00:04:00\n\
             *FROM CLIP NAME: sh010\n",
        )
        .unwrap();
        let otio_path = tmp.path().join("out.otio");
        let (summary, events) = run(&config(&shots, &edl_path, &otio_path), None);

        assert_eq!(summary.clips_placed, 2);
        assert_eq!(summary.records_skipped, 0);

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(&otio_path).unwrap()).unwrap();
        assert_eq!(doc["name"], "ep101_cut01");
        // Version 1 on Video1, version 2 on Video2; tracks 3..10 stay empty.
        let tracks = &doc["tracks"]["children"];
        assert_eq!(tracks.as_array().unwrap().len(), 10);
        assert_eq!(tracks[0]["children"].as_array().unwrap().len(), 1);
        assert_eq!(tracks[1]["children"].as_array().unwrap().len(), 1);
        assert_eq!(tracks[2]["children"].as_array().unwrap().len(), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Progress { done: 1, total: 1, .. })));
    }

    #[test]
    fn test_missing_media_degrades_to_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let shots = tmp.path().join("shots");
        fs::create_dir_all(&shots).unwrap();

        let edl_path = tmp.path().join("cut.edl");
        fs::write(
            &edl_path,
            "001  reelA  V  C  00:00:41:16 00:00:45:16 01:00:00:00 01:00:04:00\n\
             *FROM CLIP NAME: sh404\n",
        )
        .unwrap();
        let otio_path = tmp.path().join("out.otio");
        let (summary, events) = run(&config(&shots, &edl_path, &otio_path), None);

        assert_eq!(summary.clips_placed, 0);
        assert_eq!(summary.records_skipped, 1);
        assert!(otio_path.exists());
        let warnings = warnings(&events);
        assert!(warnings.iter().any(|w| w.contains("sh404")));
        assert!(warnings.iter().any(|w| w.contains("no clips were placed")));
    }

    #[test]
    fn test_duplicate_skipped_silently() {
        let tmp = tempfile::tempdir().unwrap();
        let shots = tmp.path().join("shots");
        write_frames(&shots.join("sh010_v001"), "sh010_v001", 1001..=1096);

        let edl_path = tmp.path().join("cut.edl");
        fs::write(
            &edl_path,
            "001  reelA  V  C  00:00:41:16 00:00:45:16 01:00:00:00 01:00:04:00\n\
             *FROM CLIP NAME: sh010\n",
        )
        .unwrap();
        let otio_path = tmp.path().join("out.otio");
        let mut config = config(&shots, &edl_path, &otio_path);
        config.ignore_duplicates = true;
        let view = StaticTimelineView::new(["sh010_v001.[1001-1096].exr".to_string()]);
        let (summary, events) = run(&config, Some(&view));

        assert_eq!(summary.clips_placed, 0);
        assert_eq!(summary.records_skipped, 1);
        // The duplicate itself produces no warning line.
        assert!(!warnings(&events).iter().any(|w| w.contains("sh010")));
    }

    #[test]
    fn test_gap_precedes_clip_off_hour_origin() {
        let tmp = tempfile::tempdir().unwrap();
        let shots = tmp.path().join("shots");
        write_frames(&shots.join("sh010_v001"), "sh010_v001", 1001..=1096);

        // Record starts one second past the hour origin.
        let edl_path = tmp.path().join("cut.edl");
        fs::write(
            &edl_path,
            "001  reelA  V  C  00:00:41:16 00:00:45:16 01:00:01:00 01:00:05:00\n\
             *FROM CLIP NAME: sh010\n",
        )
        .unwrap();
        let otio_path = tmp.path().join("out.otio");
        run(&config(&shots, &edl_path, &otio_path), None);

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(&otio_path).unwrap()).unwrap();
        let children = &doc["tracks"]["children"][0]["children"];
        assert_eq!(children.as_array().unwrap().len(), 2);
        assert_eq!(children[0]["OTIO_SCHEMA"], "Gap.1");
        assert_eq!(children[0]["source_range"]["duration"]["value"], 24.0);
        assert_eq!(children[1]["OTIO_SCHEMA"], "Clip.1");
    }

    #[test]
    fn test_cancellation_between_records() {
        let tmp = tempfile::tempdir().unwrap();
        let shots = tmp.path().join("shots");
        fs::create_dir_all(&shots).unwrap();
        let edl_path = tmp.path().join("cut.edl");
        fs::write(
            &edl_path,
            "001  reelA  V  C  00:00:41:16 00:00:45:16 01:00:00:00 01:00:04:00\n",
        )
        .unwrap();
        let otio_path = tmp.path().join("out.otio");

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = run_conform(
            &config(&shots, &edl_path, &otio_path),
            None,
            &cancel,
            &mut |_| {},
        );
        assert!(matches!(result, Err(ConformError::Cancelled)));
        assert!(!otio_path.exists());
    }
}
