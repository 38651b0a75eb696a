//! End-to-end conform scenarios.
//!
//! Builds synthetic delivery trees (EXR sequences with real header
//! timecodes) and EDLs on disk, runs the engine, and checks the emitted
//! OTIO document frame by frame.

use std::fs;
use std::path::{Path, PathBuf};

use conform_core::{FrameRate, HandlesLogic, JobConfig, Timecode, TrackRange};
use conform_engine::{run_conform, CancelToken, ConformJob, EngineEvent, StaticTimelineView};

const RATE: FrameRate = FrameRate::FPS_24;

// ── Fixture helpers ────────────────────────────────────────────

/// Write a minimal EXR: magic, version, timeCode + framesPerSecond
/// attributes, list terminator. Enough header for the probe; no pixels.
fn write_exr_frame(path: &Path, tc: Timecode, fps: i32) {
    let mut out = Vec::new();
    out.extend_from_slice(&[0x76, 0x2f, 0x31, 0x01]);
    out.extend_from_slice(&2i32.to_le_bytes());

    let smpte = (tc.frames % 10)
        | (tc.frames / 10) << 4
        | (tc.seconds % 10) << 8
        | (tc.seconds / 10) << 12
        | (tc.minutes % 10) << 16
        | (tc.minutes / 10) << 20
        | (tc.hours % 10) << 24
        | (tc.hours / 10) << 28;
    let mut data = Vec::new();
    data.extend_from_slice(&smpte.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    push_attr(&mut out, "timeCode", "timecode", &data);

    let mut fps_data = Vec::new();
    fps_data.extend_from_slice(&fps.to_le_bytes());
    fps_data.extend_from_slice(&1u32.to_le_bytes());
    push_attr(&mut out, "framesPerSecond", "rational", &fps_data);

    out.push(0);
    fs::write(path, out).unwrap();
}

fn push_attr(out: &mut Vec<u8>, name: &str, attr_type: &str, data: &[u8]) {
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    out.extend_from_slice(attr_type.as_bytes());
    out.push(0);
    out.extend_from_slice(&(data.len() as i32).to_le_bytes());
    out.extend_from_slice(data);
}

/// A sequence directory with header timecode `tc` on every frame.
fn write_sequence(dir: &Path, prefix: &str, tc: &str, range: std::ops::RangeInclusive<i64>) {
    fs::create_dir_all(dir).unwrap();
    let tc = Timecode::parse(tc).unwrap();
    for n in range {
        write_exr_frame(&dir.join(format!("{prefix}.{n:04}.exr")), tc, 24);
    }
}

fn write_edl(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
}

fn config(shots: &Path, edl: &Path, otio: &Path, logic: HandlesLogic) -> JobConfig {
    JobConfig {
        edl_path: edl.to_path_buf(),
        shots_folder: shots.to_path_buf(),
        otio_path: otio.to_path_buf(),
        extension: "exr".to_string(),
        frame_rate: RATE,
        ignore_duplicates: false,
        handles_logic: logic,
        start_frame_ui: 3,
        include_slate: false,
        track_range: TrackRange::default(),
    }
}

fn run(config: &JobConfig) -> (conform_engine::JobSummary, Vec<EngineEvent>) {
    let mut events = Vec::new();
    let summary = run_conform(config, None, &CancelToken::new(), &mut |e| events.push(e))
        .expect("conform succeeds");
    (summary, events)
}

fn read_doc(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn track_children(doc: &serde_json::Value, track: usize) -> Vec<serde_json::Value> {
    doc["tracks"]["children"][track]["children"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

// ── Full-logic placement ───────────────────────────────────────

#[test]
fn full_logic_places_edl_window_inside_source() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    // 100 frames starting at 00:59:59:00 -> source 86376..86476 raw.
    write_sequence(
        &shots.join("sh010_v001"),
        "sh010_v001",
        "00:59:59:00",
        1001..=1100,
    );

    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "TITLE: ep101\n\
         001  reelA  V  C  00:59:59:12 01:00:00:12 01:00:00:00 01:00:01:00\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, _) = run(&config(&shots, &edl, &otio, HandlesLogic::FullLogic));
    assert_eq!(summary.clips_placed, 1);

    let doc = read_doc(&otio);
    assert_eq!(doc["name"], "ep101");
    let children = track_children(&doc, 0);
    // EDL window fits inside the source; one clip, no gaps.
    assert_eq!(children.len(), 1);
    let clip = &children[0];
    assert_eq!(clip["OTIO_SCHEMA"], "Clip.1");
    // Source-in 00:59:59:12 = 86388 raw, minus the NLE compensation frame.
    assert_eq!(clip["source_range"]["start_time"]["value"], 86387.0);
    assert_eq!(clip["source_range"]["duration"]["value"], 24.0);

    let media = &clip["media_reference"];
    assert_eq!(media["OTIO_SCHEMA"], "ImageSequenceReference.1");
    assert_eq!(media["name_prefix"], "sh010_v001.");
    assert_eq!(media["name_suffix"], ".exr");
    assert_eq!(media["start_frame"], 1001);
    assert_eq!(media["frame_zero_padding"], 4);
    assert_eq!(media["frame_step"], 1);
    assert_eq!(media["missing_frame_policy"], "error");
    assert_eq!(media["available_range"]["start_time"]["value"], 86375.0);
    assert_eq!(media["available_range"]["duration"]["value"], 100.0);
}

#[test]
fn full_logic_short_source_leaves_post_gap() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    // 50 frames: source 86376..86426. EDL wants up to 86435 inclusive.
    write_sequence(
        &shots.join("sh010_v001"),
        "sh010_v001",
        "00:59:59:00",
        1001..=1050,
    );

    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  00:59:59:12 01:00:01:12 01:00:00:00 01:00:02:00\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, events) = run(&config(&shots, &edl, &otio, HandlesLogic::FullLogic));
    assert_eq!(summary.clips_placed, 1);

    let children = track_children(&read_doc(&otio), 0);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["OTIO_SCHEMA"], "Clip.1");
    assert_eq!(children[0]["source_range"]["duration"]["value"], 39.0);
    assert_eq!(children[1]["OTIO_SCHEMA"], "Gap.1");
    assert_eq!(children[1]["source_range"]["duration"]["value"], 9.0);

    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::Warning(w) if w.contains("shorter than EDL at end")
    )));
}

#[test]
fn records_chain_gaps_between_clips() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    write_sequence(&shots.join("sh010_v001"), "sh010_v001", "00:59:59:00", 1001..=1100);
    write_sequence(&shots.join("sh020_v001"), "sh020_v001", "01:59:59:00", 1001..=1100);

    // Second record starts one second after the first ends.
    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  00:59:59:12 01:00:00:12 01:00:00:00 01:00:01:00\n\
         *FROM CLIP NAME: sh010\n\
         002  reelB  V  C  01:59:59:12 02:00:00:12 01:00:02:00 01:00:03:00\n\
         *FROM CLIP NAME: sh020\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, _) = run(&config(&shots, &edl, &otio, HandlesLogic::FullLogic));
    assert_eq!(summary.clips_placed, 2);

    let children = track_children(&read_doc(&otio), 0);
    // clip, 24-frame gap, clip.
    assert_eq!(children.len(), 3);
    assert_eq!(children[1]["OTIO_SCHEMA"], "Gap.1");
    assert_eq!(children[1]["source_range"]["duration"]["value"], 24.0);
}

#[test]
fn versions_fan_out_across_tracks() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    write_sequence(&shots.join("a/sh010_v001"), "sh010_v001", "00:59:59:00", 1001..=1100);
    write_sequence(&shots.join("b/sh010_v002"), "sh010_v002", "00:59:59:00", 1001..=1100);

    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  00:59:59:12 01:00:00:12 01:00:00:00 01:00:01:00\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, _) = run(&config(&shots, &edl, &otio, HandlesLogic::FullLogic));
    assert_eq!(summary.clips_placed, 2);

    let doc = read_doc(&otio);
    assert_eq!(track_children(&doc, 0).len(), 1);
    assert_eq!(track_children(&doc, 1).len(), 1);
    assert_eq!(track_children(&doc, 2).len(), 0);
    assert_eq!(
        track_children(&doc, 0)[0]["name"],
        "sh010_v001.[1001-1100].exr"
    );
    assert_eq!(
        track_children(&doc, 1)[0]["name"],
        "sh010_v002.[1001-1100].exr"
    );
}

// ── Policy variants ────────────────────────────────────────────

#[test]
fn from_start_frame_ignores_edl_source_window() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    write_sequence(&shots.join("sh010_v001"), "sh010_v001", "00:59:59:00", 1001..=1100);

    // EDL source window far outside the media; policy A does not care.
    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  05:00:00:00 05:00:01:00 01:00:00:00 01:00:01:00\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, _) = run(&config(&shots, &edl, &otio, HandlesLogic::FromStartFrame));
    assert_eq!(summary.clips_placed, 1);

    let children = track_children(&read_doc(&otio), 0);
    // Media start 86375 compensated, plus the 3-frame UI offset.
    assert_eq!(children[0]["source_range"]["start_time"]["value"], 86378.0);
    assert_eq!(children[0]["source_range"]["duration"]["value"], 24.0);
}

#[test]
fn rate_mismatch_skips_the_candidate() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    let dir = shots.join("sh010_v001");
    fs::create_dir_all(&dir).unwrap();
    let tc = Timecode::parse("00:59:59:00").unwrap();
    for n in 1001..=1010i64 {
        write_exr_frame(&dir.join(format!("sh010_v001.{n:04}.exr")), tc, 25);
    }

    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  00:59:59:12 00:59:59:20 01:00:00:00 01:00:00:08\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio = tmp.path().join("out.otio");
    let (summary, events) = run(&config(&shots, &edl, &otio, HandlesLogic::FullLogic));
    assert_eq!(summary.clips_placed, 0);
    assert_eq!(summary.records_skipped, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::Warning(w) if w.contains("frame rate 25")
    )));
}

// ── Job worker ─────────────────────────────────────────────────

#[test]
fn job_with_view_skips_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let shots = tmp.path().join("shots");
    write_sequence(&shots.join("sh010_v001"), "sh010_v001", "00:59:59:00", 1001..=1100);

    let edl = tmp.path().join("cut.edl");
    write_edl(
        &edl,
        "001  reelA  V  C  00:59:59:12 01:00:00:12 01:00:00:00 01:00:01:00\n\
         *FROM CLIP NAME: sh010\n",
    );
    let otio: PathBuf = tmp.path().join("out.otio");
    let mut config = config(&shots, &edl, &otio, HandlesLogic::FullLogic);
    config.ignore_duplicates = true;

    let view = StaticTimelineView::new(["sh010_v001.[1001-1100].exr".to_string()]);
    let handle = ConformJob::new(config).with_view(Box::new(view)).spawn();
    let summary = handle.wait().unwrap();
    assert_eq!(summary.clips_placed, 0);

    let ticks: Vec<_> = handle.progress().try_iter().collect();
    assert_eq!(ticks.len(), 1);
}
