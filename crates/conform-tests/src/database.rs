//! Edit database workflows.
//!
//! Ingest -> save -> reopen -> compare -> restore, the way a front-end
//! drives the database across sessions.

use std::fs;

use conform_core::FrameRate;
use conform_db::{
    compare, max_source_ranges, render_table, restore_shots, Category, EditDatabase, EditSelection,
};
use conform_edl::{EdlParser, EdlWriter};

const RATE: FrameRate = FrameRate::FPS_24;

const CUT01: &str = "001  reelA  V  C  01:00:00:00 01:00:04:00 01:00:00:00 01:00:04:00\n\
                     *FROM CLIP NAME: sh010\n\
                     002  reelB  V  C  02:00:00:00 02:00:02:00 01:00:04:00 01:00:06:00\n\
                     *FROM CLIP NAME: sh020\n";

// sh010 trimmed at both ends, sh020 gone, sh030 new.
const CUT02: &str = "001  reelA  V  C  01:00:00:10 01:00:03:14 01:00:00:00 01:00:03:04\n\
                     *FROM CLIP NAME: sh010\n\
                     002  reelC  V  C  03:00:00:00 03:00:02:00 01:00:03:04 01:00:05:04\n\
                     *FROM CLIP NAME: sh030\n";

fn parse(text: &str) -> Vec<conform_edl::EdlRecord> {
    EdlParser::new(RATE).parse_str(text).unwrap()
}

#[test]
fn save_reopen_round_trip_with_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("edits.json");

    let mut db = EditDatabase::open(&path).unwrap();
    db.ingest_records("show", "cut01", &parse(CUT01), true);
    db.save().unwrap();

    assert!(path.exists());
    assert!(tmp.path().join("edits_backup.json").exists());

    let reopened = EditDatabase::open(&path).unwrap();
    let shots = reopened.query_by_edit("show", "cut01");
    assert_eq!(shots.len(), 2);
    assert_eq!(
        shots["sh010"].source_in.to_string(),
        "01:00:00:00"
    );
    assert!(shots["sh010"].is_actual);
}

#[test]
fn update_status_moves_the_actual_flag() {
    let tmp = tempfile::tempdir().unwrap();
    let mut db = EditDatabase::open(&tmp.path().join("edits.json")).unwrap();
    db.ingest_records("show", "cut01", &parse(CUT01), true);
    db.ingest_records("show", "cut02", &parse(CUT02), true);

    // sh010 exists in both; only the cut02 copy may stay actual.
    let actual = db.query_by_actual("show");
    assert_eq!(
        actual["sh010"].source_in.to_string(),
        "01:00:00:10"
    );
    // sh020 only exists in cut01, so its actual survives.
    assert!(actual.contains_key("sh020"));
}

#[test]
fn compare_across_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("edits.json");
    {
        let mut db = EditDatabase::open(&path).unwrap();
        db.ingest_records("show", "cut01", &parse(CUT01), false);
        db.save().unwrap();
    }
    let mut db = EditDatabase::open(&path).unwrap();
    db.ingest_records("show", "cut02", &parse(CUT02), false);

    let outcome = compare(
        &db,
        "show",
        &EditSelection::Edit("cut01".into()),
        &EditSelection::Edit("cut02".into()),
        RATE,
    )
    .unwrap();

    let less = outcome.entries(Category::Less);
    assert_eq!(less.len(), 1);
    assert_eq!(less[0].shot, "sh010");
    assert_eq!(less[0].start_diff, Some(10));
    assert_eq!(less[0].end_diff, Some(-10));
    assert_eq!(outcome.entries(Category::Leave)[0].shot, "sh020");
    assert_eq!(outcome.entries(Category::New)[0].shot, "sh030");

    let table = render_table(&outcome);
    assert!(table.contains("sh010"));
    assert!(table.contains("+10"));
    assert!(table.contains("-10"));
}

#[test]
fn fragments_round_trip_through_the_writer() {
    let tmp = tempfile::tempdir().unwrap();
    let mut db = EditDatabase::open(&tmp.path().join("edits.json")).unwrap();
    db.ingest_records("show", "cut01", &parse(CUT01), false);
    db.ingest_records("show", "cut02", &parse(CUT02), false);

    let outcome = compare(
        &db,
        "show",
        &EditSelection::Edit("cut01".into()),
        &EditSelection::Edit("cut02".into()),
        RATE,
    )
    .unwrap();

    let fragment_path = tmp.path().join("new.edl");
    let records = &outcome.fragments[&Category::New];
    EdlWriter::with_title("New")
        .write_file(&fragment_path, records)
        .unwrap();

    let reparsed = parse(&fs::read_to_string(&fragment_path).unwrap());
    assert_eq!(reparsed.len(), 1);
    assert_eq!(reparsed[0].shot_name, "sh030");
    assert_eq!(reparsed[0].source_in.to_string(), "03:00:00:00");
}

#[test]
fn restore_then_max_range() {
    let tmp = tempfile::tempdir().unwrap();
    let mut db = EditDatabase::open(&tmp.path().join("edits.json")).unwrap();
    db.ingest_records("show", "cut01", &parse(CUT01), false);

    // A raw cut overlapping sh010's source window on reelA.
    let raw = "001  reelA  V  C  01:00:01:00 01:00:03:00 05:00:00:00 05:00:02:00\n";
    let outcome = restore_shots(
        &db,
        "show",
        &EditSelection::Edit("cut01".into()),
        &parse(raw),
        RATE,
    );
    assert_eq!(outcome.records[0].shot_name, "sh010");
    assert_eq!(outcome.markers.len(), 1);

    let marker_path = tmp.path().join("markers.txt");
    outcome.write_marker_file(&marker_path).unwrap();
    let markers = fs::read_to_string(&marker_path).unwrap();
    assert_eq!(markers.trim(), "05:00:01:00 sh010");

    // Ingest the restored records as a new edit and widen cut01 against it.
    db.ingest_records("show", "restored", &outcome.records, false);
    let ranges = max_source_ranges(&db, "show", "cut01", &["restored"], RATE);
    // The restored cut sits inside cut01's window; nothing widens.
    let sh010 = ranges.iter().find(|r| r.shot_name == "sh010").unwrap();
    assert_eq!(sh010.source_in.to_string(), "01:00:00:00");
    assert_eq!(sh010.source_out.to_string(), "01:00:04:00");
}

#[test]
fn remove_edit_and_project() {
    let tmp = tempfile::tempdir().unwrap();
    let mut db = EditDatabase::open(&tmp.path().join("edits.json")).unwrap();
    db.ingest_records("show", "cut01", &parse(CUT01), false);
    db.ingest_records("show", "cut02", &parse(CUT02), false);
    db.ingest_records("other", "cut01", &parse(CUT01), false);

    assert_eq!(db.projects(), vec!["other", "show"]);
    assert_eq!(db.edits("show"), vec!["cut01", "cut02"]);

    db.remove_edit("show", "cut01");
    assert!(db.query_by_edit("show", "cut01").is_empty());
    assert!(!db.query_by_edit("show", "cut02").is_empty());

    db.remove_project("show");
    assert!(db.projects() == vec!["other"]);
}
