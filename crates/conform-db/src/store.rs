//! The edit database.
//!
//! UTF-8 JSON file, root object `{project: {shot: {edit: record}}}`. Every
//! mutation is in-memory; `save` rewrites the whole file atomically and
//! drops a `*_backup.json` sibling. There is no cross-process locking:
//! concurrent writers are last-writer-wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use conform_core::{ConformError, Result, Timecode};
use conform_edl::{EdlRecord, TrackKind};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One shot as recorded for one edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEditRecord {
    pub source_in: Timecode,
    pub source_out: Timecode,
    /// Source out inclusive of any retime tail, as written in the EDL.
    pub source_out_full: Timecode,
    pub record_in: Timecode,
    pub record_out: Timecode,
    /// Source/reel column of the originating event.
    pub source_name: String,
    pub track: TrackKind,
    pub transition: String,
    pub record_id: String,
    /// At most one edit per shot carries `true`.
    pub is_actual: bool,
    /// ISO timestamp of insertion.
    pub add_data: String,
}

impl ShotEditRecord {
    /// Build a database record from a parsed EDL record.
    pub fn from_edl(record: &EdlRecord) -> Self {
        Self {
            source_in: record.source_in,
            source_out: record.source_out,
            source_out_full: record.source_out_full,
            record_in: record.record_in,
            record_out: record.record_out,
            source_name: record.source_name.clone(),
            track: record.track,
            transition: record.transition.clone(),
            record_id: record.id.clone(),
            is_actual: false,
            add_data: Utc::now().to_rfc3339(),
        }
    }

    /// Reconstruct an EDL record, e.g. for comparator fragments.
    pub fn to_edl(&self, shot_name: &str) -> EdlRecord {
        EdlRecord {
            id: self.record_id.clone(),
            shot_name: shot_name.to_string(),
            source_name: self.source_name.clone(),
            track: self.track,
            transition: self.transition.clone(),
            source_in: self.source_in,
            source_out: self.source_out,
            source_out_full: self.source_out_full,
            record_in: self.record_in,
            record_out: self.record_out,
            retime: self.source_out != self.source_out_full,
            clip_name: Some(shot_name.to_string()),
            title: None,
        }
    }
}

type EditMap = BTreeMap<String, ShotEditRecord>;
type ShotMap = BTreeMap<String, EditMap>;

/// JSON-backed store of every shot from every parsed edit.
#[derive(Debug, Clone)]
pub struct EditDatabase {
    path: PathBuf,
    root: BTreeMap<String, ShotMap>,
}

impl EditDatabase {
    /// Open a database file; a missing file yields an empty store that is
    /// created on first save.
    pub fn open(path: &Path) -> Result<Self> {
        let root = if path.exists() {
            let data = std::fs::read(path)?;
            serde_json::from_slice(&data)
                .map_err(|e| ConformError::Database(format!("{}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Insert or replace one shot/edit record. With `update_status` the new
    /// record becomes the shot's actual edit and all siblings are cleared.
    pub fn add(
        &mut self,
        project: &str,
        shot: &str,
        edit: &str,
        mut record: ShotEditRecord,
        update_status: bool,
    ) {
        let edits = self
            .root
            .entry(project.to_string())
            .or_default()
            .entry(shot.to_string())
            .or_default();
        if update_status {
            for sibling in edits.values_mut() {
                sibling.is_actual = false;
            }
            record.is_actual = true;
        }
        edits.insert(edit.to_string(), record);
    }

    /// Add every record of a parsed EDL under one edit name.
    pub fn ingest_records(
        &mut self,
        project: &str,
        edit: &str,
        records: &[EdlRecord],
        update_status: bool,
    ) {
        for record in records {
            self.add(
                project,
                &record.shot_name,
                edit,
                ShotEditRecord::from_edl(record),
                update_status,
            );
        }
        info!("ingested {} records into {project}/{edit}", records.len());
    }

    /// Delete an edit from every shot of a project; shots left without edits
    /// are purged.
    pub fn remove_edit(&mut self, project: &str, edit: &str) {
        if let Some(shots) = self.root.get_mut(project) {
            for edits in shots.values_mut() {
                edits.remove(edit);
            }
            shots.retain(|_, edits| !edits.is_empty());
        }
    }

    pub fn remove_project(&mut self, project: &str) {
        self.root.remove(project);
    }

    /// Shots of a project carrying the given edit.
    pub fn query_by_edit(&self, project: &str, edit: &str) -> BTreeMap<String, &ShotEditRecord> {
        let mut out = BTreeMap::new();
        if let Some(shots) = self.root.get(project) {
            for (shot, edits) in shots {
                if let Some(record) = edits.get(edit) {
                    out.insert(shot.clone(), record);
                }
            }
        }
        out
    }

    /// The unique actual record per shot.
    pub fn query_by_actual(&self, project: &str) -> BTreeMap<String, &ShotEditRecord> {
        let mut out = BTreeMap::new();
        if let Some(shots) = self.root.get(project) {
            for (shot, edits) in shots {
                if let Some(record) = edits.values().find(|r| r.is_actual) {
                    out.insert(shot.clone(), record);
                }
            }
        }
        out
    }

    /// Per shot, the records of each requested edit in request order.
    pub fn query_by_edits(
        &self,
        project: &str,
        edits: &[&str],
    ) -> BTreeMap<String, Vec<&ShotEditRecord>> {
        let mut out: BTreeMap<String, Vec<&ShotEditRecord>> = BTreeMap::new();
        if let Some(shots) = self.root.get(project) {
            for (shot, shot_edits) in shots {
                let records: Vec<&ShotEditRecord> = edits
                    .iter()
                    .filter_map(|edit| shot_edits.get(*edit))
                    .collect();
                if !records.is_empty() {
                    out.insert(shot.clone(), records);
                }
            }
        }
        out
    }

    /// Every edit name appearing in a project.
    pub fn edits(&self, project: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .root
            .get(project)
            .map(|shots| {
                shots
                    .values()
                    .flat_map(|edits| edits.keys().cloned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names.dedup();
        names
    }

    pub fn projects(&self) -> Vec<&str> {
        self.root.keys().map(String::as_str).collect()
    }

    /// Atomic whole-file rewrite plus a `*_backup.json` sibling. Two
    /// concurrent writers are last-writer-wins; readers never see a torn
    /// file because the temp file is renamed into place.
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.root)
            .map_err(|e| ConformError::Database(format!("serialize: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &data)?;
        std::fs::rename(&tmp, &self.path)?;
        std::fs::write(self.backup_path(), &data)?;
        Ok(())
    }

    /// Sibling path with the `_backup.json` suffix.
    pub fn backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "edits".to_string());
        self.path.with_file_name(format!("{stem}_backup.json"))
    }
}
