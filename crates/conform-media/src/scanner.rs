//! Media root scanning.
//!
//! One walk of the delivery tree builds an index; per-shot lookups are then a
//! case-insensitive substring filter over the indexed names. Multiple hits
//! for one shot name are multiple versions, kept in traversal order.

use std::path::{Path, PathBuf};

use conform_core::Result;
use smallvec::SmallVec;
use tracing::debug;

use crate::candidate::{MovieCandidate, SequenceCandidate, ShotCandidate};

/// Extensions delivered as numbered still frames rather than containers.
const SEQUENCE_EXTENSIONS: &[&str] = &["exr", "dpx", "png", "jpg", "jpeg", "tif", "tiff"];

fn is_sequence_extension(extension: &str) -> bool {
    SEQUENCE_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(extension))
}

/// One indexed media location.
#[derive(Debug, Clone)]
struct MediaEntry {
    /// Directory (sequences) or file (movies).
    path: PathBuf,
    /// Lowercased name used for matching.
    search_name: String,
}

/// Index from shot names to on-disk media under one root.
#[derive(Debug, Clone)]
pub struct ShotIndex {
    extension: String,
    sequence_mode: bool,
    entries: Vec<MediaEntry>,
}

impl ShotIndex {
    /// Walk `root` and index every candidate location for `extension`.
    pub fn scan(root: &Path, extension: &str) -> Result<Self> {
        let sequence_mode = is_sequence_extension(extension);
        let mut index = Self {
            extension: extension.to_string(),
            sequence_mode,
            entries: Vec::new(),
        };
        index.walk(root)?;
        debug!(
            "indexed {} media entries under {}",
            index.entries.len(),
            root.display()
        );
        Ok(index)
    }

    fn walk(&mut self, dir: &Path) -> Result<()> {
        let mut children: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        // read_dir order is platform-dependent; sort so version order and
        // therefore track assignment is stable.
        children.sort();

        let mut has_frames = false;
        for child in &children {
            if child.is_dir() {
                self.walk(child)?;
            } else if self.sequence_mode {
                has_frames |= self.matches_extension(child);
            } else if self.matches_extension(child) {
                self.push_entry(child);
            }
        }
        if self.sequence_mode && has_frames {
            self.push_entry(dir);
        }
        Ok(())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    fn push_entry(&mut self, path: &Path) {
        let search_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.entries.push(MediaEntry {
            path: path.to_path_buf(),
            search_name,
        });
    }

    /// All versions of a shot, in traversal order. The k-th hit lands on
    /// track k downstream.
    pub fn find(&self, shot_name: &str) -> Result<SmallVec<[ShotCandidate; 2]>> {
        let needle = shot_name.to_lowercase();
        let mut versions = SmallVec::new();
        for entry in &self.entries {
            if !entry.search_name.contains(&needle) {
                continue;
            }
            if self.sequence_mode {
                if let Some(seq) = SequenceCandidate::from_dir(&entry.path, &self.extension)? {
                    versions.push(ShotCandidate::Sequence(seq));
                }
            } else {
                versions.push(ShotCandidate::Movie(MovieCandidate {
                    path: entry.path.clone(),
                    extension: self.extension.clone(),
                }));
            }
        }
        Ok(versions)
    }

    /// Number of indexed locations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
