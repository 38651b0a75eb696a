//! Shot candidate variants.
//!
//! A candidate is either a directory holding an image sequence or a single
//! movie file. Both expose the same capability surface; the engine matches
//! exhaustively on the variant where behavior differs.

use std::path::{Path, PathBuf};

use conform_core::{ConformError, Result};
use serde::{Deserialize, Serialize};

/// One frame of an image sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFile {
    /// File name within the sequence directory.
    pub file_name: String,
    /// Frame number parsed from the file name.
    pub number: i64,
}

/// A directory of numbered frames sharing one extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCandidate {
    pub dir: PathBuf,
    pub extension: String,
    /// Frames sorted by number. Non-empty by construction.
    pub frames: Vec<FrameFile>,
    /// File name up to the frame digits, separator included
    /// (e.g. `sh010_comp_v002.`).
    pub prefix: String,
    /// Zero padding of the frame digits in the file names.
    pub padding: usize,
}

/// A delivered movie file (`mov`/`mp4`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieCandidate {
    pub path: PathBuf,
    pub extension: String,
}

/// Physical media matched to an EDL shot name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShotCandidate {
    Sequence(SequenceCandidate),
    Movie(MovieCandidate),
}

/// Split `sh010_comp_v002.1001.exr` into prefix, digits and padding.
fn split_frame_name<'a>(file_name: &'a str, extension: &str) -> Option<(&'a str, &'a str)> {
    let stem = file_name.strip_suffix(extension)?.strip_suffix('.')?;
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()?
        .0;
    let (prefix, digits) = stem.split_at(digits_start);
    if digits.is_empty() {
        return None;
    }
    Some((prefix, digits))
}

impl SequenceCandidate {
    /// Build a candidate from a directory, collecting files with the given
    /// extension. Returns `None` when the directory holds no frames.
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Option<Self>> {
        let mut frames = Vec::new();
        let mut prefix = String::new();
        let mut padding = 0usize;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some((name_prefix, digits)) = split_frame_name(&file_name, extension) else {
                continue;
            };
            let number: i64 = digits
                .parse()
                .map_err(|_| ConformError::ShotInvalid(format!("bad frame digits in {file_name}")))?;
            if frames.is_empty() {
                prefix = name_prefix.to_string();
                padding = digits.len();
            }
            frames.push(FrameFile { file_name, number });
        }
        if frames.is_empty() {
            return Ok(None);
        }
        frames.sort_by_key(|f| f.number);
        Ok(Some(Self {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
            frames,
            prefix,
            padding,
        }))
    }

    /// First frame number on disk.
    pub fn first_frame(&self) -> i64 {
        self.frames[0].number
    }

    /// Last frame number on disk.
    pub fn last_frame(&self) -> i64 {
        self.frames[self.frames.len() - 1].number
    }

    /// Path of the first frame file.
    pub fn first_frame_path(&self) -> PathBuf {
        self.dir.join(&self.frames[0].file_name)
    }

    /// Derived display name, `PREFIX[start-end].ext`.
    pub fn name(&self) -> String {
        format!(
            "{}[{:0pad$}-{:0pad$}].{}",
            self.prefix,
            self.first_frame(),
            self.last_frame(),
            self.extension,
            pad = self.padding,
        )
    }
}

impl MovieCandidate {
    /// Display name is the file name.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl ShotCandidate {
    /// Display name used for duplicate detection and clip naming.
    pub fn name(&self) -> String {
        match self {
            Self::Sequence(seq) => seq.name(),
            Self::Movie(movie) => movie.name(),
        }
    }

    /// On-disk location (directory for sequences, file for movies).
    pub fn source_path(&self) -> &Path {
        match self {
            Self::Sequence(seq) => &seq.dir,
            Self::Movie(movie) => &movie.path,
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self, Self::Movie(_))
    }
}
