//! EDL text emission.
//!
//! Used for the comparator's per-category fragments and the restorer's
//! rewritten EDL. Output always carries a `*FROM CLIP NAME:` continuation so
//! the shot name survives a round trip through the parser.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use conform_core::Result;

use crate::record::EdlRecord;

/// Writer for CMX-3600 text.
#[derive(Debug, Clone, Default)]
pub struct EdlWriter {
    title: Option<String>,
}

impl EdlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    /// Format records as EDL text.
    pub fn format(&self, records: &[EdlRecord]) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            let _ = writeln!(out, "TITLE: {title}");
        }
        let _ = writeln!(out, "FCM: NON-DROP FRAME");
        out.push('\n');
        for record in records {
            let _ = writeln!(
                out,
                "{:<4} {:<16} {:<2} {:<4} {} {} {} {}",
                record.id,
                record.source_name,
                record.track.code(),
                record.transition,
                record.source_in,
                record.source_out_full,
                record.record_in,
                record.record_out,
            );
            let _ = writeln!(out, "*FROM CLIP NAME: {}", record.shot_name);
            out.push('\n');
        }
        out
    }

    /// Write records to a file.
    pub fn write_file(&self, path: &Path, records: &[EdlRecord]) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(self.format(records).as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
