//! EDL parsing.
//!
//! An event is a primary line (numeric id, eight whitespace-separated
//! columns) followed by continuation lines up to the next primary line.
//! Continuation lines carry retime markers and, depending on dialect, the
//! shot name.

use std::path::Path;

use conform_core::{ConformError, FrameRate, Result, Timecode};
use tracing::{debug, warn};

use crate::dialect::Dialect;
use crate::record::{EdlRecord, TrackKind};

/// Parser for one EDL source at a fixed project rate.
#[derive(Debug, Clone, Copy)]
pub struct EdlParser {
    rate: FrameRate,
}

/// A primary line plus its continuation lines, before dialect resolution.
struct RawEvent<'a> {
    tokens: Vec<&'a str>,
    continuations: Vec<&'a str>,
}

impl EdlParser {
    pub fn new(rate: FrameRate) -> Self {
        Self { rate }
    }

    /// Parse an EDL file. I/O failures are fatal to the job.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<EdlRecord>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConformError::EdlRead(format!("{}: {e}", path.display())))?;
        self.parse_str(&text)
    }

    /// Parse EDL text. Records are returned in file order; calling again on
    /// the same text yields the same records.
    pub fn parse_str(&self, text: &str) -> Result<Vec<EdlRecord>> {
        let dialect = Dialect::sniff(text);
        let mut title: Option<String> = None;
        let mut events: Vec<RawEvent<'_>> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("TITLE:") {
                title = Some(rest.trim().to_string());
                continue;
            }
            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            let is_primary = tokens
                .first()
                .is_some_and(|t| t.chars().all(|c| c.is_ascii_digit()));
            if is_primary {
                if tokens.len() < 8 {
                    debug!("skipping short event line: {trimmed:?}");
                    continue;
                }
                events.push(RawEvent {
                    tokens,
                    continuations: Vec::new(),
                });
            } else if let Some(event) = events.last_mut() {
                event.continuations.push(trimmed);
            }
        }

        let mut records = Vec::with_capacity(events.len());
        for event in &events {
            if let Some(record) = self.resolve_event(event, dialect, title.as_deref())? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Turn a raw event into a record, or `None` when the dialect requires a
    /// shot name the event does not carry.
    fn resolve_event(
        &self,
        event: &RawEvent<'_>,
        dialect: Dialect,
        title: Option<&str>,
    ) -> Result<Option<EdlRecord>> {
        let tokens = &event.tokens;
        let id = tokens[0].to_string();
        let source_name = tokens[1].to_string();
        let Some(track) = TrackKind::parse(tokens[2]) else {
            warn!("event {id}: unknown track column {:?}, skipped", tokens[2]);
            return Ok(None);
        };
        let transition = tokens[3].to_string();
        let source_in = Timecode::parse(tokens[4])?;
        let raw_source_out = Timecode::parse(tokens[5])?;
        let record_in = Timecode::parse(tokens[6])?;
        let record_out = Timecode::parse(tokens[7])?;

        if record_out.to_frames(self.rate) < record_in.to_frames(self.rate) {
            warn!("event {id}: record out precedes record in, skipped");
            return Ok(None);
        }

        let mut m2_marker = false;
        let mut loc_name: Option<String> = None;
        let mut clip_name: Option<String> = None;
        for cont in &event.continuations {
            let lower = cont.to_ascii_lowercase();
            if lower.starts_with("m2") {
                m2_marker = true;
            } else if lower.starts_with("*loc") {
                loc_name = cont.split_whitespace().last().map(str::to_string);
            } else if lower.starts_with("*from clip name") {
                clip_name = cont.split_once(':').map(|(_, v)| v.trim().to_string());
            }
        }

        let shot_name = match dialect {
            Dialect::Plain => source_name.clone(),
            Dialect::Loc => match loc_name {
                Some(name) => name,
                None => {
                    debug!("event {id}: no *LOC shot name, skipped");
                    return Ok(None);
                }
            },
            Dialect::ClipName => match clip_name.clone() {
                Some(name) => name,
                None => {
                    debug!("event {id}: no *FROM CLIP NAME, skipped");
                    return Ok(None);
                }
            },
        };

        // A duration mismatch implies a retime even without an M2 line.
        let record_duration = record_out.diff_frames(record_in, self.rate);
        let source_duration = raw_source_out.diff_frames(source_in, self.rate);
        let retime = m2_marker || record_duration != source_duration;

        // Normalize so downstream code sees matching windows; the raw tail
        // survives as source_out_full.
        let source_out = if retime {
            source_in.add_frames(record_duration, self.rate)
        } else {
            raw_source_out
        };

        Ok(Some(EdlRecord {
            id,
            shot_name,
            source_name,
            track,
            transition,
            source_in,
            source_out,
            source_out_full: raw_source_out,
            record_in,
            record_out,
            retime,
            clip_name,
            title: title.map(str::to_string),
        }))
    }
}
