//! Minimal OpenEXR header reading.
//!
//! Only the header attribute list is parsed; pixel data is never touched.
//! The two attributes the conform cares about are `timeCode` (intrinsic
//! start timecode) and a frame rate, delivered either as the standard
//! `framesPerSecond` rational or Nuke's `nuke/input/frame_rate`.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use conform_core::{ConformError, Result, Timecode};

const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

/// Longest attribute name/type the reader accepts; EXR caps names at 255.
const MAX_NAME: usize = 256;

/// Header fields relevant to conforming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExrHeader {
    /// `timeCode` attribute, when written by the renderer.
    pub timecode: Option<Timecode>,
    /// Frame rate from `framesPerSecond` or `nuke/input/frame_rate`.
    pub frame_rate: Option<f64>,
}

/// Read the header of an EXR file.
pub fn read_header(path: &Path) -> Result<ExrHeader> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != EXR_MAGIC {
        return Err(ConformError::Probe(format!(
            "{} is not an EXR file",
            path.display()
        )));
    }
    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;

    let mut header = ExrHeader::default();
    loop {
        let name = read_cstr(&mut reader)?;
        if name.is_empty() {
            // Single null byte terminates the attribute list.
            break;
        }
        let attr_type = read_cstr(&mut reader)?;
        let size = read_i32(&mut reader)?;
        if size < 0 {
            return Err(ConformError::Probe(format!(
                "negative attribute size in {}",
                path.display()
            )));
        }

        match (name.as_str(), attr_type.as_str()) {
            ("timeCode", "timecode") if size >= 8 => {
                let time_and_flags = read_u32(&mut reader)?;
                let _user_data = read_u32(&mut reader)?;
                reader.seek(SeekFrom::Current(size as i64 - 8))?;
                header.timecode = Some(decode_smpte(time_and_flags));
            }
            ("framesPerSecond", "rational") if size >= 8 => {
                let numerator = read_i32(&mut reader)?;
                let denominator = read_u32(&mut reader)?;
                reader.seek(SeekFrom::Current(size as i64 - 8))?;
                if denominator != 0 {
                    header.frame_rate = Some(numerator as f64 / denominator as f64);
                }
            }
            ("nuke/input/frame_rate", "float") if size >= 4 => {
                let mut buf = [0u8; 4];
                reader.read_exact(&mut buf)?;
                reader.seek(SeekFrom::Current(size as i64 - 4))?;
                header.frame_rate = Some(f32::from_le_bytes(buf) as f64);
            }
            ("nuke/input/frame_rate", "string") => {
                let mut buf = vec![0u8; size as usize];
                reader.read_exact(&mut buf)?;
                if let Ok(text) = String::from_utf8(buf) {
                    if let Ok(rate) = text.trim_matches(char::from(0)).trim().parse::<f64>() {
                        header.frame_rate = Some(rate);
                    }
                }
            }
            _ => {
                reader.seek(SeekFrom::Current(size as i64))?;
            }
        }
    }
    Ok(header)
}

/// Unpack a SMPTE time-and-flags word (BCD fields per the EXR spec).
fn decode_smpte(word: u32) -> Timecode {
    let frames = (word & 0xf) + ((word >> 4) & 0x3) * 10;
    let seconds = ((word >> 8) & 0xf) + ((word >> 12) & 0x7) * 10;
    let minutes = ((word >> 16) & 0xf) + ((word >> 20) & 0x7) * 10;
    let hours = ((word >> 24) & 0xf) + ((word >> 28) & 0x3) * 10;
    Timecode {
        hours,
        minutes,
        seconds,
        frames,
    }
}

fn read_cstr<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        reader.read_exact(&mut buf)?;
        if buf[0] == 0 {
            break;
        }
        bytes.push(buf[0]);
        if bytes.len() > MAX_NAME {
            return Err(ConformError::Probe(
                "unterminated attribute name in EXR header".to_string(),
            ));
        }
    }
    String::from_utf8(bytes)
        .map_err(|_| ConformError::Probe("non-UTF8 attribute name in EXR header".to_string()))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
