//! Conform EDL - CMX-3600 edit decision list support
//!
//! Three dialects are understood, selected by content sniffing:
//! - plain event lines (shot name = source column)
//! - `*LOC` locator continuation lines
//! - `*FROM CLIP NAME:` continuation lines
//!
//! Retimes are recognized from `M2` continuation lines and inferred from
//! source/record duration mismatches.

pub mod dialect;
pub mod parser;
pub mod record;
pub mod writer;

pub use dialect::Dialect;
pub use parser::EdlParser;
pub use record::{EdlRecord, TrackKind};
pub use writer::EdlWriter;
