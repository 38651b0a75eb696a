//! EDL dialect sniffing.

/// The three understood EDL flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Shot name is the source column of the event line.
    Plain,
    /// Shot name is the trailing token of a `*LOC` continuation line.
    Loc,
    /// Shot name follows a `*FROM CLIP NAME:` continuation line.
    ClipName,
}

impl Dialect {
    /// Pick a dialect by scanning the EDL text once. First marker found wins;
    /// a text with neither marker is treated as plain.
    pub fn sniff(text: &str) -> Self {
        for line in text.lines() {
            let lower = line.trim_start().to_ascii_lowercase();
            if lower.starts_with("*loc") {
                return Self::Loc;
            }
            if lower.starts_with("*from clip name") {
                return Self::ClipName;
            }
        }
        Self::Plain
    }
}
