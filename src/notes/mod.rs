use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub mod composer;
pub mod editor;
pub mod format;
pub mod sort;
pub mod store;
pub mod text;

pub const PREVIEW_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Nanoseconds since the Unix epoch.
///
/// Backends may hand out values wider than 64 bits, so the count is kept as
/// an `i128` and only ever compared or divided as an integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstantNanos(pub i128);

impl InstantNanos {
    pub const NANOS_PER_MILLI: i128 = 1_000_000;

    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp_nanos())
    }

    pub fn as_millis(self) -> i128 {
        self.0 / Self::NANOS_PER_MILLI
    }
}

impl fmt::Display for InstantNanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub time_stamp: InstantNanos,
}

impl Note {
    pub fn content_preview(&self) -> String {
        self.content.chars().take(PREVIEW_CHARS).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_truncate_toward_zero() {
        assert_eq!(InstantNanos(1_999_999).as_millis(), 1);
        assert_eq!(InstantNanos(-1).as_millis(), 0);
        assert_eq!(InstantNanos(-1_000_001).as_millis(), -1);
    }

    #[test]
    fn note_wire_format_uses_camel_case_timestamp() {
        let raw = r#"{"id":7,"title":"t","content":"c","timeStamp":1712148300000000000}"#;
        let note: Note = serde_json::from_str(raw).expect("note");
        assert_eq!(note.id, NoteId(7));
        assert_eq!(note.time_stamp, InstantNanos(1_712_148_300_000_000_000));
    }

    #[test]
    fn timestamps_wider_than_i64_survive_decoding() {
        let wide = i128::from(i64::MAX) + 10;
        let raw = format!(r#"{{"id":1,"title":"","content":"","timeStamp":{wide}}}"#);
        let note: Note = serde_json::from_str(&raw).expect("note");
        assert_eq!(note.time_stamp.0, wide);
    }

    #[test]
    fn content_preview_counts_characters_not_bytes() {
        let note = Note {
            id: NoteId(1),
            title: "Umlauts".into(),
            content: "äöüäöüäöüäöü tail".into(),
            time_stamp: InstantNanos(0),
        };
        assert_eq!(note.content_preview(), "äöüäöüäöüä");
    }
}
