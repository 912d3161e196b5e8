use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{InstantNanos, Note};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateDescending,
    DateAscending,
    TitleAscending,
    TitleDescending,
}

impl SortOrder {
    pub fn label(self) -> &'static str {
        match self {
            SortOrder::DateDescending => "New to Old",
            SortOrder::DateAscending => "Old to New",
            SortOrder::TitleAscending => "A to Z",
            SortOrder::TitleDescending => "Z to A",
        }
    }

    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        match self {
            SortOrder::DateAscending => compare_timestamps(a.time_stamp, b.time_stamp),
            SortOrder::DateDescending => compare_timestamps(b.time_stamp, a.time_stamp),
            SortOrder::TitleAscending => compare_titles(&a.title, &b.title),
            SortOrder::TitleDescending => compare_titles(&b.title, &a.title),
        }
    }

    pub fn index(self) -> usize {
        SortOrder::iter().position(|order| order == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        SortOrder::iter().nth(index)
    }

    pub fn next(self) -> Self {
        let count = SortOrder::iter().count();
        SortOrder::from_index((self.index() + 1) % count).unwrap_or_default()
    }
}

pub fn compare_timestamps(a: InstantNanos, b: InstantNanos) -> Ordering {
    a.0.cmp(&b.0)
}

/// Collation in three levels: base letters ignoring accents and case, then
/// accents, then case with lowercase first at the first differing character.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| compare_case(a, b))
}

fn folded(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfd().flat_map(char::to_lowercase)
}

fn base_letters(text: &str) -> impl Iterator<Item = char> + '_ {
    folded(text).filter(|ch| !is_combining_mark(*ch))
}

fn compare_case(a: &str, b: &str) -> Ordering {
    for (left, right) in a.chars().zip(b.chars()) {
        if left == right {
            continue;
        }
        return match (left.is_lowercase(), right.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => left.cmp(&right),
        };
    }
    a.chars().count().cmp(&b.chars().count())
}

pub fn sorted(notes: &[Note], order: SortOrder) -> Vec<Note> {
    let mut copy = notes.to_vec();
    copy.sort_by(|a, b| order.compare(a, b));
    copy
}
