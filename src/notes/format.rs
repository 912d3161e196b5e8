use std::str::FromStr;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use super::InstantNanos;

const FULL_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday], [month repr:long] [day padding:none], [year], [hour]:[minute]"
);
const ABBR_FORMAT: &[FormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year] [hour]:[minute]");
const YEAR_FORMAT: &[FormatItem<'static>] = format_description!("[year]");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum DateStyle {
    Full,
    #[default]
    Abbr,
    Year,
}

impl DateStyle {
    pub fn parse_lossy(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or(DateStyle::Abbr)
    }

    fn description(self) -> &'static [FormatItem<'static>] {
        match self {
            DateStyle::Full => FULL_FORMAT,
            DateStyle::Abbr => ABBR_FORMAT,
            DateStyle::Year => YEAR_FORMAT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampFormatter {
    offset: UtcOffset,
}

impl Default for TimestampFormatter {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimestampFormatter {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(UtcOffset::UTC)
    }

    /// Resolves the machine's local offset. Must run before other threads are
    /// spawned; on failure the formatter stays on UTC.
    pub fn local() -> Self {
        match UtcOffset::current_local_offset() {
            Ok(offset) => Self::new(offset),
            Err(err) => {
                tracing::warn!(%err, "could not determine local UTC offset, using UTC");
                Self::utc()
            }
        }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn format_instant(&self, instant: InstantNanos, style: DateStyle) -> String {
        let shifted = instant
            .as_millis()
            .checked_mul(InstantNanos::NANOS_PER_MILLI)
            .and_then(|nanos| nanos.checked_add(self.offset_nanos()));
        shifted
            .and_then(|nanos| OffsetDateTime::from_unix_timestamp_nanos(nanos).ok())
            .and_then(|dt| dt.format(style.description()).ok())
            .unwrap_or_else(|| instant.to_string())
    }

    pub fn format_now(&self, style: DateStyle) -> String {
        self.format_instant(InstantNanos::now(), style)
    }

    fn offset_nanos(&self) -> i128 {
        i128::from(self.offset.whole_seconds()) * 1_000_000_000
    }
}

pub fn format_instant(instant: InstantNanos, style: DateStyle) -> String {
    TimestampFormatter::utc().format_instant(instant, style)
}

pub fn format_now(style: DateStyle) -> String {
    TimestampFormatter::utc().format_now(style)
}
