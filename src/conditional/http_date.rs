//! HTTP-date values at second granularity.
//!
//! Parsing accepts the three forms a recipient must understand
//! (IMF-fixdate, RFC 850 and asctime). The leading day name is not
//! checked against the calendar date; clients that send
//! `Tue, 01 Jan 2024 00:00:00 GMT` still get a usable date.
//! Formatting always produces IMF-fixdate.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

const IMF_FIXDATE: &str = "%d %b %Y %H:%M:%S GMT";
const RFC_850: &str = "%d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%b %e %H:%M:%S %Y";
const OUTPUT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A point in time truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpDate(DateTime<Utc>);

impl HttpDate {
    /// Truncates `datetime` to whole seconds.
    #[must_use]
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime.trunc_subsecs(0))
    }

    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parses a header value, returning `None` for anything that is not an
    /// HTTP-date.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (day_name, rest) = split_day_name(raw)?;

        let parsed = match rest.strip_prefix(',') {
            Some(rest) if day_name.len() == 3 => {
                NaiveDateTime::parse_from_str(rest.trim_start(), IMF_FIXDATE).ok()
            }
            Some(rest) => NaiveDateTime::parse_from_str(rest.trim_start(), RFC_850).ok(),
            None => NaiveDateTime::parse_from_str(rest.trim_start(), ASCTIME).ok(),
        }?;

        Some(Self(parsed.and_utc()))
    }
}

/// Splits off the leading alphabetic day name.
fn split_day_name(raw: &str) -> Option<(&str, &str)> {
    let end = raw
        .char_indices()
        .find(|(_, character)| !character.is_ascii_alphabetic())
        .map(|(index, _)| index)?;

    if end < 3 {
        return None;
    }
    Some(raw.split_at(end))
}

impl From<DateTime<Utc>> for HttpDate {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0.format(OUTPUT))
    }
}
