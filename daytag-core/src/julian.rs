//! Julian day numbers.
//!
//! Days are keyed by a plain integer so range walks are integer loops.
//! Day 1 is 0001-01-01 in the proleptic Gregorian calendar; `0` is the
//! "invalid" sentinel.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::component::{EventTime, resolve_local};

/// Julian value returned for a missing or unrepresentable date.
pub const INVALID_JULIAN: u32 = 0;

/// Encode a calendar date. Out-of-range dates and dates before year 1
/// give [`INVALID_JULIAN`].
pub fn encode_ymd(year: i32, month: u32, day: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, day).map_or(INVALID_JULIAN, date_to_julian)
}

/// Inverse of [`encode_ymd`]; `None` for [`INVALID_JULIAN`].
pub fn decode_julian(julian: u32) -> Option<(i32, u32, u32)> {
    julian_to_date(julian).map(|d| (d.year(), d.month(), d.day()))
}

pub fn date_to_julian(date: NaiveDate) -> u32 {
    u32::try_from(date.num_days_from_ce()).unwrap_or(INVALID_JULIAN)
}

pub fn julian_to_date(julian: u32) -> Option<NaiveDate> {
    if julian == INVALID_JULIAN {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(julian).ok()?)
}

/// Julian day of the local date of `instant` in `zone`.
pub fn encode_instant(instant: Option<DateTime<Utc>>, zone: Tz) -> u32 {
    instant.map_or(INVALID_JULIAN, |t| {
        date_to_julian(t.with_timezone(&zone).date_naive())
    })
}

/// Julian day of a component time. DATE values encode their own date
/// regardless of `zone`.
pub fn encode_event_time(time: Option<&EventTime>, zone: Tz) -> u32 {
    time.and_then(|t| t.local_date(zone))
        .map_or(INVALID_JULIAN, date_to_julian)
}

/// Inclusive julian span covered by a start/end pair.
///
/// The end is exclusive in ICS, so a timed end is stepped back one second
/// and an all-day end one day; the span never ends before it starts.
/// Returns `None` when the start is missing or invalid.
pub fn julian_span(start: Option<&EventTime>, end: Option<&EventTime>, zone: Tz) -> Option<(u32, u32)> {
    let start_julian = encode_event_time(start, zone);
    if start_julian == INVALID_JULIAN {
        return None;
    }

    let end_julian = match end {
        Some(EventTime::Date(d)) => date_to_julian(*d - Duration::days(1)),
        Some(other) => encode_instant(other.to_utc(zone).map(|t| t - Duration::seconds(1)), zone),
        None => start_julian,
    };

    Some((start_julian, end_julian.max(start_julian)))
}

/// UTC instant of local midnight starting `julian` in `zone`.
pub fn day_start(julian: u32, zone: Tz) -> Option<DateTime<Utc>> {
    let date = julian_to_date(julian)?;
    resolve_local(zone, date.and_hms_opt(0, 0, 0)?)
}
