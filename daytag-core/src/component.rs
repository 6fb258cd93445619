//! Calendar components as the tagging engine sees them.
//!
//! Only the properties that influence day marks are kept: identity, the
//! start/end times, transparency and recurrence. Everything else an ICS
//! event carries is irrelevant to the date navigator.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A calendar component (VEVENT) or one generated occurrence of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub uid: String,
    pub summary: String,
    /// DTSTART. `None` when missing or unparseable.
    pub start: Option<EventTime>,
    /// DTEND (exclusive). `None` when the component has no end.
    pub end: Option<EventTime>,
    /// Whether event blocks time (OPAQUE) or is free (TRANSPARENT)
    pub transparency: Transparency,
    /// RRULE/EXDATE for master components
    pub recurrence: Option<Recurrence>,
    /// Original start of a detached or generated instance (RECURRENCE-ID)
    pub recurrence_id: Option<EventTime>,
}

/// Recurrence rule of a master component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// RRULE value without the `RRULE:` prefix, e.g. `FREQ=WEEKLY;COUNT=4`
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

/// Event transparency (busy/free status)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Event blocks time on calendar (default)
    #[default]
    Opaque,
    /// Event does not block time (shows as free)
    Transparent,
}

/// A DTSTART/DTEND/RECURRENCE-ID value, keeping the ICS value kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day value (`VALUE=DATE`)
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    /// Local time with no zone; read in the display zone.
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Resolve to an absolute instant. DATE and floating values are read
    /// in `zone`; a TZID that chrono-tz does not know falls back to `zone`.
    pub fn to_utc(&self, zone: Tz) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => resolve_local(zone, d.and_time(NaiveTime::MIN)),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(dt) => resolve_local(zone, *dt),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let tz = tzid.parse::<Tz>().unwrap_or_else(|_| {
                    tracing::trace!(tzid = %tzid, "Unknown TZID, using display zone");
                    zone
                });
                resolve_local(tz, *datetime)
            }
        }
    }

    /// The calendar date this value falls on when displayed in `zone`.
    pub fn local_date(&self, zone: Tz) -> Option<NaiveDate> {
        match self {
            EventTime::Date(d) => Some(*d),
            _ => self
                .to_utc(zone)
                .map(|dt| dt.with_timezone(&zone).date_naive()),
        }
    }

    /// Canonical ICS text, used as the recurrence-id key of an instance.
    pub fn to_ics_string(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::DateTimeFloating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::DateTimeZoned { datetime, tzid } => {
                format!("TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
            }
        }
    }
}

/// Map a wall-clock time in `zone` to UTC. Ambiguous times take the
/// earlier mapping; times inside a DST gap move forward by an hour.
pub(crate) fn resolve_local(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

impl Component {
    pub fn new(uid: &str, start: EventTime, end: EventTime) -> Self {
        Component {
            uid: uid.to_string(),
            summary: String::new(),
            start: Some(start),
            end: Some(end),
            transparency: Transparency::Opaque,
            recurrence: None,
            recurrence_id: None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.transparency == Transparency::Transparent
    }

    /// True for master components with a rule and for detached or
    /// generated instances.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some() || self.recurrence_id.is_some()
    }

    /// Recurrence-id in its canonical text form.
    pub fn rid(&self) -> Option<String> {
        self.recurrence_id.as_ref().map(EventTime::to_ics_string)
    }

    /// Start/end as UTC instants. A missing end yields a zero-length span,
    /// or a single day for all-day starts.
    pub fn instant_span(&self, zone: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start_time = self.start.as_ref()?;
        let start = start_time.to_utc(zone)?;
        let end = match self.end.as_ref().and_then(|e| e.to_utc(zone)) {
            Some(end) if end >= start => end,
            _ if start_time.is_date() => start + Duration::days(1),
            _ => start,
        };
        Some((start, end))
    }

    /// Whether this component occupies any time in `[range_start, range_end)`.
    /// Zero-length components count when their start lies in the range.
    pub fn overlaps(&self, range_start: DateTime<Utc>, range_end: DateTime<Utc>, zone: Tz) -> bool {
        match self.instant_span(zone) {
            Some((start, end)) if start == end => start >= range_start && start < range_end,
            Some((start, end)) => start < range_end && end > range_start,
            None => false,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.summary.is_empty() {
            write!(f, "{}", self.uid)
        } else {
            write!(f, "{}", self.summary)
        }
    }
}
