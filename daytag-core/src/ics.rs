//! ICS parsing using the icalendar crate's parser.

use chrono::{NaiveDate, NaiveDateTime};
use icalendar::parser::{Component as IcsComponent, Property, read_calendar, unfold};

use crate::component::{Component, EventTime, Recurrence, Transparency};
use crate::error::{DayTagError, DayTagResult};

/// Parse every VEVENT of an ICS document. Events without a UID are
/// skipped; a document that is not valid iCalendar is an error.
pub fn parse_components(content: &str) -> DayTagResult<Vec<Component>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| DayTagError::IcsParse(e.to_string()))?;

    let components = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| {
            let component = parse_vevent(vevent);
            if component.is_none() {
                tracing::debug!("Skipping VEVENT without UID");
            }
            component
        })
        .collect();

    Ok(components)
}

fn parse_vevent(vevent: &IcsComponent) -> Option<Component> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    // A broken DTSTART leaves the component without a day span; the engine
    // drops it, the parser does not.
    let start = vevent.find_prop("DTSTART").and_then(first_time);
    let end = vevent.find_prop("DTEND").and_then(first_time);

    let transparency = vevent
        .find_prop("TRANSP")
        .map(|p| {
            if p.val == "TRANSPARENT" {
                Transparency::Transparent
            } else {
                Transparency::Opaque
            }
        })
        .unwrap_or(Transparency::Opaque);

    // Recurrence (RRULE, EXDATE)
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(property_times)
        .collect();
    let recurrence = rrule.map(|rrule| Recurrence { rrule, exdates });

    let recurrence_id = vevent.find_prop("RECURRENCE-ID").and_then(first_time);

    Some(Component {
        uid,
        summary,
        start,
        end,
        transparency,
        recurrence,
        recurrence_id,
    })
}

fn first_time(prop: &Property) -> Option<EventTime> {
    property_times(prop).into_iter().next()
}

/// Every value of a DTSTART, DTEND, RECURRENCE-ID or EXDATE property.
/// Values that do not parse are dropped.
fn property_times(prop: &Property) -> Vec<EventTime> {
    let tzid = param(prop, "TZID");
    let date_only = param(prop, "VALUE") == Some("DATE");

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| parse_time_value(raw, tzid, date_only))
        .collect()
}

fn param<'p>(prop: &'p Property, key: &str) -> Option<&'p str> {
    prop.params
        .iter()
        .find(|p| p.key == key)
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref())
}

/// One DATE or DATE-TIME value. A bare `YYYYMMDD` is a date even without
/// `VALUE=DATE`; a trailing `Z` wins over any TZID.
fn parse_time_value(raw: &str, tzid: Option<&str>, date_only: bool) -> Option<EventTime> {
    if date_only || !raw.contains('T') {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").ok().map(EventTime::Date);
    }

    let (local, utc) = match raw.strip_suffix('Z') {
        Some(local) => (local, true),
        None => (raw, false),
    };
    let datetime = NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S").ok()?;

    Some(match (utc, tzid) {
        (true, _) => EventTime::DateTimeUtc(datetime.and_utc()),
        (false, Some(tzid)) => EventTime::DateTimeZoned {
            datetime,
            tzid: tzid.to_string(),
        },
        (false, None) => EventTime::DateTimeFloating(datetime),
    })
}
