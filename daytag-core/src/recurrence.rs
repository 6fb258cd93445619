//! Occurrence generation for recurring components.
//!
//! [`RRuleExpander`] expands a master component locally with the rrule
//! crate. Sources that expand on a server implement
//! [`RemoteInstanceGenerator`] instead.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use futures::Stream;
use rrule::RRuleSet;
use tokio_util::sync::CancellationToken;

use crate::component::{Component, EventTime, Recurrence};
use crate::error::{DayTagError, DayTagResult};

/// Upper bound on occurrences produced for one component and window.
pub const DEFAULT_INSTANCE_LIMIT: u16 = 1000;

/// Synchronous occurrence generator.
pub trait InstanceGenerator {
    /// Call `callback` with every occurrence of `component` that overlaps
    /// `[start, end)`. Generation stops early when `callback` returns
    /// `false`.
    fn generate_instances(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        zone: Tz,
        callback: &mut dyn FnMut(Component) -> bool,
    ) -> DayTagResult<()>;
}

/// Asynchronous occurrence generator, e.g. a server-side expansion.
///
/// Occurrences arrive one at a time, so a consumer can act on each as it
/// comes in and stop once `cancel` fires.
pub trait RemoteInstanceGenerator {
    /// Stream of the occurrences of `component` overlapping `[start, end)`.
    /// Implementations should end the stream early once `cancel` fires.
    fn generate_instances(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        zone: Tz,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = DayTagResult<Component>>;
}

/// Local rrule-based expansion.
#[derive(Debug, Clone, Copy)]
pub struct RRuleExpander {
    limit: u16,
}

impl Default for RRuleExpander {
    fn default() -> Self {
        RRuleExpander {
            limit: DEFAULT_INSTANCE_LIMIT,
        }
    }
}

impl RRuleExpander {
    pub fn with_limit(limit: u16) -> Self {
        RRuleExpander { limit }
    }

    /// Collect the occurrences of `component` overlapping `[start, end)`.
    pub fn expand(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        zone: Tz,
    ) -> DayTagResult<Vec<Component>> {
        let mut instances = Vec::new();
        self.generate_instances(component, start, end, zone, &mut |instance| {
            instances.push(instance);
            true
        })?;
        Ok(instances)
    }
}

impl InstanceGenerator for RRuleExpander {
    fn generate_instances(
        &self,
        component: &Component,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        zone: Tz,
        callback: &mut dyn FnMut(Component) -> bool,
    ) -> DayTagResult<()> {
        let Some(recurrence) = &component.recurrence else {
            if component.overlaps(start, end, zone) {
                callback(component.clone());
            }
            return Ok(());
        };

        let Some(master_start) = &component.start else {
            return Ok(());
        };
        let Some((master_from, master_to)) = component.instant_span(zone) else {
            return Ok(());
        };
        let duration = master_to - master_from;

        let rrule_str = build_rrule_string(master_start, recurrence, zone);
        let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
            DayTagError::Recurrence(format!(
                "Failed to parse RRULE for component '{}': {}",
                component.uid, e
            ))
        })?;

        // Occurrences starting up to one duration before the window can
        // still reach into it. Bounds are padded by a second because the
        // rrule crate treats them as exclusive.
        let tz: rrule::Tz = Utc.into();
        let after = (start - duration - Duration::seconds(1)).with_timezone(&tz);
        let before = (end + Duration::seconds(1)).with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(self.limit);
        if result.limited {
            tracing::debug!(uid = %component.uid, limit = self.limit, "Occurrence limit reached");
        }

        for occurrence in &result.dates {
            let instance = build_instance(component, master_start, occurrence, duration);
            if !instance.overlaps(start, end, zone) {
                continue;
            }
            if !callback(instance) {
                break;
            }
        }

        Ok(())
    }
}

/// Build an iCalendar-format rule set string for the rrule crate parser.
///
/// All-day starts become midnight UTC; floating starts are pinned to the
/// display zone.
fn build_rrule_string(start: &EventTime, recurrence: &Recurrence, zone: Tz) -> String {
    let mut lines = vec![format!("DTSTART{}", rrule_time(start, zone))];
    lines.push(format!("RRULE:{}", recurrence.rrule));
    for exdate in &recurrence.exdates {
        lines.push(format!("EXDATE{}", rrule_time(exdate, zone)));
    }
    lines.join("\n")
}

fn rrule_time(time: &EventTime, zone: Tz) -> String {
    match time {
        EventTime::Date(d) => format!(":{}T000000Z", d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!(":{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => {
            format!(";TZID={}:{}", zone.name(), dt.format("%Y%m%dT%H%M%S"))
        }
        EventTime::DateTimeZoned { datetime, tzid } => {
            let tzid = if tzid.parse::<Tz>().is_ok() { tzid.as_str() } else { zone.name() };
            format!(";TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

/// An occurrence of `master` starting at `occurrence`, keeping the
/// master's value kind and duration.
fn build_instance(
    master: &Component,
    master_start: &EventTime,
    occurrence: &DateTime<rrule::Tz>,
    duration: Duration,
) -> Component {
    let (start, end) = match master_start {
        EventTime::Date(_) => {
            let day = occurrence.date_naive();
            (EventTime::Date(day), EventTime::Date(day + Duration::days(duration.num_days().max(1))))
        }
        EventTime::DateTimeUtc(_) => {
            let at = occurrence.with_timezone(&Utc);
            (EventTime::DateTimeUtc(at), EventTime::DateTimeUtc(at + duration))
        }
        EventTime::DateTimeFloating(_) => {
            let at = occurrence.naive_local();
            (EventTime::DateTimeFloating(at), EventTime::DateTimeFloating(at + duration))
        }
        EventTime::DateTimeZoned { tzid, .. } => {
            let at = occurrence.naive_local();
            (
                EventTime::DateTimeZoned { datetime: at, tzid: tzid.clone() },
                EventTime::DateTimeZoned { datetime: at + duration, tzid: tzid.clone() },
            )
        }
    };

    Component {
        uid: master.uid.clone(),
        summary: master.summary.clone(),
        start: Some(start.clone()),
        end: Some(end),
        transparency: master.transparency,
        recurrence: None,
        recurrence_id: Some(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Transparency;
    use chrono::{NaiveDate, TimeZone};

    fn weekly_standup() -> Component {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let mut comp = Component::new(
            "standup",
            EventTime::DateTimeUtc(start),
            EventTime::DateTimeUtc(start + Duration::minutes(30)),
        );
        comp.recurrence = Some(Recurrence {
            rrule: "FREQ=WEEKLY;COUNT=10".to_string(),
            exdates: vec![EventTime::DateTimeUtc(start + Duration::weeks(2))],
        });
        comp
    }

    fn march() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_expand_weekly_with_exdate() {
        let (start, end) = march();
        let instances = RRuleExpander::default()
            .expand(&weekly_standup(), start, end, chrono_tz::UTC)
            .unwrap();

        let days: Vec<u32> = instances
            .iter()
            .map(|i| i.start.as_ref().unwrap().local_date(chrono_tz::UTC).unwrap())
            .map(|d| chrono::Datelike::day(&d))
            .collect();
        assert_eq!(days, vec![3, 10, 24, 31]);

        for instance in &instances {
            assert_eq!(instance.recurrence, None);
            assert_eq!(instance.recurrence_id, instance.start);
            assert!(instance.is_recurring());
        }
    }

    #[test]
    fn test_callback_can_stop_generation() {
        let (start, end) = march();
        let mut seen = 0;
        RRuleExpander::default()
            .generate_instances(&weekly_standup(), start, end, chrono_tz::UTC, &mut |_| {
                seen += 1;
                false
            })
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_all_day_master_keeps_day_count() {
        let first = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut comp = Component::new(
            "trip",
            EventTime::Date(first),
            EventTime::Date(first + Duration::days(2)),
        );
        comp.transparency = Transparency::Transparent;
        comp.recurrence = Some(Recurrence {
            rrule: "FREQ=MONTHLY;COUNT=3".to_string(),
            exdates: vec![],
        });

        let instances = RRuleExpander::default()
            .expand(
                &comp,
                Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
                chrono_tz::UTC,
            )
            .unwrap();

        assert_eq!(instances.len(), 1);
        let feb = NaiveDate::from_ymd_opt(2025, 2, 6).unwrap();
        assert_eq!(instances[0].start, Some(EventTime::Date(feb)));
        assert_eq!(instances[0].end, Some(EventTime::Date(feb + Duration::days(2))));
        assert!(instances[0].is_transparent());
    }

    #[test]
    fn test_occurrence_reaching_into_window_is_included() {
        let start = Utc.with_ymd_and_hms(2025, 2, 28, 22, 0, 0).unwrap();
        let mut comp = Component::new(
            "night-shift",
            EventTime::DateTimeUtc(start),
            EventTime::DateTimeUtc(start + Duration::hours(4)),
        );
        comp.recurrence = Some(Recurrence {
            rrule: "FREQ=DAILY;COUNT=1".to_string(),
            exdates: vec![],
        });

        let (from, to) = march();
        let instances = RRuleExpander::default().expand(&comp, from, to, chrono_tz::UTC).unwrap();
        assert_eq!(instances.len(), 1);
    }

    #[test]
    fn test_single_component_yields_itself_when_overlapping() {
        let (start, end) = march();
        let mut comp = weekly_standup();
        comp.recurrence = None;

        let inside = RRuleExpander::default().expand(&comp, start, end, chrono_tz::UTC).unwrap();
        assert_eq!(inside, vec![comp.clone()]);

        let later = RRuleExpander::default()
            .expand(&comp, end, end + Duration::days(30), chrono_tz::UTC)
            .unwrap();
        assert!(later.is_empty());
    }

    #[test]
    fn test_invalid_rule_is_an_error() {
        let (start, end) = march();
        let mut comp = weekly_standup();
        comp.recurrence = Some(Recurrence {
            rrule: "FREQ=SOMETIMES".to_string(),
            exdates: vec![],
        });

        let result = RRuleExpander::default().expand(&comp, start, end, chrono_tz::UTC);
        assert!(matches!(result, Err(DayTagError::Recurrence(_))));
    }
}
