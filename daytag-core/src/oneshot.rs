//! One-shot tagging of a single component's occurrences.
//!
//! Unlike [`crate::TagCalendar`] nothing is counted: every occurrence in
//! the visible window is merged straight into the widget's marks.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::component::Component;
use crate::julian::{julian_span, julian_to_date};
use crate::recurrence::{InstanceGenerator, RemoteInstanceGenerator};
use crate::sink::SinkHandle;
use crate::style::StyleBits;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagOptions {
    /// Clear all marks before tagging.
    pub clear_first: bool,
    /// Leave transparent (free) occurrences unmarked instead of italic.
    pub skip_transparent: bool,
    pub recur_events_italic: bool,
}

pub struct InstanceTagger {
    sink: SinkHandle,
    zone: Tz,
    options: TagOptions,
}

impl InstanceTagger {
    pub fn new(sink: SinkHandle, zone: Tz, options: TagOptions) -> Self {
        InstanceTagger {
            sink,
            zone,
            options,
        }
    }

    /// Mark the occurrences of `component` produced locally by
    /// `generator`. Returns the number of occurrences marked.
    pub fn tag(&self, component: &Component, generator: &dyn InstanceGenerator) -> usize {
        let Some((window, start, end)) = self.prepare() else {
            return 0;
        };
        let Some(style) = self.style_for(component) else {
            return 0;
        };

        let mut marked = 0;
        let result = generator.generate_instances(component, start, end, self.zone, &mut |instance| {
            if self.mark_instance(&instance, style, window) {
                marked += 1;
            }
            self.sink.is_alive()
        });
        if let Err(e) = result {
            tracing::warn!(uid = %component.uid, "Could not generate occurrences: {e}");
        }

        marked
    }

    /// Mark the occurrences of `component` as expanded by a remote
    /// `generator`. Once `cancel` fires no further day is marked; marks
    /// already made stay.
    pub async fn tag_on_server<G: RemoteInstanceGenerator>(
        &self,
        component: &Component,
        generator: &G,
        cancel: &CancellationToken,
    ) -> usize {
        let Some((window, start, end)) = self.prepare() else {
            return 0;
        };
        let Some(style) = self.style_for(component) else {
            return 0;
        };

        let mut instances = std::pin::pin!(
            generator.generate_instances(component, start, end, self.zone, cancel)
        );
        let mut marked = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = instances.next() => next,
            };
            let Some(next) = next else {
                break;
            };
            let instance = match next {
                Ok(instance) => instance,
                Err(e) => {
                    tracing::warn!(uid = %component.uid, "Could not generate occurrences: {e}");
                    break;
                }
            };
            if cancel.is_cancelled() {
                break;
            }
            if self.mark_instance(&instance, style, window) {
                marked += 1;
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!(uid = %component.uid, marked, "Tagging cancelled");
        }
        marked
    }

    /// Visible window as julian days and UTC instants, clearing first if
    /// asked to. `None` when there is nothing to tag into.
    fn prepare(&self) -> Option<((u32, u32), DateTime<Utc>, DateTime<Utc>)> {
        let Some(visible) = self.sink.visible_range() else {
            tracing::debug!("Calendar gone or empty, nothing to tag");
            return None;
        };
        let (start, end) = visible.instants(self.zone)?;

        if self.options.clear_first {
            self.sink.clear_marks();
        }
        Some((visible.to_julian(), start, end))
    }

    /// Style shared by every occurrence of `component`; `None` when they
    /// are skipped altogether.
    fn style_for(&self, component: &Component) -> Option<StyleBits> {
        if component.is_transparent() {
            if self.options.skip_transparent {
                tracing::trace!(uid = %component.uid, "Skipping transparent component");
                return None;
            }
            return Some(StyleBits::ITALIC);
        }
        if component.is_recurring() && self.options.recur_events_italic {
            return Some(StyleBits::ITALIC);
        }
        Some(StyleBits::BOLD)
    }

    fn mark_instance(&self, instance: &Component, style: StyleBits, window: (u32, u32)) -> bool {
        let Some((first, last)) = julian_span(instance.start.as_ref(), instance.end.as_ref(), self.zone)
        else {
            return false;
        };

        let first = first.max(window.0);
        let last = last.min(window.1);
        if first > last {
            return false;
        }

        match (julian_to_date(first), julian_to_date(last)) {
            (Some(first), Some(last)) => {
                self.sink.mark_span(first, last, style);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{EventTime, Transparency};
    use crate::sink::{CalendarDay, CalendarSink, VisibleRange};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct SpanSink {
        spans: Vec<(CalendarDay, CalendarDay, StyleBits, bool)>,
    }

    impl CalendarSink for SpanSink {
        fn mark_day(&mut self, day: CalendarDay, style: StyleBits, merge: bool) {
            self.spans.push((day, day, style, merge));
        }
        fn mark_days(&mut self, from: CalendarDay, to: CalendarDay, style: StyleBits, merge: bool) {
            self.spans.push((from, to, style, merge));
        }
        fn clear_marks(&mut self) {}
        fn visible_range(&self) -> Option<VisibleRange> {
            Some(VisibleRange::new(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            ))
        }
        fn date_at(&self, _x: i32, _y: i32) -> Option<NaiveDate> {
            None
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_span_is_clamped_to_window() {
        let sink = Rc::new(RefCell::new(SpanSink::default()));
        let tagger = InstanceTagger::new(SinkHandle::new(&sink), chrono_tz::UTC, TagOptions::default());

        let trip = Component::new(
            "trip",
            EventTime::Date(NaiveDate::from_ymd_opt(2025, 5, 29).unwrap()),
            EventTime::Date(day(3)),
        );
        let marked = tagger.tag(&trip, &crate::recurrence::RRuleExpander::default());

        assert_eq!(marked, 1);
        let spans = &sink.borrow().spans;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0], (day(1).into(), day(2).into(), StyleBits::BOLD, true));
    }

    #[test]
    fn test_style_table() {
        let sink = Rc::new(RefCell::new(SpanSink::default()));
        let options = TagOptions {
            recur_events_italic: true,
            ..TagOptions::default()
        };
        let tagger = InstanceTagger::new(SinkHandle::new(&sink), chrono_tz::UTC, options);

        let mut comp = Component::new("a", EventTime::Date(day(2)), EventTime::Date(day(3)));
        assert_eq!(tagger.style_for(&comp), Some(StyleBits::BOLD));

        comp.recurrence_id = Some(EventTime::Date(day(2)));
        assert_eq!(tagger.style_for(&comp), Some(StyleBits::ITALIC));

        comp.recurrence_id = None;
        comp.transparency = Transparency::Transparent;
        assert_eq!(tagger.style_for(&comp), Some(StyleBits::ITALIC));
    }
}
