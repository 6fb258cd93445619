#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use daytag_core::julian::julian_to_date;
use daytag_core::{
    CalendarDay, CalendarSink, ClientId, Component, DataSource, EventTime, StyleBits, Subscriber,
    SubscriptionId, VisibleRange,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Mark(NaiveDate, StyleBits, bool),
    MarkDays(NaiveDate, NaiveDate, StyleBits, bool),
    Clear,
}

/// Widget double: applies marks like a real date navigator and records
/// every call it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub range: Option<VisibleRange>,
    pub calls: Vec<SinkCall>,
    pub marks: BTreeMap<NaiveDate, StyleBits>,
}

impl RecordingSink {
    pub fn showing(first: u32, last: u32) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(RecordingSink {
            range: Some(julian_range(first, last)),
            ..RecordingSink::default()
        }))
    }

    pub fn mark_of(&self, julian: u32) -> StyleBits {
        self.marks.get(&day(julian)).copied().unwrap_or_default()
    }

    pub fn clears(&self) -> usize {
        self.calls.iter().filter(|c| **c == SinkCall::Clear).count()
    }

    /// Single-day mark calls, in order.
    pub fn day_marks(&self) -> Vec<(NaiveDate, StyleBits)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Mark(date, style, _) => Some((*date, *style)),
                _ => None,
            })
            .collect()
    }

    fn apply(&mut self, date: NaiveDate, style: StyleBits, merge: bool) {
        let current = self.marks.get(&date).copied().unwrap_or_default();
        let next = if merge { current | style } else { style };
        if next.is_empty() {
            self.marks.remove(&date);
        } else {
            self.marks.insert(date, next);
        }
    }
}

impl CalendarSink for RecordingSink {
    fn mark_day(&mut self, day: CalendarDay, style: StyleBits, merge: bool) {
        let Some(date) = day.to_date() else {
            return;
        };
        self.calls.push(SinkCall::Mark(date, style, merge));
        self.apply(date, style, merge);
    }

    fn mark_days(&mut self, from: CalendarDay, to: CalendarDay, style: StyleBits, merge: bool) {
        let (Some(from), Some(to)) = (from.to_date(), to.to_date()) else {
            return;
        };
        self.calls.push(SinkCall::MarkDays(from, to, style, merge));
        for date in from.iter_days().take_while(|d| *d <= to) {
            self.apply(date, style, merge);
        }
    }

    fn clear_marks(&mut self) {
        self.calls.push(SinkCall::Clear);
        self.marks.clear();
    }

    fn visible_range(&self) -> Option<VisibleRange> {
        self.range
    }

    /// Seven columns per row, starting at the first visible day.
    fn date_at(&self, x: i32, y: i32) -> Option<NaiveDate> {
        let range = self.range?;
        if !(0..7).contains(&x) || y < 0 {
            return None;
        }
        let date = range.first + Duration::days(i64::from(y * 7 + x));
        range.contains(date).then_some(date)
    }
}

/// Data source double driven by hand from the test.
pub struct ManualSource {
    pub zone: Tz,
    pub subscriber: Option<Weak<RefCell<dyn Subscriber>>>,
    pub subscribed: Vec<(SubscriptionId, DateTime<Utc>, DateTime<Utc>)>,
    pub unsubscribed: Vec<SubscriptionId>,
    next_id: u64,
}

impl ManualSource {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(ManualSource {
            zone: chrono_tz::UTC,
            subscriber: None,
            subscribed: Vec::new(),
            unsubscribed: Vec::new(),
            next_id: 1,
        }))
    }

    pub fn emit(&self, f: impl FnOnce(&mut dyn Subscriber)) {
        let subscriber = self
            .subscriber
            .as_ref()
            .and_then(Weak::upgrade)
            .expect("no live subscriber");
        f(&mut *subscriber.borrow_mut());
    }

    pub fn add(&self, component: &Component) {
        self.emit(|s| s.component_added(&client(), component));
    }

    pub fn modify(&self, component: &Component) {
        self.emit(|s| s.component_modified(&client(), component));
    }

    pub fn remove(&self, component: &Component) {
        let rid = component.rid();
        self.emit(|s| s.component_removed(&client(), &component.uid, rid.as_deref()));
    }
}

impl DataSource for ManualSource {
    fn timezone(&self) -> Tz {
        self.zone
    }

    fn subscribe(
        &mut self,
        subscriber: Weak<RefCell<dyn Subscriber>>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriber = Some(subscriber);
        self.subscribed.push((id, start, end));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.unsubscribed.push(id);
        self.subscriber = None;
    }
}

pub fn as_source<S: DataSource + 'static>(source: &Rc<RefCell<S>>) -> Rc<RefCell<dyn DataSource>> {
    source.clone()
}

pub fn client() -> ClientId {
    ClientId::new("personal")
}

pub fn day(julian: u32) -> NaiveDate {
    julian_to_date(julian).expect("valid julian day")
}

pub fn julian_range(first: u32, last: u32) -> VisibleRange {
    VisibleRange::new(day(first), day(last))
}

/// An all-day component covering julian days `[first, last]`.
pub fn all_day(uid: &str, first: u32, last: u32) -> Component {
    Component::new(
        uid,
        EventTime::Date(day(first)),
        EventTime::Date(day(last) + Duration::days(1)),
    )
}
