//! The calendar widget that receives day marks.
//!
//! The engine never owns the widget. It talks to it through a
//! [`SinkHandle`], which holds a weak reference and silently skips every
//! call once the widget has been dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::julian::{date_to_julian, day_start, julian_to_date};
use crate::style::StyleBits;

/// A day as the widget addresses it: zero-based month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay {
    pub year: i32,
    pub month0: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, self.day)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        CalendarDay {
            year: date.year(),
            month0: date.month0(),
            day: date.day(),
        }
    }
}

/// Inclusive range of dates currently shown by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl VisibleRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        VisibleRange { first, last }
    }

    pub fn to_julian(self) -> (u32, u32) {
        (date_to_julian(self.first), date_to_julian(self.last))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    /// `[first 00:00, last + 1 day 00:00)` in `zone`, as UTC instants.
    pub fn instants(self, zone: Tz) -> Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
        let (start, end) = self.to_julian();
        Some((day_start(start, zone)?, day_start(end + 1, zone)?))
    }
}

/// Month-grid calendar widget.
pub trait CalendarSink {
    /// Set the mark of one day. With `merge` the style is OR-ed into the
    /// existing mark, otherwise it replaces it; an empty replacement
    /// clears the day.
    fn mark_day(&mut self, day: CalendarDay, style: StyleBits, merge: bool);

    /// [`CalendarSink::mark_day`] for every day of `[from, to]`.
    fn mark_days(&mut self, from: CalendarDay, to: CalendarDay, style: StyleBits, merge: bool);

    fn clear_marks(&mut self);

    /// Dates currently displayed, or `None` while the widget shows nothing.
    fn visible_range(&self) -> Option<VisibleRange>;

    /// Date under the widget position `(x, y)`, used for tooltips.
    fn date_at(&self, x: i32, y: i32) -> Option<NaiveDate>;
}

/// Non-owning, liveness-checked reference to a [`CalendarSink`].
#[derive(Clone)]
pub struct SinkHandle {
    sink: Weak<RefCell<dyn CalendarSink>>,
}

impl SinkHandle {
    pub fn new<S: CalendarSink + 'static>(sink: &Rc<RefCell<S>>) -> Self {
        let sink: Weak<RefCell<S>> = Rc::downgrade(sink);
        SinkHandle { sink }
    }

    pub fn is_alive(&self) -> bool {
        self.sink.strong_count() > 0
    }

    /// Run `f` against the widget if it still exists and is not already
    /// borrowed, e.g. by a widget callback that re-entered the engine.
    fn with<R>(&self, f: impl FnOnce(&mut dyn CalendarSink) -> R) -> Option<R> {
        let sink = self.sink.upgrade()?;
        let Ok(mut sink) = sink.try_borrow_mut() else {
            tracing::debug!("Calendar busy, call skipped");
            return None;
        };
        Some(f(&mut *sink))
    }

    /// Replace the mark of a julian day.
    pub fn mark_julian(&self, julian: u32, style: StyleBits) {
        let Some(date) = julian_to_date(julian) else {
            return;
        };
        tracing::trace!(%date, ?style, "Mark day");
        if self.with(|s| s.mark_day(date.into(), style, false)).is_none() {
            tracing::trace!(%date, "Calendar unavailable, mark skipped");
        }
    }

    /// Merge `style` into every day of `[first, last]`.
    pub fn mark_span(&self, first: NaiveDate, last: NaiveDate, style: StyleBits) {
        tracing::trace!(%first, %last, ?style, "Mark days");
        self.with(|s| s.mark_days(first.into(), last.into(), style, true));
    }

    pub fn clear_marks(&self) {
        self.with(|s| s.clear_marks());
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        let sink = self.sink.upgrade()?;
        let range = sink.try_borrow().ok()?.visible_range();
        range
    }

    pub fn date_at(&self, x: i32, y: i32) -> Option<NaiveDate> {
        let sink = self.sink.upgrade()?;
        let date = sink.try_borrow().ok()?.date_at(x, y);
        date
    }
}
