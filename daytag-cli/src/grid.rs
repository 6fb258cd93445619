//! Six-week month grid, the terminal stand-in for a date navigator widget.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use daytag_core::{CalendarDay, CalendarSink, StyleBits, VisibleRange};

const WEEKS: i64 = 6;

pub struct MonthGrid {
    /// First day of the month shown
    month: NaiveDate,
    /// Monday on or before the first of the month
    first: NaiveDate,
    marks: BTreeMap<NaiveDate, StyleBits>,
}

impl MonthGrid {
    pub fn new(month: NaiveDate) -> Self {
        let month = month.with_day(1).unwrap_or(month);
        let first = month - Duration::days(i64::from(month.weekday().num_days_from_monday()));
        MonthGrid {
            month,
            first,
            marks: BTreeMap::new(),
        }
    }

    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn last(&self) -> NaiveDate {
        self.first + Duration::days(WEEKS * 7 - 1)
    }

    pub fn in_month(&self, date: NaiveDate) -> bool {
        date.year() == self.month.year() && date.month() == self.month.month()
    }

    pub fn mark(&self, date: NaiveDate) -> StyleBits {
        self.marks.get(&date).copied().unwrap_or_default()
    }

    pub fn marked_days(&self) -> usize {
        self.marks.len()
    }

    /// Rows of seven dates, Monday first.
    pub fn weeks(&self) -> impl Iterator<Item = Vec<NaiveDate>> + '_ {
        (0..WEEKS).map(move |week| {
            (0..7)
                .map(|weekday| self.first + Duration::days(week * 7 + weekday))
                .collect()
        })
    }

    /// Column and row of `date`, the inverse of [`CalendarSink::date_at`].
    pub fn position_of(&self, date: NaiveDate) -> Option<(i32, i32)> {
        if date < self.first || date > self.last() {
            return None;
        }
        let offset = i32::try_from((date - self.first).num_days()).ok()?;
        Some((offset % 7, offset / 7))
    }

    fn apply(&mut self, date: NaiveDate, style: StyleBits, merge: bool) {
        let style = if merge { self.mark(date) | style } else { style };
        if style.is_empty() {
            self.marks.remove(&date);
        } else {
            self.marks.insert(date, style);
        }
    }
}

impl CalendarSink for MonthGrid {
    fn mark_day(&mut self, day: CalendarDay, style: StyleBits, merge: bool) {
        if let Some(date) = day.to_date() {
            self.apply(date, style, merge);
        }
    }

    fn mark_days(&mut self, from: CalendarDay, to: CalendarDay, style: StyleBits, merge: bool) {
        let (Some(from), Some(to)) = (from.to_date(), to.to_date()) else {
            return;
        };
        for date in from.iter_days().take_while(|d| *d <= to) {
            self.apply(date, style, merge);
        }
    }

    fn clear_marks(&mut self) {
        self.marks.clear();
    }

    fn visible_range(&self) -> Option<VisibleRange> {
        Some(VisibleRange::new(self.first, self.last()))
    }

    fn date_at(&self, x: i32, y: i32) -> Option<NaiveDate> {
        if !(0..7).contains(&x) || !(0..WEEKS as i32).contains(&y) {
            return None;
        }
        Some(self.first + Duration::days(i64::from(y * 7 + x)))
    }
}
