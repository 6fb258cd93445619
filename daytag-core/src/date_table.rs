//! Per-day contribution counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::object_index::Category;
use crate::style::{StyleBits, style};

/// Counters for one day. Only days with at least one contribution are
/// stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateInfo {
    pub n_transparent: u32,
    pub n_recurring: u32,
    pub n_single: u32,
}

impl DateInfo {
    pub fn total(&self) -> u32 {
        self.n_transparent + self.n_recurring + self.n_single
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn counter_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Transparent => &mut self.n_transparent,
            Category::Recurring => &mut self.n_recurring,
            Category::Single => &mut self.n_single,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increment,
    Decrement,
}

/// Which adjustments are clipped to the visible range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClampPolicy {
    /// Increments and decrements both walk only the visible days.
    #[default]
    Symmetric,
    /// Only increments are clipped; decrements walk the full span of the
    /// component. Days outside the range that other components populate
    /// lose counts they never received from this one.
    IncrementOnly,
}

impl ClampPolicy {
    /// The part of `[start, end]` an adjustment should walk. `None` when
    /// nothing is left after clipping.
    pub fn clamp(
        self,
        start: u32,
        end: u32,
        delta: Delta,
        visible: Option<(u32, u32)>,
    ) -> Option<(u32, u32)> {
        if self == ClampPolicy::IncrementOnly && delta == Delta::Decrement {
            return Some((start, end));
        }

        let (range_start, range_end) = visible?;
        let (start, end) = (start.max(range_start), end.min(range_end));
        (start <= end).then_some((start, end))
    }
}

/// Julian day → [`DateInfo`].
#[derive(Debug, Default)]
pub struct DateAggregateTable {
    dates: BTreeMap<u32, DateInfo>,
}

impl DateAggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `delta` to the `category` counter of every day in
    /// `[start, end]`, calling `emit` for each day whose style changed.
    /// A day whose counters all reach zero is emitted with an empty style
    /// and dropped. Returns the number of days a decrement found without
    /// contributions and left alone.
    pub fn adjust_range(
        &mut self,
        start: u32,
        end: u32,
        category: Category,
        delta: Delta,
        recur_events_italic: bool,
        emit: &mut dyn FnMut(u32, StyleBits),
    ) -> usize {
        let mut skipped = 0;
        for julian in start..=end {
            if !self.adjust_day(julian, category, delta, recur_events_italic, emit) {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(start, end, ?category, skipped, "Decrement on days without contributions");
        }
        skipped
    }

    /// `false` when a decrement finds no entry for `julian`.
    fn adjust_day(
        &mut self,
        julian: u32,
        category: Category,
        delta: Delta,
        recur_events_italic: bool,
        emit: &mut dyn FnMut(u32, StyleBits),
    ) -> bool {
        let info = match delta {
            Delta::Increment => self.dates.entry(julian).or_default(),
            Delta::Decrement => match self.dates.get_mut(&julian) {
                Some(info) => info,
                None => {
                    tracing::trace!(julian, ?category, "No contributions to decrement");
                    return false;
                }
            },
        };

        let old_style = style(info, recur_events_italic);
        let counter = info.counter_mut(category);
        match delta {
            Delta::Increment => *counter += 1,
            Delta::Decrement if *counter == 0 => {
                tracing::warn!(julian, ?category, "Counter already zero");
            }
            Delta::Decrement => *counter -= 1,
        }
        let new_style = style(info, recur_events_italic);
        let emptied = info.is_empty();

        if new_style != old_style {
            emit(julian, new_style);
        }
        if emptied {
            self.dates.remove(&julian);
        }
        true
    }

    /// Emit the current style of every stored day.
    pub fn rebuild_all(&self, recur_events_italic: bool, emit: &mut dyn FnMut(u32, StyleBits)) {
        for (julian, info) in &self.dates {
            emit(*julian, style(info, recur_events_italic));
        }
    }

    pub fn lookup(&self, julian: u32) -> Option<&DateInfo> {
        self.dates.get(&julian)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn clear(&mut self) {
        self.dates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(
        table: &mut DateAggregateTable,
        start: u32,
        end: u32,
        category: Category,
        delta: Delta,
    ) -> Vec<(u32, StyleBits)> {
        let mut marks = Vec::new();
        table.adjust_range(start, end, category, delta, false, &mut |j, s| marks.push((j, s)));
        marks
    }

    #[test]
    fn test_increment_creates_entries_and_emits() {
        let mut table = DateAggregateTable::new();
        let marks = collect(&mut table, 10, 12, Category::Single, Delta::Increment);

        assert_eq!(
            marks,
            vec![(10, StyleBits::BOLD), (11, StyleBits::BOLD), (12, StyleBits::BOLD)]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(11).unwrap().n_single, 1);
    }

    #[test]
    fn test_unchanged_style_is_not_emitted() {
        let mut table = DateAggregateTable::new();
        collect(&mut table, 10, 10, Category::Single, Delta::Increment);

        assert!(collect(&mut table, 10, 10, Category::Single, Delta::Increment).is_empty());
        assert!(collect(&mut table, 10, 10, Category::Single, Delta::Decrement).is_empty());
        assert_eq!(table.lookup(10).unwrap().n_single, 1);
    }

    #[test]
    fn test_last_decrement_clears_and_drops() {
        let mut table = DateAggregateTable::new();
        collect(&mut table, 10, 11, Category::Transparent, Delta::Increment);

        let marks = collect(&mut table, 10, 11, Category::Transparent, Delta::Decrement);
        assert_eq!(marks, vec![(10, StyleBits::empty()), (11, StyleBits::empty())]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_decrement_never_underflows() {
        let mut table = DateAggregateTable::new();
        collect(&mut table, 10, 10, Category::Single, Delta::Increment);

        // Day 9 has no entry, day 10 has no transparent count
        assert!(collect(&mut table, 9, 9, Category::Single, Delta::Decrement).is_empty());
        assert!(collect(&mut table, 10, 10, Category::Transparent, Delta::Decrement).is_empty());

        assert_eq!(table.lookup(9), None);
        assert_eq!(
            table.lookup(10),
            Some(&DateInfo {
                n_transparent: 0,
                n_recurring: 0,
                n_single: 1
            })
        );
    }

    #[test]
    fn test_wide_decrement_over_absent_days_is_counted_once() {
        let mut table = DateAggregateTable::new();
        collect(&mut table, 5_000, 5_000, Category::Single, Delta::Increment);

        let mut marks = Vec::new();
        let mut emit = |j, s| marks.push((j, s));
        let skipped = table.adjust_range(1, 10_000, Category::Single, Delta::Decrement, false, &mut emit);

        assert_eq!(skipped, 9_999);
        assert_eq!(marks, vec![(5_000, StyleBits::empty())]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_rebuild_all_uses_current_preference() {
        let mut table = DateAggregateTable::new();
        collect(&mut table, 10, 11, Category::Recurring, Delta::Increment);

        let mut marks = Vec::new();
        table.rebuild_all(true, &mut |j, s| marks.push((j, s)));
        assert_eq!(marks, vec![(10, StyleBits::ITALIC), (11, StyleBits::ITALIC)]);
    }

    #[test]
    fn test_clamp_policy() {
        let visible = Some((90, 110));

        for policy in [ClampPolicy::Symmetric, ClampPolicy::IncrementOnly] {
            assert_eq!(policy.clamp(95, 115, Delta::Increment, visible), Some((95, 110)));
            assert_eq!(policy.clamp(111, 115, Delta::Increment, visible), None);
            assert_eq!(policy.clamp(95, 100, Delta::Increment, None), None);
        }

        assert_eq!(
            ClampPolicy::Symmetric.clamp(80, 115, Delta::Decrement, visible),
            Some((90, 110))
        );
        assert_eq!(
            ClampPolicy::IncrementOnly.clamp(80, 115, Delta::Decrement, visible),
            Some((80, 115))
        );
    }
}
