//! Continuous aggregation of component notifications into day marks.

use chrono_tz::Tz;

use crate::component::Component;
use crate::date_table::{ClampPolicy, DateAggregateTable, DateInfo, Delta};
use crate::object_index::{ClientId, ComponentId, ObjectIndex, ObjectInfo};
use crate::sink::SinkHandle;
use crate::source::Subscriber;

/// Receives component notifications for the visible range and keeps the
/// widget's day marks in step with them.
///
/// Driven by [`crate::TagCalendar`], which owns the subscription and
/// decides when the range changes.
pub struct DayTagger {
    objects: ObjectIndex,
    dates: DateAggregateTable,
    sink: SinkHandle,
    zone: Tz,
    range: Option<(u32, u32)>,
    recur_events_italic: bool,
    clamp_policy: ClampPolicy,
}

impl DayTagger {
    pub fn new(sink: SinkHandle, recur_events_italic: bool, clamp_policy: ClampPolicy) -> Self {
        DayTagger {
            objects: ObjectIndex::new(),
            dates: DateAggregateTable::new(),
            sink,
            zone: chrono_tz::UTC,
            range: None,
            recur_events_italic,
            clamp_policy,
        }
    }

    /// Drop all marks and contributions and start over on `range`.
    pub(crate) fn reset(&mut self, range: Option<(u32, u32)>, zone: Tz) {
        self.sink.clear_marks();
        self.objects.clear();
        self.dates.clear();
        self.range = range;
        self.zone = zone;
    }

    /// Drop all marks and contributions and forget the range.
    pub(crate) fn clear(&mut self) {
        let zone = self.zone;
        self.reset(None, zone);
    }

    /// Change the recurring-event preference, re-marking every day if it
    /// differs from the current one.
    pub(crate) fn set_recur_events_italic(&mut self, recur_events_italic: bool) {
        if self.recur_events_italic == recur_events_italic {
            return;
        }
        self.recur_events_italic = recur_events_italic;

        let sink = &self.sink;
        self.dates
            .rebuild_all(recur_events_italic, &mut |julian, style| sink.mark_julian(julian, style));
    }

    pub fn recur_events_italic(&self) -> bool {
        self.recur_events_italic
    }

    pub fn range(&self) -> Option<(u32, u32)> {
        self.range
    }

    pub fn date_info(&self, julian: u32) -> Option<&DateInfo> {
        self.dates.lookup(julian)
    }

    pub fn object_info(&self, id: &ComponentId) -> Option<&ObjectInfo> {
        self.objects.lookup(id)
    }

    pub fn tracked_components(&self) -> usize {
        self.objects.len()
    }

    pub fn tagged_days(&self) -> usize {
        self.dates.len()
    }

    /// "N events" for a tagged day, `None` for an untagged one.
    pub fn tooltip(&self, julian: u32) -> Option<String> {
        let total = self.dates.lookup(julian)?.total();
        Some(if total == 1 {
            "1 event".to_string()
        } else {
            format!("{total} events")
        })
    }

    fn update_by_info(&mut self, info: &ObjectInfo, delta: Delta) {
        let Some((start, end)) =
            self.clamp_policy
                .clamp(info.start_julian, info.end_julian, delta, self.range)
        else {
            return;
        };

        let sink = &self.sink;
        self.dates.adjust_range(
            start,
            end,
            info.category(),
            delta,
            self.recur_events_italic,
            &mut |julian, style| sink.mark_julian(julian, style),
        );
    }

    fn update_component_dates(&mut self, old: Option<&ObjectInfo>, new: Option<&ObjectInfo>) {
        if let Some(old) = old {
            self.update_by_info(old, Delta::Decrement);
        }
        if let Some(new) = new {
            self.update_by_info(new, Delta::Increment);
        }
    }
}

impl Subscriber for DayTagger {
    fn component_added(&mut self, client: &ClientId, component: &Component) {
        let Some(info) = ObjectInfo::from_component(client, component, self.zone) else {
            tracing::debug!(uid = %component.uid, "No valid day span, ignoring added component");
            return;
        };

        // A repeated add replaces the earlier contribution instead of
        // counting the component twice.
        let old = self.objects.lookup(&info.id).cloned();
        self.update_component_dates(old.as_ref(), Some(&info));
        self.objects.upsert(info);
    }

    fn component_modified(&mut self, client: &ClientId, component: &Component) {
        let id = ComponentId::of(client, component);
        let Some(old) = self.objects.lookup(&id).cloned() else {
            tracing::trace!(uid = %component.uid, "Modified component is not tracked");
            return;
        };

        match ObjectInfo::from_component(client, component, self.zone) {
            Some(new) if new.data_equal(&old) => {}
            Some(new) => {
                self.update_component_dates(Some(&old), Some(&new));
                self.objects.upsert(new);
            }
            None => {
                tracing::debug!(uid = %component.uid, "Modified component lost its day span");
                self.update_component_dates(Some(&old), None);
                self.objects.remove(&id);
            }
        }
    }

    fn component_removed(&mut self, client: &ClientId, uid: &str, rid: Option<&str>) {
        let id = ComponentId::new(client, uid, rid);
        let Some(old) = self.objects.remove(&id) else {
            tracing::trace!(uid, "Removed component is not tracked");
            return;
        };

        self.update_component_dates(Some(&old), None);
    }
}
