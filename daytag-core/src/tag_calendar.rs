//! Subscription controller: ties a [`DayTagger`] to a data source over the
//! widget's visible range.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;

use crate::config::TagConfig;
use crate::date_table::DateInfo;
use crate::engine::DayTagger;
use crate::julian::date_to_julian;
use crate::sink::SinkHandle;
use crate::source::{DataSource, Subscriber, SubscriptionId};

enum Subscription {
    Unsubscribed,
    Subscribed {
        source: Weak<RefCell<dyn DataSource>>,
        id: SubscriptionId,
        range: (u32, u32),
    },
}

/// Tags the days of a calendar widget with the components of a data
/// source that fall into the widget's visible range.
///
/// The widget should call [`TagCalendar::on_visible_range_changed`]
/// whenever it scrolls; the data source drives everything else.
pub struct TagCalendar {
    tagger: Rc<RefCell<DayTagger>>,
    sink: SinkHandle,
    subscription: Subscription,
}

impl TagCalendar {
    pub fn new(sink: SinkHandle, config: &TagConfig) -> Self {
        let tagger = DayTagger::new(sink.clone(), config.recur_events_italic, config.clamp_policy);
        TagCalendar {
            tagger: Rc::new(RefCell::new(tagger)),
            sink,
            subscription: Subscription::Unsubscribed,
        }
    }

    /// Subscribe to `source` for the widget's current range, replacing any
    /// earlier subscription. Marks and counters start from scratch.
    pub fn subscribe(&mut self, source: &Rc<RefCell<dyn DataSource>>) {
        self.release();

        let zone = source.borrow().timezone();
        let Some(visible) = self.sink.visible_range() else {
            tracing::debug!("Calendar shows no dates, not subscribing");
            self.tagger.borrow_mut().reset(None, zone);
            return;
        };
        let Some((start, end)) = visible.instants(zone) else {
            tracing::warn!(first = %visible.first, last = %visible.last, "Visible range not representable");
            self.tagger.borrow_mut().reset(None, zone);
            return;
        };

        let range = visible.to_julian();
        self.tagger.borrow_mut().reset(Some(range), zone);

        let subscriber = Rc::downgrade(&self.tagger) as Weak<RefCell<dyn Subscriber>>;
        let id = source.borrow_mut().subscribe(subscriber, start, end);

        tracing::info!(?id, first = %visible.first, last = %visible.last, "Subscribed");
        self.subscription = Subscription::Subscribed {
            source: Rc::downgrade(source),
            id,
            range,
        };
    }

    /// Follow the widget to its new range. Does nothing while unsubscribed
    /// or when the range did not actually change.
    pub fn on_visible_range_changed(&mut self) {
        let (source, range) = match &self.subscription {
            Subscription::Subscribed { source, range, .. } => (source.clone(), *range),
            Subscription::Unsubscribed => return,
        };

        let Some(source) = source.upgrade() else {
            tracing::debug!("Data source gone, unsubscribing");
            self.unsubscribe();
            return;
        };

        match self.sink.visible_range() {
            Some(visible) if visible.to_julian() == range => {
                tracing::trace!("Visible range unchanged");
            }
            Some(_) => self.subscribe(&source),
            None => self.unsubscribe(),
        }
    }

    /// Stop receiving notifications and clear every mark.
    pub fn unsubscribe(&mut self) {
        self.release();
        self.tagger.borrow_mut().clear();
    }

    /// Detach from the data source without touching marks or counters.
    fn release(&mut self) {
        let previous = std::mem::replace(&mut self.subscription, Subscription::Unsubscribed);
        let Subscription::Subscribed { source, id, .. } = previous else {
            return;
        };

        match source.upgrade() {
            Some(source) => match source.try_borrow_mut() {
                Ok(mut source) => {
                    source.unsubscribe(id);
                    tracing::info!(?id, "Unsubscribed");
                }
                Err(_) => tracing::warn!(?id, "Data source busy, subscription left behind"),
            },
            None => tracing::debug!(?id, "Data source already gone"),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self.subscription, Subscription::Subscribed { .. })
    }

    /// Current visible range as julian days.
    pub fn range(&self) -> Option<(u32, u32)> {
        self.tagger.borrow().range()
    }

    pub fn recur_events_italic(&self) -> bool {
        self.tagger.borrow().recur_events_italic()
    }

    /// Switch recurring events between bold and italic, re-marking every
    /// tagged day.
    pub fn set_recur_events_italic(&mut self, recur_events_italic: bool) {
        self.tagger
            .borrow_mut()
            .set_recur_events_italic(recur_events_italic);
    }

    /// Tooltip for the widget position `(x, y)`: the number of events on
    /// that day, or `None` if the day is not tagged.
    pub fn query_tooltip(&self, x: i32, y: i32) -> Option<String> {
        let date = self.sink.date_at(x, y)?;
        self.tooltip_for_date(date)
    }

    pub fn tooltip_for_date(&self, date: NaiveDate) -> Option<String> {
        self.tagger.borrow().tooltip(date_to_julian(date))
    }

    pub fn date_info(&self, date: NaiveDate) -> Option<DateInfo> {
        self.tagger.borrow().date_info(date_to_julian(date)).copied()
    }

    pub fn tracked_components(&self) -> usize {
        self.tagger.borrow().tracked_components()
    }

    pub fn tagged_days(&self) -> usize {
        self.tagger.borrow().tagged_days()
    }
}

impl Drop for TagCalendar {
    fn drop(&mut self) {
        self.release();
    }
}
