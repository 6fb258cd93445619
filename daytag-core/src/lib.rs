//! Calendar day tagging.
//!
//! Turns a stream of calendar components into per-day marks on a
//! month-grid widget: a day is bold when something busy happens on it and
//! italic when it only holds free (transparent) or, optionally, recurring
//! events.
//!
//! - [`TagCalendar`] keeps a widget in step with a [`DataSource`] over the
//!   widget's visible range, counting contributions per day.
//! - [`InstanceTagger`] marks the occurrences of a single component once.
//! - [`ComponentStore`] is a [`DataSource`] over directories of .ics files.

pub mod component;
pub mod config;
pub mod date_table;
pub mod engine;
pub mod error;
pub mod ics;
pub mod julian;
pub mod object_index;
pub mod oneshot;
pub mod recurrence;
pub mod sink;
pub mod source;
pub mod store;
pub mod style;
pub mod tag_calendar;

pub use component::{Component, EventTime, Recurrence, Transparency};
pub use config::TagConfig;
pub use date_table::{ClampPolicy, DateInfo};
pub use engine::DayTagger;
pub use error::{DayTagError, DayTagResult};
pub use object_index::{ClientId, ComponentId};
pub use oneshot::{InstanceTagger, TagOptions};
pub use recurrence::{InstanceGenerator, RRuleExpander, RemoteInstanceGenerator};
pub use sink::{CalendarDay, CalendarSink, SinkHandle, VisibleRange};
pub use source::{DataSource, Subscriber, SubscriptionId};
pub use store::ComponentStore;
pub use style::StyleBits;
pub use tag_calendar::TagCalendar;
