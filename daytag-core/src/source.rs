//! The data source that feeds components to subscribers.

use std::cell::RefCell;
use std::rc::Weak;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::component::Component;
use crate::object_index::ClientId;

/// Receiver of component change notifications.
///
/// Notifications arrive on the thread that owns the source, one at a
/// time, and must not call back into the source.
pub trait Subscriber {
    fn component_added(&mut self, client: &ClientId, component: &Component);
    fn component_modified(&mut self, client: &ClientId, component: &Component);
    fn component_removed(&mut self, client: &ClientId, uid: &str, rid: Option<&str>);

    /// Start of a batch of notifications.
    fn freeze(&mut self) {}

    /// End of a batch of notifications.
    fn thaw(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Provider of components within a time window.
pub trait DataSource {
    /// Display zone used for all day computations.
    fn timezone(&self) -> Tz;

    /// Register `subscriber` for `[start, end)`. The source reports every
    /// component already in the window through `component_added`, either
    /// before returning or later, and then keeps the subscriber informed
    /// until [`DataSource::unsubscribe`].
    fn subscribe(
        &mut self,
        subscriber: Weak<RefCell<dyn Subscriber>>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);
}
