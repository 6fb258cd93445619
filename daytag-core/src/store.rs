//! In-memory component store backed by directories of .ics files.
//!
//! Layout on disk, one client per calendar:
//!
//! ```text
//! ~/calendar/
//!   home/
//!     2025-03-03T0900__standup.ics
//!   work/
//!     ...
//! ```
//!
//! Subscribers see occurrences, not masters: recurring components are
//! expanded locally for each subscription's window, and a stored override
//! (RECURRENCE-ID) replaces the occurrence it detaches.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Weak;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::component::Component;
use crate::error::{DayTagError, DayTagResult};
use crate::ics::parse_components;
use crate::object_index::{ClientId, ComponentId};
use crate::recurrence::RRuleExpander;
use crate::source::{DataSource, Subscriber, SubscriptionId};

struct Subscription {
    id: SubscriptionId,
    subscriber: Weak<RefCell<dyn Subscriber>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

type Instances = BTreeMap<ComponentId, Component>;

pub struct ComponentStore {
    zone: Tz,
    components: BTreeMap<ComponentId, Component>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
    expander: RRuleExpander,
}

impl ComponentStore {
    pub fn new(zone: Tz) -> Self {
        ComponentStore {
            zone,
            components: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_id: 1,
            expander: RRuleExpander::default(),
        }
    }

    pub fn with_expander(mut self, expander: RRuleExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Insert or replace a component, notifying subscribers of every
    /// occurrence that appeared, changed or vanished.
    pub fn put(&mut self, client: &ClientId, component: Component) {
        let id = ComponentId::of(client, &component);
        let uid = component.uid.clone();
        self.change(client, &uid, |components| {
            components.insert(id, component);
        });
    }

    /// Remove the component stored under `(client, uid, rid)`. Removing a
    /// master leaves its overrides in place.
    pub fn remove(&mut self, client: &ClientId, uid: &str, rid: Option<&str>) -> Option<Component> {
        let id = ComponentId::new(client, uid, rid);
        let mut removed = None;
        self.change(client, uid, |components| {
            removed = components.remove(&id);
        });
        removed
    }

    pub fn get(&self, client: &ClientId, uid: &str, rid: Option<&str>) -> Option<&Component> {
        self.components.get(&ComponentId::new(client, uid, rid))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Live subscriptions, dropping those whose subscriber is gone.
    pub fn subscription_count(&mut self) -> usize {
        self.prune();
        self.subscriptions.len()
    }

    /// Load every .ics file of `dir` as components of `client`. Files that
    /// fail to parse are skipped. Returns the number of components loaded.
    pub fn load_calendar_dir(&mut self, client: &ClientId, dir: &Path) -> DayTagResult<usize> {
        let entries = std::fs::read_dir(dir)?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let components = match std::fs::read_to_string(&path)
                .map_err(DayTagError::from)
                .and_then(|content| parse_components(&content))
            {
                Ok(components) => components,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable file: {e}");
                    continue;
                }
            };
            for component in components {
                self.put(client, component);
                loaded += 1;
            }
        }

        tracing::debug!(client = %client, dir = %dir.display(), loaded, "Loaded calendar");
        Ok(loaded)
    }

    /// Load every calendar below `root`, one client per subdirectory.
    pub fn load_root(&mut self, root: &Path) -> DayTagResult<usize> {
        let mut loaded = 0;
        for name in calendars(root)? {
            loaded += self.load_calendar_dir(&ClientId::new(&name), &root.join(&name))?;
        }
        Ok(loaded)
    }

    /// Apply `mutate` and report the resulting occurrence changes of
    /// `(client, uid)` to every subscription.
    fn change(&mut self, client: &ClientId, uid: &str, mutate: impl FnOnce(&mut BTreeMap<ComponentId, Component>)) {
        self.prune();

        let before: Vec<Instances> = self
            .subscriptions
            .iter()
            .map(|s| self.instances_of(client, uid, s.start, s.end))
            .collect();

        mutate(&mut self.components);

        for (subscription, before) in self.subscriptions.iter().zip(before) {
            let after = self.instances_of(client, uid, subscription.start, subscription.end);
            if before == after {
                continue;
            }
            notify(&subscription.subscriber, |subscriber| {
                subscriber.freeze();
                report_diff(subscriber, &before, &after);
                subscriber.thaw();
            });
        }
    }

    fn prune(&mut self) {
        self.subscriptions.retain(|s| s.subscriber.strong_count() > 0);
    }

    /// Occurrences in `[start, end)` of every component stored for
    /// `(client, uid)`.
    fn instances_of(&self, client: &ClientId, uid: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Instances {
        let first = ComponentId::new(client, uid, None);
        let group: Vec<(&ComponentId, &Component)> = self
            .components
            .range(first..)
            .take_while(|(id, _)| id.client == *client && id.uid == uid)
            .collect();
        self.expand_group(&group, start, end)
    }

    /// Occurrences in `[start, end)` of everything in the store.
    fn all_instances(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Instances {
        let mut instances = Instances::new();
        let mut group: Vec<(&ComponentId, &Component)> = Vec::new();

        for entry in &self.components {
            let same_uid = group
                .last()
                .is_none_or(|(last, _)| last.client == entry.0.client && last.uid == entry.0.uid);
            if !same_uid {
                instances.append(&mut self.expand_group(&group, start, end));
                group.clear();
            }
            group.push(entry);
        }
        instances.append(&mut self.expand_group(&group, start, end));
        instances
    }

    /// Expand one UID's master and overrides. Overrides win over the
    /// generated occurrence with the same recurrence-id.
    fn expand_group(&self, group: &[(&ComponentId, &Component)], start: DateTime<Utc>, end: DateTime<Utc>) -> Instances {
        let overridden: BTreeSet<&ComponentId> = group
            .iter()
            .filter(|(id, _)| id.rid.is_some())
            .map(|(id, _)| *id)
            .collect();

        let mut instances = Instances::new();
        for (id, component) in group {
            if component.recurrence.is_none() {
                if component.overlaps(start, end, self.zone) {
                    instances.insert((*id).clone(), (*component).clone());
                }
                continue;
            }

            match self.expander.expand(component, start, end, self.zone) {
                Ok(expanded) => {
                    for instance in expanded {
                        let instance_id = ComponentId::of(&id.client, &instance);
                        if !overridden.contains(&instance_id) {
                            instances.insert(instance_id, instance);
                        }
                    }
                }
                Err(e) => tracing::warn!(uid = %component.uid, "Not expanding component: {e}"),
            }
        }
        instances
    }
}

impl DataSource for ComponentStore {
    fn timezone(&self) -> Tz {
        self.zone
    }

    fn subscribe(
        &mut self,
        subscriber: Weak<RefCell<dyn Subscriber>>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SubscriptionId {
        self.prune();

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let instances = self.all_instances(start, end);
        tracing::debug!(?id, %start, %end, instances = instances.len(), "Replaying components");
        notify(&subscriber, |subscriber| {
            subscriber.freeze();
            for (id, instance) in &instances {
                subscriber.component_added(&id.client, instance);
            }
            subscriber.thaw();
        });

        self.subscriptions.push(Subscription {
            id,
            subscriber,
            start,
            end,
        });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != id);
    }
}

/// Names of the calendar directories below `root`, sorted.
pub fn calendars(root: &Path) -> DayTagResult<Vec<String>> {
    let entries = std::fs::read_dir(root)?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();

    names.sort();
    Ok(names)
}

fn notify(subscriber: &Weak<RefCell<dyn Subscriber>>, f: impl FnOnce(&mut dyn Subscriber)) {
    let Some(subscriber) = subscriber.upgrade() else {
        return;
    };
    match subscriber.try_borrow_mut() {
        Ok(mut subscriber) => f(&mut *subscriber),
        Err(_) => tracing::warn!("Subscriber busy, notification dropped"),
    };
}

fn report_diff(subscriber: &mut dyn Subscriber, before: &Instances, after: &Instances) {
    for (id, old) in before {
        match after.get(id) {
            None => subscriber.component_removed(&id.client, &old.uid, id.rid.as_deref()),
            Some(new) if new != old => subscriber.component_modified(&id.client, new),
            Some(_) => {}
        }
    }
    for (id, new) in after {
        if !before.contains_key(id) {
            subscriber.component_added(&id.client, new);
        }
    }
}
