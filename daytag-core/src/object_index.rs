//! Per-component contribution cache, keyed by component identity.

use std::collections::HashMap;
use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::julian::julian_span;

/// Opaque handle of the calendar (data source client) owning a component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(name: &str) -> Self {
        ClientId(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one component contribution: client + UID + recurrence-id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId {
    pub client: ClientId,
    pub uid: String,
    /// Canonical recurrence-id text, see [`crate::EventTime::to_ics_string`]
    pub rid: Option<String>,
}

impl ComponentId {
    pub fn new(client: &ClientId, uid: &str, rid: Option<&str>) -> Self {
        ComponentId {
            client: client.clone(),
            uid: uid.to_string(),
            rid: rid.map(str::to_string),
        }
    }

    pub fn of(client: &ClientId, component: &Component) -> Self {
        ComponentId {
            client: client.clone(),
            uid: component.uid.clone(),
            rid: component.rid(),
        }
    }
}

/// Which day counter a component feeds. Each component feeds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Transparent,
    Recurring,
    Single,
}

/// Cached summary of what one component contributes to the date table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub id: ComponentId,
    pub is_transparent: bool,
    pub is_recurring: bool,
    /// First day covered, inclusive
    pub start_julian: u32,
    /// Last day covered, inclusive
    pub end_julian: u32,
}

impl ObjectInfo {
    /// Summarise `component` in the display `zone`. Returns `None` when no
    /// valid day span can be computed.
    pub fn from_component(client: &ClientId, component: &Component, zone: Tz) -> Option<Self> {
        let (start_julian, end_julian) =
            julian_span(component.start.as_ref(), component.end.as_ref(), zone)?;

        Some(ObjectInfo {
            id: ComponentId::of(client, component),
            is_transparent: component.is_transparent(),
            is_recurring: component.is_recurring(),
            start_julian,
            end_julian,
        })
    }

    /// Transparency wins over recurrence.
    pub fn category(&self) -> Category {
        if self.is_transparent {
            Category::Transparent
        } else if self.is_recurring {
            Category::Recurring
        } else {
            Category::Single
        }
    }

    /// Compare contributions, ignoring identity.
    pub fn data_equal(&self, other: &ObjectInfo) -> bool {
        self.is_transparent == other.is_transparent
            && self.is_recurring == other.is_recurring
            && self.start_julian == other.start_julian
            && self.end_julian == other.end_julian
    }
}

/// Live contributions by identity.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    objects: HashMap<ComponentId, ObjectInfo>,
}

impl ObjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the entry previously stored under the
    /// same identity.
    pub fn upsert(&mut self, info: ObjectInfo) -> Option<ObjectInfo> {
        self.objects.insert(info.id.clone(), info)
    }

    pub fn lookup(&self, id: &ComponentId) -> Option<&ObjectInfo> {
        self.objects.get(id)
    }

    pub fn remove(&mut self, id: &ComponentId) -> Option<ObjectInfo> {
        self.objects.remove(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
