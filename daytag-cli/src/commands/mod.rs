pub mod month;
pub mod tag;
pub mod tooltip;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use daytag_core::store::calendars;
use daytag_core::{ClientId, ComponentStore, DataSource, SinkHandle, TagCalendar, TagConfig};

use crate::grid::MonthGrid;

/// First day of the month given as `YYYY-MM`, or of the current month.
pub fn parse_month(month: Option<&str>, zone: Tz) -> Result<NaiveDate> {
    match month {
        Some(month) => NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
            .with_context(|| format!("Invalid month '{month}', expected YYYY-MM")),
        None => {
            let today = Utc::now().with_timezone(&zone).date_naive();
            Ok(today.with_day(1).unwrap_or(today))
        }
    }
}

/// Load one calendar (by slug) or every calendar below `root`.
pub fn load_store(root: &Path, calendar: Option<&str>, zone: Tz) -> Result<ComponentStore> {
    let available = calendars(root)
        .with_context(|| format!("Could not read calendars in {}", root.display()))?;

    let mut store = ComponentStore::new(zone);
    match calendar {
        Some(slug) => {
            if !available.iter().any(|name| name == slug) {
                anyhow::bail!(
                    "Calendar '{}' not found. Available: {}",
                    slug,
                    available.join(", ")
                );
            }
            store.load_calendar_dir(&ClientId::new(slug), &root.join(slug))?;
        }
        None => {
            store.load_root(root)?;
        }
    }

    tracing::info!(components = store.len(), "Loaded calendars");
    Ok(store)
}

/// A month grid kept tagged by a [`TagCalendar`] subscribed to the
/// calendars below `dir` (or the configured calendar directory).
pub struct TaggedMonth {
    pub grid: Rc<RefCell<MonthGrid>>,
    pub calendar: TagCalendar,
    // Keeps the subscription's source alive
    _store: Rc<RefCell<ComponentStore>>,
}

impl TaggedMonth {
    pub fn load(
        config: &TagConfig,
        month: NaiveDate,
        calendar: Option<&str>,
        dir: Option<PathBuf>,
    ) -> Result<Self> {
        let zone = config.timezone()?;
        let root = dir.unwrap_or_else(|| config.calendar_path());
        let store = Rc::new(RefCell::new(load_store(&root, calendar, zone)?));

        let grid = Rc::new(RefCell::new(MonthGrid::new(month)));
        let mut tag_calendar = TagCalendar::new(SinkHandle::new(&grid), config);
        let source: Rc<RefCell<dyn DataSource>> = store.clone();
        tag_calendar.subscribe(&source);

        Ok(TaggedMonth {
            grid,
            calendar: tag_calendar,
            _store: store,
        })
    }
}
