use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use daytag_core::ics::parse_components;
use daytag_core::{Component, InstanceTagger, RRuleExpander, SinkHandle, TagConfig, TagOptions};
use owo_colors::OwoColorize;

use crate::grid::MonthGrid;
use crate::render::{Render, pluralize};

pub fn run(config: &TagConfig, file: &Path, month: NaiveDate, skip_transparent: bool) -> Result<()> {
    let zone = config.timezone()?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let component = first_component(parse_components(&content)?)
        .with_context(|| format!("No events in {}", file.display()))?;

    let grid = Rc::new(RefCell::new(MonthGrid::new(month)));
    let options = TagOptions {
        clear_first: true,
        skip_transparent,
        recur_events_italic: config.recur_events_italic,
    };
    let tagger = InstanceTagger::new(SinkHandle::new(&grid), zone, options);
    let marked = tagger.tag(&component, &RRuleExpander::default());

    println!("{}", grid.borrow().render());
    println!();
    let summary = format!(
        "{}: {} {} tagged",
        component,
        marked,
        pluralize("occurrence", marked)
    );
    println!("{}", summary.dimmed());

    Ok(())
}

/// The master of the file if there is one, else its first component.
fn first_component(components: Vec<Component>) -> Option<Component> {
    let master = components.iter().position(|c| c.recurrence_id.is_none());
    let index = master.unwrap_or(0);
    components.into_iter().nth(index)
}
