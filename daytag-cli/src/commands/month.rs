use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use daytag_core::TagConfig;
use owo_colors::OwoColorize;

use crate::commands::TaggedMonth;
use crate::render::{Render, pluralize};

pub fn run(config: &TagConfig, month: NaiveDate, calendar: Option<&str>, dir: Option<PathBuf>) -> Result<()> {
    let tagged = TaggedMonth::load(config, month, calendar, dir)?;
    let grid = tagged.grid.borrow();

    println!("{}", grid.render());
    println!();

    let days = tagged.calendar.tagged_days();
    let components = tagged.calendar.tracked_components();
    let summary = format!(
        "{} {} across {} {}",
        components,
        pluralize("event", components),
        days,
        pluralize("day", days)
    );
    println!("{}", summary.dimmed());

    Ok(())
}
