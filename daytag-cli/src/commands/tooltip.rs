use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use daytag_core::TagConfig;
use owo_colors::OwoColorize;

use crate::commands::TaggedMonth;

pub fn run(config: &TagConfig, date: &str, calendar: Option<&str>, dir: Option<PathBuf>) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date}', expected YYYY-MM-DD"))?;
    let month = date.with_day(1).unwrap_or(date);

    let tagged = TaggedMonth::load(config, month, calendar, dir)?;

    // Ask the way a widget would: by grid position
    let position = tagged.grid.borrow().position_of(date);
    let tooltip = position.and_then(|(x, y)| tagged.calendar.query_tooltip(x, y));

    match tooltip {
        Some(text) => println!("{}: {}", date.format("%a %b %-d"), text.bold()),
        None => println!("{}: {}", date.format("%a %b %-d"), "No events".dimmed()),
    }

    Ok(())
}
