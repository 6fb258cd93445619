mod commands;
mod grid;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use daytag_core::TagConfig;

#[derive(Parser)]
#[command(name = "daytag")]
#[command(about = "Show which days of a month have calendar events")]
struct Cli {
    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a month with every day that has events marked
    Month {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Only use this calendar (by slug)
        #[arg(short, long)]
        calendar: Option<String>,

        /// Calendar directory (defaults to calendar_dir from the config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Show recurring events in italic
        #[arg(long)]
        recur_italic: bool,
    },
    /// Mark the occurrences of the event in one .ics file
    Tag {
        file: PathBuf,

        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Leave free (transparent) occurrences unmarked
        #[arg(long)]
        skip_transparent: bool,

        /// Show recurring events in italic
        #[arg(long)]
        recur_italic: bool,
    },
    /// Print the event count of one day (YYYY-MM-DD)
    Tooltip {
        date: String,

        /// Only use this calendar (by slug)
        #[arg(short, long)]
        calendar: Option<String>,

        /// Calendar directory (defaults to calendar_dir from the config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = TagConfig::load()?;

    match cli.command {
        Commands::Month {
            month,
            calendar,
            dir,
            recur_italic,
        } => {
            config.recur_events_italic |= recur_italic;
            let month = commands::parse_month(month.as_deref(), config.timezone()?)?;
            commands::month::run(&config, month, calendar.as_deref(), dir)
        }
        Commands::Tag {
            file,
            month,
            skip_transparent,
            recur_italic,
        } => {
            config.recur_events_italic |= recur_italic;
            let month = commands::parse_month(month.as_deref(), config.timezone()?)?;
            commands::tag::run(&config, &file, month, skip_transparent)
        }
        Commands::Tooltip { date, calendar, dir } => {
            commands::tooltip::run(&config, &date, calendar.as_deref(), dir)
        }
    }
}
