//! User configuration at ~/.config/daytag/config.toml
//!
//! Every key can be overridden from the environment with a `DAYTAG_`
//! prefix, e.g. `DAYTAG_RECUR_EVENTS_ITALIC=true`.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date_table::ClampPolicy;
use crate::error::{DayTagError, DayTagResult};

static DEFAULT_CALENDAR_DIR: &str = "~/calendar";

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_DIR)
}

fn is_default_calendar_dir(p: &PathBuf) -> bool {
    *p == default_calendar_dir()
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    /// Root holding one subdirectory of .ics files per calendar.
    #[serde(
        default = "default_calendar_dir",
        skip_serializing_if = "is_default_calendar_dir"
    )]
    pub calendar_dir: PathBuf,

    /// IANA zone used to place events on days. Defaults to the system zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Show recurring events in italic instead of bold.
    #[serde(default, skip_serializing_if = "is_false")]
    pub recur_events_italic: bool,

    #[serde(default)]
    pub clamp_policy: ClampPolicy,
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            calendar_dir: default_calendar_dir(),
            timezone: None,
            recur_events_italic: false,
            clamp_policy: ClampPolicy::default(),
        }
    }
}

impl TagConfig {
    pub fn config_path() -> DayTagResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DayTagError::Config("Could not determine config directory".into()))?
            .join("daytag");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user config, writing a commented default file first if
    /// none exists yet.
    pub fn load() -> DayTagResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (optional) layered under `DAYTAG_*` variables.
    pub fn load_from(path: &Path) -> DayTagResult<Self> {
        let config: TagConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("DAYTAG"))
            .build()
            .map_err(|e| DayTagError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DayTagError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DayTagResult<()> {
        let contents = format!(
            "\
# daytag configuration

# Where your calendars live (one subdirectory of .ics files per calendar):
# calendar_dir = \"{}\"

# Timezone used to place events on days (defaults to the system zone):
# timezone = \"Europe/Berlin\"

# Show recurring events in italic instead of bold:
# recur_events_italic = true

# How decrements treat days outside the visible range
# (\"symmetric\" or \"increment-only\"):
# clamp_policy = \"symmetric\"
",
            DEFAULT_CALENDAR_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DayTagError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DayTagError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Write the non-default settings to `path`.
    pub fn save(&self, path: &Path) -> DayTagResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DayTagError::Config(format!("Failed to serialize config: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured zone, else the system zone, else UTC.
    pub fn timezone(&self) -> DayTagResult<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|_| DayTagError::UnknownTimezone(name.clone()));
        }

        let system = iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok());
        Ok(system.unwrap_or(chrono_tz::UTC))
    }

    /// `calendar_dir` with `~` expanded.
    pub fn calendar_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.calendar_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}
