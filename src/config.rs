use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::Deserialize;
use tracing::{debug, info};

use crate::aggregate::AggregationOptions;
use crate::sources::state_dir;

pub const CONFIG_ENV: &str = "WEEKLY_LEDGER_CONFIG";
const CONFIG_FILE: &str = "config.toml";
const MAX_OFFSET_MINUTES: u32 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("utc offset out of range: {0} minutes")]
    InvalidOffset(i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Count only the portion of straddling events that lies inside the week.
    pub clip_to_window: bool,
    /// Fixed offset that defines local midnight. Unset means the system zone.
    pub utc_offset_minutes: Option<i32>,
}

impl Settings {
    /// Loads settings from `--config`, then the environment, then the state
    /// directory. Only the implicit location may be absent.
    #[tracing::instrument(skip_all)]
    pub fn load(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path_override {
            Some(path) => (path.to_path_buf(), true),
            None => match env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
                Some(value) => (PathBuf::from(value), true),
                None => (state_dir().join(CONFIG_FILE), false),
            },
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound && !explicit => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let settings = Self::from_toml(&raw, &path)?;
        info!(path = %path.display(), ?settings, "loaded config");
        Ok(settings)
    }

    pub fn from_toml(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.fixed_offset()?;
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, clip_to_window: bool, utc_offset_minutes: Option<i32>) {
        if clip_to_window {
            self.clip_to_window = true;
        }
        if utc_offset_minutes.is_some() {
            self.utc_offset_minutes = utc_offset_minutes;
        }
    }

    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            clip_to_window: self.clip_to_window,
        }
    }

    pub fn fixed_offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        let Some(minutes) = self.utc_offset_minutes else {
            return Ok(None);
        };
        if minutes.unsigned_abs() >= MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidOffset(minutes));
        }
        FixedOffset::east_opt(minutes * 60)
            .map(Some)
            .ok_or(ConfigError::InvalidOffset(minutes))
    }
}
