use std::env;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const RECENT_CALENDARS_FILE: &str = "recent_calendars.txt";
const MAX_RECENT_CALENDARS: usize = 50;
const APP_DIR: &str = "weekly_ledger";

pub const CALENDAR_ENV: &str = "WEEKLY_LEDGER_CALENDAR";
pub const STATE_DIR_ENV: &str = "WEEKLY_LEDGER_STATE_DIR";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error(
		"no calendar selected: pass --calendar <path>, set WEEKLY_LEDGER_CALENDAR, \
		 or pick one from `calendars`"
	)]
	NotSelected,
	#[error("failed to access recent calendars list: {0}")]
	Io(#[from] std::io::Error),
}

/// Most-recently-used calendar snapshots, newest first, one path per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCalendars {
	path: PathBuf,
}

impl RecentCalendars {
	pub fn in_state_dir() -> Self {
		Self::at(state_dir().join(RECENT_CALENDARS_FILE))
	}

	pub fn at(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn list(&self, limit: usize) -> Result<Vec<PathBuf>, SourceError> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(err.into()),
		};

		Ok(raw
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.take(limit)
			.map(PathBuf::from)
			.collect())
	}

	pub fn latest(&self) -> Result<Option<PathBuf>, SourceError> {
		Ok(self.list(1)?.into_iter().next())
	}

	/// Moves `calendar` to the front, dropping an older copy of it.
	pub fn remember(&self, calendar: &Path) -> Result<(), SourceError> {
		let calendar = to_absolute(calendar.to_path_buf());
		let mut entries = self.list(MAX_RECENT_CALENDARS)?;
		entries.retain(|entry| entry != &calendar);
		entries.insert(0, calendar);
		entries.truncate(MAX_RECENT_CALENDARS);

		if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		let mut file = fs::File::create(&self.path)?;
		for entry in &entries {
			writeln!(file, "{}", entry.display())?;
		}
		debug!(path = %self.path.display(), count = entries.len(), "stored recent calendars");
		Ok(())
	}
}

/// Picks the snapshot to read: explicit flag, then the environment, then the
/// most recently used file.
pub fn resolve_calendar_path(
	cli_path: Option<PathBuf>,
	recent: &RecentCalendars,
) -> Result<PathBuf, SourceError> {
	if let Some(path) = cli_path {
		return Ok(to_absolute(path));
	}

	let from_env = env::var_os(CALENDAR_ENV).filter(|value| !value.is_empty());
	if let Some(path) = from_env.map(PathBuf::from) {
		debug!(path = %path.display(), "calendar taken from environment");
		return Ok(to_absolute(path));
	}

	match recent.latest() {
		Ok(Some(path)) => Ok(path),
		Ok(None) => Err(SourceError::NotSelected),
		Err(err) => {
			warn!(error = %err, "could not read recent calendars");
			Err(SourceError::NotSelected)
		}
	}
}

/// Directory for config and the recent list. `WEEKLY_LEDGER_STATE_DIR` wins,
/// then the platform state location.
pub fn state_dir() -> PathBuf {
	if let Some(dir) = env::var_os(STATE_DIR_ENV).filter(|value| !value.is_empty()) {
		return PathBuf::from(dir);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(dir) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(dir).join(APP_DIR);
		}
	}

	env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")))
		.map(|base| base.join(APP_DIR))
		.unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR}")))
}

/// Canonical form for files that exist, cwd-joined form otherwise.
fn to_absolute(path: PathBuf) -> PathBuf {
	fs::canonicalize(&path)
		.or_else(|_| std::path::absolute(&path))
		.unwrap_or(path)
}
