use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use chrono::{DateTime, TimeZone};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::week::{WeekIndex, current_week_index};

#[derive(Debug, Parser)]
#[command(
	name = "weekly-ledger",
	about = "Weekly time breakdown per calendar category"
)]
pub struct Cli {
	/// Calendar snapshot to read.
	#[arg(long, global = true)]
	pub calendar: Option<PathBuf>,
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,
	/// Count only the part of each event that falls inside the week.
	#[arg(long, global = true)]
	pub clip: bool,
	/// Fixed UTC offset defining local midnight, e.g. 120 or -300.
	#[arg(long, global = true, allow_negative_numbers = true)]
	pub utc_offset_minutes: Option<i32>,
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub quiet: u8,
	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	#[command(flatten)]
	Report(ReportCommand),
	/// Recently used calendar snapshots.
	Calendars {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

/// Commands that read a calendar snapshot.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
	/// Per-category totals for one week.
	Week(WeekArgs),
	/// Events of one category inside a week.
	Events {
		#[arg(long)]
		category: String,
		#[command(flatten)]
		week: WeekArgs,
	},
	/// Weeks reachable by stepping back from the current one.
	History {
		#[arg(long, default_value_t = 12)]
		limit: usize,
	},
}

impl Default for ReportCommand {
	fn default() -> Self {
		Self::Week(WeekArgs::default())
	}
}

#[derive(Debug, Clone, Default, Args)]
pub struct WeekArgs {
	/// ISO week number, relative to the current ISO year.
	#[arg(long, allow_negative_numbers = true, conflicts_with = "back")]
	pub week: Option<WeekIndex>,
	/// Number of weeks before the current one.
	#[arg(long)]
	pub back: Option<u32>,
}

impl WeekArgs {
	/// Selected week index; weeks after the current one are refused.
	pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> anyhow::Result<WeekIndex> {
		let current = current_week_index(now);
		let week = match (self.week, self.back) {
			(Some(week), _) => week,
			(None, Some(back)) => current - WeekIndex::from(back),
			(None, None) => current,
		};

		if week > current {
			bail!("week {week} is in the future (current week is {current})");
		}
		Ok(week)
	}
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
	let default_level = if quiet >= 2 {
		"error"
	} else if quiet == 1 {
		"warn"
	} else if verbose >= 3 {
		"trace"
	} else if verbose == 2 {
		"debug"
	} else if verbose == 1 {
		"info"
	} else {
		"warn"
	};

	let env_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(default_level))
		.map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

	let init_result = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.try_init();

	if let Err(err) = init_result {
		debug!(error = %err, "tracing subscriber already set, continuing");
	}

	Ok(())
}
