use std::fmt::Display;

use anyhow::{Context, bail};
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::Parser;
use tracing::{info, warn};

use weekly_ledger::aggregate::{AggregationOptions, navigable_history, weekly_summary};
use weekly_ledger::cli::{Cli, Command, ReportCommand, init_tracing};
use weekly_ledger::config::Settings;
use weekly_ledger::domain::{Category, find_category};
use weekly_ledger::report::{render_events, render_history, render_week};
use weekly_ledger::sources::{RecentCalendars, resolve_calendar_path};
use weekly_ledger::storage::load_calendar;
use weekly_ledger::week::window_for_week;

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}

fn run() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose, cli.quiet)?;

	let recent = RecentCalendars::in_state_dir();
	let command = match cli.command {
		Some(Command::Calendars { limit }) => return print_recent_calendars(&recent, limit),
		Some(Command::Report(command)) => command,
		None => ReportCommand::default(),
	};

	let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
	settings.apply_overrides(cli.clip, cli.utc_offset_minutes);
	let options = settings.aggregation_options();

	let calendar_path = resolve_calendar_path(cli.calendar, &recent)?;
	let categories = load_calendar(&calendar_path)
		.with_context(|| format!("failed to load calendar {}", calendar_path.display()))?;
	if let Err(err) = recent.remember(&calendar_path) {
		warn!(error = %err, "failed to store recent calendar");
	}

	match settings.fixed_offset()? {
		Some(offset) => execute(command, &categories, Utc::now().with_timezone(&offset), options),
		None => execute(command, &categories, Local::now(), options),
	}
}

fn execute<Tz>(
	command: ReportCommand,
	categories: &[Category],
	now: DateTime<Tz>,
	options: AggregationOptions,
) -> anyhow::Result<()>
where
	Tz: TimeZone,
	Tz::Offset: Display,
{
	let tz = now.timezone();
	info!(clip_to_window = options.clip_to_window, "running command");

	match command {
		ReportCommand::Week(args) => {
			let week = args.resolve(&now)?;
			let summary = weekly_summary(categories, week, &now, options);
			println!("{}", render_week(&summary, &tz));
		}
		ReportCommand::Events { category, week } => {
			let week = week.resolve(&now)?;
			let Some(category) = find_category(categories, &category) else {
				bail!("category not found: {category}");
			};
			let window = window_for_week(week, &now);
			println!("{}", render_events(category, &window, &tz));
		}
		ReportCommand::History { limit } => {
			let history = navigable_history(categories, &now, options, limit);
			println!("{}", render_history(&history, &tz));
		}
	}

	Ok(())
}

fn print_recent_calendars(recent: &RecentCalendars, limit: usize) -> anyhow::Result<()> {
	let rows = recent.list(limit)?;
	if rows.is_empty() {
		println!("no recent calendars");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}
