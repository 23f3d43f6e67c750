use std::fmt::Display;

use chrono::{Duration, TimeZone};

use crate::aggregate::{WeeklySummary, events_in_window};
use crate::domain::{Category, format_duration};
use crate::week::Window;

pub fn render_week<Tz>(summary: &WeeklySummary, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let result = &summary.result;
    let total = result.total();
    let mut lines = vec![format!(
        "week {}: {}",
        summary.week,
        result.window.label(tz)
    )];

    if result.totals.is_empty() {
        lines.push("no categories in this calendar".to_string());
    }
    for entry in &result.totals {
        lines.push(format!(
            "{} | {:>5.1}% | {} ({})",
            format_duration(entry.duration),
            entry.share(total) * 100.0,
            entry.label,
            entry.id
        ));
    }

    lines.push(format!("total: {}", format_duration(total)));
    lines.push(format!(
        "earlier: {} | later: {}",
        yes_no(summary.navigation.can_go_earlier),
        yes_no(summary.navigation.can_go_later)
    ));
    lines.join("\n")
}

pub fn render_events<Tz>(category: &Category, window: &Window, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let events = events_in_window(category, window);
    let mut lines = vec![format!("{} | {}", category.label, window.label(tz))];
    if events.is_empty() {
        lines.push("no events in this week".to_string());
    }

    for event in events {
        let start = event.start.with_timezone(tz);
        let end = event.end.with_timezone(tz);
        lines.push(format!(
            "{} - {} | {} | {}",
            start.format("%a %d %b %H:%M"),
            end.format("%a %d %b %H:%M"),
            format_duration(event.duration()),
            event.short_title()
        ));
    }
    lines.join("\n")
}

pub fn render_history<Tz>(history: &[WeeklySummary], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if history.iter().all(|summary| summary.result.total() == Duration::zero()) {
        return "no tracked time in reachable weeks".to_string();
    }

    history
        .iter()
        .map(|summary| {
            format!(
                "{:>4} | {} | {}",
                summary.week,
                format_duration(summary.result.total()),
                summary.result.window.label(tz)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
