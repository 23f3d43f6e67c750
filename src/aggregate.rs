use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CalendarEvent, Category};
use crate::week::{WeekIndex, Window, current_week_index, window_for_week};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Count only the part of an event that falls inside the window. Off by
    /// default, so a straddling event contributes its whole length.
    #[serde(default)]
    pub clip_to_window: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub id: String,
    pub label: String,
    pub color: String,
    pub duration: Duration,
}

impl CategoryTotal {
    /// Fraction of `total` taken by this category, `0.0` when nothing was tracked.
    pub fn share(&self, total: Duration) -> f64 {
        let total_ms = total.num_milliseconds();
        if total_ms <= 0 {
            return 0.0;
        }
        self.duration.num_milliseconds() as f64 / total_ms as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    pub window: Window,
    pub totals: Vec<CategoryTotal>,
}

impl AggregationResult {
    pub fn total(&self) -> Duration {
        saturating_sum(self.totals.iter().map(|entry| entry.duration))
    }

    pub fn is_empty(&self) -> bool {
        self.total() == Duration::zero()
    }

    pub fn get(&self, category_id: &str) -> Option<&CategoryTotal> {
        self.totals.iter().find(|entry| entry.id == category_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub can_go_earlier: bool,
    pub can_go_later: bool,
}

impl Navigation {
    pub fn earlier(&self, week: WeekIndex) -> Option<WeekIndex> {
        self.can_go_earlier.then(|| week.saturating_sub(1))
    }

    pub fn later(&self, week: WeekIndex) -> Option<WeekIndex> {
        self.can_go_later.then(|| week.saturating_add(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySummary {
    pub week: WeekIndex,
    pub result: AggregationResult,
    pub navigation: Navigation,
}

/// Inclusive on both ends: touching the window boundary counts as overlapping.
pub fn overlaps(window: &Window, event: &CalendarEvent) -> bool {
    event.start <= window.end && event.end >= window.start
}

pub fn total_duration<'a, I>(events: I) -> Duration
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    saturating_sum(events.into_iter().map(CalendarEvent::duration))
}

/// Sums durations, pinning at `Duration::MAX` instead of overflowing.
fn saturating_sum(durations: impl Iterator<Item = Duration>) -> Duration {
    durations.fold(Duration::zero(), |acc, duration| {
        acc.checked_add(&duration).unwrap_or(Duration::MAX)
    })
}

fn clipped_duration(window: &Window, event: &CalendarEvent) -> Duration {
    let start = event.start.max(window.start);
    let end = event.end.min(window.end);
    (end - start).max(Duration::zero())
}

pub fn duration_in_window(
    window: &Window,
    events: &[CalendarEvent],
    options: AggregationOptions,
) -> Duration {
    let in_window = events.iter().filter(|event| overlaps(window, event));
    if options.clip_to_window {
        saturating_sum(in_window.map(|event| clipped_duration(window, event)))
    } else {
        total_duration(in_window)
    }
}

pub fn aggregate_window(
    categories: &[Category],
    window: Window,
    options: AggregationOptions,
) -> AggregationResult {
    let totals = categories
        .iter()
        .map(|category| CategoryTotal {
            id: category.id.clone(),
            label: category.label.clone(),
            color: category.color.clone(),
            duration: duration_in_window(&window, &category.events, options),
        })
        .collect();

    AggregationResult { window, totals }
}

#[tracing::instrument(skip(categories, now, options), fields(category_count = categories.len()))]
pub fn aggregate<Tz: TimeZone>(
    categories: &[Category],
    week: WeekIndex,
    now: &DateTime<Tz>,
    options: AggregationOptions,
) -> AggregationResult {
    let result = aggregate_window(categories, window_for_week(week, now), options);
    debug!(total_ms = result.total().num_milliseconds(), "aggregated week");
    result
}

pub fn is_window_empty<Tz: TimeZone>(
    categories: &[Category],
    week: WeekIndex,
    now: &DateTime<Tz>,
    options: AggregationOptions,
) -> bool {
    aggregate(categories, week, now, options).is_empty()
}

pub fn navigation<Tz: TimeZone>(
    categories: &[Category],
    week: WeekIndex,
    now: &DateTime<Tz>,
    options: AggregationOptions,
) -> Navigation {
    Navigation {
        can_go_earlier: !is_window_empty(categories, week.saturating_sub(1), now, options),
        can_go_later: week != current_week_index(now),
    }
}

pub fn weekly_summary<Tz: TimeZone>(
    categories: &[Category],
    week: WeekIndex,
    now: &DateTime<Tz>,
    options: AggregationOptions,
) -> WeeklySummary {
    WeeklySummary {
        week,
        result: aggregate(categories, week, now, options),
        navigation: navigation(categories, week, now, options),
    }
}

/// Summaries from the current week backwards, following the same rule the
/// earlier-week control uses: stop once the previous week holds nothing.
pub fn navigable_history<Tz: TimeZone>(
    categories: &[Category],
    now: &DateTime<Tz>,
    options: AggregationOptions,
    limit: usize,
) -> Vec<WeeklySummary> {
    let mut summaries = Vec::new();
    let mut week = current_week_index(now);

    while summaries.len() < limit {
        let summary = weekly_summary(categories, week, now, options);
        let previous = summary.navigation.earlier(week);
        summaries.push(summary);

        match previous {
            Some(earlier) if earlier != week => week = earlier,
            _ => break,
        }
    }

    summaries
}

/// Events of `category` touching `window`, earliest first.
pub fn events_in_window<'a>(category: &'a Category, window: &Window) -> Vec<&'a CalendarEvent> {
    let mut events = category
        .events
        .iter()
        .filter(|event| overlaps(window, event))
        .collect::<Vec<_>>();
    events.sort_by_key(|event| (event.start, event.end));
    events
}
