pub mod aggregate;
pub mod cli;
pub mod config;
pub mod domain;
pub mod report;
pub mod sources;
pub mod storage;
pub mod week;

pub use aggregate::{
	AggregationOptions, AggregationResult, CategoryTotal, Navigation, WeeklySummary, aggregate,
	is_window_empty, navigable_history, navigation, overlaps, total_duration, weekly_summary,
};
pub use domain::{CalendarEvent, Category};
pub use week::{WeekIndex, Window, current_week_index, end_of_week, start_of_week, window_for_week};
