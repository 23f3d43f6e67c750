use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub category_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CalendarEvent {
    pub fn new(category_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            category_id: category_id.into(),
            start,
            end,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Length of the event. An event whose end precedes its start counts as zero.
    pub fn duration(&self) -> Duration {
        (self.end - self.start).max(Duration::zero())
    }

    pub fn short_title(&self) -> String {
        self.title
            .as_deref()
            .and_then(|title| title.lines().next())
            .unwrap_or("(untitled)")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl Category {
    pub fn new(id: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: color.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }
}

pub fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find(|category| category.id == id)
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{CalendarEvent, Category, find_category, format_duration};

    #[test]
    fn inverted_event_has_zero_duration() {
        let event = CalendarEvent::new(
            "work",
            Utc.with_ymd_and_hms(2026, 1, 5, 11, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
        );
        assert_eq!(event.duration(), Duration::zero());
    }

    #[test]
    fn formats_hours_past_a_day() {
        assert_eq!(format_duration(Duration::hours(26) + Duration::seconds(61)), "26:01:01");
        assert_eq!(format_duration(Duration::seconds(-5)), "00:00:00");
    }

    #[test]
    fn finds_category_by_id() {
        let categories = vec![
            Category::new("work", "Work", "#3366ff"),
            Category::new("gym", "Gym", "#ff6633"),
        ];
        let gym = find_category(&categories, "gym").expect("gym should exist");
        assert_eq!(gym.label, "Gym");
        assert!(find_category(&categories, "sleep").is_none());
    }

    #[test]
    fn short_title_uses_first_line() {
        let event = CalendarEvent::new(
            "work",
            Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
        )
        .with_title("Standup\nnotes follow");
        assert_eq!(event.short_title(), "Standup");
    }
}
