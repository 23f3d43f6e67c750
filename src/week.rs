use std::fmt;

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};

/// ISO week number, counted from the ISO week that contains the reference "now".
/// Indices below 1 or above 52/53 simply step into neighbouring years.
pub type WeekIndex = i64;

const MAX_GAP_MINUTES: usize = 180;
const SAFETY_MARGIN_DAYS: u64 = 14;

/// One calendar week, Monday 00:00:00.000 through Sunday 23:59:59.999 local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Human label such as `3rd Jun - 9th Jun`, both ends rendered in `tz`.
    pub fn label<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        format!(
            "{} - {}",
            display_day(self.start, tz),
            display_day(self.end, tz)
        )
    }
}

pub fn current_week_index<Tz: TimeZone>(now: &DateTime<Tz>) -> WeekIndex {
    WeekIndex::from(now.iso_week().week())
}

pub fn start_of_week<Tz: TimeZone>(week: WeekIndex, now: &DateTime<Tz>) -> DateTime<Utc> {
    window_for_week(week, now).start
}

pub fn end_of_week<Tz: TimeZone>(week: WeekIndex, now: &DateTime<Tz>) -> DateTime<Utc> {
    window_for_week(week, now).end
}

pub fn window_for_week<Tz: TimeZone>(week: WeekIndex, now: &DateTime<Tz>) -> Window {
    let tz = now.timezone();
    let monday = monday_for_week(week, now);
    let next_monday = monday
        .checked_add_days(Days::new(7))
        .unwrap_or(NaiveDate::MAX);

    let start = local_midnight_to_utc(&tz, monday);
    let end = local_midnight_to_utc(&tz, next_monday) - Duration::milliseconds(1);
    tracing::trace!(week, %start, %end, "derived week window");
    Window { start, end }
}

fn monday_for_week<Tz: TimeZone>(week: WeekIndex, now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    let this_monday = today
        .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
        .unwrap_or(today);
    let offset_weeks = week.saturating_sub(current_week_index(now));

    let shifted = offset_weeks
        .checked_mul(7)
        .and_then(Duration::try_days)
        .and_then(|delta| this_monday.checked_add_signed(delta));

    let (earliest, latest) = representable_mondays();
    match shifted {
        Some(monday) => monday.clamp(earliest, latest),
        None if offset_weeks < 0 => earliest,
        None => latest,
    }
}

/// Mondays far enough from chrono's date limits that the following Monday and
/// any fixed offset applied to either still fit.
fn representable_mondays() -> (NaiveDate, NaiveDate) {
    let low = NaiveDate::MIN
        .checked_add_days(Days::new(SAFETY_MARGIN_DAYS))
        .unwrap_or(NaiveDate::MIN);
    let earliest = low
        .checked_add_days(Days::new(u64::from(
            (7 - low.weekday().num_days_from_monday()) % 7,
        )))
        .unwrap_or(low);

    let high = NaiveDate::MAX
        .checked_sub_days(Days::new(SAFETY_MARGIN_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let latest = high
        .checked_sub_days(Days::new(u64::from(high.weekday().num_days_from_monday())))
        .unwrap_or(high);

    (earliest, latest)
}

/// Resolves local midnight of `day`. Midnights skipped by a DST gap move forward
/// to the first local instant that exists; ambiguous ones take the earlier instant.
fn local_midnight_to_utc<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    let mut cursor = midnight;
    for _ in 0..MAX_GAP_MINUTES {
        match tz.from_local_datetime(&cursor) {
            LocalResult::Single(local) => return local.with_timezone(&Utc),
            LocalResult::Ambiguous(first, second) => return first.min(second).with_timezone(&Utc),
            LocalResult::None => cursor += Duration::minutes(1),
        }
    }

    tracing::warn!(%day, "no local midnight found, falling back to UTC midnight");
    midnight.and_utc()
}

fn display_day<Tz>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = instant.with_timezone(tz);
    format!(
        "{}{} {}",
        local.day(),
        ordinal_suffix(local.day()),
        local.format("%b")
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};
    use chrono_tz::America::{Havana, Sao_Paulo};

    use super::{
        WeekIndex, current_week_index, end_of_week, local_midnight_to_utc, ordinal_suffix,
        start_of_week, window_for_week,
    };

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap()
    }

    fn full_week() -> Duration {
        Duration::days(7) - Duration::milliseconds(1)
    }

    #[test]
    fn current_index_is_iso_week_of_now() {
        assert_eq!(current_week_index(&reference_now()), 42);
    }

    #[test]
    fn current_week_runs_monday_to_sunday() {
        let now = reference_now();
        let window = window_for_week(42, &now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap());
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(window.start.weekday(), Weekday::Mon);
        assert_eq!(window.end.weekday(), Weekday::Sun);
        assert!(window.contains(now));
    }

    #[test]
    fn week_one_can_start_in_previous_year() {
        let now = reference_now();
        assert_eq!(
            start_of_week(1, &now),
            Utc.with_ymd_and_hms(2025, 12, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            start_of_week(0, &now),
            Utc.with_ymd_and_hms(2025, 12, 22, 0, 0, 0).unwrap()
        );
        assert_eq!(
            start_of_week(54, &now),
            Utc.with_ymd_and_hms(2027, 1, 4, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn weeks_span_seven_days_minus_one_millisecond() {
        let now = reference_now();
        for week in -120..=120 {
            let start = start_of_week(week, &now);
            let end = end_of_week(week, &now);
            assert!(start <= end, "week {week} is inverted");
            assert_eq!(end - start, full_week(), "week {week} has the wrong span");
        }
    }

    #[test]
    fn weeks_tile_without_gaps() {
        let now = reference_now();
        for week in -120..120 {
            assert_eq!(
                start_of_week(week + 1, &now),
                end_of_week(week, &now) + Duration::milliseconds(1),
                "gap after week {week}"
            );
        }
    }

    #[test]
    fn uses_local_midnight_of_reference_zone() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let now = offset.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let window = window_for_week(42, &now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 10, 11, 22, 0, 0).unwrap());
        assert_eq!(window.span(), full_week());
        assert_eq!(window.label(&offset), "12th Oct - 18th Oct");
    }

    #[test]
    fn local_week_number_decides_current_index() {
        // Sunday 23:30 in UTC is already Monday of week 43 at +02:00.
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let now = Utc
            .with_ymd_and_hms(2026, 10, 18, 23, 30, 0)
            .unwrap()
            .with_timezone(&offset);
        assert_eq!(current_week_index(&now), 43);
    }

    #[test]
    fn dst_weeks_still_tile_and_lose_the_skipped_hour() {
        // Sao Paulo skipped 2018-11-04 00:00, moving straight to 01:00 -02.
        let now = Sao_Paulo.with_ymd_and_hms(2018, 11, 8, 12, 0, 0).unwrap();
        let current = current_week_index(&now);
        assert_eq!(current, 45);

        for week in current - 60..current + 60 {
            let window = window_for_week(week, &now);
            assert!(window.start <= window.end, "week {week} is inverted");
            assert_eq!(
                start_of_week(week + 1, &now),
                window.end + Duration::milliseconds(1),
                "gap after week {week}"
            );
        }

        let shortened = window_for_week(44, &now);
        assert_eq!(shortened.start, Utc.with_ymd_and_hms(2018, 10, 29, 3, 0, 0).unwrap());
        assert_eq!(
            shortened.span(),
            Duration::days(7) - Duration::hours(1) - Duration::milliseconds(1)
        );
        assert_eq!(window_for_week(45, &now).label(&Sao_Paulo), "5th Nov - 11th Nov");
    }

    #[test]
    fn missing_midnight_moves_forward_and_repeated_midnight_takes_the_first() {
        let skipped = NaiveDate::from_ymd_opt(2018, 11, 4).expect("valid date");
        assert_eq!(
            local_midnight_to_utc(&Sao_Paulo, skipped),
            Utc.with_ymd_and_hms(2018, 11, 4, 3, 0, 0).unwrap()
        );

        // Havana fell back from 01:00 CDT to 00:00 CST, so midnight happened twice.
        assert_eq!(
            local_midnight_to_utc(&Havana, skipped),
            Utc.with_ymd_and_hms(2018, 11, 4, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn extreme_indices_stay_well_formed() {
        let now = reference_now();
        for week in [WeekIndex::MIN, WeekIndex::MIN + 1, -10_000_000, 10_000_000, WeekIndex::MAX] {
            let window = window_for_week(week, &now);
            assert!(window.start <= window.end, "week {week} is inverted");
            assert_eq!(window.start.weekday(), Weekday::Mon);
        }
        assert!(start_of_week(WeekIndex::MIN, &now) < start_of_week(WeekIndex::MAX, &now));
    }

    #[test]
    fn labels_use_ordinal_day_and_short_month() {
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 8, 0, 0).unwrap();
        let week = current_week_index(&now);
        assert_eq!(window_for_week(week, &now).label(&Utc), "3rd Jun - 9th Jun");
    }

    #[test]
    fn ordinal_suffixes() {
        let rendered = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31]
            .map(|day| format!("{day}{}", ordinal_suffix(day)));
        assert_eq!(
            rendered,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "31st"]
        );
    }
}
