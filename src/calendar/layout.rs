//! Weekly grid layout.
//!
//! Events are bucketed into Sunday..Saturday columns of the week containing a
//! reference date and given a vertical offset and height at a fixed scale of
//! one pixel per minute. Overlapping events are not split into lanes; order
//! within a column is input order.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::models::event::Event;

pub const PIXELS_PER_HOUR: i64 = 60;
pub const DAYS_PER_WEEK: usize = 7;

/// Closed interval from Sunday 00:00 to Saturday 23:59:59.999 in `tz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl WeekWindow {
    pub fn containing(reference: NaiveDate, tz: Tz) -> Self {
        let first_day = week_start_date(reference);
        let start = local_midnight(first_day, tz);
        let end = local_midnight(first_day + Duration::days(DAYS_PER_WEEK as i64), tz)
            - Duration::milliseconds(1);
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start.with_timezone(&Utc) && instant <= self.end.with_timezone(&Utc)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn day(&self, index: usize) -> NaiveDate {
        self.first_day() + Duration::days(index as i64)
    }
}

pub fn week_start_date(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(reference.weekday().num_days_from_sunday() as i64)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// An event with its pixel placement inside a day column. `height` is not
/// clamped: events ending after midnight or with zero length can produce zero
/// or negative heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedEvent {
    pub event: Event,
    pub top: i64,
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub events: Vec<PlacedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekLayout {
    pub window: WeekWindow,
    pub days: Vec<DayColumn>,
}

impl WeekLayout {
    pub fn event_count(&self) -> usize {
        self.days.iter().map(|day| day.events.len()).sum()
    }
}

fn minutes_into_day<T: Timelike>(time: &T) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}

pub fn place_event(event: &Event, tz: Tz) -> PlacedEvent {
    let start = event.start.with_timezone(&tz);
    let end = event.end.with_timezone(&tz);
    let top = minutes_into_day(&start) * PIXELS_PER_HOUR / 60;
    let bottom = minutes_into_day(&end) * PIXELS_PER_HOUR / 60;
    PlacedEvent {
        event: event.clone(),
        top,
        height: bottom - top,
    }
}

/// Column index of an instant: 0 for Sunday through 6 for Saturday.
pub fn column_index(instant: DateTime<Utc>, tz: Tz) -> usize {
    instant.with_timezone(&tz).weekday().num_days_from_sunday() as usize
}

pub fn layout_week(events: &[Event], reference: NaiveDate, tz: Tz) -> WeekLayout {
    let window = WeekWindow::containing(reference, tz);
    let mut days: Vec<DayColumn> = (0..DAYS_PER_WEEK)
        .map(|index| {
            let date = window.day(index);
            DayColumn {
                weekday: date.weekday(),
                date,
                events: Vec::new(),
            }
        })
        .collect();

    for event in events.iter().filter(|event| window.contains(event.start)) {
        days[column_index(event.start, tz)]
            .events
            .push(place_event(event, tz));
    }

    WeekLayout { window, days }
}
