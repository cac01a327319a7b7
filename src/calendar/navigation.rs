use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use super::layout::{layout_week, WeekLayout, WeekWindow};
use crate::errors::{ChronosError, Result};
use crate::models::event::Event;

/// Reference date of the weekly grid. Holds no bucketed events; every
/// [`CalendarView::layout`] call recomputes from the full event set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarView {
    reference: NaiveDate,
    tz: Tz,
}

impl CalendarView {
    pub fn new(reference: NaiveDate, tz: Tz) -> Self {
        Self { reference, tz }
    }

    pub fn starting_today(now: DateTime<Utc>, tz: Tz) -> Self {
        Self::new(now.with_timezone(&tz).date_naive(), tz)
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn next_week(&mut self) {
        self.reference += Duration::weeks(1);
    }

    pub fn previous_week(&mut self) {
        self.reference -= Duration::weeks(1);
    }

    pub fn today(&mut self, now: DateTime<Utc>) {
        self.reference = now.with_timezone(&self.tz).date_naive();
    }

    /// Moves by `offset` weeks; negative goes back. Offsets that leave the
    /// representable calendar are rejected and the view stays put.
    pub fn shift_weeks(&mut self, offset: i64) -> Result<()> {
        let out_of_range = || ChronosError::InvalidInput(format!("week offset {} is out of range", offset));
        let next = Duration::try_weeks(offset)
            .and_then(|delta| self.reference.checked_add_signed(delta))
            .ok_or_else(out_of_range)?;
        // The week grid reaches up to a week to either side of the reference.
        let week = Duration::weeks(1);
        if next.checked_sub_signed(week).is_none() || next.checked_add_signed(week).is_none() {
            return Err(out_of_range());
        }
        self.reference = next;
        Ok(())
    }

    pub fn window(&self) -> WeekWindow {
        WeekWindow::containing(self.reference, self.tz)
    }

    pub fn layout(&self, events: &[Event]) -> WeekLayout {
        layout_week(events, self.reference, self.tz)
    }

    pub fn label(&self) -> String {
        let window = self.window();
        format!(
            "{} - {}",
            window.start.format("%b %-d"),
            window.end.format("%b %-d, %Y")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    #[test]
    fn navigates_one_week_at_a_time() {
        let mut view = CalendarView::new(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(), UTC);
        view.next_week();
        assert_eq!(view.reference(), NaiveDate::from_ymd_opt(2026, 10, 28).unwrap());
        view.previous_week();
        view.previous_week();
        assert_eq!(view.reference(), NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        view.shift_weeks(3).unwrap();
        assert_eq!(view.reference(), NaiveDate::from_ymd_opt(2026, 11, 4).unwrap());
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let mut view = CalendarView::new(start, UTC);
        assert!(matches!(view.shift_weeks(99_999_999_999), Err(ChronosError::InvalidInput(_))));
        assert!(matches!(view.shift_weeks(i64::MIN), Err(ChronosError::InvalidInput(_))));
        assert_eq!(view.reference(), start);

        let mut edge = CalendarView::new(NaiveDate::MAX - Duration::days(3), UTC);
        assert!(edge.shift_weeks(0).is_err());
    }

    #[test]
    fn today_resets_reference() {
        let mut view = CalendarView::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), UTC);
        view.today(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap());
        assert_eq!(view.reference(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn relayout_after_navigation_refilters() {
        let events = vec![Event::new(
            "e",
            "Review",
            Utc.with_ymd_and_hms(2026, 10, 27, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 27, 11, 0, 0).unwrap(),
        )];
        let mut view = CalendarView::new(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(), UTC);
        assert_eq!(view.layout(&events).event_count(), 0);
        view.next_week();
        assert_eq!(view.layout(&events).event_count(), 1);
    }

    #[test]
    fn label_spans_the_week() {
        let view = CalendarView::new(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(), UTC);
        assert_eq!(view.label(), "Oct 18 - Oct 24, 2026");
    }
}
