//! The trailing run of calendar months covered by the dashboard charts.

use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// The number of calendar months shown by the dashboard charts, including
/// the current month.
pub const WINDOW_MONTHS: usize = 6;

/// The last [WINDOW_MONTHS] calendar months, ending with the current month.
///
/// Months are keyed by their first day, so a month key is a plain [Date]
/// that sorts chronologically.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthWindow {
    /// The first day of each month, oldest first.
    months: [Date; WINDOW_MONTHS],
    /// The offset used to decide which calendar day a timestamp falls on.
    offset: UtcOffset,
}

impl MonthWindow {
    /// The window whose newest month contains `now`.
    ///
    /// Timestamps are assigned to months using the offset of `now`.
    pub(super) fn ending_at(now: OffsetDateTime) -> Self {
        let mut months = [first_of_month(now.date()); WINDOW_MONTHS];

        for i in (0..WINDOW_MONTHS - 1).rev() {
            months[i] = previous_month(months[i + 1]);
        }

        Self {
            months,
            offset: now.offset(),
        }
    }

    /// The first day of the oldest month in the window.
    pub(super) fn start(&self) -> Date {
        self.months[0]
    }

    /// The first day of each month in the window, oldest first.
    pub(super) fn months(&self) -> &[Date] {
        &self.months
    }

    /// The month `timestamp` belongs to, or `None` if it happened before the
    /// window starts.
    ///
    /// Timestamps after the newest month are not excluded.
    pub(super) fn month_of(&self, timestamp: OffsetDateTime) -> Option<Date> {
        let local_date = timestamp.to_offset(self.offset).date();

        (local_date >= self.start()).then(|| first_of_month(local_date))
    }
}

/// The first day of the month containing `date`.
pub(super) fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

fn previous_month(first_day: Date) -> Date {
    first_of_month(first_day - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::dashboard::window::{MonthWindow, first_of_month};

    #[test]
    fn window_covers_six_months_ending_now() {
        let window = MonthWindow::ending_at(datetime!(2024-03-15 10:00 UTC));

        assert_eq!(
            window.months(),
            &[
                date!(2023 - 10 - 01),
                date!(2023 - 11 - 01),
                date!(2023 - 12 - 01),
                date!(2024 - 01 - 01),
                date!(2024 - 02 - 01),
                date!(2024 - 03 - 01),
            ]
        );
        assert_eq!(window.start(), date!(2023 - 10 - 01));
    }

    #[test]
    fn window_on_last_day_of_long_month() {
        let window = MonthWindow::ending_at(datetime!(2024-08-31 23:59 UTC));

        assert_eq!(window.start(), date!(2024 - 03 - 01));
        assert_eq!(window.months()[5], date!(2024 - 08 - 01));
    }

    #[test]
    fn first_of_month_handles_every_day() {
        assert_eq!(first_of_month(date!(2024 - 02 - 29)), date!(2024 - 02 - 01));
        assert_eq!(first_of_month(date!(2024 - 01 - 01)), date!(2024 - 01 - 01));
        assert_eq!(first_of_month(date!(2023 - 12 - 31)), date!(2023 - 12 - 01));
    }

    #[test]
    fn month_of_excludes_timestamps_before_window() {
        let window = MonthWindow::ending_at(datetime!(2024-03-15 10:00 UTC));

        assert_eq!(window.month_of(datetime!(2023-09-30 23:59 UTC)), None);
        assert_eq!(
            window.month_of(datetime!(2023-10-01 0:00 UTC)),
            Some(date!(2023 - 10 - 01))
        );
        assert_eq!(
            window.month_of(datetime!(2024-03-31 12:00 UTC)),
            Some(date!(2024 - 03 - 01))
        );
    }

    #[test]
    fn month_of_uses_local_calendar_day() {
        let window = MonthWindow::ending_at(datetime!(2024-03-15 10:00 -3));

        // 02:00 UTC on the 1st of March is still the 29th of February in UTC-3.
        assert_eq!(
            window.month_of(datetime!(2024-03-01 2:00 UTC)),
            Some(date!(2024 - 02 - 01))
        );
    }
}
