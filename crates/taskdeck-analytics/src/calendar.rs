//! Calendar-day bucketing
//!
//! Every function takes "now" as a zoned instant; day boundaries are local
//! midnights in that zone. Production callers pass `Local::now()`.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use taskdeck_model::Task;

/// Days in the weekly series
pub const WEEK_DAYS: usize = 7;

/// Days covered by the upcoming-deadline window
pub const UPCOMING_DAYS: u64 = 7;

/// Start of `date` in `tz`.
///
/// When midnight does not exist locally (DST gap) the UTC midnight of the
/// same date is used.
#[must_use]
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Half-open instant range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    /// First instant inside the window
    pub start: DateTime<Utc>,
    /// First instant after the window
    pub end: DateTime<Utc>,
}

impl Window {
    /// Check if `instant` falls inside
    #[inline]
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

fn day_span<Tz: TimeZone>(now: &DateTime<Tz>, back: u64, forward: u64) -> Option<Window> {
    let today = now.date_naive();
    let first = today.checked_sub_days(Days::new(back))?;
    let after = today.checked_add_days(Days::new(forward))?;
    let tz = now.timezone();
    Some(Window {
        start: local_midnight(&tz, first).with_timezone(&Utc),
        end: local_midnight(&tz, after).with_timezone(&Utc),
    })
}

/// The trailing seven local days ending today, for `dueAfter`/`dueBefore`
#[must_use]
pub fn weekly_window<Tz: TimeZone>(now: &DateTime<Tz>) -> Window {
    day_span(now, WEEK_DAYS as u64 - 1, 1).unwrap_or(Window {
        start: now.with_timezone(&Utc),
        end: now.with_timezone(&Utc),
    })
}

/// Today's local midnight up to the midnight seven days later
#[must_use]
pub fn upcoming_window<Tz: TimeZone>(now: &DateTime<Tz>) -> Window {
    day_span(now, 0, UPCOMING_DAYS).unwrap_or(Window {
        start: now.with_timezone(&Utc),
        end: now.with_timezone(&Utc),
    })
}

/// Completed tasks per local day over the trailing week, oldest first.
///
/// Bucket `i` holds tasks due on the `i`-th day after the window start,
/// measured in calendar days. Tasks due outside the window are not counted.
#[must_use]
pub fn weekly_series<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> [usize; WEEK_DAYS] {
    let mut series = [0; WEEK_DAYS];
    let tz = now.timezone();
    let Some(start) = now.date_naive().checked_sub_days(Days::new(WEEK_DAYS as u64 - 1)) else {
        return series;
    };

    for task in tasks.iter().filter(|task| task.is_completed()) {
        let due_day = task.due_date.with_timezone(&tz).date_naive();
        let offset = due_day.signed_duration_since(start).num_days();
        if let Ok(index) = usize::try_from(offset) {
            if let Some(bucket) = series.get_mut(index) {
                *bucket += 1;
            }
        }
    }
    series
}

/// Tasks due in the upcoming window, soonest first, at most `limit`
#[must_use]
pub fn upcoming<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>, limit: usize) -> Vec<&'a Task> {
    let window = upcoming_window(now);
    let mut due: Vec<&Task> = tasks
        .iter()
        .filter(|task| window.contains(task.due_date))
        .collect();
    due.sort_by_key(|task| task.due_date);
    due.truncate(limit);
    due
}

/// Group tasks by the local day they are due
#[must_use]
pub fn tasks_by_day<'a, Tz: TimeZone>(tasks: &'a [Task], tz: &Tz) -> BTreeMap<NaiveDate, Vec<&'a Task>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        days.entry(task.due_date.with_timezone(tz).date_naive())
            .or_default()
            .push(task);
    }
    days
}

/// Sunday-first month grid with leading blanks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    /// Year
    pub year: i32,
    /// Month, 1-based
    pub month: u32,
    /// `None` for leading blanks, then day numbers from 1
    pub cells: Vec<Option<u32>>,
}

impl MonthGrid {
    /// Grid for the month containing `date`
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let blanks = first.weekday().num_days_from_sunday() as usize;
        let days = first
            .iter_days()
            .take_while(|day| day.month() == first.month())
            .count();

        let mut cells = vec![None; blanks];
        cells.extend((1..).take(days).map(Some));
        Self {
            year: first.year(),
            month: first.month(),
            cells,
        }
    }

    /// Number of days in the month
    #[must_use]
    pub fn days(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    /// Rows of seven cells; the last row may be short
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<u32>]> {
        self.cells.chunks(7)
    }
}
