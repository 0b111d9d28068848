//! Timesheet cycle resolution and assembly
//!
//! A "cycle" is the concrete date range a timesheet covers, bounded by the
//! organization's closing day. All arithmetic happens on `NaiveDate` (UTC
//! calendar dates), so cycle boundaries never drift with local-timezone
//! daylight-saving transitions.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::balance::calculate_day;
use crate::models::{DailyResult, Holiday, PunchRecord, ScheduleEntry, ShiftType};

/// Closing days at or above this value select the full calendar month.
pub const FULL_MONTH_THRESHOLD: u32 = 28;

/// The resolved date range of a timesheet period, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleRange {
    /// Iterate every date in the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Resolve the cycle for a target month under the given closing day.
///
/// Month is 0-based (January = 0). A closing day of 28 or higher selects the
/// full calendar month; otherwise the cycle runs from (closing day + 1) of
/// the previous month through the closing day of the target month, e.g.
/// closing day 20 and February 2026 resolve to 2026-01-21 through 2026-02-20.
///
/// Returns `None` for an out-of-range month or closing day.
pub fn resolve_cycle(closing_day: u32, month0: u32, year: i32) -> Option<CycleRange> {
    if month0 > 11 || !(1..=31).contains(&closing_day) {
        return None;
    }
    let month = month0 + 1;

    if closing_day >= FULL_MONTH_THRESHOLD {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = last_day_of_month(year, month)?;
        return Some(CycleRange { start, end });
    }

    // Split-month convention. closing_day < 28 here, so closing_day + 1 is a
    // valid day in every month.
    let (prev_year, prev_month) = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    let start = NaiveDate::from_ymd_opt(prev_year, prev_month, closing_day + 1)?;
    let end = NaiveDate::from_ymd_opt(year, month, closing_day)?;
    Some(CycleRange { start, end })
}

/// Map a calendar date to the (month0, year) period that covers it under the
/// given closing day. Inverse of [`resolve_cycle`]: a date past the closing
/// day belongs to the next month's cycle.
pub fn period_for_date(closing_day: u32, date: NaiveDate) -> (u32, i32) {
    if closing_day >= FULL_MONTH_THRESHOLD || date.day() <= closing_day {
        return (date.month0(), date.year());
    }
    if date.month() == 12 {
        (0, date.year() + 1)
    } else {
        (date.month0() + 1, date.year())
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// A full timesheet for one employee over one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSheet {
    pub employee_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// One result per date in the cycle, ascending.
    pub days: Vec<DailyResult>,
    /// Running balance over days strictly before `today`, so an incomplete
    /// current day never shows up as a deficit.
    pub total_balance_minutes: i64,
}

/// Assemble a timesheet from pre-loaded data.
///
/// Callers bulk-load the cycle's scales, punches and holidays once and hand
/// them over; this function only groups by date and drives the daily
/// calculator, keeping the whole assembly a pure function of its inputs
/// (`today` included).
pub fn build_time_sheet(
    employee_id: &str,
    range: CycleRange,
    scales: &[ScheduleEntry],
    punches: &[PunchRecord],
    holidays: &[Holiday],
    shifts: &HashMap<i64, ShiftType>,
    today: NaiveDate,
) -> TimeSheet {
    let scale_by_date: HashMap<NaiveDate, &ScheduleEntry> = scales
        .iter()
        .filter(|s| s.employee_id == employee_id)
        .map(|s| (s.date, s))
        .collect();

    let mut punches_by_date: HashMap<NaiveDate, Vec<NaiveTime>> = HashMap::new();
    for punch in punches.iter().filter(|p| p.employee_id == employee_id) {
        punches_by_date.entry(punch.date).or_default().push(punch.time);
    }
    for times in punches_by_date.values_mut() {
        times.sort_unstable();
    }

    let holiday_set: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();

    let mut days = Vec::new();
    let mut total_balance_minutes = 0;
    for date in range.days() {
        let shift = scale_by_date
            .get(&date)
            .and_then(|s| s.shift_id)
            .and_then(|id| shifts.get(&id));
        let times = punches_by_date.get(&date).map_or(&[][..], Vec::as_slice);

        let result = calculate_day(date, shift, times, &holiday_set);
        if date < today {
            total_balance_minutes += result.balance_minutes;
        }
        days.push(result);
    }

    TimeSheet {
        employee_id: employee_id.to_string(),
        start: range.start,
        end: range.end,
        days,
        total_balance_minutes,
    }
}
