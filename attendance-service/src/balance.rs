//! Daily balance calculation
//!
//! Pure computation of a single day's attendance result from the assigned
//! shift, the day's punch list and the holiday set. No clock reads, no
//! store access; identical inputs always produce identical results.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

use crate::models::{minutes_of_day, DailyResult, DayStatus, ShiftType};

/// Allowed deviation, in minutes, before a work day counts as DELAY/EXTRA.
pub const TOLERANCE_MINUTES: i64 = 10;

/// Display name attached to unscheduled dates.
pub const DAY_OFF_LABEL: &str = "Day off";

/// Sum the durations of the in/out pairs in a punch list.
///
/// Punches pair strictly in input order: `[0]↔[1]`, `[2]↔[3]`, and so on.
/// A trailing unpaired punch contributes nothing to the sum; the caller is
/// expected to flag the day as incomplete instead.
pub fn worked_minutes(punches: &[NaiveTime]) -> i64 {
    punches
        .chunks_exact(2)
        .map(|pair| minutes_of_day(pair[1]) - minutes_of_day(pair[0]))
        .sum()
}

/// Compute the attendance result for one day.
///
/// `shift` is the resolved shift of the day's schedule entry; `None` means
/// the date is a day off (either an explicit day-off entry or no entry at
/// all). Punches must be in chronological input order.
pub fn calculate_day(
    date: NaiveDate,
    shift: Option<&ShiftType>,
    punches: &[NaiveTime],
    holidays: &HashSet<NaiveDate>,
) -> DailyResult {
    let expected_minutes = shift.map_or(0, ShiftType::expected_minutes);
    let worked = worked_minutes(punches);

    // On a day off all work counts as balance; on a work day the balance is
    // the signed difference against the expected window.
    let balance_minutes = match shift {
        Some(_) => worked - expected_minutes,
        None => worked,
    };

    let status = match shift {
        None if worked == 0 => DayStatus::DayOff,
        None => DayStatus::Extra,
        Some(_) if punches.is_empty() => DayStatus::Absent,
        Some(_) if punches.len() % 2 == 1 => DayStatus::Missing,
        Some(_) if balance_minutes < -TOLERANCE_MINUTES => DayStatus::Delay,
        Some(_) if balance_minutes > TOLERANCE_MINUTES => DayStatus::Extra,
        Some(_) => DayStatus::Ok,
    };

    DailyResult {
        date,
        status,
        expected_minutes,
        worked_minutes: worked,
        balance_minutes,
        punches: punches.to_vec(),
        shift_name: shift.map_or_else(|| DAY_OFF_LABEL.to_string(), ShiftType::label),
        is_holiday: holidays.contains(&date),
    }
}
