//! Attendance models
//!
//! Domain models for the attendance and time-balance engine.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minutes in a 24-hour day, used for overnight shift wraparound.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes past midnight for a time-of-day value. Punches and shift
/// boundaries are minute-granular; seconds are discarded.
pub fn minutes_of_day(time: NaiveTime) -> i64 {
    (time.num_seconds_from_midnight() / 60) as i64
}

/// Normalize a UTC timestamp to the calendar-date key used by the scale and
/// punch stores. All range arithmetic in the engine happens on `NaiveDate`,
/// so a lookup can never miss an entry because of time-of-day or DST drift.
pub fn scale_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// A named shift template assignable to a schedule entry.
///
/// An end time numerically earlier than the start time denotes an overnight
/// shift (e.g. 22:00-06:00).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftType {
    pub id: i64,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_minutes: i64,
}

impl ShiftType {
    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    /// Paid minutes this shift expects: the start-to-end span (wrapping past
    /// midnight for overnight shifts) minus the paid break.
    pub fn expected_minutes(&self) -> i64 {
        let start = minutes_of_day(self.start);
        let end = minutes_of_day(self.end);
        let span = if end < start {
            (MINUTES_PER_DAY - start) + end
        } else {
            end - start
        };
        span - self.break_minutes
    }

    /// Display name used in daily results.
    pub fn label(&self) -> String {
        format!(
            "{} ({} - {})",
            self.name,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// A work-scale cell: which shift (if any) an employee is assigned on a date.
///
/// `shift_id = None` means the date is a day off. At most one entry exists
/// per (employee, date); writes are upserts on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub employee_id: String,
    pub date: NaiveDate,
    pub shift_id: Option<i64>,
}

/// Where a punch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchSource {
    /// Captured by a clock device.
    Device,
    /// Entered by hand; carries a justification.
    Manual,
}

impl PunchSource {
    /// Value stored in the `source` column.
    pub fn as_db(self) -> &'static str {
        match self {
            PunchSource::Device => "device",
            PunchSource::Manual => "manual",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "manual" => PunchSource::Manual,
            _ => PunchSource::Device,
        }
    }
}

/// A single clock-in or clock-out timestamp for an employee's day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchRecord {
    pub employee_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub source: PunchSource,
    /// Required on manual entries; the same justification is stamped on
    /// every punch of a manual day replacement.
    pub justification: Option<String>,
}

/// A holiday date, consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// Roster entry for the aggregate reporters. Employee master data itself is
/// managed elsewhere; the engine only needs identity and the company filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub company_id: Option<String>,
    pub active: bool,
}

/// Classification of a single day's attendance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    /// Worked within tolerance of the expected minutes.
    Ok,
    /// Odd punch count on a work day; the day is incomplete.
    Missing,
    /// Shortfall beyond the tolerance.
    Delay,
    /// Extra time beyond the tolerance, or any work on a day off.
    Extra,
    /// Unscheduled date with no work.
    DayOff,
    /// Scheduled work day with no punches at all.
    Absent,
}

impl DayStatus {
    /// Sort key for the daily overview: most actionable cases first.
    pub fn priority(self) -> u8 {
        match self {
            DayStatus::Absent => 0,
            DayStatus::Delay => 1,
            DayStatus::Missing => 2,
            DayStatus::Extra => 3,
            DayStatus::Ok => 4,
            DayStatus::DayOff => 5,
        }
    }
}

/// One day's computed attendance result.
///
/// Derived data: recomputed on every read and never persisted, so it always
/// reflects the latest schedule and punch state until the period is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub expected_minutes: i64,
    pub worked_minutes: i64,
    /// Worked minus expected; positive = extra time, negative = shortfall.
    /// On unscheduled days the full worked time counts as balance.
    pub balance_minutes: i64,
    pub punches: Vec<NaiveTime>,
    pub shift_name: String,
    pub is_holiday: bool,
}

/// The immutable closing record for an employee's timesheet period.
///
/// Unique per (employee, month, year); its existence *is* the CLOSED state.
/// Month is 0-based (January = 0), matching the external interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingRecord {
    pub employee_id: String,
    pub month: u32,
    pub year: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Snapshot balance at closing time, in minutes, fixed-point.
    pub balance: Decimal,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
}

/// Result of a closing-status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ClosingStatus {
    /// No closing record exists; the period is still editable.
    Open,
    /// The period is closed and the record's balance is authoritative.
    Closed(ClosingRecord),
}

impl ClosingStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, ClosingStatus::Closed(_))
    }
}

/// Weekly day-off pattern for automatic scale generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekPattern {
    /// Five work days, Saturday and Sunday off.
    #[serde(rename = "5x2")]
    FiveByTwo,
    /// Six work days, only Sunday off.
    #[serde(rename = "6x1")]
    SixByOne,
}

impl WeekPattern {
    pub fn is_day_off(self, weekday: Weekday) -> bool {
        match self {
            WeekPattern::FiveByTwo => matches!(weekday, Weekday::Sat | Weekday::Sun),
            WeekPattern::SixByOne => weekday == Weekday::Sun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_expected_minutes_same_day_shift() {
        let shift = ShiftType {
            id: 1,
            name: "Comercial".to_string(),
            start: t(8, 0),
            end: t(17, 0),
            break_minutes: 60,
        };
        assert!(!shift.is_overnight());
        assert_eq!(shift.expected_minutes(), 480);
    }

    #[test]
    fn test_expected_minutes_overnight_shift() {
        let shift = ShiftType {
            id: 2,
            name: "Noturno".to_string(),
            start: t(22, 0),
            end: t(6, 0),
            break_minutes: 60,
        };
        assert!(shift.is_overnight());
        // (1440 - 1320) + 360 - 60
        assert_eq!(shift.expected_minutes(), 420);
    }

    #[test]
    fn test_shift_label() {
        let shift = ShiftType {
            id: 1,
            name: "Morning".to_string(),
            start: t(8, 0),
            end: t(17, 0),
            break_minutes: 60,
        };
        assert_eq!(shift.label(), "Morning (08:00 - 17:00)");
    }

    #[test]
    fn test_week_pattern_days_off() {
        assert!(WeekPattern::FiveByTwo.is_day_off(Weekday::Sat));
        assert!(WeekPattern::FiveByTwo.is_day_off(Weekday::Sun));
        assert!(!WeekPattern::FiveByTwo.is_day_off(Weekday::Mon));

        assert!(WeekPattern::SixByOne.is_day_off(Weekday::Sun));
        assert!(!WeekPattern::SixByOne.is_day_off(Weekday::Sat));
    }

    #[test]
    fn test_status_priority_order() {
        let mut statuses = vec![
            DayStatus::DayOff,
            DayStatus::Ok,
            DayStatus::Extra,
            DayStatus::Missing,
            DayStatus::Delay,
            DayStatus::Absent,
        ];
        statuses.sort_by_key(|s| s.priority());
        assert_eq!(
            statuses,
            vec![
                DayStatus::Absent,
                DayStatus::Delay,
                DayStatus::Missing,
                DayStatus::Extra,
                DayStatus::Ok,
                DayStatus::DayOff,
            ]
        );
    }

    #[test]
    fn test_scale_date_normalization() {
        let late_evening = "2026-02-20T23:45:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            scale_date(late_evening),
            NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
        );
    }
}
