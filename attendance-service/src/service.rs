//! Attendance service
//!
//! Business operations over the attendance store: timesheets, the daily
//! overview, the bank of hours, schedule editing, manual punch adjustment
//! and the one-way closing workflow. Months are 0-based throughout
//! (January = 0), matching the host application's convention.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use error::{AppError, DatabaseError};

use crate::balance::calculate_day;
use crate::config::AttendanceConfig;
use crate::cycle::{self, build_time_sheet, CycleRange, TimeSheet};
use crate::models::{
    ClosingRecord, ClosingStatus, DailyResult, PunchRecord, PunchSource, ScheduleEntry, ShiftType,
    WeekPattern,
};
use crate::repository::AttendanceStore;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Shift {0} not found")]
    ShiftNotFound(i64),

    #[error("Timesheet for employee {employee_id} is already closed for period {month}/{year}")]
    AlreadyClosed {
        employee_id: String,
        month: u32,
        year: i32,
    },

    #[error("Cannot modify {date} for employee {employee_id}: the covering period is closed")]
    PeriodClosed {
        employee_id: String,
        date: NaiveDate,
    },

    #[error("No schedule or punch data to close for employee {employee_id} in period {month}/{year}")]
    NothingToClose {
        employee_id: String,
        month: u32,
        year: i32,
    },

    #[error("Source week starting {0} has no schedule entries")]
    EmptySourceWeek(NaiveDate),

    #[error("Repository error: {0}")]
    Repository(#[from] DatabaseError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(_) | ServiceError::EmptySourceWeek(_) => {
                AppError::Validation(message)
            }
            ServiceError::AlreadyClosed { .. } | ServiceError::PeriodClosed { .. } => {
                AppError::Conflict(message)
            }
            ServiceError::ShiftNotFound(_) | ServiceError::NothingToClose { .. } => {
                AppError::NotFound(message)
            }
            ServiceError::Repository(db) => AppError::Database(db),
        }
    }
}

/// One cell of a batch scale write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleAssignment {
    pub employee_id: String,
    pub date: NaiveDate,
    /// `None` assigns a day off.
    pub shift_id: Option<i64>,
}

/// One row of the daily overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewEntry {
    pub employee_id: String,
    pub employee_name: String,
    pub result: DailyResult,
}

/// One row of the bank-of-hours report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    pub employee_id: String,
    pub employee_name: String,
    pub balance_minutes: i64,
}

/// Attendance engine operations over a store.
pub struct AttendanceService<S> {
    store: S,
    config: AttendanceConfig,
}

impl<S: AttendanceStore> AttendanceService<S> {
    pub fn new(store: S, config: AttendanceConfig) -> Self {
        Self { store, config }
    }

    fn resolve(&self, month0: u32, year: i32) -> Result<CycleRange, ServiceError> {
        cycle::resolve_cycle(self.config.closing_day, month0, year).ok_or_else(|| {
            ServiceError::Validation(format!("invalid period {month0}/{year}"))
        })
    }

    async fn shift_map(&self) -> Result<HashMap<i64, ShiftType>, ServiceError> {
        Ok(self
            .store
            .shift_catalog()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect())
    }

    /// Reject writes into a period that already has a closing record.
    async fn ensure_open(&self, employee_id: &str, date: NaiveDate) -> Result<(), ServiceError> {
        let (month, year) = cycle::period_for_date(self.config.closing_day, date);
        if self.store.find_closing(employee_id, month, year).await?.is_some() {
            return Err(ServiceError::PeriodClosed {
                employee_id: employee_id.to_string(),
                date,
            });
        }
        Ok(())
    }

    /// Full timesheet for an employee's cycle, with today's date taken from
    /// the wall clock.
    pub async fn time_sheet(
        &self,
        employee_id: &str,
        month0: u32,
        year: i32,
    ) -> Result<TimeSheet, ServiceError> {
        self.time_sheet_as_of(employee_id, month0, year, Utc::now().date_naive())
            .await
    }

    /// Deterministic variant of [`time_sheet`](Self::time_sheet): the
    /// `today` cutoff for the running total is an explicit input.
    pub async fn time_sheet_as_of(
        &self,
        employee_id: &str,
        month0: u32,
        year: i32,
        today: NaiveDate,
    ) -> Result<TimeSheet, ServiceError> {
        let range = self.resolve(month0, year)?;

        // One bulk load per store, then a pure per-day pass.
        let scales = self
            .store
            .scales_in_range(Some(employee_id), range.start, range.end)
            .await?;
        let punches = self
            .store
            .punches_in_range(Some(employee_id), range.start, range.end)
            .await?;
        let holidays = self.store.holidays_in_range(range.start, range.end).await?;
        let shifts = self.shift_map().await?;

        Ok(build_time_sheet(
            employee_id,
            range,
            &scales,
            &punches,
            &holidays,
            &shifts,
            today,
        ))
    }

    /// Ad-hoc single-day query; fetches the day's data by key and runs the
    /// daily calculator on it.
    pub async fn daily_result(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<DailyResult, ServiceError> {
        let scale = self.store.find_scale(employee_id, date).await?;
        let shift = match scale.and_then(|s| s.shift_id) {
            Some(id) => self.store.find_shift(id).await?,
            None => None,
        };
        let punches = self.store.punches_for_day(employee_id, date).await?;
        let times: Vec<NaiveTime> = punches.iter().map(|p| p.time).collect();
        let holidays: HashSet<NaiveDate> = self
            .store
            .holidays_in_range(date, date)
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();

        Ok(calculate_day(date, shift.as_ref(), &times, &holidays))
    }

    /// Roster-wide snapshot of one date, most actionable statuses first.
    pub async fn daily_overview(
        &self,
        date: NaiveDate,
        company_id: Option<&str>,
    ) -> Result<Vec<OverviewEntry>, ServiceError> {
        let employees = self.store.active_employees(company_id).await?;
        let scales = self.store.scales_in_range(None, date, date).await?;
        let punches = self.store.punches_in_range(None, date, date).await?;
        let holidays: HashSet<NaiveDate> = self
            .store
            .holidays_in_range(date, date)
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();
        let shifts = self.shift_map().await?;

        let scale_by_employee: HashMap<&str, &ScheduleEntry> = scales
            .iter()
            .map(|s| (s.employee_id.as_str(), s))
            .collect();
        let mut punches_by_employee: HashMap<&str, Vec<NaiveTime>> = HashMap::new();
        for punch in &punches {
            punches_by_employee
                .entry(punch.employee_id.as_str())
                .or_default()
                .push(punch.time);
        }
        for times in punches_by_employee.values_mut() {
            times.sort_unstable();
        }

        let mut entries: Vec<OverviewEntry> = employees
            .iter()
            .map(|employee| {
                let shift = scale_by_employee
                    .get(employee.id.as_str())
                    .and_then(|s| s.shift_id)
                    .and_then(|id| shifts.get(&id));
                let times = punches_by_employee
                    .get(employee.id.as_str())
                    .map_or(&[][..], Vec::as_slice);
                OverviewEntry {
                    employee_id: employee.id.clone(),
                    employee_name: employee.name.clone(),
                    result: calculate_day(date, shift, times, &holidays),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.result
                .status
                .priority()
                .cmp(&b.result.status.priority())
                .then_with(|| a.employee_name.cmp(&b.employee_name))
        });
        Ok(entries)
    }

    /// Bank of hours for the cycle: every active employee's period balance,
    /// deepest deficit first.
    pub async fn bank_overview(
        &self,
        month0: u32,
        year: i32,
    ) -> Result<Vec<BankEntry>, ServiceError> {
        self.bank_overview_as_of(month0, year, Utc::now().date_naive())
            .await
    }

    pub async fn bank_overview_as_of(
        &self,
        month0: u32,
        year: i32,
        today: NaiveDate,
    ) -> Result<Vec<BankEntry>, ServiceError> {
        let range = self.resolve(month0, year)?;
        let employees = self.store.active_employees(None).await?;
        let scales = self.store.scales_in_range(None, range.start, range.end).await?;
        let punches = self
            .store
            .punches_in_range(None, range.start, range.end)
            .await?;
        let holidays = self.store.holidays_in_range(range.start, range.end).await?;
        let shifts = self.shift_map().await?;

        let mut entries: Vec<BankEntry> = employees
            .iter()
            .map(|employee| {
                let sheet = build_time_sheet(
                    &employee.id,
                    range,
                    &scales,
                    &punches,
                    &holidays,
                    &shifts,
                    today,
                );
                BankEntry {
                    employee_id: employee.id.clone(),
                    employee_name: employee.name.clone(),
                    balance_minutes: sheet.total_balance_minutes,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.balance_minutes
                .cmp(&b.balance_minutes)
                .then_with(|| a.employee_name.cmp(&b.employee_name))
        });
        Ok(entries)
    }

    /// Replace a day's punch list by hand. The whole list is swapped in one
    /// atomic step and every punch is stamped with the justification.
    pub async fn adjust_time_records(
        &self,
        employee_id: &str,
        date: NaiveDate,
        times: &[NaiveTime],
        justification: &str,
    ) -> Result<(), ServiceError> {
        let justification = justification.trim();
        if justification.is_empty() {
            return Err(ServiceError::Validation(
                "a justification is required for manual punch adjustment".to_string(),
            ));
        }
        if times.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ServiceError::Validation(
                "punches must be in chronological order".to_string(),
            ));
        }
        self.ensure_open(employee_id, date).await?;

        let records: Vec<PunchRecord> = times
            .iter()
            .map(|&time| PunchRecord {
                employee_id: employee_id.to_string(),
                date,
                time,
                source: PunchSource::Manual,
                justification: Some(justification.to_string()),
            })
            .collect();
        self.store.replace_day(employee_id, date, &records).await?;

        tracing::info!(
            "Replaced {} punches for {} on {}",
            records.len(),
            employee_id,
            date
        );
        Ok(())
    }

    /// Upsert a single scale cell. `shift_id = None` assigns a day off.
    pub async fn save_work_scale(
        &self,
        employee_id: &str,
        date: NaiveDate,
        shift_id: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(id) = shift_id {
            if self.store.find_shift(id).await?.is_none() {
                return Err(ServiceError::ShiftNotFound(id));
            }
        }
        self.ensure_open(employee_id, date).await?;

        self.store
            .upsert_scale(&ScheduleEntry {
                employee_id: employee_id.to_string(),
                date,
                shift_id,
            })
            .await?;
        Ok(())
    }

    /// Atomic batch scale write: all cells land or none do.
    pub async fn save_work_scales(
        &self,
        assignments: &[ScaleAssignment],
    ) -> Result<u32, ServiceError> {
        if assignments.is_empty() {
            return Err(ServiceError::Validation(
                "batch scale save requires at least one entry".to_string(),
            ));
        }

        let shift_ids: HashSet<i64> = assignments.iter().filter_map(|a| a.shift_id).collect();
        for id in shift_ids {
            if self.store.find_shift(id).await?.is_none() {
                return Err(ServiceError::ShiftNotFound(id));
            }
        }
        self.ensure_all_open(assignments.iter().map(|a| (a.employee_id.as_str(), a.date)))
            .await?;

        let entries: Vec<ScheduleEntry> = assignments
            .iter()
            .map(|a| ScheduleEntry {
                employee_id: a.employee_id.clone(),
                date: a.date,
                shift_id: a.shift_id,
            })
            .collect();
        Ok(self.store.upsert_scales(&entries).await?)
    }

    /// Copy the prior week's assignments forward by exactly 7 days,
    /// optionally restricted to a subset of employees. Fails when the source
    /// week is empty.
    pub async fn clone_weekly_scale(
        &self,
        target_week_start: NaiveDate,
        employee_ids: Option<&[String]>,
    ) -> Result<u32, ServiceError> {
        let source_start = target_week_start - Duration::days(7);
        let source_end = target_week_start - Duration::days(1);

        let mut source = self
            .store
            .scales_in_range(None, source_start, source_end)
            .await?;
        if let Some(ids) = employee_ids {
            source.retain(|s| ids.contains(&s.employee_id));
        }
        if source.is_empty() {
            return Err(ServiceError::EmptySourceWeek(source_start));
        }

        let entries: Vec<ScheduleEntry> = source
            .into_iter()
            .map(|s| ScheduleEntry {
                date: s.date + Duration::days(7),
                ..s
            })
            .collect();
        self.ensure_all_open(entries.iter().map(|e| (e.employee_id.as_str(), e.date)))
            .await?;

        let count = self.store.upsert_scales(&entries).await?;
        tracing::info!(
            "Cloned {} scale entries into week starting {}",
            count,
            target_week_start
        );
        Ok(count)
    }

    /// Fill a week with a default shift for a set of employees, laying out
    /// days off from the weekly pattern (5x2: Sat+Sun off; 6x1: Sun off).
    pub async fn generate_automatic_scale(
        &self,
        week_start: NaiveDate,
        employee_ids: &[String],
        shift_id: i64,
        pattern: WeekPattern,
    ) -> Result<u32, ServiceError> {
        if employee_ids.is_empty() {
            return Err(ServiceError::Validation(
                "automatic scale generation requires at least one employee".to_string(),
            ));
        }
        if self.store.find_shift(shift_id).await?.is_none() {
            return Err(ServiceError::ShiftNotFound(shift_id));
        }

        let mut entries = Vec::with_capacity(employee_ids.len() * 7);
        for employee_id in employee_ids {
            for offset in 0..7 {
                let date = week_start + Duration::days(offset);
                let assigned = if pattern.is_day_off(date.weekday()) {
                    None
                } else {
                    Some(shift_id)
                };
                entries.push(ScheduleEntry {
                    employee_id: employee_id.clone(),
                    date,
                    shift_id: assigned,
                });
            }
        }
        self.ensure_all_open(entries.iter().map(|e| (e.employee_id.as_str(), e.date)))
            .await?;

        Ok(self.store.upsert_scales(&entries).await?)
    }

    /// Close an employee's timesheet period: a one-way gate. Fails when the
    /// period is already closed or has no underlying data at all.
    pub async fn close_time_sheet(
        &self,
        employee_id: &str,
        month0: u32,
        year: i32,
        balance: Decimal,
        closed_by: &str,
    ) -> Result<ClosingRecord, ServiceError> {
        let range = self.resolve(month0, year)?;

        if self.store.find_closing(employee_id, month0, year).await?.is_some() {
            return Err(ServiceError::AlreadyClosed {
                employee_id: employee_id.to_string(),
                month: month0,
                year,
            });
        }

        let scales = self
            .store
            .scales_in_range(Some(employee_id), range.start, range.end)
            .await?;
        let punches = self
            .store
            .punches_in_range(Some(employee_id), range.start, range.end)
            .await?;
        if scales.is_empty() && punches.is_empty() {
            return Err(ServiceError::NothingToClose {
                employee_id: employee_id.to_string(),
                month: month0,
                year,
            });
        }

        let record = ClosingRecord {
            employee_id: employee_id.to_string(),
            month: month0,
            year,
            period_start: range.start,
            period_end: range.end,
            balance,
            closed_by: closed_by.to_string(),
            closed_at: Utc::now(),
        };
        match self.store.create_closing(&record).await {
            Ok(()) => {
                tracing::info!(
                    "Closed period {}/{} for {} with balance {}",
                    month0,
                    year,
                    employee_id,
                    balance
                );
                Ok(record)
            }
            // Lost a race against a concurrent close; the winner's record
            // stands.
            Err(e) if e.is_duplicate() => Err(ServiceError::AlreadyClosed {
                employee_id: employee_id.to_string(),
                month: month0,
                year,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a period is open or closed, with the record when closed.
    pub async fn closing_status(
        &self,
        employee_id: &str,
        month0: u32,
        year: i32,
    ) -> Result<ClosingStatus, ServiceError> {
        Ok(match self.store.find_closing(employee_id, month0, year).await? {
            Some(record) => ClosingStatus::Closed(record),
            None => ClosingStatus::Open,
        })
    }

    /// Run the closed-period guard once per distinct (employee, period) in a
    /// batch write.
    async fn ensure_all_open<'a>(
        &self,
        keys: impl Iterator<Item = (&'a str, NaiveDate)>,
    ) -> Result<(), ServiceError> {
        let mut seen: HashSet<(String, u32, i32)> = HashSet::new();
        for (employee_id, date) in keys {
            let (month, year) = cycle::period_for_date(self.config.closing_day, date);
            if seen.insert((employee_id.to_string(), month, year)) {
                self.ensure_open(employee_id, date).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayStatus, Employee, Holiday, ShiftType};
    use crate::repository::InMemoryStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn service() -> AttendanceService<InMemoryStore> {
        let store = InMemoryStore::new();
        store.add_shift(ShiftType {
            id: 1,
            name: "Commercial".to_string(),
            start: t(8, 0),
            end: t(17, 0),
            break_minutes: 60,
        });
        store.add_employee(Employee {
            id: "E1".to_string(),
            name: "Ana".to_string(),
            company_id: Some("C1".to_string()),
            active: true,
        });
        store.add_employee(Employee {
            id: "E2".to_string(),
            name: "Bruno".to_string(),
            company_id: Some("C1".to_string()),
            active: true,
        });
        AttendanceService::new(store, AttendanceConfig { closing_day: 20 })
    }

    #[tokio::test]
    async fn test_adjust_requires_justification() {
        let svc = service();
        let result = svc
            .adjust_time_records("E1", d(2026, 2, 2), &[t(8, 0), t(17, 0)], "   ")
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_adjust_rejects_unordered_punches() {
        let svc = service();
        let result = svc
            .adjust_time_records("E1", d(2026, 2, 2), &[t(17, 0), t(8, 0)], "badge lost")
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_time_sheet_covers_split_cycle() {
        let svc = service();
        svc.save_work_scale("E1", d(2026, 2, 2), Some(1)).await.unwrap();
        svc.adjust_time_records(
            "E1",
            d(2026, 2, 2),
            &[t(8, 0), t(12, 0), t(13, 0), t(17, 0)],
            "import",
        )
        .await
        .unwrap();

        let sheet = svc
            .time_sheet_as_of("E1", 1, 2026, d(2026, 2, 10))
            .await
            .unwrap();
        assert_eq!(sheet.start, d(2026, 1, 21));
        assert_eq!(sheet.end, d(2026, 2, 20));
        assert_eq!(sheet.days.len(), 31);

        // Dates ascend and the worked day computed as OK.
        assert!(sheet.days.windows(2).all(|w| w[0].date < w[1].date));
        let worked_day = sheet.days.iter().find(|r| r.date == d(2026, 2, 2)).unwrap();
        assert_eq!(worked_day.status, DayStatus::Ok);
        assert_eq!(worked_day.balance_minutes, 0);
        assert_eq!(sheet.total_balance_minutes, 0);
    }

    #[tokio::test]
    async fn test_daily_result_self_fetches() {
        let svc = service();
        svc.save_work_scale("E1", d(2026, 2, 2), Some(1)).await.unwrap();
        svc.adjust_time_records(
            "E1",
            d(2026, 2, 2),
            &[t(8, 25), t(12, 5), t(13, 10), t(16, 45)],
            "terminal offline",
        )
        .await
        .unwrap();

        let result = svc.daily_result("E1", d(2026, 2, 2)).await.unwrap();
        assert_eq!(result.status, DayStatus::Delay);
        assert_eq!(result.balance_minutes, -25);
    }

    #[tokio::test]
    async fn test_close_is_one_shot() {
        let svc = service();
        svc.save_work_scale("E1", d(2026, 2, 2), Some(1)).await.unwrap();

        let record = svc
            .close_time_sheet("E1", 1, 2026, Decimal::from(-25), "manager-1")
            .await
            .unwrap();
        assert_eq!(record.period_start, d(2026, 1, 21));
        assert_eq!(record.period_end, d(2026, 2, 20));

        let second = svc
            .close_time_sheet("E1", 1, 2026, Decimal::ZERO, "manager-2")
            .await;
        assert!(matches!(second, Err(ServiceError::AlreadyClosed { .. })));

        let status = svc.closing_status("E1", 1, 2026).await.unwrap();
        match status {
            ClosingStatus::Closed(kept) => assert_eq!(kept.closed_by, "manager-1"),
            ClosingStatus::Open => panic!("period should be closed"),
        }
    }

    #[tokio::test]
    async fn test_close_without_data_fails() {
        let svc = service();
        let result = svc
            .close_time_sheet("E1", 1, 2026, Decimal::ZERO, "manager-1")
            .await;
        assert!(matches!(result, Err(ServiceError::NothingToClose { .. })));

        let status = svc.closing_status("E1", 1, 2026).await.unwrap();
        assert!(!status.is_closed());
    }

    #[tokio::test]
    async fn test_closed_period_rejects_edits() {
        let svc = service();
        svc.save_work_scale("E1", d(2026, 2, 2), Some(1)).await.unwrap();
        svc.close_time_sheet("E1", 1, 2026, Decimal::ZERO, "manager-1")
            .await
            .unwrap();

        let scale_edit = svc.save_work_scale("E1", d(2026, 2, 10), Some(1)).await;
        assert!(matches!(scale_edit, Err(ServiceError::PeriodClosed { .. })));

        let punch_edit = svc
            .adjust_time_records("E1", d(2026, 2, 10), &[t(8, 0), t(17, 0)], "late import")
            .await;
        assert!(matches!(punch_edit, Err(ServiceError::PeriodClosed { .. })));

        // A date past the closing day belongs to the next period and stays
        // editable.
        svc.save_work_scale("E1", d(2026, 2, 25), Some(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_work_scale_rejects_unknown_shift() {
        let svc = service();
        let result = svc.save_work_scale("E1", d(2026, 2, 2), Some(99)).await;
        assert!(matches!(result, Err(ServiceError::ShiftNotFound(99))));
    }

    #[tokio::test]
    async fn test_batch_scale_save() {
        let svc = service();
        let assignments: Vec<ScaleAssignment> = (2..=6)
            .map(|day| ScaleAssignment {
                employee_id: "E1".to_string(),
                date: d(2026, 3, day),
                shift_id: Some(1),
            })
            .collect();

        let count = svc.save_work_scales(&assignments).await.unwrap();
        assert_eq!(count, 5);

        let empty = svc.save_work_scales(&[]).await;
        assert!(matches!(empty, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_clone_weekly_scale() {
        let svc = service();
        // Source week: Monday 2026-03-02 through Sunday 2026-03-08.
        for day in 2..=6 {
            svc.save_work_scale("E1", d(2026, 3, day), Some(1)).await.unwrap();
        }

        let count = svc.clone_weekly_scale(d(2026, 3, 9), None).await.unwrap();
        assert_eq!(count, 5);

        let copied = svc.daily_result("E1", d(2026, 3, 9)).await.unwrap();
        assert_eq!(copied.expected_minutes, 480);
    }

    #[tokio::test]
    async fn test_clone_rejects_empty_source_week() {
        let svc = service();
        let result = svc.clone_weekly_scale(d(2026, 3, 9), None).await;
        assert!(matches!(result, Err(ServiceError::EmptySourceWeek(_))));
    }

    #[tokio::test]
    async fn test_clone_filters_by_employee() {
        let svc = service();
        svc.save_work_scale("E1", d(2026, 3, 2), Some(1)).await.unwrap();
        svc.save_work_scale("E2", d(2026, 3, 2), Some(1)).await.unwrap();

        let only_e2 = vec!["E2".to_string()];
        let count = svc
            .clone_weekly_scale(d(2026, 3, 9), Some(&only_e2))
            .await
            .unwrap();
        assert_eq!(count, 1);

        let e1_next_week = svc.daily_result("E1", d(2026, 3, 9)).await.unwrap();
        assert_eq!(e1_next_week.status, DayStatus::DayOff);
    }

    #[tokio::test]
    async fn test_generate_automatic_scale_five_by_two() {
        let svc = service();
        // Monday 2026-03-02.
        let employees = vec!["E1".to_string()];
        let count = svc
            .generate_automatic_scale(d(2026, 3, 2), &employees, 1, WeekPattern::FiveByTwo)
            .await
            .unwrap();
        assert_eq!(count, 7);

        let monday = svc.daily_result("E1", d(2026, 3, 2)).await.unwrap();
        assert_eq!(monday.expected_minutes, 480);
        // Saturday and Sunday are explicit days off.
        let saturday = svc.daily_result("E1", d(2026, 3, 7)).await.unwrap();
        assert_eq!(saturday.status, DayStatus::DayOff);
        let sunday = svc.daily_result("E1", d(2026, 3, 8)).await.unwrap();
        assert_eq!(sunday.status, DayStatus::DayOff);
    }

    #[tokio::test]
    async fn test_generate_automatic_scale_six_by_one() {
        let svc = service();
        let employees = vec!["E1".to_string()];
        svc.generate_automatic_scale(d(2026, 3, 2), &employees, 1, WeekPattern::SixByOne)
            .await
            .unwrap();

        let saturday = svc.daily_result("E1", d(2026, 3, 7)).await.unwrap();
        assert_eq!(saturday.expected_minutes, 480);
        let sunday = svc.daily_result("E1", d(2026, 3, 8)).await.unwrap();
        assert_eq!(sunday.status, DayStatus::DayOff);
    }

    #[tokio::test]
    async fn test_daily_overview_priority_order() {
        let svc = service();
        let date = d(2026, 3, 2);
        // Ana scheduled and present, Bruno scheduled but absent.
        svc.save_work_scale("E1", date, Some(1)).await.unwrap();
        svc.save_work_scale("E2", date, Some(1)).await.unwrap();
        svc.adjust_time_records("E1", date, &[t(8, 0), t(12, 0), t(13, 0), t(17, 0)], "import")
            .await
            .unwrap();

        let overview = svc.daily_overview(date, None).await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].employee_id, "E2");
        assert_eq!(overview[0].result.status, DayStatus::Absent);
        assert_eq!(overview[1].employee_id, "E1");
        assert_eq!(overview[1].result.status, DayStatus::Ok);
    }

    #[tokio::test]
    async fn test_daily_overview_company_filter() {
        let svc = service();
        let overview = svc
            .daily_overview(d(2026, 3, 2), Some("C2"))
            .await
            .unwrap();
        assert!(overview.is_empty());
    }

    #[tokio::test]
    async fn test_bank_overview_sorts_deficit_first() {
        let svc = service();
        // Both scheduled on 2026-02-02; Ana works the full day, Bruno is
        // absent and ends the cycle in deficit.
        svc.save_work_scale("E1", d(2026, 2, 2), Some(1)).await.unwrap();
        svc.save_work_scale("E2", d(2026, 2, 2), Some(1)).await.unwrap();
        svc.adjust_time_records(
            "E1",
            d(2026, 2, 2),
            &[t(8, 0), t(12, 0), t(13, 0), t(17, 0)],
            "import",
        )
        .await
        .unwrap();

        let bank = svc.bank_overview_as_of(1, 2026, d(2026, 2, 10)).await.unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].employee_id, "E2");
        assert_eq!(bank[0].balance_minutes, -480);
        assert_eq!(bank[1].employee_id, "E1");
        assert_eq!(bank[1].balance_minutes, 0);
    }

    #[tokio::test]
    async fn test_holiday_marked_in_time_sheet() {
        let store = InMemoryStore::new();
        store.add_holiday(Holiday {
            date: d(2026, 2, 17),
            name: "Carnival".to_string(),
        });
        store.add_employee(Employee {
            id: "E1".to_string(),
            name: "Ana".to_string(),
            company_id: None,
            active: true,
        });
        let svc = AttendanceService::new(store, AttendanceConfig { closing_day: 20 });

        let sheet = svc
            .time_sheet_as_of("E1", 1, 2026, d(2026, 3, 1))
            .await
            .unwrap();
        let holiday = sheet.days.iter().find(|r| r.date == d(2026, 2, 17)).unwrap();
        assert!(holiday.is_holiday);
    }
}
