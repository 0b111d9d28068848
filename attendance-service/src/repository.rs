//! Attendance repositories
//!
//! Store contracts for the engine, one trait per concern, plus an in-memory
//! implementation for tests and development. Identities are natural
//! composite keys (employee + date, employee + month + year); all writes
//! against a composite key are upserts, and multi-row writes are atomic.

use std::sync::RwLock;

use chrono::{NaiveDate, Utc};
use error::DatabaseError;

use crate::models::{
    ClosingRecord, Employee, Holiday, PunchRecord, ScheduleEntry, ShiftType,
};

/// Work-scale store: one optional shift per (employee, date).
#[allow(async_fn_in_trait)]
pub trait ScaleRepository: Send + Sync {
    async fn find_scale(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ScheduleEntry>, DatabaseError>;

    /// Range scan, optionally restricted to one employee.
    async fn scales_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, DatabaseError>;

    async fn upsert_scale(&self, entry: &ScheduleEntry) -> Result<(), DatabaseError>;

    /// Atomic batch upsert: either every entry lands or none do.
    async fn upsert_scales(&self, entries: &[ScheduleEntry]) -> Result<u32, DatabaseError>;
}

/// Punch ledger: ordered raw clock events per (employee, date).
#[allow(async_fn_in_trait)]
pub trait PunchRepository: Send + Sync {
    async fn punches_for_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError>;

    /// Range scan, optionally restricted to one employee.
    async fn punches_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError>;

    /// Replace a day's punch list wholesale (delete-then-reinsert in one
    /// atomic step). Partial edits are not offered: a manually adjusted day
    /// must stay internally consistent with its justification.
    async fn replace_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
        punches: &[PunchRecord],
    ) -> Result<(), DatabaseError>;
}

/// Holiday calendar, read-only for this engine.
#[allow(async_fn_in_trait)]
pub trait HolidayRepository: Send + Sync {
    async fn holidays_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Holiday>, DatabaseError>;
}

/// Shift catalog.
#[allow(async_fn_in_trait)]
pub trait ShiftRepository: Send + Sync {
    async fn find_shift(&self, id: i64) -> Result<Option<ShiftType>, DatabaseError>;

    async fn shift_catalog(&self) -> Result<Vec<ShiftType>, DatabaseError>;
}

/// Closing ledger: the engine's only immutable persisted artifact.
#[allow(async_fn_in_trait)]
pub trait ClosingRepository: Send + Sync {
    async fn find_closing(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<ClosingRecord>, DatabaseError>;

    /// Insert a closing record. Fails with [`DatabaseError::DuplicateEntry`]
    /// when a record for (employee, month, year) already exists; the
    /// uniqueness guarantee belongs to the store, never to an application
    /// mutex, so two concurrent closes yield exactly one success.
    async fn create_closing(&self, record: &ClosingRecord) -> Result<(), DatabaseError>;
}

/// Active-employee roster for the aggregate reporters.
#[allow(async_fn_in_trait)]
pub trait EmployeeRepository: Send + Sync {
    /// Active employees, optionally filtered to one company.
    async fn active_employees(
        &self,
        company_id: Option<&str>,
    ) -> Result<Vec<Employee>, DatabaseError>;
}

/// Everything the engine needs from persistence, as one bound.
pub trait AttendanceStore:
    ScaleRepository
    + PunchRepository
    + HolidayRepository
    + ShiftRepository
    + ClosingRepository
    + EmployeeRepository
{
}

impl<T> AttendanceStore for T where
    T: ScaleRepository
        + PunchRepository
        + HolidayRepository
        + ShiftRepository
        + ClosingRepository
        + EmployeeRepository
{
}

/// In-memory store for testing and development.
///
/// Each table sits behind its own `RwLock`; every multi-row operation takes
/// a single write lock, which is what makes it atomic.
#[derive(Default)]
pub struct InMemoryStore {
    shifts: RwLock<Vec<ShiftType>>,
    employees: RwLock<Vec<Employee>>,
    scales: RwLock<Vec<ScheduleEntry>>,
    punches: RwLock<Vec<PunchRecord>>,
    holidays: RwLock<Vec<Holiday>>,
    closings: RwLock<Vec<ClosingRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shift(&self, shift: ShiftType) {
        self.shifts.write().unwrap().push(shift);
    }

    pub fn add_employee(&self, employee: Employee) {
        self.employees.write().unwrap().push(employee);
    }

    pub fn add_holiday(&self, holiday: Holiday) {
        self.holidays.write().unwrap().push(holiday);
    }
}

impl ScaleRepository for InMemoryStore {
    async fn find_scale(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ScheduleEntry>, DatabaseError> {
        let scales = self.scales.read().unwrap();
        Ok(scales
            .iter()
            .find(|s| s.employee_id == employee_id && s.date == date)
            .cloned())
    }

    async fn scales_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, DatabaseError> {
        let scales = self.scales.read().unwrap();
        Ok(scales
            .iter()
            .filter(|s| {
                s.date >= start
                    && s.date <= end
                    && employee_id.map_or(true, |id| s.employee_id == id)
            })
            .cloned()
            .collect())
    }

    async fn upsert_scale(&self, entry: &ScheduleEntry) -> Result<(), DatabaseError> {
        let mut scales = self.scales.write().unwrap();
        upsert_scale_locked(&mut scales, entry);
        Ok(())
    }

    async fn upsert_scales(&self, entries: &[ScheduleEntry]) -> Result<u32, DatabaseError> {
        let mut scales = self.scales.write().unwrap();
        for entry in entries {
            upsert_scale_locked(&mut scales, entry);
        }
        Ok(entries.len() as u32)
    }
}

fn upsert_scale_locked(scales: &mut Vec<ScheduleEntry>, entry: &ScheduleEntry) {
    match scales
        .iter_mut()
        .find(|s| s.employee_id == entry.employee_id && s.date == entry.date)
    {
        Some(existing) => existing.shift_id = entry.shift_id,
        None => scales.push(entry.clone()),
    }
}

impl PunchRepository for InMemoryStore {
    async fn punches_for_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError> {
        let punches = self.punches.read().unwrap();
        let mut day: Vec<PunchRecord> = punches
            .iter()
            .filter(|p| p.employee_id == employee_id && p.date == date)
            .cloned()
            .collect();
        day.sort_by_key(|p| p.time);
        Ok(day)
    }

    async fn punches_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError> {
        let punches = self.punches.read().unwrap();
        Ok(punches
            .iter()
            .filter(|p| {
                p.date >= start
                    && p.date <= end
                    && employee_id.map_or(true, |id| p.employee_id == id)
            })
            .cloned()
            .collect())
    }

    async fn replace_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
        new_punches: &[PunchRecord],
    ) -> Result<(), DatabaseError> {
        let mut punches = self.punches.write().unwrap();
        punches.retain(|p| !(p.employee_id == employee_id && p.date == date));
        punches.extend_from_slice(new_punches);
        Ok(())
    }
}

impl HolidayRepository for InMemoryStore {
    async fn holidays_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Holiday>, DatabaseError> {
        let holidays = self.holidays.read().unwrap();
        Ok(holidays
            .iter()
            .filter(|h| h.date >= start && h.date <= end)
            .cloned()
            .collect())
    }
}

impl ShiftRepository for InMemoryStore {
    async fn find_shift(&self, id: i64) -> Result<Option<ShiftType>, DatabaseError> {
        let shifts = self.shifts.read().unwrap();
        Ok(shifts.iter().find(|s| s.id == id).cloned())
    }

    async fn shift_catalog(&self) -> Result<Vec<ShiftType>, DatabaseError> {
        Ok(self.shifts.read().unwrap().clone())
    }
}

impl ClosingRepository for InMemoryStore {
    async fn find_closing(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<ClosingRecord>, DatabaseError> {
        let closings = self.closings.read().unwrap();
        Ok(closings
            .iter()
            .find(|c| c.employee_id == employee_id && c.month == month && c.year == year)
            .cloned())
    }

    async fn create_closing(&self, record: &ClosingRecord) -> Result<(), DatabaseError> {
        // Check-and-insert under one write lock mirrors the unique key the
        // SQL store enforces.
        let mut closings = self.closings.write().unwrap();
        if closings.iter().any(|c| {
            c.employee_id == record.employee_id && c.month == record.month && c.year == record.year
        }) {
            return Err(DatabaseError::DuplicateEntry(format!(
                "closing {}/{}/{}",
                record.employee_id, record.month, record.year
            )));
        }
        let mut record = record.clone();
        record.closed_at = Utc::now();
        closings.push(record);
        Ok(())
    }
}

impl EmployeeRepository for InMemoryStore {
    async fn active_employees(
        &self,
        company_id: Option<&str>,
    ) -> Result<Vec<Employee>, DatabaseError> {
        let employees = self.employees.read().unwrap();
        Ok(employees
            .iter()
            .filter(|e| e.active && company_id.map_or(true, |c| e.company_id.as_deref() == Some(c)))
            .cloned()
            .collect())
    }
}
