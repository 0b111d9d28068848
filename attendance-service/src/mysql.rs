//! MySQL-backed attendance store
//!
//! sqlx implementation of the repository traits over the shared connection
//! pool. Multi-row writes run inside a transaction; the closing insert
//! relies on the table's composite unique key for its one-shot guarantee.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE shift_type (
//!     id            BIGINT PRIMARY KEY,
//!     name          VARCHAR(64) NOT NULL,
//!     start_time    TIME NOT NULL,
//!     end_time      TIME NOT NULL,
//!     break_minutes INT NOT NULL DEFAULT 0
//! );
//! CREATE TABLE work_scale (
//!     employee_id VARCHAR(36) NOT NULL,
//!     scale_date  DATE NOT NULL,
//!     shift_id    BIGINT NULL,
//!     PRIMARY KEY (employee_id, scale_date)
//! );
//! CREATE TABLE time_record (
//!     employee_id   VARCHAR(36) NOT NULL,
//!     record_date   DATE NOT NULL,
//!     record_time   TIME NOT NULL,
//!     source        VARCHAR(16) NOT NULL,
//!     justification TEXT NULL,
//!     KEY idx_time_record_day (employee_id, record_date)
//! );
//! CREATE TABLE holiday (
//!     holiday_date DATE PRIMARY KEY,
//!     name         VARCHAR(128) NOT NULL
//! );
//! CREATE TABLE employee (
//!     id         VARCHAR(36) PRIMARY KEY,
//!     name       VARCHAR(128) NOT NULL,
//!     company_id VARCHAR(36) NULL,
//!     active     BOOLEAN NOT NULL DEFAULT TRUE
//! );
//! CREATE TABLE timesheet_closing (
//!     employee_id  VARCHAR(36) NOT NULL,
//!     month        INT NOT NULL,  -- 0-based, January = 0
//!     year         INT NOT NULL,
//!     period_start DATE NOT NULL,
//!     period_end   DATE NOT NULL,
//!     balance      DECIMAL(12, 2) NOT NULL,
//!     closed_by    VARCHAR(36) NOT NULL,
//!     closed_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
//!     PRIMARY KEY (employee_id, month, year)
//! );
//! ```

use chrono::{NaiveDate, Utc};
use db::DbPool;
use error::DatabaseError;
use sqlx::mysql::MySqlRow;
use sqlx::Row;

use crate::models::{
    ClosingRecord, Employee, Holiday, PunchRecord, PunchSource, ScheduleEntry, ShiftType,
};
use crate::repository::{
    ClosingRepository, EmployeeRepository, HolidayRepository, PunchRepository, ScaleRepository,
    ShiftRepository,
};

/// Attendance store backed by MySQL.
pub struct MySqlStore {
    pool: DbPool,
}

impl MySqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn query_err(e: sqlx::Error) -> DatabaseError {
    DatabaseError::QueryFailed(e.to_string())
}

fn tx_err(e: sqlx::Error) -> DatabaseError {
    DatabaseError::TransactionFailed(e.to_string())
}

fn scale_from_row(row: &MySqlRow) -> Result<ScheduleEntry, DatabaseError> {
    Ok(ScheduleEntry {
        employee_id: row.try_get("employee_id").map_err(query_err)?,
        date: row.try_get("scale_date").map_err(query_err)?,
        shift_id: row.try_get("shift_id").map_err(query_err)?,
    })
}

fn punch_from_row(row: &MySqlRow) -> Result<PunchRecord, DatabaseError> {
    let source: String = row.try_get("source").map_err(query_err)?;
    Ok(PunchRecord {
        employee_id: row.try_get("employee_id").map_err(query_err)?,
        date: row.try_get("record_date").map_err(query_err)?,
        time: row.try_get("record_time").map_err(query_err)?,
        source: PunchSource::from_db(&source),
        justification: row.try_get("justification").map_err(query_err)?,
    })
}

fn shift_from_row(row: &MySqlRow) -> Result<ShiftType, DatabaseError> {
    Ok(ShiftType {
        id: row.try_get("id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        start: row.try_get("start_time").map_err(query_err)?,
        end: row.try_get("end_time").map_err(query_err)?,
        break_minutes: row.try_get::<i32, _>("break_minutes").map_err(query_err)? as i64,
    })
}

fn closing_from_row(row: &MySqlRow) -> Result<ClosingRecord, DatabaseError> {
    Ok(ClosingRecord {
        employee_id: row.try_get("employee_id").map_err(query_err)?,
        month: row.try_get::<i32, _>("month").map_err(query_err)? as u32,
        year: row.try_get("year").map_err(query_err)?,
        period_start: row.try_get("period_start").map_err(query_err)?,
        period_end: row.try_get("period_end").map_err(query_err)?,
        balance: row.try_get("balance").map_err(query_err)?,
        closed_by: row.try_get("closed_by").map_err(query_err)?,
        closed_at: row.try_get("closed_at").map_err(query_err)?,
    })
}

fn employee_from_row(row: &MySqlRow) -> Result<Employee, DatabaseError> {
    Ok(Employee {
        id: row.try_get("id").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        company_id: row.try_get("company_id").map_err(query_err)?,
        active: row.try_get("active").map_err(query_err)?,
    })
}

impl ScaleRepository for MySqlStore {
    async fn find_scale(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ScheduleEntry>, DatabaseError> {
        let row = sqlx::query(
            "SELECT employee_id, scale_date, shift_id FROM work_scale \
             WHERE employee_id = ? AND scale_date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.as_ref().map(scale_from_row).transpose()
    }

    async fn scales_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, DatabaseError> {
        let rows = match employee_id {
            Some(id) => {
                sqlx::query(
                    "SELECT employee_id, scale_date, shift_id FROM work_scale \
                     WHERE employee_id = ? AND scale_date BETWEEN ? AND ?",
                )
                .bind(id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT employee_id, scale_date, shift_id FROM work_scale \
                     WHERE scale_date BETWEEN ? AND ?",
                )
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(query_err)?;

        rows.iter().map(scale_from_row).collect()
    }

    async fn upsert_scale(&self, entry: &ScheduleEntry) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO work_scale (employee_id, scale_date, shift_id) VALUES (?, ?, ?) \
             ON DUPLICATE KEY UPDATE shift_id = VALUES(shift_id)",
        )
        .bind(&entry.employee_id)
        .bind(entry.date)
        .bind(entry.shift_id)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn upsert_scales(&self, entries: &[ScheduleEntry]) -> Result<u32, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(tx_err)?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO work_scale (employee_id, scale_date, shift_id) VALUES (?, ?, ?) \
                 ON DUPLICATE KEY UPDATE shift_id = VALUES(shift_id)",
            )
            .bind(&entry.employee_id)
            .bind(entry.date)
            .bind(entry.shift_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_err)?;
        }
        tx.commit().await.map_err(tx_err)?;
        Ok(entries.len() as u32)
    }
}

impl PunchRepository for MySqlStore {
    async fn punches_for_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT employee_id, record_date, record_time, source, justification \
             FROM time_record WHERE employee_id = ? AND record_date = ? \
             ORDER BY record_time",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.iter().map(punch_from_row).collect()
    }

    async fn punches_in_range(
        &self,
        employee_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PunchRecord>, DatabaseError> {
        let rows = match employee_id {
            Some(id) => {
                sqlx::query(
                    "SELECT employee_id, record_date, record_time, source, justification \
                     FROM time_record WHERE employee_id = ? AND record_date BETWEEN ? AND ? \
                     ORDER BY record_date, record_time",
                )
                .bind(id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT employee_id, record_date, record_time, source, justification \
                     FROM time_record WHERE record_date BETWEEN ? AND ? \
                     ORDER BY record_date, record_time",
                )
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(query_err)?;

        rows.iter().map(punch_from_row).collect()
    }

    async fn replace_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
        punches: &[PunchRecord],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(tx_err)?;
        sqlx::query("DELETE FROM time_record WHERE employee_id = ? AND record_date = ?")
            .bind(employee_id)
            .bind(date)
            .execute(&mut *tx)
            .await
            .map_err(tx_err)?;
        for punch in punches {
            sqlx::query(
                "INSERT INTO time_record \
                 (employee_id, record_date, record_time, source, justification) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&punch.employee_id)
            .bind(punch.date)
            .bind(punch.time)
            .bind(punch.source.as_db())
            .bind(&punch.justification)
            .execute(&mut *tx)
            .await
            .map_err(tx_err)?;
        }
        tx.commit().await.map_err(tx_err)?;
        Ok(())
    }
}

impl HolidayRepository for MySqlStore {
    async fn holidays_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Holiday>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT holiday_date, name FROM holiday WHERE holiday_date BETWEEN ? AND ?",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                Ok(Holiday {
                    date: row.try_get("holiday_date").map_err(query_err)?,
                    name: row.try_get("name").map_err(query_err)?,
                })
            })
            .collect()
    }
}

impl ShiftRepository for MySqlStore {
    async fn find_shift(&self, id: i64) -> Result<Option<ShiftType>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, name, start_time, end_time, break_minutes FROM shift_type WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.as_ref().map(shift_from_row).transpose()
    }

    async fn shift_catalog(&self) -> Result<Vec<ShiftType>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT id, name, start_time, end_time, break_minutes FROM shift_type ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.iter().map(shift_from_row).collect()
    }
}

impl ClosingRepository for MySqlStore {
    async fn find_closing(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<ClosingRecord>, DatabaseError> {
        let row = sqlx::query(
            "SELECT employee_id, month, year, period_start, period_end, balance, \
             closed_by, closed_at \
             FROM timesheet_closing WHERE employee_id = ? AND month = ? AND year = ?",
        )
        .bind(employee_id)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.as_ref().map(closing_from_row).transpose()
    }

    async fn create_closing(&self, record: &ClosingRecord) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO timesheet_closing \
             (employee_id, month, year, period_start, period_end, balance, closed_by, closed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.employee_id)
        .bind(record.month)
        .bind(record.year)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(record.balance)
        .bind(&record.closed_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The primary key on (employee_id, month, year) is the one-shot
            // gate; a lost race surfaces here as a duplicate.
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                tracing::warn!(
                    "Rejected duplicate closing for {} {}/{}",
                    record.employee_id,
                    record.month,
                    record.year
                );
                Err(DatabaseError::DuplicateEntry(format!(
                    "closing {}/{}/{}",
                    record.employee_id, record.month, record.year
                )))
            }
            Err(e) => Err(query_err(e)),
        }
    }
}

impl EmployeeRepository for MySqlStore {
    async fn active_employees(
        &self,
        company_id: Option<&str>,
    ) -> Result<Vec<Employee>, DatabaseError> {
        let rows = match company_id {
            Some(company) => {
                sqlx::query(
                    "SELECT id, name, company_id, active FROM employee \
                     WHERE active = TRUE AND company_id = ? ORDER BY name",
                )
                .bind(company)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, name, company_id, active FROM employee \
                     WHERE active = TRUE ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(query_err)?;

        rows.iter().map(employee_from_row).collect()
    }
}
