//! Attendance Service
//!
//! The attendance and time-balance engine: reconciles planned work scales
//! against raw clock punches, computes daily and period balances under the
//! organization's closing-day cycle, and enforces the irreversible monthly
//! closing workflow. Transport is the host's concern; this crate exposes the
//! operations as plain async functions over a pluggable store.

pub mod balance;
pub mod config;
pub mod cycle;
pub mod models;
pub mod mysql;
pub mod repository;
pub mod service;

pub use config::AttendanceConfig;
pub use cycle::{CycleRange, TimeSheet};
pub use models::{
    ClosingRecord, ClosingStatus, DailyResult, DayStatus, Employee, Holiday, PunchRecord,
    PunchSource, ScheduleEntry, ShiftType, WeekPattern,
};
pub use mysql::MySqlStore;
pub use repository::{AttendanceStore, InMemoryStore};
pub use service::{
    AttendanceService, BankEntry, OverviewEntry, ScaleAssignment, ServiceError,
};
