//! Database utilities and connection pooling for the attendance services.
//!
//! Provides MySQL connection pool management using sqlx. The schema itself
//! (scales, time records, holidays, closings) is owned by the consuming
//! service crate.

mod config;
mod pool;

pub use config::DbConfig;
pub use pool::{create_pool, health_check, DbPool};

// Re-export sqlx types for convenience
pub use sqlx::{self, MySql, Row};
