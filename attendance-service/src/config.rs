use serde::{Deserialize, Serialize};

use crate::cycle::FULL_MONTH_THRESHOLD;

/// Attendance engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// Day of month (1-31) on which timesheet cycles close. Values of 28 or
    /// higher select the full calendar month; lower values produce the
    /// split-month cycle (closing day 20 means 21st through the 20th).
    pub closing_day: u32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self { closing_day: 20 }
    }
}

impl AttendanceConfig {
    /// Create configuration from environment variables. An unset or invalid
    /// `CLOSING_DAY` falls back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(day) = std::env::var("CLOSING_DAY") {
            if let Ok(n) = day.parse() {
                if (1..=31).contains(&n) {
                    config.closing_day = n;
                }
            }
        }

        config
    }

    /// Whether cycles coincide with full calendar months.
    pub fn uses_full_month(&self) -> bool {
        self.closing_day >= FULL_MONTH_THRESHOLD
    }
}
