use {
    chrono::{DateTime, Timelike, Utc},
    chrono_tz::Tz,
    ekitten_config::ActiveHoursConfig,
};

use crate::error::{Error, Result};

/// Hour-of-day window `start_hour <= h < end_hour` in a fixed timezone.
///
/// A window with `start_hour > end_hour` wraps past midnight (e.g. 22–6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    start_hour: u32,
    end_hour: u32,
    tz: Tz,
}

impl ActiveHours {
    pub fn new(start_hour: u32, end_hour: u32, tz: Tz) -> Self {
        Self {
            start_hour,
            end_hour,
            tz,
        }
    }

    pub fn from_config(config: &ActiveHoursConfig) -> Result<Self> {
        let tz = config
            .timezone
            .parse::<Tz>()
            .map_err(|_| Error::unknown_timezone(&config.timezone))?;
        Ok(Self::new(config.start_hour, config.end_hour, tz))
    }

    /// Hour of `at` in the window's timezone.
    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        at.with_timezone(&self.tz).hour()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let hour = self.local_hour(at);
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}
