//! In-game clock: a day counter anchored to a calendar base date.

mod store;

pub use store::*;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Hour at which a fresh clock starts.
pub const DEFAULT_START_HOUR: u8 = 8;

/// Calendar date day 1 maps to when nothing else is configured.
pub fn default_base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Game time. Day numbering starts at 1; time never regresses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    pub base: NaiveDate,
    pub day: u32,
    pub hour: u8,
    pub minute: u8,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::start_of(default_base_date())
    }
}

impl GameClock {
    /// Day 1, 08:00 on the given base date.
    pub fn start_of(base: NaiveDate) -> Self {
        Self {
            base,
            day: 1,
            hour: DEFAULT_START_HOUR,
            minute: 0,
        }
    }

    /// Build a clock from unnormalized components.
    ///
    /// Minutes carry into hours and hours into days in both directions, so
    /// `-600` minutes from day 2 00:00 lands on day 1 14:00. The day is floored
    /// at 1 even when a negative carry would push it lower.
    pub fn normalized(base: NaiveDate, day: i64, hour: i64, minute: i64) -> Self {
        let hour = hour.saturating_add(minute.div_euclid(60));
        let minute = minute.rem_euclid(60);

        let day = day.saturating_add(hour.div_euclid(24));
        let hour = hour.rem_euclid(24);

        Self {
            base,
            day: day.clamp(1, u32::MAX as i64) as u32,
            hour: hour as u8,
            minute: minute as u8,
        }
    }

    /// Whether every field is in range.
    pub fn is_valid(&self) -> bool {
        self.day >= 1 && self.hour < 24 && self.minute < 60
    }

    /// Shift by a signed number of minutes.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self::normalized(
            self.base,
            self.day as i64,
            self.hour as i64,
            (self.minute as i64).saturating_add(minutes),
        )
    }

    /// Calendar timestamp: base date plus `day - 1` days at `hour:minute`.
    pub fn to_datetime(&self) -> NaiveDateTime {
        let date = self
            .base
            .checked_add_days(Days::new(u64::from(self.day.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX);
        let time = NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or_default();
        date.and_time(time)
    }

    /// ISO-8601 form of [`GameClock::to_datetime`].
    pub fn to_iso(&self) -> String {
        self.to_datetime().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Check if it's currently night.
    pub fn is_night(&self) -> bool {
        self.hour < 6 || self.hour >= 20
    }
}

impl std::fmt::Display for GameClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {}, {:02}:{:02}", self.day, self.hour, self.minute)
    }
}
