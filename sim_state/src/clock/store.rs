//! Persisted clock singleton.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use super::GameClock;
use crate::error::StateError;
use crate::storage::{keys, load_record, save_record, KeyValueStore};

/// Partial update for [`ClockStore::set`]. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockPatch {
    pub base: Option<NaiveDate>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
}

/// Reads and writes the game clock record.
#[derive(Clone)]
pub struct ClockStore {
    store: Rc<dyn KeyValueStore>,
    start: GameClock,
}

impl ClockStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self::with_start(store, GameClock::default())
    }

    /// Use `start` whenever the record is missing or corrupt.
    pub fn with_start(store: Rc<dyn KeyValueStore>, start: GameClock) -> Self {
        Self { store, start }
    }

    /// Current clock; falls back to the start clock on missing or corrupt state.
    pub fn get(&self) -> GameClock {
        match load_record::<GameClock>(self.store.as_ref(), keys::CLOCK) {
            Some(clock) if clock.is_valid() => clock,
            Some(clock) => {
                tracing::warn!(?clock, "Clock record out of range, using start clock");
                self.start
            }
            None => self.start,
        }
    }

    fn save(&self, clock: GameClock) -> GameClock {
        save_record(self.store.as_ref(), keys::CLOCK, &clock);
        clock
    }

    /// Apply a validated patch. Any out-of-range field rejects the whole patch.
    pub fn set(&self, patch: ClockPatch) -> Result<GameClock, StateError> {
        let mut clock = self.get();

        if let Some(day) = patch.day {
            check_range("day", day, 1, u32::MAX as i64)?;
        }
        if let Some(hour) = patch.hour {
            check_range("hour", hour, 0, 23)?;
        }
        if let Some(minute) = patch.minute {
            check_range("minute", minute, 0, 59)?;
        }

        if let Some(base) = patch.base {
            clock.base = base;
        }
        if let Some(day) = patch.day {
            clock.day = day as u32;
        }
        if let Some(hour) = patch.hour {
            clock.hour = hour as u8;
        }
        if let Some(minute) = patch.minute {
            clock.minute = minute as u8;
        }

        Ok(self.save(clock))
    }

    pub fn advance_minutes(&self, minutes: i64) -> GameClock {
        let clock = self.get().plus_minutes(minutes);
        self.save(clock)
    }

    pub fn advance_hours(&self, hours: i64) -> GameClock {
        self.advance_minutes(hours.saturating_mul(60))
    }

    pub fn advance_days(&self, days: i64) -> GameClock {
        self.advance_minutes(days.saturating_mul(24 * 60))
    }

    pub fn set_day_hour(&self, day: i64, hour: i64, minute: i64) -> Result<GameClock, StateError> {
        self.set(ClockPatch {
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            ..Default::default()
        })
    }

    pub fn set_base_date(&self, base: NaiveDate) -> GameClock {
        let mut clock = self.get();
        clock.base = base;
        self.save(clock)
    }

    /// Back to the start clock.
    pub fn reset(&self) -> GameClock {
        self.save(self.start)
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), StateError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(StateError::OutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn setup() -> (Rc<MemoryStore>, ClockStore) {
        let kv = Rc::new(MemoryStore::new());
        let clocks = ClockStore::new(kv.clone());
        (kv, clocks)
    }

    #[test]
    fn test_get_defaults_to_day_one_morning() {
        let (_, clocks) = setup();
        let clock = clocks.get();
        assert_eq!((clock.day, clock.hour, clock.minute), (1, 8, 0));
    }

    #[test]
    fn test_corrupt_record_recovers() {
        let (kv, clocks) = setup();
        kv.set(keys::CLOCK, "garbage".to_string());
        assert_eq!(clocks.get(), GameClock::default());

        kv.set(
            keys::CLOCK,
            r#"{"base":"2025-01-01","day":0,"hour":8,"minute":0}"#.to_string(),
        );
        assert_eq!(clocks.get(), GameClock::default());
    }

    #[test]
    fn test_advance_minutes_persists() {
        let (_, clocks) = setup();
        clocks.set_day_hour(1, 8, 30).unwrap();

        let clock = clocks.advance_minutes(60);
        assert_eq!((clock.day, clock.hour, clock.minute), (1, 9, 30));
        assert_eq!(clocks.get(), clock);
    }

    #[test]
    fn test_advance_backwards_across_day() {
        let (_, clocks) = setup();
        clocks.set_day_hour(2, 0, 0).unwrap();

        let clock = clocks.advance_minutes(-600);
        assert_eq!((clock.day, clock.hour, clock.minute), (1, 14, 0));
    }

    #[test]
    fn test_advance_hours_and_days() {
        let (_, clocks) = setup();
        clocks.advance_hours(20);
        let clock = clocks.advance_days(2);
        assert_eq!((clock.day, clock.hour), (4, 4));
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let (_, clocks) = setup();
        let before = clocks.get();

        let err = clocks.set_day_hour(3, 24, 0).unwrap_err();
        assert_eq!(
            err,
            StateError::OutOfRange {
                field: "hour",
                value: 24
            }
        );
        assert_eq!(clocks.get(), before);
        assert!(clocks.set_day_hour(0, 8, 0).is_err());
    }

    #[test]
    fn test_set_partial_patch() {
        let (_, clocks) = setup();
        let clock = clocks
            .set(ClockPatch {
                minute: Some(45),
                ..Default::default()
            })
            .unwrap();
        assert_eq!((clock.day, clock.hour, clock.minute), (1, 8, 45));
    }

    #[test]
    fn test_set_base_date_and_reset() {
        let (_, clocks) = setup();
        let base = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        clocks.advance_days(4);

        let clock = clocks.set_base_date(base);
        assert_eq!(clock.base, base);
        assert_eq!(clock.day, 5);
        assert_eq!(clock.to_iso(), "2030-06-05T08:00:00");

        assert_eq!(clocks.reset(), GameClock::default());
    }

    #[test]
    fn test_custom_start_clock() {
        let kv = Rc::new(MemoryStore::new());
        let base = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let clocks = ClockStore::with_start(kv, GameClock::start_of(base));
        assert_eq!(clocks.get().base, base);
    }
}
