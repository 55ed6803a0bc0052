//! Day/night schedule.
//!
//! Night is a fixed local-time window rather than a coin flip, so whether an
//! interaction counts as a night interaction is reproducible from its
//! timestamp alone.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Day,
    Night,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayCycle {
    /// When false every moment is day and no night interactions are recorded automatically.
    pub enabled: bool,
    /// Local hour (0-23) night begins.
    pub night_start_hour: u32,
    /// Local hour (0-23) night ends.
    pub night_end_hour: u32,
    /// Offset of local time from UTC.
    pub utc_offset_minutes: i32,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self {
            enabled: true,
            night_start_hour: 20,
            night_end_hour: 6,
            utc_offset_minutes: 0,
        }
    }
}

impl DayCycle {
    pub fn phase(&self, at: DateTime<Utc>) -> DayPhase {
        if !self.enabled || self.night_start_hour == self.night_end_hour {
            return DayPhase::Day;
        }
        let hour = (at + Duration::minutes(i64::from(self.utc_offset_minutes))).hour();
        let night = if self.night_start_hour < self.night_end_hour {
            self.night_start_hour <= hour && hour < self.night_end_hour
        } else {
            // Window wraps midnight.
            hour >= self.night_start_hour || hour < self.night_end_hour
        };
        if night {
            DayPhase::Night
        } else {
            DayPhase::Day
        }
    }

    pub fn is_night(&self, at: DateTime<Utc>) -> bool {
        self.phase(at) == DayPhase::Night
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err("day_cycle hours must be in 0..=23".to_string());
        }
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err("day_cycle.utc_offset_minutes must be within ±14h".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 30, 0).unwrap()
    }

    #[test]
    fn default_night_wraps_midnight() {
        let cycle = DayCycle::default();
        assert!(cycle.is_night(at(22)));
        assert!(cycle.is_night(at(0)));
        assert!(cycle.is_night(at(5)));
        assert!(!cycle.is_night(at(6)));
        assert!(!cycle.is_night(at(12)));
        assert!(cycle.is_night(at(20)));
    }

    #[test]
    fn non_wrapping_window() {
        let cycle = DayCycle {
            night_start_hour: 1,
            night_end_hour: 4,
            ..DayCycle::default()
        };
        assert!(cycle.is_night(at(2)));
        assert!(!cycle.is_night(at(4)));
        assert!(!cycle.is_night(at(23)));
    }

    #[test]
    fn offset_shifts_local_hour() {
        let cycle = DayCycle {
            utc_offset_minutes: -5 * 60,
            ..DayCycle::default()
        };
        // 03:30 UTC is 22:30 at UTC-5.
        assert!(cycle.is_night(at(3)));
        // 14:30 UTC is 09:30 local.
        assert!(!cycle.is_night(at(14)));
    }

    #[test]
    fn disabled_is_always_day() {
        let cycle = DayCycle {
            enabled: false,
            ..DayCycle::default()
        };
        assert_eq!(cycle.phase(at(23)), DayPhase::Day);
    }

    #[test]
    fn validate_rejects_bad_hours() {
        let cycle = DayCycle {
            night_start_hour: 24,
            ..DayCycle::default()
        };
        assert!(cycle.validate().is_err());
    }
}
