//! Daily counters and local-midnight arithmetic.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Counters shown in the control panel; zeroed at local midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounters {
    pub blocked_today: u64,
    pub focus_streak_minutes: u64,
}

impl DailyCounters {
    pub fn record_block(&mut self) -> u64 {
        self.blocked_today = self.blocked_today.saturating_add(1);
        self.blocked_today
    }

    pub fn add_focus_minutes(&mut self, minutes: u64) -> u64 {
        self.focus_streak_minutes = self.focus_streak_minutes.saturating_add(minutes);
        self.focus_streak_minutes
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn to_datetime<Tz: TimeZone>(tz: &Tz, now_ms: u64) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(i64::try_from(now_ms).ok()?).earliest()
}

/// Calendar date of `now_ms` in `tz`.
pub fn date_in<Tz: TimeZone>(tz: &Tz, now_ms: u64) -> Option<NaiveDate> {
    to_datetime(tz, now_ms).map(|dt| dt.date_naive())
}

/// Epoch ms of the next midnight in `tz` strictly after `now_ms`.
pub fn next_midnight_in<Tz: TimeZone>(tz: &Tz, now_ms: u64) -> u64 {
    let fallback = now_ms.saturating_add(DAY_MS);
    let Some(today) = date_in(tz, now_ms) else {
        return fallback;
    };
    let Some(midnight) = today
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
    else {
        return fallback;
    };
    // A DST gap can swallow midnight; take the earliest valid instant.
    tz.from_local_datetime(&midnight)
        .earliest()
        .and_then(|dt| u64::try_from(dt.timestamp_millis()).ok())
        .unwrap_or(fallback)
}

pub fn local_date(now_ms: u64) -> Option<NaiveDate> {
    date_in(&Local, now_ms)
}

pub fn next_local_midnight(now_ms: u64) -> u64 {
    next_midnight_in(&Local, now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    // 2024-03-15T13:20:00Z
    const NOON_ISH: u64 = 1_710_508_800_000;

    #[test]
    fn next_midnight_utc() {
        let next = next_midnight_in(&Utc, NOON_ISH);
        // 2024-03-16T00:00:00Z
        assert_eq!(next, 1_710_547_200_000);
        assert!(next > NOON_ISH);
    }

    #[test]
    fn next_midnight_respects_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let next = next_midnight_in(&tz, NOON_ISH);
        // 2024-03-16T00:00:00+02:00 == 2024-03-15T22:00:00Z
        assert_eq!(next, 1_710_540_000_000);
    }

    #[test]
    fn exactly_midnight_moves_to_following_day() {
        let midnight = 1_710_547_200_000;
        assert_eq!(next_midnight_in(&Utc, midnight), midnight + DAY_MS);
    }

    #[test]
    fn date_in_tracks_calendar_day() {
        assert_eq!(
            date_in(&Utc, NOON_ISH),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let mut counters = DailyCounters::default();
        assert_eq!(counters.record_block(), 1);
        assert_eq!(counters.record_block(), 2);
        assert_eq!(counters.add_focus_minutes(25), 25);
        counters.reset();
        assert_eq!(counters, DailyCounters::default());
    }
}
