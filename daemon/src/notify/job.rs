//! Scheduled job definitions

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// When a job recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every day at a fixed local time
    Daily(NaiveTime),
    /// At a fixed interval from the previous scheduled time
    Every(Duration),
}

impl Cadence {
    fn period(&self) -> Duration {
        match self {
            Cadence::Daily(_) => Duration::days(1),
            Cadence::Every(interval) => *interval,
        }
    }

    /// First fire time strictly after `start`
    pub fn first_after(&self, start: NaiveDateTime) -> NaiveDateTime {
        match self {
            Cadence::Daily(at) => {
                let today = start.date().and_time(*at);
                if today > start {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
            Cadence::Every(interval) => start + *interval,
        }
    }

    /// Next fire time after `scheduled` has fired at `now`
    ///
    /// Steps from the scheduled time, not from `now`, so late ticks do not
    /// accumulate drift. Periods missed entirely (host asleep) are skipped.
    pub fn advance(&self, scheduled: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
        let period = self.period();
        if period <= Duration::zero() {
            return now + Duration::minutes(1);
        }
        let mut next = scheduled + period;
        while next <= now {
            next += period;
        }
        next
    }
}

/// Proactive action a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    DailyWeather,
    BatteryCheck,
    NewsDigest,
}

#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub name: &'static str,
    pub next_fire_at: NaiveDateTime,
    pub cadence: Cadence,
    pub action: JobAction,
}

impl ScheduledJob {
    pub fn new(
        name: &'static str,
        cadence: Cadence,
        action: JobAction,
        start: NaiveDateTime,
    ) -> Self {
        Self {
            name,
            next_fire_at: cadence.first_after(start),
            cadence,
            action,
        }
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_fire_at <= now
    }

    /// Move `next_fire_at` past `now`
    pub fn advance(&mut self, now: NaiveDateTime) {
        self.next_fire_at = self.cadence.advance(self.next_fire_at, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_first_fire_today_or_tomorrow() {
        let daily = Cadence::Daily(eight());
        assert_eq!(daily.first_after(at(7, 30, 0)), at(8, 0, 0));
        assert_eq!(
            daily.first_after(at(8, 0, 0)),
            at(8, 0, 0) + Duration::days(1)
        );
        assert_eq!(
            daily.first_after(at(21, 0, 0)),
            at(8, 0, 0) + Duration::days(1)
        );
    }

    #[test]
    fn test_interval_advances_from_scheduled_time() {
        let every = Cadence::Every(Duration::minutes(5));
        // Fired 40 seconds late
        let next = every.advance(at(9, 5, 0), at(9, 5, 40));
        assert_eq!(next, at(9, 10, 0));
    }

    #[test]
    fn test_daily_advances_to_same_time_next_day() {
        let daily = Cadence::Daily(eight());
        let next = daily.advance(at(8, 0, 0), at(8, 0, 30));
        assert_eq!(next, at(8, 0, 0) + Duration::days(1));
    }

    #[test]
    fn test_missed_periods_are_skipped_in_phase() {
        let every = Cadence::Every(Duration::minutes(5));
        let next = every.advance(at(9, 5, 0), at(9, 23, 0));
        assert_eq!(next, at(9, 25, 0));
    }

    #[test]
    fn test_job_due() {
        let mut job = ScheduledJob::new(
            "battery-check",
            Cadence::Every(Duration::minutes(5)),
            JobAction::BatteryCheck,
            at(9, 0, 0),
        );
        assert_eq!(job.next_fire_at, at(9, 5, 0));
        assert!(!job.is_due(at(9, 4, 59)));
        assert!(job.is_due(at(9, 5, 0)));
        job.advance(at(9, 5, 0));
        assert_eq!(job.next_fire_at, at(9, 10, 0));
    }
}
