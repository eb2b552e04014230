//! Notification scheduler
//!
//! Owns the proactive jobs and runs them on its own timeline. `tick` is the
//! unit of work: every due job advances and fires. `run` calls it on a fixed
//! polling interval for the life of the process.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::events::SessionEvent;

use super::actions::ProactiveActions;
use super::job::{Cadence, JobAction, ScheduledJob};

/// Timing of the stock jobs
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    /// Local time of the daily weather update
    pub daily_weather_at: NaiveTime,
    pub battery_every: Duration,
    pub news_every: Duration,
    /// Polling interval between ticks
    pub tick: StdDuration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            daily_weather_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            battery_every: Duration::minutes(5),
            news_every: Duration::hours(3),
            tick: StdDuration::from_secs(30),
        }
    }
}

pub struct NotificationScheduler {
    jobs: Vec<ScheduledJob>,
    actions: ProactiveActions,
    clock: Arc<dyn Clock>,
    tick: StdDuration,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl NotificationScheduler {
    /// Scheduler with the stock jobs, timed from the clock's current time
    pub fn new(
        settings: &ScheduleSettings,
        actions: ProactiveActions,
        clock: Arc<dyn Clock>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let start = clock.now();
        let jobs = vec![
            ScheduledJob::new(
                "daily-weather",
                Cadence::Daily(settings.daily_weather_at),
                JobAction::DailyWeather,
                start,
            ),
            ScheduledJob::new(
                "battery-check",
                Cadence::Every(settings.battery_every),
                JobAction::BatteryCheck,
                start,
            ),
            ScheduledJob::new(
                "news-digest",
                Cadence::Every(settings.news_every),
                JobAction::NewsDigest,
                start,
            ),
        ];

        for job in &jobs {
            info!(job = job.name, next_fire_at = %job.next_fire_at, "job scheduled");
        }

        Self {
            jobs,
            actions,
            clock,
            tick: settings.tick,
            event_tx,
        }
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    /// Fire every job due at `now`. Returns how many fired.
    pub async fn tick(&mut self, now: NaiveDateTime) -> usize {
        let mut fired = 0;
        for job in self.jobs.iter_mut().filter(|job| job.is_due(now)) {
            let scheduled = job.next_fire_at;
            job.advance(now);
            let outcome = self.actions.perform(job.action).await;
            fired += 1;

            info!(
                job = job.name,
                %scheduled,
                next_fire_at = %job.next_fire_at,
                ?outcome,
                "job fired"
            );
            let _ = self.event_tx.send(SessionEvent::JobFired {
                job: job.name.to_string(),
                outcome,
            });
        }
        fired
    }

    /// Poll forever
    pub async fn run(mut self) {
        info!(tick_secs = self.tick.as_secs(), "notification scheduler started");

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let now = self.clock.now();
            let fired = self.tick(now).await;
            if fired > 0 {
                debug!(fired, "scheduler tick");
            }
        }
    }
}
