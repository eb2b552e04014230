//! Proactive actions fired by the scheduler
//!
//! Each action reads `notifications_enabled` itself and swallows its own
//! provider failures, so a broken collaborator only costs that cycle's output.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::events::Delivery;
use crate::providers::{BatteryProbe, BatteryStatus, NewsProvider, Region};
use crate::state::SharedFlags;
use crate::voice::Responder;
use crate::weather::WeatherCache;

use super::job::JobAction;

/// Alert below this charge when unplugged
pub const BATTERY_ALERT_PERCENT: u8 = 20;

/// Headlines read per region in the digest
const DIGEST_HEADLINES: usize = 3;

/// Whether a battery reading warrants an alert
pub fn needs_battery_alert(status: BatteryStatus) -> bool {
    status.percent < BATTERY_ALERT_PERCENT && !status.plugged
}

#[derive(Clone)]
pub struct ProactiveActions {
    flags: SharedFlags,
    responder: Responder,
    weather: Arc<WeatherCache>,
    battery: Arc<dyn BatteryProbe>,
    news: Arc<dyn NewsProvider>,
}

impl ProactiveActions {
    pub fn new(
        flags: SharedFlags,
        responder: Responder,
        weather: Arc<WeatherCache>,
        battery: Arc<dyn BatteryProbe>,
        news: Arc<dyn NewsProvider>,
    ) -> Self {
        Self {
            flags,
            responder,
            weather,
            battery,
            news,
        }
    }

    pub async fn perform(&self, action: JobAction) -> Delivery {
        if !self.flags.notifications_enabled() {
            debug!(?action, "notifications disabled, staying quiet");
            return Delivery::Suppressed;
        }

        match action {
            JobAction::DailyWeather => self.daily_weather().await,
            JobAction::BatteryCheck => self.battery_check().await,
            JobAction::NewsDigest => self.news_digest().await,
        }
    }

    async fn daily_weather(&self) -> Delivery {
        match self.weather.fresh_report().await {
            Ok(report) => {
                self.responder
                    .say(&format!(
                        "Good morning! Here's your daily weather update: {report}"
                    ))
                    .await;
                Delivery::Spoken
            }
            Err(e) => {
                warn!(error = %e, "skipping daily weather update");
                Delivery::Nothing
            }
        }
    }

    async fn battery_check(&self) -> Delivery {
        match self.battery.status().await {
            Some(status) if needs_battery_alert(status) => {
                self.responder
                    .say(&format!(
                        "Alert! Your battery is at {} percent. Please plug in your charger.",
                        status.percent
                    ))
                    .await;
                Delivery::Spoken
            }
            _ => Delivery::Nothing,
        }
    }

    async fn news_digest(&self) -> Delivery {
        let mut spoken = false;
        for (region, intro) in [
            (Region::India, "Here are the top 3 news updates from India:"),
            (Region::Global, "And here are the top 3 global headlines:"),
        ] {
            let headlines = match self.news.headlines(region).await {
                Ok(headlines) if !headlines.is_empty() => headlines,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, ?region, "skipping headlines in digest");
                    continue;
                }
            };
            self.responder.say(intro).await;
            for headline in headlines.iter().take(DIGEST_HEADLINES) {
                self.responder.say(headline).await;
            }
            spoken = true;
        }

        if spoken {
            Delivery::Spoken
        } else {
            Delivery::Nothing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::testing::Harness;

    fn battery(percent: u8, plugged: bool) -> Option<BatteryStatus> {
        Some(BatteryStatus { percent, plugged })
    }

    #[test]
    fn test_battery_predicate() {
        assert!(needs_battery_alert(BatteryStatus {
            percent: 19,
            plugged: false
        }));
        assert!(!needs_battery_alert(BatteryStatus {
            percent: 20,
            plugged: false
        }));
        assert!(!needs_battery_alert(BatteryStatus {
            percent: 5,
            plugged: true
        }));
    }

    #[tokio::test]
    async fn test_battery_alert_only_when_low_and_unplugged() {
        let h = Harness::new();
        h.flags.set_notifications_enabled(true);
        let actions = h.actions();

        for (reading, expected) in [
            (battery(50, false), Delivery::Nothing),
            (battery(20, false), Delivery::Nothing),
            (battery(10, true), Delivery::Nothing),
            (None, Delivery::Nothing),
            (battery(12, false), Delivery::Spoken),
        ] {
            h.battery.set(reading);
            assert_eq!(actions.perform(JobAction::BatteryCheck).await, expected);
        }
        assert_eq!(
            h.speech.echoed(),
            vec!["Alert! Your battery is at 12 percent. Please plug in your charger."]
        );
    }

    #[tokio::test]
    async fn test_disabled_notifications_suppress_everything() {
        let h = Harness::new();
        h.battery.set(battery(5, false));
        let actions = h.actions();

        for action in [
            JobAction::DailyWeather,
            JobAction::BatteryCheck,
            JobAction::NewsDigest,
        ] {
            assert_eq!(actions.perform(action).await, Delivery::Suppressed);
        }
        assert!(h.speech.echoed().is_empty());
        assert_eq!(h.weather.calls(), 0);
    }

    #[tokio::test]
    async fn test_daily_weather_skips_on_failure() {
        let h = Harness::new();
        h.flags.set_notifications_enabled(true);
        h.weather
            .fail_with(|| ProviderError::Malformed("timeout".into()));

        let delivery = h.actions().perform(JobAction::DailyWeather).await;
        assert_eq!(delivery, Delivery::Nothing);
        assert!(h.speech.echoed().is_empty());
    }

    #[tokio::test]
    async fn test_daily_weather_speaks_report() {
        let h = Harness::new();
        h.flags.set_notifications_enabled(true);
        h.actions().perform(JobAction::DailyWeather).await;
        assert_eq!(
            h.speech.echoed(),
            vec!["Good morning! Here's your daily weather update: Based on your location, the weather in Pune is 28.5°C with clear sky."]
        );
    }

    #[tokio::test]
    async fn test_news_digest_reads_three_per_region() {
        let h = Harness::new();
        h.flags.set_notifications_enabled(true);
        h.actions().perform(JobAction::NewsDigest).await;

        let echoed = h.speech.echoed();
        assert_eq!(echoed.len(), 2 * (1 + 3));
        assert_eq!(echoed[0], "Here are the top 3 news updates from India:");
        assert_eq!(echoed[4], "And here are the top 3 global headlines:");
    }

    #[tokio::test]
    async fn test_news_digest_survives_one_region_failing() {
        let h = Harness::new();
        h.flags.set_notifications_enabled(true);
        h.news.fail(Region::India);

        let delivery = h.actions().perform(JobAction::NewsDigest).await;
        assert_eq!(delivery, Delivery::Spoken);
        assert_eq!(
            h.speech.echoed()[0],
            "And here are the top 3 global headlines:"
        );
    }
}
