//! Single-slot weather cache
//!
//! Shared by the `weather` command and the daily proactive job. A report is
//! reused while younger than the freshness window; a failed refresh leaves
//! the previous entry untouched and is retried on the next call.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::providers::{ProviderError, WeatherProvider, WeatherReport};

/// Default freshness window
pub const WEATHER_TTL_SECS: i64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather provider rejected the lookup: {0}")]
    Rejected(String),

    #[error("weather lookup failed: {0}")]
    Unavailable(#[source] ProviderError),
}

impl WeatherError {
    /// Fixed user-facing apology for this failure
    pub fn apology(&self) -> &'static str {
        match self {
            WeatherError::Rejected(_) => "I couldn't fetch the weather for your location right now.",
            WeatherError::Unavailable(_) => "I couldn't check the weather right now.",
        }
    }
}

impl From<ProviderError> for WeatherError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Rejected(msg) => WeatherError::Rejected(msg),
            other => WeatherError::Unavailable(other),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    last_report: Option<String>,
    last_fetched_at: Option<NaiveDateTime>,
}

pub struct WeatherCache {
    provider: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
    location: Option<String>,
    ttl: Duration,
    slot: Mutex<Slot>,
}

impl WeatherCache {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        clock: Arc<dyn Clock>,
        location: Option<String>,
    ) -> Self {
        Self {
            provider,
            clock,
            location,
            ttl: Duration::seconds(WEATHER_TTL_SECS),
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Report for the interactive command; failures become an apology
    pub async fn report(&self) -> String {
        match self.fresh_report().await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "weather lookup failed");
                e.apology().to_string()
            }
        }
    }

    /// Cached report if still fresh, otherwise a new fetch
    pub async fn fresh_report(&self) -> Result<String, WeatherError> {
        if let Some(report) = self.cached(self.clock.now()) {
            debug!("weather served from cache");
            return Ok(report);
        }

        // The lock is not held across the fetch
        let report = self.provider.fetch(self.location.as_deref()).await?;
        let text = describe(&report);

        let mut slot = self.slot.lock();
        slot.last_report = Some(text.clone());
        slot.last_fetched_at = Some(self.clock.now());
        Ok(text)
    }

    fn cached(&self, now: NaiveDateTime) -> Option<String> {
        let slot = self.slot.lock();
        match (&slot.last_report, slot.last_fetched_at) {
            (Some(report), Some(at)) if now - at < self.ttl => Some(report.clone()),
            _ => None,
        }
    }
}

fn describe(report: &WeatherReport) -> String {
    format!(
        "Based on your location, the weather in {} is {}°C with {}.",
        report.city, report.temp_c, report.description
    )
}
