//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{Duration, NaiveTime};
use tracing::warn;

use crate::notify::ScheduleSettings;

/// Provider credentials, all optional; a missing key only disables that
/// provider
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openrouter: Option<String>,
    pub news: Option<String>,
    pub weather: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openrouter", &self.openrouter.is_some())
            .field("news", &self.news.is_some())
            .field("weather", &self.weather.is_some())
            .finish()
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Plain-text file holding the owner's name
    pub owner_file: PathBuf,

    /// Name the assistant answers to, lowercase
    pub assistant_name: String,

    /// Length of a bounded listening window
    pub awake_window: Duration,

    /// Timeout hint for each capture
    pub capture_timeout: StdDuration,

    /// Whether proactive jobs start enabled
    pub notifications_enabled: bool,

    /// Fixed weather location; `None` locates the host by IP
    pub weather_location: Option<String>,

    /// Text-to-speech program; `None` disables audio
    pub tts_command: Option<String>,

    /// Model used for completions
    pub completion_model: String,

    /// Timeout for every provider request
    pub http_timeout: StdDuration,

    pub schedule: ScheduleSettings,

    pub keys: ApiKeys,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        Ok(Self::from_lookup(&home, |key| std::env::var(key).ok()))
    }

    /// Build configuration from `home` and a variable lookup
    pub fn from_lookup(home: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = var("SKAI_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("skai")
        });
        let owner_file = data_dir.join("owner.txt");

        let tts_command = match var("SKAI_TTS") {
            Some(cmd) if cmd.eq_ignore_ascii_case("none") => None,
            Some(cmd) => Some(cmd),
            None => Some(default_tts().to_string()),
        };

        let notifications_enabled = match var("SKAI_NOTIFICATIONS") {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warn!(%raw, "invalid SKAI_NOTIFICATIONS, notifications stay off");
                false
            }),
            None => false,
        };

        let mut schedule = ScheduleSettings::default();
        if let Some(raw) = var("SKAI_DAILY_WEATHER_AT") {
            match NaiveTime::parse_from_str(&raw, "%H:%M") {
                Ok(at) => schedule.daily_weather_at = at,
                Err(e) => warn!(%raw, error = %e, "invalid SKAI_DAILY_WEATHER_AT, using default"),
            }
        }
        if let Some(mins) = positive(&var, "SKAI_BATTERY_EVERY_MINS") {
            schedule.battery_every = Duration::minutes(mins as i64);
        }
        if let Some(mins) = positive(&var, "SKAI_NEWS_EVERY_MINS") {
            schedule.news_every = Duration::minutes(mins as i64);
        }
        if let Some(secs) = positive(&var, "SKAI_TICK_SECS") {
            schedule.tick = StdDuration::from_secs(secs);
        }

        Self {
            owner_file,
            data_dir,
            assistant_name: var("SKAI_NAME")
                .map(|n| n.to_lowercase())
                .unwrap_or_else(|| "sky".to_string()),
            awake_window: Duration::seconds(600),
            capture_timeout: StdDuration::from_secs(8),
            notifications_enabled,
            weather_location: var("SKAI_WEATHER_LOCATION"),
            tts_command,
            completion_model: var("SKAI_MODEL")
                .unwrap_or_else(|| "tngtech/deepseek-r1t2-chimera:free".to_string()),
            http_timeout: StdDuration::from_secs(15),
            schedule,
            keys: ApiKeys {
                openrouter: var("OPENROUTER_API_KEY"),
                news: var("NEWS_API_KEY"),
                weather: var("WEATHER_API_KEY"),
            },
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn default_tts() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

/// Positive integer from `key`; anything else warns and yields `None`
fn positive(var: impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = var(key)?;
    match raw.parse::<u64>() {
        Ok(n) if n > 0 && n <= u32::MAX as u64 => Some(n),
        _ => {
            warn!(key, %raw, "expected a positive integer, using default");
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
