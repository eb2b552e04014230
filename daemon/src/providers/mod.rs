//! External collaborators
//!
//! Every side effect the assistant relies on sits behind one of these narrow
//! traits: speech capture and playback, weather, battery, host load, news,
//! completion, encyclopedia lookups, video search and opening URLs. The
//! session loop and the scheduler only ever see the traits.

mod battery;
mod console;
mod http;
mod stats;
mod system;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub use battery::SysfsBattery;
pub use console::ConsoleSource;
pub use http::{client as http_client, NewsApi, OpenRouter, OpenWeather, Wikipedia, YouTube};
pub use stats::HostStats;
pub use system::{SystemBrowser, SystemVoice};

/// Errors reported by external collaborators
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("command failed: {0}")]
    Command(#[from] std::io::Error),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Yields the next transcribed phrase
#[async_trait]
pub trait UtteranceSource: Send {
    /// Block until a phrase is captured. Returns an empty string when nothing
    /// was recognised within `timeout_hint`.
    async fn next(&mut self, timeout_hint: Duration) -> String;
}

/// Audio and text halves of a spoken response
///
/// Callers go through [`crate::voice::Responder`], which decides from the
/// mode flags which half runs.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Play `text` aloud, returning once playback has finished
    async fn play(&self, text: &str) -> Result<(), ProviderError>;

    /// Print `text`
    fn echo(&self, text: &str);
}

/// Current conditions for a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temp_c: f64,
    pub description: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch current conditions. `None` asks the provider to locate the host.
    async fn fetch(&self, location: Option<&str>) -> Result<WeatherReport, ProviderError>;
}

/// Charge state of the host battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryStatus {
    pub percent: u8,
    pub plugged: bool,
}

#[async_trait]
pub trait BatteryProbe: Send + Sync {
    /// `None` when the host has no battery or it cannot be read
    async fn status(&self) -> Option<BatteryStatus>;
}

/// Host load as percentages
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemUsage {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub disk_percent: f32,
}

#[async_trait]
pub trait SystemStats: Send + Sync {
    /// `None` when the host cannot be sampled
    async fn usage(&self) -> Option<SystemUsage>;
}

/// Headline region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    India,
    Global,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Numbered headlines, most important first
    async fn headlines(&self, region: Region) -> Result<Vec<String>, ProviderError>;
}

#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn summary(&self, topic: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait VideoFinder: Send + Sync {
    /// URL of the first result, if any
    async fn first_video(&self, query: &str) -> Result<Option<String>, ProviderError>;
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), ProviderError>;
}

/// Collaborators shared by the dispatcher and the scheduler
#[derive(Clone)]
pub struct Services {
    pub battery: Arc<dyn BatteryProbe>,
    pub stats: Arc<dyn SystemStats>,
    pub news: Arc<dyn NewsProvider>,
    pub completion: Arc<dyn Completion>,
    pub encyclopedia: Arc<dyn Encyclopedia>,
    pub videos: Arc<dyn VideoFinder>,
    pub browser: Arc<dyn Browser>,
}
