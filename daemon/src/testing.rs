//! Scripted collaborators for unit tests

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::commands::CommandDispatcher;
use crate::notify::ProactiveActions;
use crate::providers::{
    BatteryProbe, BatteryStatus, Browser, Completion, Encyclopedia, NewsProvider, ProviderError,
    Region, Services, SpeechOutput, SystemStats, SystemUsage, UtteranceSource, VideoFinder,
    WeatherProvider, WeatherReport,
};
use crate::state::SharedFlags;
use crate::voice::Responder;
use crate::weather::WeatherCache;

type ErrorFactory = Box<dyn Fn() -> ProviderError + Send + Sync>;

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// 2025-01-15 (a Wednesday) at `hour:minute`
    pub fn at(hour: u32, minute: u32) -> Arc<Self> {
        let now = NaiveDate::from_ymd_opt(2025, 1, 15)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid test time");
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        ManualClock::now(self)
    }
}

/// Replays a fixed list of phrases, then yields empty strings
#[derive(Clone)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedSource {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.iter().map(|s| s.to_string()).collect())),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl UtteranceSource for ScriptedSource {
    async fn next(&mut self, _timeout_hint: StdDuration) -> String {
        self.script.lock().pop_front().unwrap_or_default()
    }
}

/// Records what would have been played and printed
#[derive(Default)]
pub struct RecordingSpeech {
    played: Mutex<Vec<String>>,
    echoed: Mutex<Vec<String>>,
    fail_playback: bool,
}

impl RecordingSpeech {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_playback: true,
            ..Self::default()
        })
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }

    pub fn echoed(&self) -> Vec<String> {
        self.echoed.lock().clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn play(&self, text: &str) -> Result<(), ProviderError> {
        if self.fail_playback {
            return Err(ProviderError::Rejected("no audio device".into()));
        }
        self.played.lock().push(text.to_string());
        Ok(())
    }

    fn echo(&self, text: &str) {
        self.echoed.lock().push(text.to_string());
    }
}

/// Weather provider counting its calls
pub struct FakeWeather {
    calls: AtomicUsize,
    failure: Mutex<Option<ErrorFactory>>,
}

impl FakeWeather {
    pub fn sunny() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, make: impl Fn() -> ProviderError + Send + Sync + 'static) {
        *self.failure.lock() = Some(Box::new(make));
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch(&self, location: Option<&str>) -> Result<WeatherReport, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make) = self.failure.lock().as_ref() {
            return Err(make());
        }
        Ok(WeatherReport {
            city: location.unwrap_or("your location").to_string(),
            temp_c: 28.5,
            description: "clear sky".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeBattery {
    status: Mutex<Option<BatteryStatus>>,
}

impl FakeBattery {
    pub fn set(&self, status: Option<BatteryStatus>) {
        *self.status.lock() = status;
    }
}

#[async_trait]
impl BatteryProbe for FakeBattery {
    async fn status(&self) -> Option<BatteryStatus> {
        *self.status.lock()
    }
}

#[derive(Default)]
pub struct FakeStats {
    usage: Mutex<Option<SystemUsage>>,
}

impl FakeStats {
    pub fn set(&self, usage: Option<SystemUsage>) {
        *self.usage.lock() = usage;
    }
}

#[async_trait]
impl SystemStats for FakeStats {
    async fn usage(&self) -> Option<SystemUsage> {
        *self.usage.lock()
    }
}

/// Five numbered headlines per region unless told to fail
#[derive(Default)]
pub struct FakeNews {
    failing: Mutex<HashSet<Region>>,
}

impl FakeNews {
    pub fn fail(&self, region: Region) {
        self.failing.lock().insert(region);
    }
}

#[async_trait]
impl NewsProvider for FakeNews {
    async fn headlines(&self, region: Region) -> Result<Vec<String>, ProviderError> {
        if self.failing.lock().contains(&region) {
            return Err(ProviderError::Rejected("status error".into()));
        }
        Ok((1..=5)
            .map(|i| format!("{i}. {region:?} story {i}"))
            .collect())
    }
}

/// Echoes prompts back as `completion: <prompt>`
#[derive(Default)]
pub struct FakeCompletion {
    prompts: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl FakeCompletion {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl Completion for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());
        if *self.failing.lock() {
            return Err(ProviderError::NotConfigured("OPENROUTER_API_KEY"));
        }
        Ok(format!("completion: {prompt}"))
    }
}

#[derive(Default)]
pub struct FakeEncyclopedia {
    failure: Mutex<Option<ErrorFactory>>,
}

impl FakeEncyclopedia {
    pub fn fail_with(&self, make: impl Fn() -> ProviderError + Send + Sync + 'static) {
        *self.failure.lock() = Some(Box::new(make));
    }
}

#[async_trait]
impl Encyclopedia for FakeEncyclopedia {
    async fn summary(&self, topic: &str) -> Result<String, ProviderError> {
        if let Some(make) = self.failure.lock().as_ref() {
            return Err(make());
        }
        Ok(format!("{topic} is a topic."))
    }
}

/// Returns a watch URL built from the query itself
#[derive(Default)]
pub struct FakeVideos;

#[async_trait]
impl VideoFinder for FakeVideos {
    async fn first_video(&self, query: &str) -> Result<Option<String>, ProviderError> {
        if query.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("https://www.youtube.com/watch?v={query}")))
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    opened: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self, url: &str) -> Result<(), ProviderError> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Every fake wired together around one set of flags and a manual clock
pub struct Harness {
    pub flags: SharedFlags,
    pub clock: Arc<ManualClock>,
    pub speech: Arc<RecordingSpeech>,
    pub responder: Responder,
    pub weather: Arc<FakeWeather>,
    pub cache: Arc<WeatherCache>,
    pub battery: Arc<FakeBattery>,
    pub stats: Arc<FakeStats>,
    pub news: Arc<FakeNews>,
    pub completion: Arc<FakeCompletion>,
    pub encyclopedia: Arc<FakeEncyclopedia>,
    pub browser: Arc<FakeBrowser>,
    services: Services,
}

impl Harness {
    /// Dormant session, notifications off, clock at 09:00
    pub fn new() -> Self {
        let flags = SharedFlags::default();
        let clock = ManualClock::at(9, 0);
        let speech = RecordingSpeech::new();
        let responder = Responder::new(flags.clone(), speech.clone());
        let weather = FakeWeather::sunny();
        let cache = Arc::new(WeatherCache::new(
            weather.clone(),
            clock.clone(),
            Some("Pune".into()),
        ));
        let battery = Arc::new(FakeBattery::default());
        let stats = Arc::new(FakeStats::default());
        let news = Arc::new(FakeNews::default());
        let completion = Arc::new(FakeCompletion::default());
        let encyclopedia = Arc::new(FakeEncyclopedia::default());
        let browser = Arc::new(FakeBrowser::default());

        let services = Services {
            battery: battery.clone(),
            stats: stats.clone(),
            news: news.clone(),
            completion: completion.clone(),
            encyclopedia: encyclopedia.clone(),
            videos: Arc::new(FakeVideos),
            browser: browser.clone(),
        };

        Self {
            flags,
            clock,
            speech,
            responder,
            weather,
            cache,
            battery,
            stats,
            news,
            completion,
            encyclopedia,
            browser,
            services,
        }
    }

    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(
            "sky",
            self.flags.clone(),
            self.responder.clone(),
            self.cache.clone(),
            self.services.clone(),
            self.clock.clone(),
        )
    }

    pub fn actions(&self) -> ProactiveActions {
        ProactiveActions::new(
            self.flags.clone(),
            self.responder.clone(),
            self.cache.clone(),
            self.battery.clone(),
            self.news.clone(),
        )
    }
}
