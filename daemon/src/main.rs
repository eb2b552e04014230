//! skai-daemon: voice assistant session loop with proactive notifications
//!
//! The daemon runs two concurrent activities over one set of shared flags:
//! - The session loop: dormant until a wake phrase, then dispatching
//!   commands within a bounded or unbounded listening window
//! - The notification scheduler: daily weather, battery checks and news
//!   digests spoken on a fixed cadence when notifications are enabled
//!
//! Phrases arrive as text lines on stdin; responses are spoken through an
//! external TTS command and echoed to stdout.

mod clock;
mod commands;
mod config;
mod events;
mod lifecycle;
mod notify;
mod profile;
mod providers;
mod state;
mod voice;
mod weather;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::clock::{Clock, SystemClock};
use crate::commands::CommandDispatcher;
use crate::config::Config;
use crate::events::SessionEvent;
use crate::lifecycle::ShutdownSignal;
use crate::notify::{NotificationScheduler, ProactiveActions};
use crate::profile::OwnerProfile;
use crate::providers::{
    http_client, ConsoleSource, HostStats, NewsApi, OpenRouter, OpenWeather, Services,
    SysfsBattery, SystemBrowser, SystemVoice, Wikipedia, YouTube,
};
use crate::state::{ModeFlags, SessionStateMachine, SharedFlags, WakePhrases};
use crate::voice::Responder;
use crate::weather::WeatherCache;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "skai-daemon starting");

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        data_dir = %config.data_dir.display(),
        name = %config.assistant_name,
        notifications = config.notifications_enabled,
        keys = ?config.keys,
        "configuration loaded"
    );

    let shutdown = ShutdownSignal::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let flags = SharedFlags::new(ModeFlags {
        notifications_enabled: config.notifications_enabled,
        ..ModeFlags::default()
    });

    // Collaborators
    let speech = Arc::new(SystemVoice::new(config.tts_command.clone(), "SKAI"));
    let responder = Responder::new(flags.clone(), speech);
    let http = http_client(config.http_timeout);
    let weather = Arc::new(WeatherCache::new(
        Arc::new(OpenWeather::new(http.clone(), config.keys.weather.clone())),
        clock.clone(),
        config.weather_location.clone(),
    ));
    let services = Services {
        battery: Arc::new(SysfsBattery::new()),
        stats: Arc::new(HostStats),
        news: Arc::new(NewsApi::new(http.clone(), config.keys.news.clone())),
        completion: Arc::new(OpenRouter::new(
            http.clone(),
            config.keys.openrouter.clone(),
            config.completion_model.clone(),
        )),
        encyclopedia: Arc::new(Wikipedia::new(http.clone())),
        videos: Arc::new(YouTube::new(http)),
        browser: Arc::new(SystemBrowser),
    };

    // Session -> logging task
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(64);

    // Greet the owner, asking for a name on first run
    let mut source = ConsoleSource::new();
    let owner = OwnerProfile::new(&config.owner_file)
        .resolve(&mut source, &responder, config.capture_timeout)
        .await;
    responder.say(&profile::greeting(&owner, clock.now())).await;

    let actions = ProactiveActions::new(
        flags.clone(),
        responder.clone(),
        weather.clone(),
        services.battery.clone(),
        services.news.clone(),
    );
    let scheduler =
        NotificationScheduler::new(&config.schedule, actions, clock.clone(), event_tx.clone());

    let dispatcher = CommandDispatcher::new(
        &config.assistant_name,
        flags.clone(),
        responder.clone(),
        weather,
        services,
        clock.clone(),
    );
    let mut session = SessionStateMachine::new(
        flags,
        Box::new(source),
        dispatcher,
        responder,
        clock,
        event_tx.clone(),
    )
    .with_phrases(WakePhrases::for_name(&config.assistant_name))
    .with_window(config.awake_window)
    .with_capture_timeout(config.capture_timeout);

    let scheduler_task = tokio::spawn(scheduler.run());

    let mut event_rx = event_tx.subscribe();
    let events_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => info!(%event, "session event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "session event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = session.run() => {
            info!("session ended");
        }
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");
    scheduler_task.abort();
    events_task.abort();
    info!("skai-daemon stopped");

    Ok(())
}
