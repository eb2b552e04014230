//! Command dispatcher
//!
//! Maps a normalized utterance to the first matching rule and performs its
//! action. Anything unmatched goes to the completion provider. The only
//! state touched here is the shared mode flags.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::providers::{ProviderError, Region, Services};
use crate::state::SharedFlags;
use crate::voice::Responder;
use crate::weather::WeatherCache;

use super::rules::{default_rules, topic_after, video_query, Action, Rule};

const APOLOGY: &str = "Apologies, I encountered an issue while processing your request.";
const JOKE_PROMPT: &str = "Tell me a short, funny joke (1-6 lines).";

/// Rule name reported when nothing in the table matched
pub const FALLBACK_RULE: &str = "fallback";

/// Whether the session keeps running after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Result of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub rule: &'static str,
    pub flow: Flow,
}

impl Outcome {
    fn proceed(rule: &'static str) -> Self {
        Self {
            rule,
            flow: Flow::Continue,
        }
    }
}

pub struct CommandDispatcher {
    rules: Vec<Rule>,
    wake_hint: String,
    flags: SharedFlags,
    responder: Responder,
    weather: Arc<WeatherCache>,
    services: Services,
    clock: Arc<dyn Clock>,
}

impl CommandDispatcher {
    /// Dispatcher with the stock table for an assistant called `name`
    pub fn new(
        name: &str,
        flags: SharedFlags,
        responder: Responder,
        weather: Arc<WeatherCache>,
        services: Services,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rules: default_rules(name),
            wake_hint: format!("Hey {}", capitalize(name)),
            flags,
            responder,
            weather,
            services,
            clock,
        }
    }

    /// First rule matching an already-normalized utterance
    pub fn classify(&self, utterance: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matcher.matches(utterance))
    }

    pub async fn dispatch(&self, utterance: &str) -> Outcome {
        let command = utterance.trim().to_lowercase();
        if command.is_empty() {
            return Outcome::proceed(FALLBACK_RULE);
        }

        let Some(rule) = self.classify(&command) else {
            debug!(%command, "no rule matched, asking completion provider");
            self.complete_and_say(&command).await;
            return Outcome::proceed(FALLBACK_RULE);
        };

        debug!(rule = rule.name, %command, "rule matched");
        let flow = self.perform(&rule.action, &command).await;
        Outcome {
            rule: rule.name,
            flow,
        }
    }

    async fn perform(&self, action: &Action, command: &str) -> Flow {
        match action {
            Action::Notifications(on) => {
                self.flags.set_notifications_enabled(*on);
                info!(enabled = on, "proactive notifications toggled");
                let state = if *on { "enabled" } else { "disabled" };
                self.say(format!("Proactive notifications {state}.")).await;
            }
            Action::TellTime => {
                let now = self.clock.now().format("%I:%M %p");
                self.say(format!("The time is {now}.")).await;
            }
            Action::TellDate => {
                let today = self.clock.now().format("%A, %B %d, %Y");
                self.say(format!("Today is {today}.")).await;
            }
            Action::Weather => {
                self.say(self.weather.report().await).await;
            }
            Action::SystemStatus => {
                let status = self.system_status().await;
                self.say(format!("Here's the current system status: {status}")).await;
            }
            Action::Headlines(region) => self.read_headlines(*region).await,
            Action::Search => {
                let topic = topic_after(command, "search for");
                let reply = match self.open_search(&topic).await {
                    Ok(()) => format!(
                        "I have searched Google for {topic}. The results are now open in your browser."
                    ),
                    Err(e) => {
                        warn!(error = %e, "search failed");
                        "I couldn't open your browser right now.".to_string()
                    }
                };
                self.say(reply).await;
            }
            Action::Wikipedia => {
                let topic = topic_after(command, "wikipedia");
                let reply = match self.services.encyclopedia.summary(&topic).await {
                    Ok(summary) => format!("According to Wikipedia, {summary}"),
                    Err(e) => {
                        warn!(error = %e, %topic, "encyclopedia lookup failed");
                        format!("Sorry, I could not find any information about {topic} on Wikipedia.")
                    }
                };
                self.say(reply).await;
            }
            Action::PlayVideo => {
                let query = video_query(command);
                self.say(format!("Searching YouTube for {query}")).await;
                let reply = match self.services.videos.first_video(&query).await {
                    Ok(Some(url)) => match self.services.browser.open(&url).await {
                        Ok(()) => "Playing the top result on YouTube.",
                        Err(e) => {
                            warn!(error = %e, "failed to open video");
                            "I couldn't find any video."
                        }
                    },
                    Ok(None) => "I couldn't find any video.",
                    Err(e) => {
                        warn!(error = %e, "video search failed");
                        "I couldn't find any video."
                    }
                };
                self.say(reply).await;
            }
            Action::StayAwake => {
                self.flags.wake_unbounded();
                self.say("I'll stay awake and keep listening for your commands until you tell me to sleep.")
                    .await;
            }
            Action::Sleep => {
                self.flags.sleep();
                self.say(format!(
                    "Going into standby mode. Say '{}' to wake me up again.",
                    self.wake_hint
                ))
                .await;
            }
            Action::Goodbye => {
                self.flags.sleep();
                self.say("Goodbye! Shutting down.").await;
                return Flow::Terminate;
            }
            Action::OpenSite { label, url } => {
                self.say(format!("Opening {label}.")).await;
                if let Err(e) = self.services.browser.open(url).await {
                    warn!(error = %e, %url, "failed to open site");
                }
            }
            Action::Silent(on) => {
                self.flags.set_silent(*on);
                let reply = if *on {
                    "Silent mode activated."
                } else {
                    "Voice mode activated."
                };
                self.say(reply).await;
            }
            Action::VoiceOnly(on) => {
                self.flags.set_voice_only(*on);
                let reply = if *on {
                    "Voice-only mode activated."
                } else {
                    "Normal mode restored."
                };
                self.say(reply).await;
            }
            Action::Joke => {
                self.say("Let me find something funny...").await;
                self.complete_and_say(JOKE_PROMPT).await;
            }
        }
        Flow::Continue
    }

    async fn say(&self, text: impl AsRef<str>) {
        self.responder.say(text.as_ref()).await
    }

    async fn system_status(&self) -> String {
        let battery = match self.services.battery.status().await {
            Some(b) if b.plugged => format!("The battery is at {}%, charging.", b.percent),
            Some(b) => format!("The battery is at {}%.", b.percent),
            None => "Battery status is unavailable.".to_string(),
        };
        match self.services.stats.usage().await {
            Some(u) => format!(
                "Your CPU is currently at {:.1} percent, RAM usage is {:.1} percent, \
                 and the disk is {:.1} percent full. {battery}",
                u.cpu_percent, u.ram_percent, u.disk_percent
            ),
            None => battery,
        }
    }

    async fn read_headlines(&self, region: Region) {
        let (intro, apology) = match region {
            Region::India => (
                "Here are the top news headlines from India:",
                "I couldn't fetch the India news right now.",
            ),
            Region::Global => (
                "Here are the top global headlines:",
                "I couldn't fetch the global news right now.",
            ),
        };

        let headlines = match self.services.news.headlines(region).await {
            Ok(headlines) if !headlines.is_empty() => headlines,
            Ok(_) => {
                self.responder.say(apology).await;
                return;
            }
            Err(e) => {
                warn!(error = %e, ?region, "headline fetch failed");
                self.responder.say(apology).await;
                return;
            }
        };

        self.responder.say(intro).await;
        for headline in &headlines {
            self.responder.say(headline).await;
        }
    }

    async fn open_search(&self, topic: &str) -> Result<(), ProviderError> {
        let url = Url::parse_with_params("https://www.google.com/search", &[("q", topic)])
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        self.services.browser.open(url.as_str()).await
    }

    async fn complete_and_say(&self, prompt: &str) {
        let reply = match self.services.completion.complete(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "completion failed");
                APOLOGY.to_string()
            }
        };
        self.responder.say(&reply).await;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
