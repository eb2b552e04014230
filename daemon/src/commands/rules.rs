//! Keyword table
//!
//! Ordered first-match-wins list of (predicate, action) pairs. Matching is
//! literal substring or prefix matching on the lowercased utterance.

use crate::providers::Region;

/// Predicate over a normalized utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Contains any of the keywords
    Any(Vec<String>),
    /// Contains every keyword
    All(Vec<String>),
    /// Starts with the prefix
    Prefix(String),
}

impl Matcher {
    pub fn any(keywords: &[&str]) -> Self {
        Matcher::Any(keywords.iter().map(|k| k.to_string()).collect())
    }

    pub fn all(keywords: &[&str]) -> Self {
        Matcher::All(keywords.iter().map(|k| k.to_string()).collect())
    }

    pub fn prefix(prefix: &str) -> Self {
        Matcher::Prefix(prefix.to_string())
    }

    pub fn matches(&self, utterance: &str) -> bool {
        match self {
            Matcher::Any(keys) => keys.iter().any(|k| utterance.contains(k.as_str())),
            Matcher::All(keys) => keys.iter().all(|k| utterance.contains(k.as_str())),
            Matcher::Prefix(prefix) => utterance.starts_with(prefix.as_str()),
        }
    }
}

/// What a matched rule does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Notifications(bool),
    TellTime,
    TellDate,
    Weather,
    /// CPU, memory, disk and battery report
    SystemStatus,
    Headlines(Region),
    /// Google search for the text after the keyword
    Search,
    /// Encyclopedia summary for the text after the keyword
    Wikipedia,
    PlayVideo,
    StayAwake,
    Sleep,
    Goodbye,
    OpenSite {
        label: &'static str,
        url: &'static str,
    },
    Silent(bool),
    VoiceOnly(bool),
    Joke,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub action: Action,
}

impl Rule {
    fn new(name: &'static str, matcher: Matcher, action: Action) -> Self {
        Self {
            name,
            matcher,
            action,
        }
    }
}

/// The stock table for an assistant called `name`
pub fn default_rules(name: &str) -> Vec<Rule> {
    let bye = format!("bye {name}");
    vec![
        Rule::new(
            "enable-notifications",
            Matcher::any(&["enable notifications"]),
            Action::Notifications(true),
        ),
        Rule::new(
            "disable-notifications",
            Matcher::any(&["disable notifications"]),
            Action::Notifications(false),
        ),
        Rule::new("time", Matcher::any(&["time"]), Action::TellTime),
        Rule::new("date", Matcher::any(&["date", "today"]), Action::TellDate),
        Rule::new("weather", Matcher::any(&["weather"]), Action::Weather),
        Rule::new(
            "system-status",
            Matcher::any(&["battery", "system status", "cpu", "ram"]),
            Action::SystemStatus,
        ),
        Rule::new(
            "india-news",
            Matcher::any(&["india news"]),
            Action::Headlines(Region::India),
        ),
        Rule::new(
            "global-news",
            Matcher::any(&["global news", "world news"]),
            Action::Headlines(Region::Global),
        ),
        Rule::new("search", Matcher::prefix("search for "), Action::Search),
        Rule::new("wikipedia", Matcher::prefix("wikipedia "), Action::Wikipedia),
        Rule::new("youtube", Matcher::all(&["play", "youtube"]), Action::PlayVideo),
        Rule::new(
            "stay-awake",
            Matcher::any(&["stay awake", "active mode"]),
            Action::StayAwake,
        ),
        Rule::new(
            "sleep",
            Matcher::any(&["go to sleep", "standby mode"]),
            Action::Sleep,
        ),
        Rule::new(
            "goodbye",
            Matcher::Any(vec![bye, "goodbye".to_string()]),
            Action::Goodbye,
        ),
        Rule::new(
            "spotify",
            Matcher::any(&["spotify"]),
            Action::OpenSite {
                label: "Spotify",
                url: "https://open.spotify.com",
            },
        ),
        Rule::new(
            "google",
            Matcher::any(&["google"]),
            Action::OpenSite {
                label: "Google",
                url: "https://www.google.com",
            },
        ),
        Rule::new("silent-mode", Matcher::any(&["silent mode"]), Action::Silent(true)),
        Rule::new("voice-mode", Matcher::any(&["voice mode"]), Action::Silent(false)),
        Rule::new(
            "voice-only-mode",
            Matcher::any(&["voice only mode"]),
            Action::VoiceOnly(true),
        ),
        Rule::new("normal-mode", Matcher::any(&["normal mode"]), Action::VoiceOnly(false)),
        Rule::new("joke", Matcher::any(&["tell me a joke"]), Action::Joke),
    ]
}

/// Text following `keyword`, trimmed
pub fn topic_after(utterance: &str, keyword: &str) -> String {
    utterance.replace(keyword, "").trim().to_string()
}

/// Video title from "play <title> on youtube"
pub fn video_query(utterance: &str) -> String {
    utterance
        .replace("play", "")
        .replace("on youtube", "")
        .trim()
        .to_string()
}
