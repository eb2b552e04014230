//! Owner name record and the startup greeting
//!
//! The owner's name lives in a single plain-text file. When it is missing the
//! assistant asks for it once; when it is unreadable a placeholder is used
//! and the session carries on.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDateTime, Timelike};
use tracing::{info, warn};

use crate::providers::UtteranceSource;
use crate::voice::Responder;

/// Name used when the record cannot be read or the owner stays quiet
pub const PLACEHOLDER_NAME: &str = "friend";

#[derive(Debug, Clone)]
pub struct OwnerProfile {
    path: PathBuf,
}

impl OwnerProfile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stored name, `None` when no record exists yet
    pub fn load(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let name = raw.trim();
        if name.is_empty() {
            bail!("owner record {} is empty", self.path.display());
        }
        Ok(Some(name.to_string()))
    }

    pub fn save(&self, name: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create profile directory")?;
        }
        fs::write(&self.path, name)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Stored name, asking for it through `source` on first run
    pub async fn resolve(
        &self,
        source: &mut dyn UtteranceSource,
        responder: &Responder,
        timeout: Duration,
    ) -> String {
        match self.load() {
            Ok(Some(name)) => return name,
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "unreadable owner record, using placeholder");
                return PLACEHOLDER_NAME.to_string();
            }
        }

        responder
            .say("Hello! I don't know your name yet. What should I call you?")
            .await;
        let name = title_case(&source.next(timeout).await);
        if name.is_empty() {
            warn!("no name heard, using placeholder");
            return PLACEHOLDER_NAME.to_string();
        }

        match self.save(&name) {
            Ok(()) => info!(path = %self.path.display(), "owner name saved"),
            Err(e) => warn!(error = %e, "failed to save owner name"),
        }
        name
    }
}

/// "Good morning, Asha! How can I help you today?"
pub fn greeting(name: &str, now: NaiveDateTime) -> String {
    let part = match now.hour() {
        h if h < 12 => "Good morning",
        h if h < 18 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{part}, {name}! How can I help you today?")
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
