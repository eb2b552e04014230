//! Spoken responses
//!
//! [`Responder`] is the only caller of [`SpeechOutput`]. It reads the
//! `silent` and `voice_only` flags on every call so toggles take effect on
//! the very next response, from either the session loop or the scheduler.

use std::sync::Arc;

use tracing::warn;

use crate::providers::SpeechOutput;
use crate::state::SharedFlags;

#[derive(Clone)]
pub struct Responder {
    flags: SharedFlags,
    output: Arc<dyn SpeechOutput>,
}

impl Responder {
    pub fn new(flags: SharedFlags, output: Arc<dyn SpeechOutput>) -> Self {
        Self { flags, output }
    }

    /// Speak `text`, honouring silent and voice-only modes
    pub async fn say(&self, text: &str) {
        let flags = self.flags.snapshot();
        if !flags.silent {
            if let Err(e) = self.output.play(text).await {
                warn!(?e, "voice error");
            }
        }
        if !flags.voice_only {
            self.output.echo(text);
        }
    }
}
