//! Collaborators that shell out to the host: text-to-speech and the browser

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Browser, ProviderError, SpeechOutput};

/// Speech through an external TTS command plus a labelled stdout echo
#[derive(Debug, Clone)]
pub struct SystemVoice {
    /// TTS program invoked as `<command> <text>`; `None` disables audio
    command: Option<String>,
    label: String,
}

impl SystemVoice {
    pub fn new(command: Option<String>, label: impl Into<String>) -> Self {
        Self {
            command,
            label: label.into(),
        }
    }
}

#[async_trait]
impl SpeechOutput for SystemVoice {
    async fn play(&self, text: &str) -> Result<(), ProviderError> {
        let Some(program) = self.command.as_deref() else {
            return Ok(());
        };
        let status = Command::new(program)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await?;
        if !status.success() {
            return Err(ProviderError::Rejected(format!("{program} exited with {status}")));
        }
        Ok(())
    }

    fn echo(&self, text: &str) {
        println!("{}: {}", self.label, text);
    }
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

#[async_trait]
impl Browser for SystemBrowser {
    async fn open(&self, url: &str) -> Result<(), ProviderError> {
        debug!(%url, "opening url");
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        command.arg(url).spawn()?;
        Ok(())
    }
}
