//! Console transcription stand-in
//!
//! Reads one phrase per line from stdin. Real speech recognition plugs in
//! behind the same [`UtteranceSource`] trait.
//!
//! Stdin is read on a dedicated thread feeding a channel, so a pending read
//! never holds up runtime shutdown.

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::UtteranceSource;

pub struct ConsoleSource {
    lines: mpsc::Receiver<String>,
    closed: bool,
}

impl ConsoleSource {
    /// Spawn the stdin reader thread
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(32);
        let spawned = thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || read_lines(std::io::stdin().lock(), tx));
        if let Err(e) = spawned {
            // The sender is gone with the closure, so the source reads as closed
            warn!(error = %e, "failed to spawn stdin reader");
        }
        Self::from_receiver(rx)
    }

    /// Source fed by an existing line channel
    pub fn from_receiver(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines,
            closed: false,
        }
    }
}

impl Default for ConsoleSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward lines from `reader` until it ends or the source is dropped
fn read_lines(reader: impl BufRead, tx: mpsc::Sender<String>) {
    info!("stdin reader started");
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(?e, "failed to read utterance");
                break;
            }
        }
    }
    info!("stdin reader stopped");
}

/// Lowercase and trim a raw transcription
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[async_trait]
impl UtteranceSource for ConsoleSource {
    async fn next(&mut self, timeout_hint: Duration) -> String {
        if self.closed {
            // Nothing will ever arrive; behave like a silent microphone
            tokio::time::sleep(timeout_hint).await;
            return String::new();
        }

        match tokio::time::timeout(timeout_hint, self.lines.recv()).await {
            Ok(Some(line)) => {
                let phrase = normalize(&line);
                debug!(%phrase, "utterance captured");
                phrase
            }
            Ok(None) => {
                warn!("stdin closed, no further utterances");
                self.closed = true;
                String::new()
            }
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};
    use std::sync::mpsc as std_mpsc;

    const SHORT: Duration = Duration::from_millis(20);

    /// Blocks in `read` until its sender is dropped
    struct StalledInput(std_mpsc::Receiver<()>);

    impl Read for StalledInput {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hey Sky \n"), "hey sky");
        assert_eq!(normalize(""), "");
    }

    #[tokio::test]
    async fn test_lines_are_normalized() {
        let (tx, rx) = mpsc::channel(4);
        let mut source = ConsoleSource::from_receiver(rx);
        tx.send("  Hey Sky ".to_string()).await.unwrap();
        assert_eq!(source.next(SHORT).await, "hey sky");
    }

    #[tokio::test]
    async fn test_timeout_yields_empty_phrase() {
        let (_tx, rx) = mpsc::channel(4);
        let mut source = ConsoleSource::from_receiver(rx);
        assert_eq!(source.next(SHORT).await, "");
        assert!(!source.closed);
    }

    #[tokio::test]
    async fn test_reader_thread_feeds_source_until_eof() {
        let (tx, rx) = mpsc::channel(4);
        let input = Cursor::new("hey sky\nWhat time is it\n");
        let reader = thread::spawn(move || read_lines(input, tx));
        let mut source = ConsoleSource::from_receiver(rx);

        assert_eq!(source.next(Duration::from_secs(1)).await, "hey sky");
        assert_eq!(source.next(Duration::from_secs(1)).await, "what time is it");
        assert_eq!(source.next(Duration::from_secs(1)).await, "");
        assert!(source.closed);
        reader.join().unwrap();
    }

    #[tokio::test]
    async fn test_stalled_reader_does_not_block_the_source() {
        let (release, stalled) = std_mpsc::channel();
        let (tx, rx) = mpsc::channel(4);
        let reader = thread::spawn(move || read_lines(BufReader::new(StalledInput(stalled)), tx));

        let mut source = ConsoleSource::from_receiver(rx);
        let heard = tokio::time::timeout(Duration::from_secs(1), source.next(SHORT)).await;
        assert_eq!(heard.unwrap(), "");

        // Dropping the source returns at once even though a read is pending
        let dropped = tokio::time::timeout(Duration::from_secs(1), async move { drop(source) }).await;
        assert!(dropped.is_ok());
        assert!(!reader.is_finished());

        drop(release);
        reader.join().unwrap();
    }
}
