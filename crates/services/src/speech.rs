//! Speech output port and a dispatcher that plays words off the judging path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SpeechError;

/// Pause between repetitions of the same word.
pub const REPEAT_PAUSE: Duration = Duration::from_millis(300);

/// Something that can say a word out loud. Calls block until playback ends.
pub trait SpeechOutput: Send + Sync {
    /// Say `text` once.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the engine is unavailable or playback fails.
    fn say(&self, text: &str) -> Result<(), SpeechError>;

    /// Say `text` `repeat` times with `REPEAT_PAUSE` in between.
    ///
    /// # Errors
    ///
    /// Stops at the first failed repetition and returns its error.
    fn speak(&self, text: &str, repeat: u32) -> Result<(), SpeechError> {
        for i in 0..repeat {
            self.say(text)?;
            if i + 1 < repeat {
                std::thread::sleep(REPEAT_PAUSE);
            }
        }
        Ok(())
    }
}

/// Output used when no speech engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechOutput for SilentSpeech {
    fn say(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// A playback that failed in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechReport {
    pub text: String,
    pub error: SpeechError,
}

/// Runs playback on the blocking pool and reports failures on a channel.
#[derive(Clone)]
pub struct SpeechDispatcher {
    output: Arc<dyn SpeechOutput>,
    reports: mpsc::UnboundedSender<SpeechReport>,
}

impl SpeechDispatcher {
    /// Returns the dispatcher and the receiving end for failure reports.
    #[must_use]
    pub fn new(output: Arc<dyn SpeechOutput>) -> (Self, mpsc::UnboundedReceiver<SpeechReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (Self { output, reports }, rx)
    }

    #[must_use]
    pub fn silent() -> (Self, mpsc::UnboundedReceiver<SpeechReport>) {
        Self::new(Arc::new(SilentSpeech))
    }

    /// Start playing `text`. Must be called inside a tokio runtime.
    ///
    /// The returned handle can be awaited or dropped; failures never reach the caller.
    pub fn play(&self, text: &str, repeat: u32) -> JoinHandle<()> {
        let output = Arc::clone(&self.output);
        let reports = self.reports.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            if let Err(error) = output.speak(&text, repeat) {
                tracing::warn!(text = %text, error = %error, "speech playback failed");
                // The host may have stopped listening.
                let _ = reports.send(SpeechReport { text, error });
            }
        })
    }
}

impl std::fmt::Debug for SpeechDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSpeech {
        said: Mutex<Vec<String>>,
    }

    impl SpeechOutput for RecordingSpeech {
        fn say(&self, text: &str) -> Result<(), SpeechError> {
            self.said.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    struct BrokenSpeech;

    impl SpeechOutput for BrokenSpeech {
        fn say(&self, _text: &str) -> Result<(), SpeechError> {
            Err(SpeechError::EngineUnavailable("no audio device".into()))
        }
    }

    #[test]
    fn speak_repeats_the_word() {
        let speech = RecordingSpeech::default();
        speech.speak("cat", 2).unwrap();
        assert_eq!(*speech.said.lock().unwrap(), vec!["cat", "cat"]);
    }

    #[test]
    fn speak_zero_times_says_nothing() {
        let speech = RecordingSpeech::default();
        speech.speak("cat", 0).unwrap();
        assert!(speech.said.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn play_runs_in_background() {
        let speech = Arc::new(RecordingSpeech::default());
        let (dispatcher, mut reports) = SpeechDispatcher::new(speech.clone());
        dispatcher.play("dog", 1).await.unwrap();
        assert_eq!(*speech.said.lock().unwrap(), vec!["dog"]);
        assert!(reports.try_recv().is_err());
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let (dispatcher, mut reports) = SpeechDispatcher::new(Arc::new(BrokenSpeech));
        dispatcher.play("dog", 2).await.unwrap();

        let report = reports.recv().await.unwrap();
        assert_eq!(report.text, "dog");
        assert_eq!(
            report.error,
            SpeechError::EngineUnavailable("no audio device".into())
        );
    }
}
