use std::io::ErrorKind;
use std::process::{Command, Stdio};

use services::{SpeechError, SpeechOutput};

/// Speaks by running an external program with the word as its last argument,
/// e.g. `espeak` or `say`.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    /// Split a command line such as `"espeak -s 140"` on whitespace.
    /// Returns `None` for a blank command.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl SpeechOutput for CommandSpeech {
    fn say(&self, text: &str) -> Result<(), SpeechError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SpeechError::EngineUnavailable(format!("{}: {e}", self.program))
                }
                _ => SpeechError::Playback(e.to_string()),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Playback(format!("{} exited with {status}", self.program)))
        }
    }
}
