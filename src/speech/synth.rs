use super::SpeechError;
use std::process::{Command, Stdio};
use tracing::debug;

/// A blocking text-to-speech engine. `synthesize` returns once the
/// utterance has finished playing.
pub trait Synthesizer: Send {
    fn synthesize(&mut self, text: &str) -> Result<(), SpeechError>;
}

/// Speaks through a local TTS program such as `espeak`, `say` or `spd-say`;
/// the text is passed as the last argument.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }
}

impl Synthesizer for CommandSynthesizer {
    fn synthesize(&mut self, text: &str) -> Result<(), SpeechError> {
        debug!("Speaking {} chars via {}", text.len(), self.program);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SpeechError::Synthesis(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_synthesis_error() {
        let mut synth = CommandSynthesizer::new("mindease-no-such-tts-binary", &[]);
        let err = synth.synthesize("hello").unwrap_err();
        assert!(matches!(err, SpeechError::Synthesis(ref m) if m.contains("failed to run")));
    }
}
