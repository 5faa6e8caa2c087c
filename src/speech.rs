use thiserror::Error;

mod capture;
mod queue;
mod synth;

pub use capture::{CaptureError, HttpTranscriber, Transcriber};
pub use queue::{DrainPolicy, SpeechQueue, WorkerState};
pub use synth::CommandSynthesizer;
use synth::Synthesizer;

#[cfg(test)]
pub(crate) use queue::tests::RecordingSynth;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Synthesis failed: {0}")]
    Synthesis(String),
    #[error("Speech queue is closed")]
    QueueClosed,
    #[error("Failed to start speech worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
    #[error("Speech worker panicked")]
    WorkerPanicked,
}
