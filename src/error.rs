use crate::generation::GenerationError;
use crate::speech::{CaptureError, SpeechError};
use thiserror::Error;

/// Every failure a user action can surface. Each variant renders as a
/// human-readable notice.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(
        "API key not found! Please set `key` under [api] in config.toml or the GOOGLE_API_KEY environment variable."
    )]
    MissingCredential,
    #[error("The assistant is unavailable right now: {0}")]
    GenerationService(#[from] GenerationError),
    #[error("Sorry, I couldn't understand the audio. Please try again or type your message.")]
    SpeechRecognitionNoMatch,
    #[error("Speech recognition failed: {0}")]
    SpeechRecognitionService(String),
    #[error("Speech output failed: {0}")]
    Synthesis(String),
    #[error("Please type something first 💡")]
    EmptyInput,
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::NoSpeechDetected => AppError::SpeechRecognitionNoMatch,
            other => AppError::SpeechRecognitionService(other.to_string()),
        }
    }
}

impl From<SpeechError> for AppError {
    fn from(err: SpeechError) -> Self {
        AppError::Synthesis(err.to_string())
    }
}
