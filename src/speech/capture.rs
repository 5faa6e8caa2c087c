use crate::config::SpeechConfig;
use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

const OUTPUT_PLACEHOLDER: &str = "{output}";
const WAV_HEADER_LEN: u64 = 44;
const TRANSCRIPTIONS_PATH: &str = "/audio/transcriptions";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no speech detected")]
    NoSpeechDetected,
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),
}

/// One-shot microphone capture followed by speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn capture_and_transcribe(&self) -> Result<String, CaptureError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResp {
    text: Option<String>,
}

/// Records one utterance with a local recorder program and posts the WAV to
/// an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct HttpTranscriber {
    client: Client,
    recorder_program: String,
    recorder_args: Vec<String>,
    url: String,
    model: Option<String>,
    api_key: Option<String>,
    scratch_dir: PathBuf,
    timeout: Duration,
}

impl HttpTranscriber {
    pub fn new(speech: &SpeechConfig, data_dir: &Path) -> Self {
        Self {
            client: Client::new(),
            recorder_program: speech.recorder_program.clone(),
            recorder_args: speech.recorder_args.clone(),
            url: normalize_transcription_url(speech.stt_url.as_deref().unwrap_or_default()),
            model: speech.stt_model.clone(),
            api_key: speech.stt_key.clone(),
            scratch_dir: data_dir.join("tmp"),
            timeout: speech.capture_timeout(),
        }
    }

    async fn record(&self, wav_path: &Path) -> Result<(), CaptureError> {
        let output = wav_path.to_string_lossy().to_string();
        let args = recorder_args(&self.recorder_args, &output);

        info!("🎤 Listening via {}...", self.recorder_program);
        let result = Command::new(&self.recorder_program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                CaptureError::ServiceUnavailable(format!(
                    "microphone capture failed to start ({}): {}",
                    self.recorder_program, e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CaptureError::ServiceUnavailable(format!(
                "microphone capture failed ({}): {}",
                result.status,
                stderr.trim()
            )));
        }

        let size = tokio::fs::metadata(wav_path)
            .await
            .map(|m| m.len())
            .map_err(|e| {
                CaptureError::ServiceUnavailable(format!(
                    "{} produced no recording: {}",
                    self.recorder_program, e
                ))
            })?;
        if size <= WAV_HEADER_LEN {
            return Err(CaptureError::NoSpeechDetected);
        }
        debug!("Captured {} bytes of audio", size);
        Ok(())
    }

    async fn transcribe(&self, wav_path: &Path) -> Result<String, CaptureError> {
        let unavailable = |e: reqwest::Error| CaptureError::ServiceUnavailable(e.to_string());

        let bytes = tokio::fs::read(wav_path)
            .await
            .map_err(|e| CaptureError::ServiceUnavailable(format!("read capture: {}", e)))?;

        let part = multipart::Part::bytes(bytes)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(unavailable)?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(unavailable)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CaptureError::ServiceUnavailable(format!(
                "speech-to-text error: {} {}",
                status,
                body.trim()
            )));
        }

        let data: TranscriptionResp = resp.json().await.map_err(unavailable)?;
        let text = data.text.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(CaptureError::NoSpeechDetected);
        }
        Ok(text)
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn capture_and_transcribe(&self) -> Result<String, CaptureError> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| CaptureError::ServiceUnavailable(format!("scratch dir: {}", e)))?;
        let wav_path = self
            .scratch_dir
            .join(format!("capture-{}.wav", uuid::Uuid::new_v4()));

        let result = tokio::time::timeout(self.timeout, async {
            self.record(&wav_path).await?;
            self.transcribe(&wav_path).await
        })
        .await
        .unwrap_or(Err(CaptureError::Timeout(self.timeout)));

        if let Err(e) = tokio::fs::remove_file(&wav_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to clean up capture file: {}", e);
        }

        match &result {
            Ok(text) => info!("Transcribed {} chars", text.len()),
            Err(e) => warn!("Speech capture failed: {}", e),
        }
        result
    }
}

fn recorder_args(template: &[String], output: &str) -> Vec<String> {
    let mut args: Vec<String> = template
        .iter()
        .map(|a| a.replace(OUTPUT_PLACEHOLDER, output))
        .collect();
    if !template.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
        args.push(output.to_string());
    }
    args
}

/// Accepts either a base URL (`http://host/v1`) or the full endpoint.
fn normalize_transcription_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(TRANSCRIPTIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, TRANSCRIPTIONS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_transcription_url_handles_base_and_full_endpoint() {
        assert_eq!(
            normalize_transcription_url(" http://localhost:9000/v1/ "),
            "http://localhost:9000/v1/audio/transcriptions"
        );
        assert_eq!(
            normalize_transcription_url("https://api.example.com/v1/audio/transcriptions"),
            "https://api.example.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn recorder_args_substitute_or_append_output() {
        let template = vec!["-d".to_string(), "5".to_string(), "{output}".to_string()];
        assert_eq!(
            recorder_args(&template, "/tmp/a.wav"),
            vec!["-d", "5", "/tmp/a.wav"]
        );

        let template = vec!["-q".to_string()];
        assert_eq!(
            recorder_args(&template, "/tmp/a.wav"),
            vec!["-q", "/tmp/a.wav"]
        );
    }

    #[tokio::test]
    async fn missing_recorder_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let speech = SpeechConfig {
            recorder_program: "mindease-no-such-recorder".into(),
            stt_url: Some("http://127.0.0.1:9/v1".into()),
            ..SpeechConfig::default()
        };
        let transcriber = HttpTranscriber::new(&speech, dir.path());

        let err = transcriber.capture_and_transcribe().await.unwrap_err();
        assert!(matches!(err, CaptureError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn recorder_without_output_file_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let speech = SpeechConfig {
            recorder_program: "sh".into(),
            recorder_args: vec!["-c".into(), "exit 0".into()],
            stt_url: Some("http://127.0.0.1:9/v1".into()),
            ..SpeechConfig::default()
        };
        let transcriber = HttpTranscriber::new(&speech, dir.path());

        let err = transcriber.capture_and_transcribe().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::ServiceUnavailable(ref m) if m.contains("no recording")
        ));
    }

    #[tokio::test]
    async fn header_only_recording_is_no_speech() {
        let dir = tempfile::tempdir().unwrap();
        let speech = SpeechConfig {
            recorder_program: "sh".into(),
            recorder_args: vec!["-c".into(), "head -c 44 /dev/zero > \"$0\"".into()],
            stt_url: Some("http://127.0.0.1:9/v1".into()),
            ..SpeechConfig::default()
        };
        let transcriber = HttpTranscriber::new(&speech, dir.path());

        let err = transcriber.capture_and_transcribe().await.unwrap_err();
        assert!(matches!(err, CaptureError::NoSpeechDetected));
    }

    #[tokio::test]
    async fn slow_recorder_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let speech = SpeechConfig {
            recorder_program: "sh".into(),
            recorder_args: vec!["-c".into(), "sleep 5".into()],
            stt_url: Some("http://127.0.0.1:9/v1".into()),
            capture_timeout_secs: 1,
            ..SpeechConfig::default()
        };
        let transcriber = HttpTranscriber::new(&speech, dir.path());

        let err = transcriber.capture_and_transcribe().await.unwrap_err();
        assert!(matches!(err, CaptureError::Timeout(d) if d == Duration::from_secs(1)));
        assert_eq!(err.to_string(), "capture timed out after 1s");
    }
}
