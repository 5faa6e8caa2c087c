use crate::crisis;
use crate::error::AppError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "MINDEASE_CONFIG";
const API_KEY_ENV: &str = "GOOGLE_API_KEY";

const DEFAULT_RECORDER_ARGS: &str = "-q -d 5 -f S16_LE -r 16000 -c 1 {output}";

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    generation: GenerationConfig,
    #[serde(default)]
    speech: SpeechConfig,
    #[serde(default)]
    crisis: CrisisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ApiConfig {
    provider: String,
    key: Option<String>,
    url: Option<String>,
    model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            key: None,
            url: None,
            model: "gemini-2.0-flash".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct StorageConfig {
    data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct GenerationConfig {
    timeout_secs: u64,
    max_retries: usize,
    retry_base_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            retry_base_ms: 500,
        }
    }
}

/// Speech in/out settings. Output needs a local TTS program; input needs a
/// recorder program and a speech-to-text endpoint (`stt_url`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub output_enabled: bool,
    pub tts_program: String,
    pub tts_args: Vec<String>,
    pub recorder_program: String,
    /// `{output}` is replaced with the WAV path; appended when absent.
    pub recorder_args: Vec<String>,
    pub stt_url: Option<String>,
    pub stt_model: Option<String>,
    pub stt_key: Option<String>,
    pub capture_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            output_enabled: false,
            tts_program: "espeak".into(),
            tts_args: Vec::new(),
            recorder_program: "arecord".into(),
            recorder_args: DEFAULT_RECORDER_ARGS
                .split_whitespace()
                .map(String::from)
                .collect(),
            stt_url: None,
            stt_model: None,
            stt_key: None,
            capture_timeout_secs: 20,
        }
    }
}

impl SpeechConfig {
    pub fn input_enabled(&self) -> bool {
        self.stt_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CrisisConfig {
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_provider: String,
    pub api_key: String,
    pub api_url: Option<String>,
    pub model: String,
    pub data_dir: PathBuf,
    pub generation_timeout: Duration,
    pub max_retries: usize,
    pub retry_base_delay: Duration,
    pub speech: SpeechConfig,
    pub crisis_keywords: Vec<String>,
}

impl Config {
    /// Builds the config from TOML text. The API key falls back to
    /// `env_api_key` when the file leaves it blank.
    pub fn from_toml(content: &str, env_api_key: Option<String>) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(content).context("Failed to parse config file")?;
        Self::from_parts(config_file, env_api_key)
    }

    pub fn from_file(path: &Path, env_api_key: Option<String>) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            return Self::from_parts(ConfigFile::default(), env_api_key);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content, env_api_key)
    }

    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_file(Path::new(&path), std::env::var(API_KEY_ENV).ok())
    }

    fn from_parts(config_file: ConfigFile, env_api_key: Option<String>) -> Result<Self> {
        let api_key = config_file
            .api
            .key
            .filter(|k| !k.trim().is_empty())
            .or(env_api_key.filter(|k| !k.trim().is_empty()))
            .ok_or(AppError::MissingCredential)?;

        let crisis_keywords = config_file.crisis.keywords.unwrap_or_else(|| {
            crisis::DEFAULT_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect()
        });

        Ok(Self {
            api_provider: config_file.api.provider,
            api_key,
            api_url: config_file.api.url.filter(|u| !u.trim().is_empty()),
            model: config_file.api.model,
            data_dir: config_file.storage.data_dir.into(),
            generation_timeout: Duration::from_secs(config_file.generation.timeout_secs),
            max_retries: config_file.generation.max_retries,
            retry_base_delay: Duration::from_millis(config_file.generation.retry_base_ms),
            speech: config_file.speech,
            crisis_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults_and_env_key() {
        let config = Config::from_toml("", Some("env-key".into())).unwrap();

        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.api_provider, "gemini");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(!config.speech.output_enabled);
        assert!(!config.speech.input_enabled());
        assert_eq!(config.crisis_keywords.len(), crisis::DEFAULT_KEYWORDS.len());
    }

    #[test]
    fn file_key_wins_over_env() {
        let config = Config::from_toml(
            r#"
            [api]
            provider = "openai"
            key = "file-key"
            url = "http://localhost:8080/v1"
            model = "gpt-4o-mini"

            [speech]
            output_enabled = true
            stt_url = "http://localhost:9000/v1"

            [crisis]
            keywords = ["hopeless"]
            "#,
            Some("env-key".into()),
        )
        .unwrap();

        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.api_provider, "openai");
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(config.speech.output_enabled);
        assert!(config.speech.input_enabled());
        assert_eq!(config.speech.tts_program, "espeak");
        assert_eq!(config.crisis_keywords, vec!["hopeless".to_string()]);
    }

    #[test]
    fn missing_credential_is_reported() {
        let err = Config::from_toml("[api]\nkey = \"  \"\n", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::MissingCredential)
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::from_file(&dir.path().join("absent.toml"), Some("env-key".into())).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
    }
}
