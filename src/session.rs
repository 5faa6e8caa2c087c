use crate::crisis;
use crate::error::AppError;
use crate::generation::{GenerationClient, Reply};
use crate::mood::Mood;
use crate::speech::{DrainPolicy, SpeechQueue, Transcriber, WorkerState};
use crate::store::{ChatTurn, MoodEntry, Store};
use crate::utils;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const MOOD_HISTORY_LEN: usize = 10;
pub const CHAT_HISTORY_LEN: usize = 5;

const MAX_UTTERANCE_LEN: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        let level = match err {
            AppError::EmptyInput
            | AppError::SpeechRecognitionNoMatch
            | AppError::SpeechRecognitionService(_)
            | AppError::Synthesis(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Notice::new(level, err.to_string())
    }
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub turn: ChatTurn,
    pub crisis: bool,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct History {
    pub moods: Vec<MoodEntry>,
    pub chats: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechStatus {
    pub output: Option<(WorkerState, usize)>,
    pub input_enabled: bool,
}

/// Handles one user action at a time. All collaborators are injected.
pub struct Session {
    store: Arc<Store>,
    generator: GenerationClient,
    speech: Option<Arc<SpeechQueue>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    crisis_keywords: Vec<String>,
}

impl Session {
    pub fn new(
        store: Arc<Store>,
        generator: GenerationClient,
        crisis_keywords: Vec<String>,
    ) -> Self {
        Self {
            store,
            generator,
            speech: None,
            transcriber: None,
            crisis_keywords,
        }
    }

    pub fn with_speech_output(mut self, queue: Arc<SpeechQueue>) -> Self {
        self.speech = Some(queue);
        self
    }

    pub fn with_speech_input(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub async fn log_mood(&self, mood: Mood) -> Result<Notice, AppError> {
        let entry = self.store.insert_mood(mood).await?;
        info!("Mood logged: {} (id {})", mood.label(), entry.id);
        Ok(Notice::new(
            NoticeLevel::Success,
            format!("Your mood '{}' has been logged 💙", mood),
        ))
    }

    /// Sends `input` to the assistant and stores the turn. Blank input is
    /// rejected before anything is stored or sent.
    pub async fn submit(&self, input: &str) -> Result<SubmitOutcome, AppError> {
        if input.trim().is_empty() {
            return Err(AppError::EmptyInput);
        }

        let crisis = crisis::contains_crisis_signal(input, &self.crisis_keywords);
        let mut notices = Vec::new();

        if crisis {
            warn!("Crisis keyword detected in user input");
            self.say(crisis::SPOKEN_SAFETY_MESSAGE, &mut notices);
        }

        let reply = self.generator.generate(input).await;
        let turn = self.store.insert_chat(input, &reply).await?;

        match &reply {
            Reply::Generated(text) => {
                for utterance in utils::split_utterances(text, MAX_UTTERANCE_LEN) {
                    self.say(&utterance, &mut notices);
                }
            }
            Reply::Failed(err) => {
                error!("Generation failed for chat turn {}: {}", turn.id, err);
                notices.push(Notice::from(&AppError::GenerationService(err.clone())));
            }
        }

        if crisis {
            notices.push(Notice::new(NoticeLevel::Error, crisis::HELPLINE_NOTICE));
            notices.push(Notice::new(NoticeLevel::Info, crisis::COUNSELOR_NOTICE));
        }

        Ok(SubmitOutcome {
            turn,
            crisis,
            notices,
        })
    }

    /// Captures one utterance from the microphone and returns its text.
    pub async fn speak_instead(&self) -> Result<String, AppError> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            AppError::SpeechRecognitionService(
                "speech input is not configured (set stt_url under [speech])".into(),
            )
        })?;

        Ok(transcriber.capture_and_transcribe().await?)
    }

    pub async fn history(&self) -> Result<History, AppError> {
        Ok(History {
            moods: self.store.recent_moods(MOOD_HISTORY_LEN).await?,
            chats: self.store.recent_chats(CHAT_HISTORY_LEN).await?,
        })
    }

    /// Returns `None` when speech output is disabled.
    pub fn clear_pending_speech(&self) -> Option<usize> {
        self.speech.as_ref().map(|q| q.clear_pending())
    }

    pub fn speech_status(&self) -> SpeechStatus {
        SpeechStatus {
            output: self.speech.as_ref().map(|q| (q.state(), q.pending())),
            input_enabled: self.transcriber.is_some(),
        }
    }

    /// Lets queued speech finish, then stops the worker.
    pub async fn shutdown(&self) {
        if let Some(queue) = &self.speech
            && let Err(e) = queue.shutdown(DrainPolicy::Drain).await
        {
            warn!("Failed to shut down speech worker: {}", e);
        }
    }

    fn say(&self, text: &str, notices: &mut Vec<Notice>) {
        let Some(queue) = &self.speech else {
            return;
        };
        if let Err(e) = queue.speak(text) {
            warn!("Failed to queue speech: {}", e);
            let notice = Notice::from(&AppError::from(e));
            if !notices.contains(&notice) {
                notices.push(notice);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{FlakyGenerator, fast_policy};
    use crate::speech::{CaptureError, RecordingSynth};
    use crate::store::ChatStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    async fn session_with(failures: usize) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).await.unwrap();
        let generator =
            GenerationClient::new(Arc::new(FlakyGenerator::new(failures)), fast_policy(0));
        let keywords = crisis::DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        (dir, Session::new(store, generator, keywords))
    }

    struct FixedTranscriber(Result<&'static str, ()>);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn capture_and_transcribe(&self) -> Result<String, CaptureError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(CaptureError::NoSpeechDetected),
            }
        }
    }

    #[tokio::test]
    async fn submit_stores_exactly_one_turn() {
        let (_dir, session) = session_with(0).await;

        let outcome = session.submit("I had a great day").await.unwrap();

        assert!(!outcome.crisis);
        assert_eq!(outcome.turn.status, ChatStatus::Ok);
        let chats = session.history().await.unwrap().chats;
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].user_input, "I had a great day");
        assert_eq!(chats[0].bot_reply, "echo: I had a great day");
    }

    #[tokio::test]
    async fn blank_submission_is_rejected_without_storing() {
        let (_dir, session) = session_with(0).await;

        let err = session.submit("   \t").await.unwrap_err();

        assert!(matches!(err, AppError::EmptyInput));
        assert_eq!(Notice::from(&err).level, NoticeLevel::Warning);
        assert!(session.history().await.unwrap().chats.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_stored_as_readable_error() {
        let (_dir, session) = session_with(usize::MAX).await;

        let outcome = session.submit("hello?").await.unwrap();

        assert_eq!(outcome.turn.status, ChatStatus::Error);
        assert!(outcome.turn.bot_reply.contains("503 Service Unavailable"));
        assert!(
            outcome
                .notices
                .iter()
                .any(|n| n.level == NoticeLevel::Error && n.message.contains("unavailable"))
        );
        let chats = session.history().await.unwrap().chats;
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].error_kind.as_deref(), Some("service"));
    }

    #[tokio::test]
    async fn crisis_input_adds_helpline_notices_and_speaks_safety_first() {
        let (_dir, session) = session_with(0).await;
        let events = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(
            SpeechQueue::start(Box::new(RecordingSynth {
                events: events.clone(),
            }))
            .unwrap(),
        );
        let session = session.with_speech_output(queue);

        let outcome = session.submit("I want to end my life").await.unwrap();
        session.shutdown().await;

        assert!(outcome.crisis);
        assert!(
            outcome
                .notices
                .iter()
                .any(|n| n.message == crisis::HELPLINE_NOTICE)
        );
        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            format!("start:{}", crisis::SPOKEN_SAFETY_MESSAGE)
        );
        assert_eq!(
            events.last().unwrap(),
            &"end:echo: I want to end my life".to_string()
        );
    }

    #[tokio::test]
    async fn speech_after_shutdown_surfaces_one_warning() {
        let (_dir, session) = session_with(0).await;
        let queue = Arc::new(
            SpeechQueue::start(Box::new(RecordingSynth {
                events: Arc::new(Mutex::new(Vec::new())),
            }))
            .unwrap(),
        );
        let session = session.with_speech_output(queue);
        session.shutdown().await;

        let outcome = session.submit("First. Second. Third.").await.unwrap();

        let warnings: Vec<_> = outcome
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(outcome.turn.status, ChatStatus::Ok);
    }

    #[tokio::test]
    async fn log_mood_is_listed_first_in_history() {
        let (_dir, session) = session_with(0).await;

        session.log_mood(Mood::Stressed).await.unwrap();
        let notice = session.log_mood(Mood::Relaxed).await.unwrap();

        assert_eq!(notice.level, NoticeLevel::Success);
        let moods = session.history().await.unwrap().moods;
        assert_eq!(moods.len(), 2);
        assert_eq!(moods[0].mood, Mood::Relaxed);
    }

    #[tokio::test]
    async fn speak_instead_maps_capture_errors() {
        let (_dir, session) = session_with(0).await;
        assert!(matches!(
            session.speak_instead().await,
            Err(AppError::SpeechRecognitionService(_))
        ));

        let session = session.with_speech_input(Arc::new(FixedTranscriber(Err(()))));
        assert!(matches!(
            session.speak_instead().await,
            Err(AppError::SpeechRecognitionNoMatch)
        ));

        let session = session.with_speech_input(Arc::new(FixedTranscriber(Ok("hello there"))));
        assert_eq!(session.speak_instead().await.unwrap(), "hello there");
    }
}
