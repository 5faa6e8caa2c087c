use crate::entity::{chats, moods};
use crate::generation::Reply;
use crate::mood::Mood;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const DB_FILE: &str = "mindease.db";

const STATUS_OK: &str = "ok";
const STATUS_ERROR: &str = "error";

/// Append-only SQLite store for mood entries and chat turns.
///
/// Each operation opens its own connection on the blocking pool. Inserts are
/// serialized by `write_lock` so there is at most one writer at a time.
pub struct Store {
    db_url: String,
    write_lock: Mutex<()>,
}

impl Store {
    pub async fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;
        let db_path = data_dir.join(DB_FILE);
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let store = Arc::new(Self {
            db_url,
            write_lock: Mutex::new(()),
        });
        store.init_schema().await?;

        info!("Store ready ({})", db_path.display());
        Ok(store)
    }

    /// Creates the `moods` and `chats` tables when absent. Safe to run on
    /// every start.
    pub async fn init_schema(&self) -> Result<()> {
        let db_url = self.db_url.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let db = Database::connect(&db_url).context("Failed to open SQLite")?;

            db.get_schema_builder()
                .register(moods::Entity)
                .register(chats::Entity)
                .sync(&db)
                .context("Failed to create schema")?;

            Ok(())
        })
        .await??;

        Ok(())
    }

    pub async fn insert_mood(&self, mood: Mood) -> Result<MoodEntry> {
        let _writer = self.write_lock.lock().await;
        let now = Utc::now().timestamp_micros();

        let record = moods::ActiveModel {
            id: NotSet,
            mood: Set(mood.label().to_string()),
            timestamp_us: Set(now),
        };

        let db_url = self.db_url.clone();

        let id = tokio::task::spawn_blocking(move || -> Result<i64> {
            let db = Database::connect(&db_url)?;
            let result = moods::Entity::insert(record).exec(&db)?;
            Ok(result.last_insert_id)
        })
        .await?
        .context("Failed to insert mood")?;

        debug!("Logged mood {} (id {})", mood.label(), id);
        Ok(MoodEntry {
            id,
            mood,
            timestamp: timestamp_from_micros(now),
        })
    }

    pub async fn insert_chat(&self, user_input: &str, reply: &Reply) -> Result<ChatTurn> {
        let _writer = self.write_lock.lock().await;
        let now = Utc::now().timestamp_micros();
        let bot_reply = reply.text();
        let (status, error_kind) = match reply {
            Reply::Generated(_) => (ChatStatus::Ok, None),
            Reply::Failed(err) => (ChatStatus::Error, Some(err.kind().to_string())),
        };

        let record = chats::ActiveModel {
            id: NotSet,
            user_input: Set(user_input.to_string()),
            bot_reply: Set(bot_reply.clone()),
            status: Set(status.as_str().to_string()),
            error_kind: Set(error_kind.clone()),
            timestamp_us: Set(now),
        };

        let db_url = self.db_url.clone();

        let id = tokio::task::spawn_blocking(move || -> Result<i64> {
            let db = Database::connect(&db_url)?;
            let result = chats::Entity::insert(record).exec(&db)?;
            Ok(result.last_insert_id)
        })
        .await?
        .context("Failed to insert chat turn")?;

        debug!("Stored chat turn {} ({})", id, status.as_str());
        Ok(ChatTurn {
            id,
            user_input: user_input.to_string(),
            bot_reply,
            status,
            error_kind,
            timestamp: timestamp_from_micros(now),
        })
    }

    /// The `limit` newest mood entries, newest first.
    pub async fn recent_moods(&self, limit: usize) -> Result<Vec<MoodEntry>> {
        let db_url = self.db_url.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<MoodEntry>> {
            let db = Database::connect(&db_url)?;
            let rows = moods::Entity::find()
                .order_by_desc(moods::Column::TimestampUs)
                .order_by_desc(moods::Column::Id)
                .limit(limit as u64)
                .all(&db)?;

            rows.into_iter().map(MoodEntry::try_from).collect()
        })
        .await?
    }

    /// The `limit` newest chat turns, newest first.
    pub async fn recent_chats(&self, limit: usize) -> Result<Vec<ChatTurn>> {
        let db_url = self.db_url.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<ChatTurn>> {
            let db = Database::connect(&db_url)?;
            let rows = chats::Entity::find()
                .order_by_desc(chats::Column::TimestampUs)
                .order_by_desc(chats::Column::Id)
                .limit(limit as u64)
                .all(&db)?;

            Ok(rows.into_iter().map(|r| r.into()).collect())
        })
        .await?
    }
}

fn timestamp_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct MoodEntry {
    pub id: i64,
    pub mood: Mood,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<moods::Model> for MoodEntry {
    type Error = anyhow::Error;

    fn try_from(r: moods::Model) -> Result<Self> {
        let mood = r
            .mood
            .parse()
            .with_context(|| format!("Corrupt mood row {}", r.id))?;
        Ok(Self {
            id: r.id,
            mood,
            timestamp: timestamp_from_micros(r.timestamp_us),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Ok,
    Error,
}

impl ChatStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatStatus::Ok => STATUS_OK,
            ChatStatus::Error => STATUS_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub id: i64,
    pub user_input: String,
    pub bot_reply: String,
    pub status: ChatStatus,
    pub error_kind: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<chats::Model> for ChatTurn {
    fn from(r: chats::Model) -> Self {
        Self {
            id: r.id,
            user_input: r.user_input,
            bot_reply: r.bot_reply,
            status: if r.status == STATUS_ERROR {
                ChatStatus::Error
            } else {
                ChatStatus::Ok
            },
            error_kind: r.error_kind,
            timestamp: timestamp_from_micros(r.timestamp_us),
        }
    }
}
