use crate::crisis;
use crate::mood::Mood;
use crate::session::{History, Notice, NoticeLevel, SpeechStatus, SubmitOutcome};
use crate::speech::WorkerState;
use crate::store::{ChatStatus, ChatTurn, MoodEntry};
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(super) fn banner() -> String {
    "🧠 MindEase: your mental health companion\n\
     Log how you feel, talk it through, and find support when you need it."
        .to_string()
}

pub(super) fn help() -> String {
    [
        "Commands:",
        "  /mood <mood>   log a mood (name, emoji or number from /moods)",
        "  /moods         list the moods you can log",
        "  /speak         talk instead of typing",
        "  /history       recent moods and conversations",
        "  /resources     mental health resources",
        "  /status        speech status",
        "  /clear         stop speech that has not started yet",
        "  /help          show this list",
        "  /quit          leave",
        "Anything else is sent to MindEase.",
    ]
    .join("\n")
}

pub(super) fn mood_menu() -> String {
    let mut out = String::from("How are you feeling today?");
    for (i, mood) in Mood::ALL.iter().enumerate() {
        let _ = write!(out, "\n  {}. {}", i + 1, mood);
    }
    out
}

pub(super) fn resources() -> String {
    let mut out = String::from("📚 Mental Health Resources");
    for line in crisis::RESOURCES {
        let _ = write!(out, "\n  • {}", line);
    }
    out
}

pub(super) fn speech_status(status: &SpeechStatus) -> String {
    let output = match status.output {
        None => "off".to_string(),
        Some((state, pending)) => {
            let state = match state {
                WorkerState::Idle => "idle",
                WorkerState::Speaking => "speaking",
                WorkerState::Terminated => "stopped",
            };
            format!("{} ({} pending)", state, pending)
        }
    };
    let input = if status.input_enabled { "on" } else { "off" };
    format!("🔊 Speech output: {}\n🎤 Speech input: {}", output, input)
}

pub(super) fn history(history: &History) -> String {
    let mut out = String::from("📈 Mood History");
    if history.moods.is_empty() {
        out.push_str("\n  No moods logged yet.");
    }
    for entry in &history.moods {
        out.push('\n');
        out.push_str(&mood_line(entry));
    }

    out.push_str("\n\n💬 Recent Conversations");
    if history.chats.is_empty() {
        out.push_str("\n  No conversations yet.");
    }
    for turn in &history.chats {
        out.push('\n');
        out.push_str(&chat_block(turn));
    }
    out
}

pub(super) fn submit_outcome(outcome: &SubmitOutcome) -> String {
    let mut out = String::new();
    if outcome.turn.status == ChatStatus::Ok {
        let _ = write!(out, "🤖 MindEase: {}", outcome.turn.bot_reply);
    }
    for notice in &outcome.notices {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&self::notice(notice));
    }
    if outcome.crisis {
        out.push_str("\n📚 Type /resources for more places to get support.");
    }
    out
}

pub(super) fn notice(notice: &Notice) -> String {
    let icon = match notice.level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Info => "ℹ️",
        NoticeLevel::Warning => "⚠️",
        NoticeLevel::Error => "❌",
    };
    // Crisis notices carry their own icon.
    if notice.message.starts_with('🚨') {
        return notice.message.clone();
    }
    format!("{} {}", icon, notice.message)
}

fn mood_line(entry: &MoodEntry) -> String {
    format!("  {} - {}", local_time(entry.timestamp), entry.mood)
}

fn chat_block(turn: &ChatTurn) -> String {
    let marker = match (turn.status, turn.error_kind.as_deref()) {
        (ChatStatus::Ok, _) => String::new(),
        (ChatStatus::Error, Some(kind)) => format!(" (failed: {})", kind),
        (ChatStatus::Error, None) => " (failed)".to_string(),
    };
    format!(
        "  [{}]{}\n  You: {}\n  MindEase: {}",
        local_time(turn.timestamp),
        marker,
        turn.user_input,
        turn.bot_reply
    )
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(status: ChatStatus, reply: &str) -> ChatTurn {
        ChatTurn {
            id: 1,
            user_input: "hi".into(),
            bot_reply: reply.into(),
            status,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn mood_menu_is_numbered_in_order() {
        let menu = mood_menu();
        assert!(menu.contains("1. 😊 Happy"));
        assert!(menu.contains("4. 😌 Relaxed"));
    }

    #[test]
    fn empty_history_says_so() {
        let text = history(&History {
            moods: Vec::new(),
            chats: Vec::new(),
        });
        assert!(text.contains("No moods logged yet."));
        assert!(text.contains("No conversations yet."));
    }

    #[test]
    fn failed_turns_are_marked_in_history() {
        let text = history(&History {
            moods: vec![MoodEntry {
                id: 1,
                mood: Mood::Sad,
                timestamp: Utc::now(),
            }],
            chats: vec![ChatTurn {
                error_kind: Some("timeout".into()),
                ..turn(ChatStatus::Error, "⚠️ Sorry")
            }],
        });
        assert!(text.contains("😔 Sad"));
        assert!(text.contains("(failed: timeout)"));
    }

    #[test]
    fn failed_outcome_shows_only_notices() {
        let outcome = SubmitOutcome {
            turn: turn(ChatStatus::Error, "⚠️ Sorry"),
            crisis: true,
            notices: vec![
                Notice::new(NoticeLevel::Error, "service down"),
                Notice::new(NoticeLevel::Error, crisis::HELPLINE_NOTICE),
            ],
        };
        let text = submit_outcome(&outcome);
        assert!(!text.contains("MindEase:"));
        assert!(text.contains("❌ service down"));
        assert!(text.lines().any(|l| l == crisis::HELPLINE_NOTICE));
        assert!(text.contains("/resources"));
    }

    #[test]
    fn ordinary_outcome_shows_the_reply_without_support_hint() {
        let outcome = SubmitOutcome {
            turn: turn(ChatStatus::Ok, "Glad to hear it."),
            crisis: false,
            notices: Vec::new(),
        };
        assert_eq!(submit_outcome(&outcome), "🤖 MindEase: Glad to hear it.");
    }

    #[test]
    fn speech_status_reports_disabled_output() {
        let text = speech_status(&SpeechStatus {
            output: None,
            input_enabled: true,
        });
        assert!(text.contains("output: off"));
        assert!(text.contains("input: on"));
    }
}
