use crate::error::AppError;
use crate::session::{Notice, NoticeLevel, Session};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod command;
mod render;

use command::Command;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Runs the interactive loop on stdin until `/quit`, end of input or Ctrl-C.
pub async fn run(session: &Session) -> Result<()> {
    println!("{}", render::banner());
    println!("{}", render::help());

    repl(session, spawn_stdin_reader()?).await
}

/// Reads stdin on its own thread. A blocked read cannot be cancelled, so the
/// thread is left detached and never holds up shutdown.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);

    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

async fn repl(session: &Session, mut lines: mpsc::Receiver<String>) -> Result<()> {
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                println!();
                break;
            }
        };

        let Some(line) = line else {
            debug!("End of input");
            break;
        };

        if handle(session, command::parse(&line)).await == Flow::Quit {
            break;
        }
    }

    Ok(())
}

async fn handle(session: &Session, command: Command) -> Flow {
    match command {
        Command::Quit => return Flow::Quit,
        Command::Help => println!("{}", render::help()),
        Command::Moods => println!("{}", render::mood_menu()),
        Command::Resources => println!("{}", render::resources()),
        Command::Status => println!("{}", render::speech_status(&session.speech_status())),
        Command::Unknown(name) => show(&Notice::new(
            NoticeLevel::Warning,
            format!("Unknown command /{}, type /help for the list", name),
        )),
        Command::Mood(arg) => match arg.parse() {
            Ok(mood) => match session.log_mood(mood).await {
                Ok(notice) => show(&notice),
                Err(e) => show_err(&e),
            },
            Err(e) => show(&Notice::new(NoticeLevel::Warning, e.to_string())),
        },
        Command::History => match session.history().await {
            Ok(history) => println!("{}", render::history(&history)),
            Err(e) => show_err(&e),
        },
        Command::ClearSpeech => match session.clear_pending_speech() {
            Some(n) => println!("Cleared {} pending utterance(s).", n),
            None => println!("Speech output is disabled."),
        },
        Command::Speak => match session.speak_instead().await {
            Ok(text) => {
                println!("🎤 You said: {}", text);
                submit(session, &text).await;
            }
            Err(e) => show_err(&e),
        },
        Command::Chat(text) => submit(session, &text).await,
    }
    Flow::Continue
}

async fn submit(session: &Session, text: &str) {
    println!("Thinking...");
    match session.submit(text).await {
        Ok(outcome) => println!("{}", render::submit_outcome(&outcome)),
        Err(e) => show_err(&e),
    }
}

fn show(notice: &Notice) {
    println!("{}", render::notice(notice));
}

fn show_err(err: &AppError) {
    show(&Notice::from(err));
}
