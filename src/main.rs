mod config;
mod console;
mod crisis;
mod entity;
mod error;
mod generation;
mod mood;
mod session;
mod speech;
mod store;
mod utils;

use anyhow::Result;
use error::AppError;
use generation::{GenerationClient, RetryPolicy};
use session::Session;
use speech::{CommandSynthesizer, HttpTranscriber, SpeechQueue};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(err @ AppError::MissingCredential) => {
                eprintln!("❌ {}", err);
                return Ok(ExitCode::FAILURE);
            }
            _ => return Err(e),
        },
    };

    let store = store::Store::open(&config.data_dir).await?;
    let generator = GenerationClient::new(
        generation::create_generator(&config)?,
        RetryPolicy::from_config(&config),
    );
    info!(
        "Using {} model {} (data dir {})",
        config.api_provider,
        config.model,
        config.data_dir.display()
    );

    let mut session = Session::new(store, generator, config.crisis_keywords.clone());

    if config.speech.output_enabled {
        let synth = CommandSynthesizer::new(&config.speech.tts_program, &config.speech.tts_args);
        match SpeechQueue::start(Box::new(synth)) {
            Ok(queue) => session = session.with_speech_output(Arc::new(queue)),
            Err(e) => warn!("Speech output unavailable: {}", e),
        }
    }

    if config.speech.input_enabled() {
        let transcriber = HttpTranscriber::new(&config.speech, &config.data_dir);
        session = session.with_speech_input(Arc::new(transcriber));
    }

    if let Err(e) = console::run(&session).await {
        error!("Console error: {}", e);
    }

    session.shutdown().await;
    info!("Shutdown complete");

    Ok(ExitCode::SUCCESS)
}
