use super::{SpeechError, Synthesizer};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Speaking,
    Terminated,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WorkerState::Idle,
            1 => WorkerState::Speaking,
            _ => WorkerState::Terminated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Speaking => 1,
            WorkerState::Terminated => 2,
        }
    }
}

/// What the worker does with utterances still queued when the queue closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Speak everything already queued, then exit.
    Drain,
    /// Drop everything not yet started, then exit.
    Discard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub spoken: usize,
    pub failed: usize,
    pub discarded: usize,
}

struct Utterance {
    generation: u64,
    text: String,
}

struct Shared {
    state: AtomicU8,
    /// Bumped by `clear_pending`; utterances from older generations are skipped.
    generation: AtomicU64,
    discard: AtomicBool,
    pending: AtomicUsize,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// FIFO text-to-speech queue drained by a single worker thread.
///
/// Shutdown protocol: `close` drops the sender, the worker drains or
/// discards what is left according to the [`DrainPolicy`] and exits, and
/// `shutdown` joins it and returns the final [`ShutdownReport`].
pub struct SpeechQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Utterance>>>,
    worker: Mutex<Option<JoinHandle<ShutdownReport>>>,
    shared: Arc<Shared>,
}

impl SpeechQueue {
    pub fn start(synth: Box<dyn Synthesizer>) -> Result<Self, SpeechError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: AtomicU8::new(WorkerState::Idle.as_u8()),
            generation: AtomicU64::new(0),
            discard: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
        });

        let worker = thread::Builder::new().name("speech-worker".into()).spawn({
            let shared = shared.clone();
            move || run_worker(rx, synth, &shared)
        })?;

        info!("Speech worker started");
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            shared,
        })
    }

    /// Queues `text` and returns immediately.
    pub fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let guard = self.tx.lock().map_err(|_| SpeechError::QueueClosed)?;
        let tx = guard.as_ref().ok_or(SpeechError::QueueClosed)?;

        let utterance = Utterance {
            generation: self.shared.generation.load(Ordering::SeqCst),
            text: text.to_string(),
        };
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(utterance).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(SpeechError::QueueClosed);
        }
        Ok(())
    }

    /// Drops every queued utterance that has not started yet. The one being
    /// spoken, if any, plays to the end. Returns how many were dropped.
    pub fn clear_pending(&self) -> usize {
        let _guard = self.tx.lock();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let cleared = self.shared.pending.load(Ordering::SeqCst);
        info!("Cleared {} pending utterance(s)", cleared);
        cleared
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Stops accepting new utterances. Idempotent.
    pub fn close(&self, policy: DrainPolicy) {
        if policy == DrainPolicy::Discard {
            self.shared.discard.store(true, Ordering::SeqCst);
        }
        if let Ok(mut tx) = self.tx.lock()
            && tx.take().is_some()
        {
            info!("Speech queue closed ({:?})", policy);
        }
    }

    /// Closes the queue and waits for the worker to confirm termination.
    pub async fn shutdown(&self, policy: DrainPolicy) -> Result<ShutdownReport, SpeechError> {
        self.close(policy);

        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        let Some(handle) = handle else {
            return Ok(ShutdownReport::default());
        };

        let report = tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|_| SpeechError::WorkerPanicked)?
            .map_err(|_| SpeechError::WorkerPanicked)?;

        info!(
            "Speech worker terminated ({} spoken, {} failed, {} discarded)",
            report.spoken, report.failed, report.discarded
        );
        Ok(report)
    }
}

impl Drop for SpeechQueue {
    fn drop(&mut self) {
        self.close(DrainPolicy::Discard);
    }
}

fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Utterance>,
    mut synth: Box<dyn Synthesizer>,
    shared: &Shared,
) -> ShutdownReport {
    let mut report = ShutdownReport::default();

    while let Some(utterance) = rx.blocking_recv() {
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        if shared.discard.load(Ordering::SeqCst)
            || utterance.generation < shared.generation.load(Ordering::SeqCst)
        {
            report.discarded += 1;
            continue;
        }

        shared.set_state(WorkerState::Speaking);
        // A failing or panicking engine costs one utterance, never the worker.
        match panic::catch_unwind(AssertUnwindSafe(|| synth.synthesize(&utterance.text))) {
            Ok(Ok(())) => {
                report.spoken += 1;
                debug!("Utterance spoken ({} chars)", utterance.text.len());
            }
            Ok(Err(e)) => {
                report.failed += 1;
                error!("Speech synthesis failed, skipping utterance: {}", e);
            }
            Err(_) => {
                report.failed += 1;
                error!("Speech engine panicked, skipping utterance");
            }
        }
        shared.set_state(WorkerState::Idle);
    }

    shared.set_state(WorkerState::Terminated);
    report
}
