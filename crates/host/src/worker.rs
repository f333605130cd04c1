// crates/host/src/worker.rs

//! Single background worker so a front end stays responsive while a run is
//! in flight. At most one run exists at a time; a second `submit` is refused
//! until the first one has finished.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use calendar_agent_core::ai_client::CompletionClient;
use calendar_agent_core::desktop_client::RemoteDesktop;
use calendar_agent_core::types::{ClarificationAnswer, ClarificationQuestion};

use crate::clarify::Clarifier;
use crate::pipeline::{Pipeline, RunReport};

/// Progress reported by the worker thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A run has started for this input.
    Started(String),
    /// The run needs answers; reply with [`PipelineWorker::answer`].
    /// Questions left out of the reply count as unanswered.
    Questions(Vec<ClarificationQuestion>),
    /// The run is over, including by panic. The worker is already idle when
    /// this arrives.
    Finished(Result<RunReport, String>),
}

pub struct PipelineWorker<C: CompletionClient + 'static, D: RemoteDesktop + 'static> {
    pipeline: Arc<Pipeline<C, D>>,
    busy: Arc<AtomicBool>,
    events: Sender<WorkerEvent>,
    answers: Mutex<Option<Sender<Vec<ClarificationAnswer>>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: CompletionClient + 'static, D: RemoteDesktop + 'static> PipelineWorker<C, D> {
    pub fn new(pipeline: Arc<Pipeline<C, D>>) -> (Self, Receiver<WorkerEvent>) {
        let (events, rx) = mpsc::channel();
        let worker = Self {
            pipeline,
            busy: Arc::new(AtomicBool::new(false)),
            events,
            answers: Mutex::new(None),
            handle: Mutex::new(None),
        };
        (worker, rx)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a run on a fresh worker thread.
    pub fn submit(&self, user_input: impl Into<String>) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            anyhow::bail!("a request is already running; wait for it to finish");
        }

        let user_input = user_input.into();
        let (answer_tx, answer_rx) = mpsc::channel();
        *self.answers.lock().unwrap_or_else(|e| e.into_inner()) = Some(answer_tx);

        let pipeline = Arc::clone(&self.pipeline);
        let busy = Arc::clone(&self.busy);
        let events = self.events.clone();

        let spawned = std::thread::Builder::new()
            .name("pipeline-worker".to_string())
            .spawn(move || {
                let _ = events.send(WorkerEvent::Started(user_input.clone()));

                let mut clarifier = ChannelClarifier {
                    events: events.clone(),
                    answers: answer_rx,
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    pipeline.run(&user_input, &mut clarifier)
                }))
                .unwrap_or_else(|_| Err(anyhow::anyhow!("pipeline worker panicked")))
                .map_err(|e| format!("{:#}", e));

                busy.store(false, Ordering::SeqCst);
                let _ = events.send(WorkerEvent::Finished(outcome));
            });

        match spawned {
            Ok(handle) => {
                *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.busy.store(false, Ordering::SeqCst);
                Err(e).context("failed to spawn pipeline worker thread")
            }
        }
    }

    /// Reply to the most recent [`WorkerEvent::Questions`].
    pub fn answer(&self, answers: Vec<ClarificationAnswer>) -> Result<()> {
        let guard = self.answers.lock().unwrap_or_else(|e| e.into_inner());
        let tx = guard.as_ref().context("no run is waiting for answers")?;
        tx.send(answers)
            .map_err(|_| anyhow::anyhow!("the run is no longer waiting for answers"))
    }

    /// Wait for the current worker thread, if any, to exit.
    pub fn join(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("pipeline worker thread panicked");
                self.busy.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// Forwards questions to the front end and waits for its answers.
struct ChannelClarifier {
    events: Sender<WorkerEvent>,
    answers: Receiver<Vec<ClarificationAnswer>>,
}

impl Clarifier for ChannelClarifier {
    fn ask(&mut self, questions: &[ClarificationQuestion]) -> Result<Vec<ClarificationAnswer>> {
        self.events
            .send(WorkerEvent::Questions(questions.to_vec()))
            .map_err(|_| anyhow::anyhow!("nobody is listening for clarification questions"))?;

        self.answers
            .recv()
            .context("front end went away before answering")
    }
}
