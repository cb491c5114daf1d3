//! Inbound completion events.
//!
//! The host pushes [`CompletionEvent`]s into an mpsc channel; the listener
//! turns each one into a queued export task. It exits once every sender is
//! dropped or when stopped.

use std::sync::Arc;

use course_export_core::ExportTaskScheduler;
use course_export_domain::CompletionEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Listener already running")]
    AlreadyRunning,

    #[error("Listener not running")]
    NotRunning,

    #[error("Listener task panicked: {0}")]
    Panicked(String),
}

/// Schedules an export for every completion event received.
pub struct CompletionListener {
    scheduler: Arc<ExportTaskScheduler>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<usize>>,
}

impl CompletionListener {
    pub fn new(scheduler: Arc<ExportTaskScheduler>) -> Self {
        Self { scheduler, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start consuming `events` in the background.
    #[instrument(skip_all)]
    pub fn start(&mut self, events: mpsc::Receiver<CompletionEvent>) -> Result<(), ListenerError> {
        if self.is_running() {
            return Err(ListenerError::AlreadyRunning);
        }

        info!("Starting completion listener");
        self.cancellation = CancellationToken::new();

        let scheduler = Arc::clone(&self.scheduler);
        let cancel = self.cancellation.clone();
        self.task_handle = Some(tokio::spawn(Self::listen(scheduler, events, cancel)));
        Ok(())
    }

    /// Cancel the listener and wait for it.
    pub async fn stop(&mut self) -> Result<usize, ListenerError> {
        self.cancellation.cancel();
        self.join().await
    }

    /// Wait for the listener to exit on its own, i.e. after every sender
    /// was dropped. Returns how many events were scheduled.
    pub async fn join(&mut self) -> Result<usize, ListenerError> {
        let handle = self.task_handle.take().ok_or(ListenerError::NotRunning)?;
        let scheduled = handle.await.map_err(|e| ListenerError::Panicked(e.to_string()))?;
        info!(scheduled, "Completion listener stopped");
        Ok(scheduled)
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn listen(
        scheduler: Arc<ExportTaskScheduler>,
        mut events: mpsc::Receiver<CompletionEvent>,
        cancel: CancellationToken,
    ) -> usize {
        let mut scheduled = 0_usize;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Completion listener cancelled");
                    break;
                }
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        debug!("Completion channel closed");
                        break;
                    };
                    match scheduler.schedule(&event).await {
                        Ok(handle) => {
                            scheduled += 1;
                            debug!(task_id = %handle.id, rescheduled = handle.rescheduled, "completion queued");
                        }
                        Err(err) => error!(
                            user_id = event.related_user_id,
                            course_id = event.course_id,
                            error = %err,
                            "failed to schedule export"
                        ),
                    }
                }
            }
        }
        scheduled
    }
}

impl Drop for CompletionListener {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CompletionListener dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}
