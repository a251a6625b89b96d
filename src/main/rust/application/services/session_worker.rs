use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::domain::entities::{SessionId, StreamSession};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ChildProcess, MetricsReporter, ProcessLauncher, SessionListener};
use crate::domain::value_objects::{DestinationSet, Invocation, LogRecord, SessionStatus};

const STOPPED_MESSAGE: &str = "Streaming stopped";

/// Upper bound on reading leftover output once the child was told to stop.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

/// How the output pump ended
enum PumpOutcome {
    Exited,
    Cancelled,
    ReadFailed(DomainError),
}

/// Drives one session on its own task. Sole writer of the session state.
pub(crate) struct SessionWorker {
    pub(crate) id: SessionId,
    pub(crate) session: Arc<Mutex<StreamSession>>,
    pub(crate) launcher: Arc<dyn ProcessLauncher>,
    pub(crate) listener: Arc<dyn SessionListener>,
    pub(crate) metrics: Arc<dyn MetricsReporter>,
    pub(crate) status_tx: watch::Sender<SessionStatus>,
    pub(crate) cancel: CancellationToken,
}

impl SessionWorker {
    /// Announce the schedule, wait for the start time, then run.
    pub(crate) async fn run_scheduled(
        self,
        delay: Duration,
        start_display: String,
        invocation: Invocation,
    ) {
        self.set_status(SessionStatus::Scheduled, None).await;
        self.log(LogRecord::notice(format!(
            "Streaming will start automatically at {}",
            start_display
        )))
        .await;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.log(LogRecord::notice("Scheduled start cancelled")).await;
                self.log(LogRecord::notice(STOPPED_MESSAGE)).await;
                self.set_status(SessionStatus::Stopped, None).await;
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        self.run(invocation).await;
    }

    /// Start time already passed: say so, then behave exactly like `run`.
    pub(crate) async fn run_overdue(self, start_display: String, invocation: Invocation) {
        self.log(LogRecord::notice(format!(
            "Start time {} has already passed, streaming starts now",
            start_display
        )))
        .await;
        self.run(invocation).await;
    }

    pub(crate) async fn run(self, invocation: Invocation) {
        if self.cancel.is_cancelled() {
            self.log(LogRecord::notice(STOPPED_MESSAGE)).await;
            self.set_status(SessionStatus::Stopped, None).await;
            return;
        }

        let destinations = {
            let session = self.session.lock().await;
            session.request().destinations().clone()
        };
        self.log(LogRecord::notice(format!(
            "Starting stream to {} destination(s)",
            destinations.len()
        )))
        .await;

        let mut process = match self.launcher.launch(&invocation).await {
            Ok(process) => process,
            Err(e) => {
                tracing::error!(session_id = %self.id, "Failed to spawn transcoder: {}", e);
                self.log(LogRecord::error(format!("Error: {}", e))).await;
                self.log(LogRecord::notice(STOPPED_MESSAGE)).await;
                self.set_status(SessionStatus::Failed, None).await;
                return;
            }
        };

        let spawned_at = Instant::now();
        let went_live = {
            let mut session = self.session.lock().await;
            let from = session.status();
            session.mark_live(process.pid(), spawned_at).map(|_| from)
        };
        self.apply(went_live, SessionStatus::Live);

        let outcome = self.pump(&mut process, &destinations, spawned_at).await;

        if !matches!(outcome, PumpOutcome::Exited) {
            if let Err(e) = process.terminate().await {
                tracing::warn!(session_id = %self.id, "Failed to terminate transcoder: {}", e);
            }
        }
        if matches!(outcome, PumpOutcome::Cancelled) {
            self.drain(&mut process, &destinations, spawned_at).await;
        }

        let exit_code = match process.wait().await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(session_id = %self.id, "Failed to reap transcoder: {}", e);
                None
            }
        };
        drop(process);

        let terminal = match outcome {
            PumpOutcome::ReadFailed(e) => {
                self.log(LogRecord::error(format!("Error: {}", e))).await;
                SessionStatus::Failed
            }
            PumpOutcome::Exited | PumpOutcome::Cancelled => SessionStatus::Stopped,
        };

        let message = match exit_code {
            Some(code) => format!("{} (exit code {})", STOPPED_MESSAGE, code),
            None => STOPPED_MESSAGE.to_string(),
        };
        self.log(LogRecord::notice(message)).await;

        self.set_status(terminal, exit_code).await;
    }

    async fn pump(
        &self,
        process: &mut Box<dyn ChildProcess>,
        destinations: &DestinationSet,
        spawned_at: Instant,
    ) -> PumpOutcome {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return PumpOutcome::Cancelled,
                line = process.next_line() => match line {
                    Ok(Some(line)) => self.relay(&line, destinations, spawned_at).await,
                    Ok(None) => return PumpOutcome::Exited,
                    Err(e) => return PumpOutcome::ReadFailed(e),
                },
            }
        }
    }

    /// Relay what the child printed between the stop request and its exit.
    async fn drain(
        &self,
        process: &mut Box<dyn ChildProcess>,
        destinations: &DestinationSet,
        spawned_at: Instant,
    ) {
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Ok(Some(line)) = process.next_line().await {
                self.relay(&line, destinations, spawned_at).await;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(session_id = %self.id, "Transcoder output still open after stop");
        }
    }

    async fn relay(&self, line: &str, destinations: &DestinationSet, spawned_at: Instant) {
        self.metrics.report_output_line();
        let text = destinations.redact(line.trim());
        self.log(LogRecord::output(spawned_at.elapsed(), text)).await;
    }

    async fn log(&self, record: LogRecord) {
        self.session.lock().await.push_log(record.clone());
        self.listener.on_log(self.id, &record);
    }

    async fn set_status(&self, status: SessionStatus, exit_code: Option<i32>) {
        let result = {
            let mut session = self.session.lock().await;
            let from = session.status();
            match status {
                SessionStatus::Scheduled => session.mark_scheduled(),
                SessionStatus::Failed => session.mark_failed(),
                _ => session.mark_stopped(exit_code),
            }
            .map(|_| from)
        };
        self.apply(result, status);
    }

    fn apply(&self, result: Result<SessionStatus>, to: SessionStatus) {
        match result {
            Ok(from) => self.announce(from, to),
            Err(e) => tracing::warn!(session_id = %self.id, "{}", e),
        }
    }

    fn announce(&self, from: SessionStatus, to: SessionStatus) {
        self.metrics.report_status_change(from, to);
        self.listener.on_status(self.id, to);
        // Subscribers waking on a terminal status may rely on the listener having seen it
        self.status_tx.send_replace(to);
    }
}
