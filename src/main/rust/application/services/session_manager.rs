use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::{watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use super::session_worker::SessionWorker;
use crate::domain::entities::{
    ScheduledStart, SessionId, SessionSnapshot, StreamSession, DEFAULT_LOG_CAPACITY,
};
use crate::domain::ports::{MetricsReporter, ProcessLauncher, SessionListener};
use crate::domain::value_objects::{SessionStatus, StreamRequest};
use crate::infrastructure::ffmpeg::CommandBuilder;

/// Caller-side handle to a session: its id plus a status subscription.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Resolve once the session reaches Stopped or Failed.
    pub async fn wait(&mut self) -> SessionStatus {
        if let Ok(status) = self.status.wait_for(|s| s.is_terminal()).await {
            return *status;
        }
        *self.status.borrow()
    }
}

/// Finished sessions kept for snapshots before the oldest are evicted.
pub const DEFAULT_FINISHED_RETENTION: usize = 32;

struct SessionEntry {
    created_at: DateTime<Local>,
    session: Arc<Mutex<StreamSession>>,
    cancel: CancellationToken,
    status: watch::Receiver<SessionStatus>,
}

/// Application service owning every transcoding session it starts.
///
/// Finished sessions stay queryable until `prune_finished` is called or more
/// than the retention limit have accumulated; registering a new session then
/// evicts the oldest finished ones.
pub struct SessionManager {
    builder: CommandBuilder,
    launcher: Arc<dyn ProcessLauncher>,
    listener: Arc<dyn SessionListener>,
    metrics: Arc<dyn MetricsReporter>,
    registry: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    log_capacity: usize,
    finished_retention: usize,
}

impl SessionManager {
    pub fn new(
        builder: CommandBuilder,
        launcher: Arc<dyn ProcessLauncher>,
        listener: Arc<dyn SessionListener>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            builder,
            launcher,
            listener,
            metrics,
            registry: Arc::new(RwLock::new(HashMap::new())),
            log_capacity: DEFAULT_LOG_CAPACITY,
            finished_retention: DEFAULT_FINISHED_RETENTION,
        }
    }

    pub fn with_log_capacity(mut self, log_capacity: usize) -> Self {
        self.log_capacity = log_capacity.max(1);
        self
    }

    pub fn with_finished_retention(mut self, finished_retention: usize) -> Self {
        self.finished_retention = finished_retention;
        self
    }

    /// Start streaming now (use case). The request is assumed validated.
    pub async fn start(&self, request: StreamRequest) -> SessionHandle {
        let invocation = self.builder.build_for(&request);
        let platforms = request.destinations().platforms();
        let (worker, handle) = self.register(request).await;

        tracing::info!(
            session_id = %handle.id(),
            destinations = ?platforms,
            "Starting stream session"
        );

        tokio::spawn(worker.run(invocation));
        handle
    }

    /// Start streaming at `start_at`, or immediately if that time has passed.
    pub async fn schedule_start(
        &self,
        request: StreamRequest,
        start_at: DateTime<Local>,
    ) -> SessionHandle {
        let scheduled = ScheduledStart::new(start_at, request);
        let delay = scheduled.delay_from(Local::now());
        let start_display = scheduled.display_time();
        let invocation = self.builder.build_for(scheduled.request());
        let (worker, handle) = self.register(scheduled.into_request()).await;

        match delay {
            Some(delay) => {
                tracing::info!(
                    session_id = %handle.id(),
                    start_at = %start_display,
                    "Stream session scheduled"
                );
                tokio::spawn(worker.run_scheduled(delay, start_display, invocation));
            }
            None => {
                tracing::info!(
                    session_id = %handle.id(),
                    start_at = %start_display,
                    "Scheduled time already passed, starting now"
                );
                tokio::spawn(worker.run_overdue(start_display, invocation));
            }
        }

        handle
    }

    /// Stop one session and wait until it is offline.
    ///
    /// Unknown or finished sessions are not an error; the listener still
    /// hears a terminal status.
    pub async fn stop(&self, id: SessionId) {
        let target = {
            let registry = self.registry.read().await;
            registry
                .get(&id)
                .map(|entry| (entry.cancel.clone(), entry.status.clone()))
        };

        let Some((cancel, mut status)) = target else {
            tracing::debug!(session_id = %id, "Stop requested for unknown session");
            self.listener.on_status(id, SessionStatus::Stopped);
            return;
        };

        let current = *status.borrow();
        if current.is_terminal() {
            self.listener.on_status(id, current);
            return;
        }

        tracing::info!(session_id = %id, "Stopping stream session");
        cancel.cancel();
        let _ = status.wait_for(|s| s.is_terminal()).await;
    }

    /// Stop every active session this manager owns. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let active: Vec<SessionId> = {
            let registry = self.registry.read().await;
            registry
                .iter()
                .filter(|(_, entry)| !entry.status.borrow().is_terminal())
                .map(|(id, _)| *id)
                .collect()
        };

        for id in &active {
            self.stop(*id).await;
        }
        active.len()
    }

    pub async fn subscribe(&self, id: SessionId) -> Option<watch::Receiver<SessionStatus>> {
        let registry = self.registry.read().await;
        registry.get(&id).map(|entry| entry.status.clone())
    }

    pub async fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
        let session = {
            let registry = self.registry.read().await;
            registry.get(&id).map(|entry| entry.session.clone())
        }?;
        let snapshot = session.lock().await.snapshot();
        Some(snapshot)
    }

    pub async fn sessions(&self) -> Vec<SessionSnapshot> {
        let sessions: Vec<_> = {
            let registry = self.registry.read().await;
            registry.values().map(|entry| entry.session.clone()).collect()
        };

        let mut snapshots = Vec::with_capacity(sessions.len());
        for session in sessions {
            snapshots.push(session.lock().await.snapshot());
        }
        snapshots.sort_by_key(|s| s.created_at);
        snapshots
    }

    pub async fn active_count(&self) -> usize {
        let registry = self.registry.read().await;
        registry
            .values()
            .filter(|entry| entry.status.borrow().is_active())
            .count()
    }

    /// Forget sessions that have gone offline. Returns how many were removed.
    pub async fn prune_finished(&self) -> usize {
        let mut registry = self.registry.write().await;
        let before = registry.len();
        registry.retain(|_, entry| !entry.status.borrow().is_terminal());
        before - registry.len()
    }

    fn evict_finished(&self, registry: &mut HashMap<SessionId, SessionEntry>) {
        let mut finished: Vec<(DateTime<Local>, SessionId)> = registry
            .iter()
            .filter(|(_, entry)| entry.status.borrow().is_terminal())
            .map(|(id, entry)| (entry.created_at, *id))
            .collect();
        if finished.len() <= self.finished_retention {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.finished_retention;
        for (_, id) in finished.into_iter().take(excess) {
            registry.remove(&id);
        }
        tracing::debug!(evicted = excess, "Evicted finished sessions");
    }

    async fn register(&self, request: StreamRequest) -> (SessionWorker, SessionHandle) {
        let session = StreamSession::new(request, self.log_capacity);
        let id = session.id();
        let created_at = session.created_at();
        let session = Arc::new(Mutex::new(session));
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Idle);

        {
            let mut registry = self.registry.write().await;
            self.evict_finished(&mut registry);
            registry.insert(
                id,
                SessionEntry {
                    created_at,
                    session: session.clone(),
                    cancel: cancel.clone(),
                    status: status_rx.clone(),
                },
            );
        }

        let worker = SessionWorker {
            id,
            session,
            launcher: self.launcher.clone(),
            listener: self.listener.clone(),
            metrics: self.metrics.clone(),
            status_tx,
            cancel,
        };

        (worker, SessionHandle { id, status: status_rx })
    }
}
