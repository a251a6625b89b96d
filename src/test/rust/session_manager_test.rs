use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use tempfile::NamedTempFile;

use multistream_relay::{
    ChildProcess, CommandBuilder, DestinationSet, DomainError, Invocation, LogRecord,
    MetricsReporter, Platform, ProcessLauncher, SessionId, SessionListener, SessionManager,
    SessionStatus, StreamDestination, StreamRequest, TokioProcessLauncher, REDACTED_KEY,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Ending {
    Exit(i32),
    ReadError,
    Hang,
}

#[derive(Clone)]
struct Script {
    lines: Vec<(Duration, String)>,
    ending: Ending,
    /// Printed once the child is asked to quit
    farewell: Vec<String>,
}

impl Script {
    fn lines(lines: &[&str], ending: Ending) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|l| (Duration::ZERO, l.to_string()))
                .collect(),
            ending,
            farewell: Vec::new(),
        }
    }

    fn with_farewell(mut self, lines: &[&str]) -> Self {
        self.farewell = lines.iter().map(|l| l.to_string()).collect();
        self
    }
}

#[derive(Default)]
struct LaunchLog {
    launches: Mutex<Vec<(Instant, Invocation)>>,
    terminated: AtomicUsize,
}

struct ScriptedLauncher {
    script: Option<Script>,
    log: Arc<LaunchLog>,
}

impl ScriptedLauncher {
    fn new(script: Script) -> (Arc<Self>, Arc<LaunchLog>) {
        let log = Arc::new(LaunchLog::default());
        let launcher = Arc::new(Self {
            script: Some(script),
            log: log.clone(),
        });
        (launcher, log)
    }

    fn failing() -> (Arc<Self>, Arc<LaunchLog>) {
        let log = Arc::new(LaunchLog::default());
        let launcher = Arc::new(Self {
            script: None,
            log: log.clone(),
        });
        (launcher, log)
    }
}

#[async_trait]
impl ProcessLauncher for ScriptedLauncher {
    async fn launch(&self, invocation: &Invocation) -> multistream_relay::Result<Box<dyn ChildProcess>> {
        self.log
            .launches
            .lock()
            .unwrap()
            .push((Instant::now(), invocation.clone()));

        let script = self.script.clone().ok_or_else(|| DomainError::SpawnFailed {
            program: invocation.program_name(),
            reason: "No such file or directory (os error 2)".to_string(),
        })?;

        Ok(Box::new(ScriptedProcess {
            lines: script.lines.into_iter().collect(),
            ending: script.ending,
            farewell: script.farewell,
            terminated: Arc::new(AtomicBool::new(false)),
            log: self.log.clone(),
        }))
    }
}

struct ScriptedProcess {
    lines: VecDeque<(Duration, String)>,
    ending: Ending,
    farewell: Vec<String>,
    terminated: Arc<AtomicBool>,
    log: Arc<LaunchLog>,
}

#[async_trait]
impl ChildProcess for ScriptedProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    async fn next_line(&mut self) -> multistream_relay::Result<Option<String>> {
        if let Some((delay, _)) = self.lines.front() {
            tokio::time::sleep(*delay).await;
            return Ok(self.lines.pop_front().map(|(_, line)| line));
        }

        match self.ending {
            Ending::Exit(_) => Ok(None),
            Ending::ReadError => Err(DomainError::ProcessIo("broken pipe".to_string())),
            Ending::Hang if self.terminated.load(Ordering::SeqCst) => Ok(None),
            Ending::Hang => std::future::pending().await,
        }
    }

    async fn terminate(&mut self) -> multistream_relay::Result<()> {
        self.terminated.store(true, Ordering::SeqCst);
        self.log.terminated.fetch_add(1, Ordering::SeqCst);
        self.lines
            .extend(self.farewell.drain(..).map(|line| (Duration::ZERO, line)));
        Ok(())
    }

    async fn wait(&mut self) -> multistream_relay::Result<Option<i32>> {
        match self.ending {
            Ending::Exit(code) => Ok(Some(code)),
            _ if self.terminated.load(Ordering::SeqCst) => Ok(Some(255)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Log(SessionId, String),
    Status(SessionId, SessionStatus),
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    fn logs(&self, id: SessionId) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Log(sid, text) if *sid == id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn statuses(&self, id: SessionId) -> Vec<SessionStatus> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Status(sid, status) if *sid == id => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl SessionListener for RecordingListener {
    fn on_log(&self, session_id: SessionId, record: &LogRecord) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Log(session_id, record.to_string()));
    }

    fn on_status(&self, session_id: SessionId, status: SessionStatus) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Status(session_id, status));
    }
}

struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_status_change(&self, _from: SessionStatus, _to: SessionStatus) {}
    fn report_output_line(&self) {}
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager_with(launcher: Arc<ScriptedLauncher>) -> (SessionManager, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let manager = SessionManager::new(
        CommandBuilder::default(),
        launcher,
        listener.clone(),
        Arc::new(NoopMetrics),
    );
    (manager, listener)
}

fn create_request(source: &NamedTempFile) -> StreamRequest {
    let destinations: DestinationSet =
        std::iter::once(StreamDestination::new(Platform::Facebook, "FB-1234-live").unwrap()).collect();
    StreamRequest::new(PathBuf::from(source.path()), destinations).unwrap()
}

/// Status sequence must be a subsequence of [Scheduled, Live, <terminal>]
fn assert_status_invariant(statuses: &[SessionStatus]) {
    let rank = |s: &SessionStatus| match s {
        SessionStatus::Idle => 0,
        SessionStatus::Scheduled => 1,
        SessionStatus::Live => 2,
        SessionStatus::Stopped | SessionStatus::Failed => 3,
    };
    let ranks: Vec<_> = statuses.iter().map(rank).collect();
    assert!(
        ranks.windows(2).all(|w| w[0] < w[1]),
        "status sequence out of order: {:?}",
        statuses
    );
    assert!(
        statuses.iter().filter(|s| s.is_terminal()).count() <= 1,
        "more than one terminal status: {:?}",
        statuses
    );
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_start_relays_output_and_goes_offline() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, launches) = ScriptedLauncher::new(Script::lines(
        &["ffmpeg version 6.1", "  Stream #0:0: Video: h264", "frame=   30 fps=30"],
        Ending::Exit(0),
    ));
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    let id = handle.id();

    assert_eq!(handle.wait().await, SessionStatus::Stopped);

    let statuses = listener.statuses(id);
    assert_eq!(statuses, vec![SessionStatus::Live, SessionStatus::Stopped]);

    let logs = listener.logs(id);
    assert_eq!(logs.first().unwrap(), "Starting stream to 1 destination(s)");
    assert_eq!(
        &logs[1..4],
        &[
            "[0s] ffmpeg version 6.1".to_string(),
            "[0s] Stream #0:0: Video: h264".to_string(),
            "[0s] frame=   30 fps=30".to_string(),
        ]
    );
    assert_eq!(logs.last().unwrap(), "Streaming stopped (exit code 0)");

    let recorded = launches.launches.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0].1.output_target(),
        Some("[f=flv]rtmps://live-api-s.facebook.com:443/rtmp/FB-1234-live")
    );

    let snapshot = manager.snapshot(id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Stopped);
    assert_eq!(snapshot.pid, Some(4242));
    assert_eq!(snapshot.exit_code, Some(0));
}

#[tokio::test]
async fn test_log_order_is_preserved_without_drops() {
    let source = NamedTempFile::new().unwrap();
    let lines: Vec<String> = (0..200).map(|i| format!("line {}", i)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(&refs, Ending::Exit(0)));
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    handle.wait().await;

    let relayed: Vec<String> = listener
        .logs(handle.id())
        .into_iter()
        .filter_map(|l| l.strip_prefix("[0s] ").map(str::to_string))
        .collect();
    assert_eq!(relayed, lines);
}

#[tokio::test]
async fn test_session_keeps_only_recent_logs() {
    let source = NamedTempFile::new().unwrap();
    let lines: Vec<String> = (0..40).map(|i| format!("line {}", i)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(&refs, Ending::Exit(0)));
    let (manager, _listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    handle.wait().await;

    let snapshot = manager.snapshot(handle.id()).await.unwrap();
    assert_eq!(snapshot.recent_logs.len(), 15);
    assert_eq!(
        snapshot.recent_logs.last().unwrap().text(),
        "Streaming stopped (exit code 0)"
    );
}

#[tokio::test]
async fn test_nonzero_exit_is_still_stopped() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(
        &["rtmp://live.twitch.tv/app/x: I/O error"],
        Ending::Exit(1),
    ));
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;

    assert_eq!(handle.wait().await, SessionStatus::Stopped);
    assert_eq!(
        listener.logs(handle.id()).last().unwrap(),
        "Streaming stopped (exit code 1)"
    );
}

#[tokio::test]
async fn test_spawn_failure_reports_and_fails() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::failing();
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    let id = handle.id();

    assert_eq!(handle.wait().await, SessionStatus::Failed);
    assert_eq!(listener.statuses(id), vec![SessionStatus::Failed]);

    let logs = listener.logs(id);
    assert!(logs.iter().any(|l| l.starts_with("Error: Failed to start ffmpeg")));
    assert_eq!(logs.last().unwrap(), "Streaming stopped");
}

#[tokio::test]
async fn test_read_error_fails_after_live() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, launches) =
        ScriptedLauncher::new(Script::lines(&["frame=1"], Ending::ReadError));
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    let id = handle.id();

    assert_eq!(handle.wait().await, SessionStatus::Failed);
    assert_eq!(
        listener.statuses(id),
        vec![SessionStatus::Live, SessionStatus::Failed]
    );
    assert!(listener
        .logs(id)
        .iter()
        .any(|l| l.contains("broken pipe")));
    assert_eq!(launches.terminated.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stop_terminates_only_its_session() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, launches) = ScriptedLauncher::new(Script::lines(&["frame=1"], Ending::Hang));
    let (manager, listener) = manager_with(launcher);

    let first = manager.start(create_request(&source)).await;
    let second = manager.start(create_request(&source)).await;
    assert_ne!(first.id(), second.id());

    let mut first_status = manager.subscribe(first.id()).await.unwrap();
    first_status
        .wait_for(|s| *s == SessionStatus::Live)
        .await
        .unwrap();
    let mut second_status = manager.subscribe(second.id()).await.unwrap();
    second_status
        .wait_for(|s| *s == SessionStatus::Live)
        .await
        .unwrap();

    manager.stop(first.id()).await;

    assert_eq!(first.status(), SessionStatus::Stopped);
    assert_eq!(second.status(), SessionStatus::Live);
    assert_eq!(launches.terminated.load(Ordering::SeqCst), 1);
    assert_eq!(manager.active_count().await, 1);
    assert_eq!(
        listener.statuses(first.id()),
        vec![SessionStatus::Live, SessionStatus::Stopped]
    );

    assert_eq!(manager.stop_all().await, 1);
    assert_eq!(second.status(), SessionStatus::Stopped);
    assert_eq!(manager.active_count().await, 0);
}

#[tokio::test]
async fn test_stop_relays_output_printed_while_quitting() {
    let source = NamedTempFile::new().unwrap();
    let script = Script::lines(&["frame=1"], Ending::Hang)
        .with_farewell(&["Exiting normally, received signal 2."]);
    let (launcher, _) = ScriptedLauncher::new(script);
    let (manager, listener) = manager_with(launcher);

    let handle = manager.start(create_request(&source)).await;
    let mut status = manager.subscribe(handle.id()).await.unwrap();
    status
        .wait_for(|s| *s == SessionStatus::Live)
        .await
        .unwrap();

    manager.stop(handle.id()).await;

    let logs = listener.logs(handle.id());
    let farewell = logs
        .iter()
        .position(|l| l.ends_with("Exiting normally, received signal 2."))
        .expect("quit output relayed");
    let stopped = logs
        .iter()
        .position(|l| l.starts_with("Streaming stopped"))
        .unwrap();
    assert!(farewell < stopped);
    assert_eq!(handle.status(), SessionStatus::Stopped);
}

#[tokio::test]
async fn test_stop_unknown_session_still_reports_offline() {
    let (launcher, _) = ScriptedLauncher::new(Script::lines(&[], Ending::Exit(0)));
    let (manager, listener) = manager_with(launcher);

    let id = SessionId::new();
    manager.stop(id).await;

    assert_eq!(listener.statuses(id), vec![SessionStatus::Stopped]);
    assert_eq!(manager.stop_all().await, 0);
}

#[tokio::test]
async fn test_stop_finished_session_reannounces_terminal_status() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::failing();
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    handle.wait().await;
    manager.stop(handle.id()).await;

    assert_eq!(
        listener.statuses(handle.id()),
        vec![SessionStatus::Failed, SessionStatus::Failed]
    );
}

// ---------------------------------------------------------------------------
// schedule_start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_schedule_in_the_past_matches_start_plus_notice() {
    let source = NamedTempFile::new().unwrap();
    let script = Script::lines(&["frame=1", "frame=2"], Ending::Exit(0));

    let (launcher, _) = ScriptedLauncher::new(script.clone());
    let (manager, listener) = manager_with(launcher);
    let mut immediate = manager.start(create_request(&source)).await;
    immediate.wait().await;

    let (launcher, _) = ScriptedLauncher::new(script);
    let (scheduled_manager, scheduled_listener) = manager_with(launcher);
    let mut overdue = scheduled_manager
        .schedule_start(
            create_request(&source),
            Local::now() - chrono::Duration::minutes(5),
        )
        .await;
    overdue.wait().await;

    let mut overdue_logs = scheduled_listener.logs(overdue.id());
    let notice = overdue_logs.remove(0);
    assert!(notice.contains("has already passed"), "unexpected: {}", notice);
    assert_eq!(overdue_logs, listener.logs(immediate.id()));
    assert_eq!(
        scheduled_listener.statuses(overdue.id()),
        listener.statuses(immediate.id())
    );
}

#[tokio::test]
async fn test_schedule_in_the_future_waits_before_spawning() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, launches) =
        ScriptedLauncher::new(Script::lines(&["frame=1"], Ending::Exit(0)));
    let (manager, listener) = manager_with(launcher);

    let delay = Duration::from_millis(400);
    let requested_at = Instant::now();
    let mut handle = manager
        .schedule_start(
            create_request(&source),
            Local::now() + chrono::Duration::milliseconds(400),
        )
        .await;
    let id = handle.id();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.status(), SessionStatus::Scheduled);
    assert!(launches.launches.lock().unwrap().is_empty());
    let logs = listener.logs(id);
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("Streaming will start automatically at "));

    assert_eq!(handle.wait().await, SessionStatus::Stopped);

    let launched_at = launches.launches.lock().unwrap()[0].0;
    // Allow for scheduler latency and clock granularity
    assert!(launched_at.duration_since(requested_at) + Duration::from_millis(20) >= delay);

    let statuses = listener.statuses(id);
    assert_eq!(
        statuses,
        vec![
            SessionStatus::Scheduled,
            SessionStatus::Live,
            SessionStatus::Stopped
        ]
    );
    assert_status_invariant(&statuses);
}

#[tokio::test]
async fn test_stop_cancels_pending_schedule() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, launches) =
        ScriptedLauncher::new(Script::lines(&["frame=1"], Ending::Exit(0)));
    let (manager, listener) = manager_with(launcher);

    let handle = manager
        .schedule_start(
            create_request(&source),
            Local::now() + chrono::Duration::hours(1),
        )
        .await;

    let mut status = manager.subscribe(handle.id()).await.unwrap();
    status
        .wait_for(|s| *s == SessionStatus::Scheduled)
        .await
        .unwrap();

    manager.stop(handle.id()).await;

    assert_eq!(handle.status(), SessionStatus::Stopped);
    assert!(launches.launches.lock().unwrap().is_empty());
    assert_eq!(
        listener.statuses(handle.id()),
        vec![SessionStatus::Scheduled, SessionStatus::Stopped]
    );
}

// ---------------------------------------------------------------------------
// registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_prune_finished_keeps_active_sessions() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(&[], Ending::Hang));
    let (manager, _listener) = manager_with(launcher);

    let live = manager.start(create_request(&source)).await;
    let mut live_status = manager.subscribe(live.id()).await.unwrap();
    live_status
        .wait_for(|s| *s == SessionStatus::Live)
        .await
        .unwrap();

    let finished = manager.start(create_request(&source)).await;
    manager.stop(finished.id()).await;

    assert_eq!(manager.sessions().await.len(), 2);
    assert_eq!(manager.prune_finished().await, 1);

    let remaining = manager.sessions().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, live.id());
    assert!(manager.snapshot(finished.id()).await.is_none());

    manager.stop_all().await;
}

#[tokio::test]
async fn test_registry_evicts_oldest_finished_sessions() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::failing();
    let (manager, _listener) = manager_with(launcher);
    let manager = manager.with_finished_retention(1);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut handle = manager.start(create_request(&source)).await;
        handle.wait().await;
        ids.push(handle.id());
    }

    assert!(manager.snapshot(ids[0]).await.is_none());
    assert!(manager.snapshot(ids[1]).await.is_some());
    assert!(manager.snapshot(ids[2]).await.is_some());
    assert_eq!(manager.sessions().await.len(), 2);
}

#[tokio::test]
async fn test_status_invariant_across_outcomes() {
    let source = NamedTempFile::new().unwrap();
    let outcomes = [
        ScriptedLauncher::new(Script::lines(&["a"], Ending::Exit(0))),
        ScriptedLauncher::new(Script::lines(&["a"], Ending::ReadError)),
        ScriptedLauncher::failing(),
    ];

    for (launcher, _) in outcomes {
        let (manager, listener) = manager_with(launcher);
        let mut handle = manager.start(create_request(&source)).await;
        handle.wait().await;
        assert_status_invariant(&listener.statuses(handle.id()));
    }
}

#[tokio::test]
async fn test_snapshot_serializes_for_dashboards() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(&["frame=1"], Ending::Exit(0)));
    let (manager, _listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    handle.wait().await;

    let snapshot = manager.snapshot(handle.id()).await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["status"], "STOPPED");
    assert_eq!(json["platforms"][0], "Facebook");
    assert!(!json.to_string().contains("FB-1234-live"), "stream key leaked: {}", json);
}

#[tokio::test]
async fn test_echoed_stream_keys_are_redacted() {
    let source = NamedTempFile::new().unwrap();
    let (launcher, _) = ScriptedLauncher::new(Script::lines(
        &["Output #0, tee, to '[f=flv]rtmps://live-api-s.facebook.com:443/rtmp/FB-1234-live':"],
        Ending::Exit(0),
    ));
    let (manager, listener) = manager_with(launcher);

    let mut handle = manager.start(create_request(&source)).await;
    handle.wait().await;

    let logs = listener.logs(handle.id());
    assert!(logs.iter().all(|l| !l.contains("FB-1234-live")), "{:?}", logs);
    assert!(logs
        .iter()
        .any(|l| l.ends_with(&format!("rtmp/{}':", REDACTED_KEY))));

    let snapshot = manager.snapshot(handle.id()).await.unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(!json.contains("FB-1234-live"), "stream key leaked: {}", json);
}

// ---------------------------------------------------------------------------
// real transcoder process
// ---------------------------------------------------------------------------

/// Stand-in transcoder: interleaves stdout and stderr, then echoes its arguments.
#[cfg(unix)]
fn write_fake_transcoder(dir: &std::path::Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    let script = r#"#!/bin/sh
i=1
while [ $i -le 20 ]; do
  echo "frame=$i"
  echo "progress $i" 1>&2
  i=$((i+1))
done
echo "args: $*" 1>&2
"#;
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_real_process_output_is_ordered_and_redacted() {
    let source = NamedTempFile::new().unwrap();
    let bin_dir = tempfile::tempdir().unwrap();
    let transcoder = write_fake_transcoder(bin_dir.path());

    let listener = Arc::new(RecordingListener::default());
    let manager = SessionManager::new(
        CommandBuilder::new(transcoder),
        Arc::new(TokioProcessLauncher::new()),
        listener.clone(),
        Arc::new(NoopMetrics),
    );

    let mut handle = manager.start(create_request(&source)).await;
    assert_eq!(handle.wait().await, SessionStatus::Stopped);

    let logs = listener.logs(handle.id());
    assert!(logs.iter().all(|l| !l.contains("FB-1234-live")), "{:?}", logs);

    let relayed: Vec<String> = logs
        .iter()
        .filter(|l| l.starts_with('['))
        .filter_map(|l| l.split_once("] ").map(|(_, text)| text.to_string()))
        .collect();

    let mut expected: Vec<String> = (1..=20)
        .flat_map(|i| [format!("frame={}", i), format!("progress {}", i)])
        .collect();
    assert_eq!(&relayed[..expected.len()], &expected[..]);

    let echoed = relayed.last().unwrap();
    assert!(echoed.starts_with("args: -re -stream_loop -1 -i "));
    assert!(echoed.ends_with(&format!(
        "-f tee [f=flv]rtmps://live-api-s.facebook.com:443/rtmp/{}",
        REDACTED_KEY
    )));
    expected.push(echoed.clone());
    assert_eq!(relayed, expected);

    assert_eq!(
        logs.last().unwrap(),
        "Streaming stopped (exit code 0)"
    );
}
