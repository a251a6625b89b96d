use std::io::{self, PipeReader, Read};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ChildProcess, ProcessLauncher};
use crate::domain::value_objects::Invocation;

/// Time a child gets to honour the quit command before it is killed.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

const OUTPUT_CHANNEL_CAPACITY: usize = 256;
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Launches transcoder invocations as tokio child processes.
pub struct TokioProcessLauncher {
    stop_grace: Duration,
}

impl TokioProcessLauncher {
    pub fn new() -> Self {
        Self::with_stop_grace(DEFAULT_STOP_GRACE)
    }

    pub fn with_stop_grace(stop_grace: Duration) -> Self {
        Self { stop_grace }
    }
}

impl Default for TokioProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn launch(&self, invocation: &Invocation) -> Result<Box<dyn ChildProcess>> {
        let spawn_error = |e: io::Error| DomainError::SpawnFailed {
            program: invocation.program_name(),
            reason: e.to_string(),
        };

        // stdout and stderr share one pipe so lines keep the order the child wrote them
        let (reader, writer) = io::pipe().map_err(spawn_error)?;
        let stdout_writer = writer.try_clone().map_err(spawn_error)?;

        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::from(stdout_writer))
            .stderr(Stdio::from(writer))
            .kill_on_drop(true);

        let spawned = command.spawn();
        // The command holds our copies of the write end; EOF needs them closed
        drop(command);
        let child = spawned.map_err(spawn_error)?;

        tracing::debug!(
            program = %invocation.program_name(),
            pid = ?child.id(),
            "Transcoder spawned"
        );

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        tokio::task::spawn_blocking(move || forward_lines(reader, tx));

        Ok(Box::new(TranscoderProcess {
            pid: child.id(),
            child,
            lines: rx,
            stop_grace: self.stop_grace,
        }))
    }
}

struct TranscoderProcess {
    pid: Option<u32>,
    child: Child,
    lines: mpsc::Receiver<io::Result<String>>,
    stop_grace: Duration,
}

#[async_trait]
impl ChildProcess for TranscoderProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(DomainError::ProcessIo(e.to_string())),
            None => Ok(None),
        }
    }

    async fn terminate(&mut self) -> Result<()> {
        // ffmpeg finishes its outputs cleanly on `q`
        if let Some(mut stdin) = self.child.stdin.take() {
            let _ = stdin.write_all(b"q\n").await;
            let _ = stdin.flush().await;
        }

        match tokio::time::timeout(self.stop_grace, self.child.wait()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DomainError::ProcessIo(e.to_string())),
            Err(_) => {
                tracing::warn!(pid = ?self.pid, "Transcoder ignored quit request, killing");
                self.child
                    .kill()
                    .await
                    .map_err(|e| DomainError::ProcessIo(e.to_string()))
            }
        }
    }

    async fn wait(&mut self) -> Result<Option<i32>> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| DomainError::ProcessIo(e.to_string()))?;
        Ok(status.code())
    }
}

/// Blocking reader loop for the merged output pipe.
fn forward_lines(mut reader: PipeReader, tx: mpsc::Sender<io::Result<String>>) {
    let mut splitter = LineSplitter::default();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        };

        for line in splitter.push(&buffer[..read]) {
            if tx.blocking_send(Ok(line)).is_err() {
                return;
            }
        }
    }

    if let Some(line) = splitter.finish() {
        let _ = tx.blocking_send(Ok(line));
    }
}

/// Splits a byte stream on `\n` and `\r`, dropping empty segments.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = self.take_pending() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    pub fn finish(&mut self) -> Option<String> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}
