use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::Invocation;

/// Port for spawning the external transcoder
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawn the invocation with stdout and stderr merged into one line stream
    async fn launch(&self, invocation: &Invocation) -> Result<Box<dyn ChildProcess>>;
}

/// A running child owned exclusively by one session worker
#[async_trait]
pub trait ChildProcess: Send {
    /// OS process identifier, when the platform reports one
    fn pid(&self) -> Option<u32>;

    /// Next output line, or `None` once every output stream reached EOF.
    /// Must be cancel-safe.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Ask this child to quit, killing it if it does not comply in time
    async fn terminate(&mut self) -> Result<()>;

    /// Reap the child and return its exit code
    async fn wait(&mut self) -> Result<Option<i32>>;
}
