pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{SessionHandle, SessionManager};
pub use config::Config;
pub use domain::entities::{ScheduledStart, SessionId, SessionSnapshot, StreamSession};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{ChildProcess, MetricsReporter, ProcessLauncher, SessionListener};
pub use domain::value_objects::{
    AspectMode, DestinationSet, Invocation, LogKind, LogRecord, Platform, SessionStatus,
    StreamDestination, StreamKey, StreamRequest, REDACTED_KEY,
};
pub use infrastructure::ffmpeg::{CommandBuilder, TokioProcessLauncher};
pub use infrastructure::listeners::TracingListener;
pub use infrastructure::media::MediaLibrary;
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
