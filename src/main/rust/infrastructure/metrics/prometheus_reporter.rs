use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::SessionStatus;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "multistream_active_sessions",
        "Number of sessions with a live transcoder"
    ).expect("metric can be created");

    pub static ref SCHEDULED_SESSIONS: IntGauge = IntGauge::new(
        "multistream_scheduled_sessions",
        "Number of sessions waiting for their start time"
    ).expect("metric can be created");

    pub static ref SESSIONS_STARTED: IntCounter = IntCounter::new(
        "multistream_sessions_started_total",
        "Total number of sessions that went live"
    ).expect("metric can be created");

    pub static ref SESSIONS_FAILED: IntCounter = IntCounter::new(
        "multistream_sessions_failed_total",
        "Total number of sessions that failed to spawn or read output"
    ).expect("metric can be created");

    pub static ref OUTPUT_LINES: IntCounter = IntCounter::new(
        "multistream_output_lines_total",
        "Total transcoder output lines relayed"
    ).expect("metric can be created");

    // Last reported status (0=Idle, 1=Scheduled, 2=Live, 3=Stopped, 4=Failed)
    pub static ref LAST_STATUS: Gauge = Gauge::new(
        "multistream_last_session_status",
        "Most recent session status transition"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(ACTIVE_SESSIONS.clone()))?;
        REGISTRY.register(Box::new(SCHEDULED_SESSIONS.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_STARTED.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_FAILED.clone()))?;
        REGISTRY.register(Box::new(OUTPUT_LINES.clone()))?;
        REGISTRY.register(Box::new(LAST_STATUS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_status_change(&self, from: SessionStatus, to: SessionStatus) {
        match from {
            SessionStatus::Live => ACTIVE_SESSIONS.dec(),
            SessionStatus::Scheduled => SCHEDULED_SESSIONS.dec(),
            _ => {}
        }

        match to {
            SessionStatus::Live => {
                ACTIVE_SESSIONS.inc();
                SESSIONS_STARTED.inc();
            }
            SessionStatus::Scheduled => SCHEDULED_SESSIONS.inc(),
            SessionStatus::Failed => SESSIONS_FAILED.inc(),
            _ => {}
        }

        LAST_STATUS.set(to.as_metric());
    }

    fn report_output_line(&self) {
        OUTPUT_LINES.inc();
    }
}
