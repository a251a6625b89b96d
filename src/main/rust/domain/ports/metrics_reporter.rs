use crate::domain::value_objects::SessionStatus;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_status_change(&self, from: SessionStatus, to: SessionStatus);
    fn report_output_line(&self);
}
