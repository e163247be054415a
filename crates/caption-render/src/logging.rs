//! Structured job logging.

use caption_models::RunId;
use tracing::{error, info, warn, Span};

/// Logs render lifecycle events with the run ID and operation attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    run_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(run_id: &RunId, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the run fields, for instrumenting the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let run_id = RunId::new();
        let logger = JobLogger::new(&run_id, "caption_overlay");

        assert_eq!(logger.run_id(), run_id.as_str());
        assert_eq!(logger.operation(), "caption_overlay");
    }
}
