//! Result of one automation run.

use fleethub_domain::automation::ExecutionStatus;
use fleethub_domain::id::AutomationId;
use fleethub_domain::time::Timestamp;

/// Summary returned to whoever started a run.
///
/// Only [`RunReport::status`] and [`RunReport::finished_at`] are persisted;
/// the per-action failures are for the caller and the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub automation_id: AutomationId,
    pub status: ExecutionStatus,
    pub failures: Vec<ActionFailure>,
    pub finished_at: Timestamp,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// A failed action within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// Position of the action in the chain.
    pub index: usize,
    pub kind: &'static str,
    pub message: String,
}

impl std::fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            index,
            kind,
            message,
        } = self;
        write!(f, "action #{index} ({kind}): {message}")
    }
}
