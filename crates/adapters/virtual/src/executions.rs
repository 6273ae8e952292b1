//! Status log of simulated playbook executions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fleethub_domain::playbook::{ExecutionId, TaskStatus, TaskStatusRecord};
use fleethub_domain::time;

/// Shared, append-only log of task statuses keyed by execution.
///
/// Cloning yields another handle onto the same log, so background
/// completion tasks can append to it.
#[derive(Clone, Default)]
pub(crate) struct ExecutionLog {
    records: Arc<Mutex<HashMap<ExecutionId, Vec<TaskStatusRecord>>>>,
}

impl ExecutionLog {
    pub fn record(&self, execution_id: &ExecutionId, status: TaskStatus) {
        tracing::debug!(%execution_id, %status, "task status recorded");
        self.lock()
            .entry(execution_id.clone())
            .or_default()
            .push(TaskStatusRecord {
                execution_id: execution_id.clone(),
                status,
                created_at: time::now(),
            });
    }

    pub fn latest(&self, execution_id: &ExecutionId) -> Option<TaskStatusRecord> {
        self.lock()
            .get(execution_id)
            .and_then(|records| records.last().cloned())
    }

    pub fn history(&self, execution_id: &ExecutionId) -> Vec<TaskStatus> {
        self.lock()
            .get(execution_id)
            .map(|records| records.iter().map(|r| r.status.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ExecutionId, Vec<TaskStatusRecord>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
