//! Playbook ports: starting playbook executions and reading their progress.

use std::future::Future;

use fleethub_domain::error::FleetHubError;
use fleethub_domain::id::{DeviceId, PlaybookId};
use fleethub_domain::playbook::{ExecutionId, ExtraVar, Playbook, TaskStatusRecord};
use fleethub_domain::user::User;

/// Playbook lookup and execution.
pub trait PlaybookService {
    fn get_playbook_by_id(
        &self,
        id: PlaybookId,
    ) -> impl Future<Output = Result<Option<Playbook>, FleetHubError>> + Send;

    /// Start running `playbook` as `user` against `targets`.
    ///
    /// Returns as soon as the execution is accepted; progress is reported
    /// through the [`TaskStatusRepository`].
    fn execute_playbook(
        &self,
        playbook: &Playbook,
        user: &User,
        targets: &[DeviceId],
        forced_extra_vars: &[ExtraVar],
    ) -> impl Future<Output = Result<ExecutionId, FleetHubError>> + Send;
}

/// Store of status entries reported by running executions.
pub trait TaskStatusRepository {
    /// Most recent status recorded for the execution, if any.
    fn find_latest_by_execution_id(
        &self,
        execution_id: &ExecutionId,
    ) -> impl Future<Output = Result<Option<TaskStatusRecord>, FleetHubError>> + Send;
}
