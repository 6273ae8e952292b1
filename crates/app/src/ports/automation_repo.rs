//! Automation repository port: persistence for automation definitions.

use std::future::Future;

use fleethub_domain::automation::{Automation, ExecutionStatus};
use fleethub_domain::error::FleetHubError;
use fleethub_domain::id::AutomationId;
use fleethub_domain::time::Timestamp;

/// Durable store of [`Automation`] definitions and their last-run bookkeeping.
pub trait AutomationRepository {
    /// Insert a new automation; names must be unique.
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, FleetHubError>> + Send;

    /// Load one automation, `None` when the id is unknown.
    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, FleetHubError>> + Send;

    /// Get an automation by its exact (trimmed) name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Automation>, FleetHubError>> + Send;

    /// Every automation, ordered by name.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, FleetHubError>> + Send;

    /// Enabled automations, ordered by name.
    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Automation>, FleetHubError>> + Send;

    /// Overwrite name, enabled flag and chain of a stored automation.
    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, FleetHubError>> + Send;

    /// Remove an automation; deleting an unknown id is a no-op.
    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), FleetHubError>> + Send;

    /// Record the outcome of a finished run.
    fn set_last_execution_status(
        &self,
        id: AutomationId,
        status: ExecutionStatus,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send;
}
