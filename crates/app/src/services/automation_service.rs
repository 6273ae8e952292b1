//! Automation service: use-cases for managing automations.
//!
//! Every change to a stored definition is mirrored in the engine: the old
//! component is deregistered, the change is persisted, and a new component
//! is registered when the definition is enabled.

use std::sync::Arc;

use fleethub_domain::automation::Automation;
use fleethub_domain::error::{FleetHubError, NotFoundError, ValidationError};
use fleethub_domain::id::AutomationId;

use crate::automation_engine::{AutomationEngine, RunReport};
use crate::ports::{AutomationRepository, Ports};

/// Application service for automation CRUD and manual execution.
pub struct AutomationService<P: Ports> {
    repo: Arc<P::Automations>,
    engine: Arc<AutomationEngine<P>>,
}

impl<P: Ports> AutomationService<P> {
    /// Create a new service sharing the engine's automation repository.
    #[must_use]
    pub fn new(engine: Arc<AutomationEngine<P>>) -> Self {
        Self {
            repo: Arc::clone(engine.collaborators().automations()),
            engine,
        }
    }

    /// Create a new automation and register it when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::Validation`] if invariants fail or the name
    /// is taken, a storage error from the repository, or the registration
    /// error of an enabled automation.
    #[tracing::instrument(skip(self, automation), fields(automation_name = %automation.name))]
    pub async fn create_automation(
        &self,
        mut automation: Automation,
    ) -> Result<Automation, FleetHubError> {
        automation.name = automation.name.trim().to_string();
        automation.last_execution_time = None;
        automation.last_execution_status = None;
        automation.validate()?;
        self.ensure_unique_name(&automation.name, automation.id)
            .await?;

        let created = self.repo.create(automation).await?;
        if created.enabled {
            self.engine.register_component(&created)?;
        }
        Ok(created)
    }

    /// Fetch one automation definition by id.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::NotFound`] when no automation with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_automation(&self, id: AutomationId) -> Result<Automation, FleetHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Every stored automation, enabled or not, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_automations(&self) -> Result<Vec<Automation>, FleetHubError> {
        self.repo.get_all().await
    }

    /// Automations the engine should currently have registered.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<Automation>, FleetHubError> {
        self.repo.get_enabled().await
    }

    /// Replace an existing automation and re-register it.
    ///
    /// The execution history of the stored definition is kept; it is only
    /// ever written by the engine.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::NotFound`] if the automation does not exist,
    /// [`FleetHubError::Validation`] if invariants fail or the name is taken,
    /// a storage error, or the registration error of an enabled automation.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_automation(
        &self,
        mut automation: Automation,
    ) -> Result<Automation, FleetHubError> {
        let existing = self.get_automation(automation.id).await?;
        automation.name = automation.name.trim().to_string();
        automation.last_execution_time = existing.last_execution_time;
        automation.last_execution_status = existing.last_execution_status;
        automation.validate()?;
        self.ensure_unique_name(&automation.name, automation.id)
            .await?;

        self.engine.deregister_component(automation.id);
        let updated = self.repo.update(automation).await?;
        if updated.enabled {
            self.engine.register_component(&updated)?;
        }
        Ok(updated)
    }

    /// Deregister and delete an automation.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::NotFound`] if the automation does not exist,
    /// or a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_automation(&self, id: AutomationId) -> Result<(), FleetHubError> {
        let existing = self.get_automation(id).await?;
        self.engine.deregister_component(existing.id);
        self.repo.delete(existing.id).await
    }

    /// Run an automation now, waiting for the whole chain to finish.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::NotFound`] if the automation does not exist,
    /// and the engine's error when it is not registered or the run failed.
    #[tracing::instrument(skip(self))]
    pub async fn execute_automation(&self, id: AutomationId) -> Result<RunReport, FleetHubError> {
        let existing = self.get_automation(id).await?;
        self.engine.execute_automation(existing.id).await
    }

    async fn ensure_unique_name(&self, name: &str, id: AutomationId) -> Result<(), FleetHubError> {
        match self.repo.find_by_name(name).await? {
            Some(other) if other.id != id => {
                Err(ValidationError::DuplicateName(name.to_string()).into())
            }
            _ => Ok(()),
        }
    }
}
