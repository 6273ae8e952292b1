//! Automation engine: turns stored automation definitions into live,
//! scheduled components and runs them.
//!
//! The engine owns a registry mapping each automation id to its
//! [`AutomationComponent`]. A component is built from the definition's chain
//! (one trigger, ordered actions) and, once registered, runs whenever its
//! cron trigger fires or when [`AutomationEngine::execute_automation`] is
//! called. Registration is all-or-nothing: a definition that fails to build
//! leaves neither a registry entry nor a scheduled job behind.

mod action;
mod component;
mod polling;
mod registry;
mod report;
mod trigger;

use std::sync::Arc;
use std::time::Duration;

pub use component::AutomationComponent;
pub use report::{ActionFailure, RunReport};

use fleethub_domain::automation::Automation;
use fleethub_domain::error::{AutomationError, FleetHubError, ValidationError};
use fleethub_domain::id::AutomationId;
use fleethub_domain::time::Timestamp;

use crate::ports::{AutomationRepository, Ports};
use crate::scheduler::Scheduler;
use registry::ComponentRegistry;

/// How playbook executions are polled for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between two status checks.
    pub interval: Duration,
    /// Number of checks after which a still-running execution fails.
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// The adapters a component may call into.
///
/// Only the automation repository is mandatory. The others are needed by
/// the action kinds that use them; building such an action without its
/// collaborator fails with [`AutomationError::MissingCollaborator`].
pub struct Collaborators<P: Ports> {
    automations: Arc<P::Automations>,
    containers: Option<Arc<P::Containers>>,
    volumes: Option<Arc<P::Volumes>>,
    playbooks: Option<Arc<P::Playbooks>>,
    task_statuses: Option<Arc<P::TaskStatuses>>,
    users: Option<Arc<P::Users>>,
}

impl<P: Ports> Clone for Collaborators<P> {
    fn clone(&self) -> Self {
        Self {
            automations: Arc::clone(&self.automations),
            containers: self.containers.clone(),
            volumes: self.volumes.clone(),
            playbooks: self.playbooks.clone(),
            task_statuses: self.task_statuses.clone(),
            users: self.users.clone(),
        }
    }
}

impl<P: Ports> Collaborators<P> {
    #[must_use]
    pub fn new(automations: Arc<P::Automations>) -> Self {
        Self {
            automations,
            containers: None,
            volumes: None,
            playbooks: None,
            task_statuses: None,
            users: None,
        }
    }

    #[must_use]
    pub fn with_containers(mut self, containers: Arc<P::Containers>) -> Self {
        self.containers = Some(containers);
        self
    }

    #[must_use]
    pub fn with_volumes(mut self, volumes: Arc<P::Volumes>) -> Self {
        self.volumes = Some(volumes);
        self
    }

    #[must_use]
    pub fn with_playbooks(mut self, playbooks: Arc<P::Playbooks>) -> Self {
        self.playbooks = Some(playbooks);
        self
    }

    #[must_use]
    pub fn with_task_statuses(mut self, task_statuses: Arc<P::TaskStatuses>) -> Self {
        self.task_statuses = Some(task_statuses);
        self
    }

    #[must_use]
    pub fn with_users(mut self, users: Arc<P::Users>) -> Self {
        self.users = Some(users);
        self
    }

    #[must_use]
    pub fn automations(&self) -> &Arc<P::Automations> {
        &self.automations
    }

    fn containers(&self) -> Result<Arc<P::Containers>, AutomationError> {
        require(self.containers.as_ref(), "container service")
    }

    fn volumes(&self) -> Result<Arc<P::Volumes>, AutomationError> {
        require(self.volumes.as_ref(), "volume service")
    }

    fn playbooks(&self) -> Result<Arc<P::Playbooks>, AutomationError> {
        require(self.playbooks.as_ref(), "playbook service")
    }

    fn task_statuses(&self) -> Result<Arc<P::TaskStatuses>, AutomationError> {
        require(self.task_statuses.as_ref(), "task status repository")
    }

    fn users(&self) -> Result<Arc<P::Users>, AutomationError> {
        require(self.users.as_ref(), "user repository")
    }
}

fn require<T>(
    collaborator: Option<&Arc<T>>,
    name: &'static str,
) -> Result<Arc<T>, AutomationError> {
    collaborator
        .map(Arc::clone)
        .ok_or(AutomationError::MissingCollaborator(name))
}

/// Process-wide owner of every live automation component.
pub struct AutomationEngine<P: Ports> {
    collaborators: Collaborators<P>,
    scheduler: Scheduler,
    polling: PollingConfig,
    registry: ComponentRegistry<P>,
}

impl<P: Ports> AutomationEngine<P> {
    /// Create an engine with an empty registry.
    #[must_use]
    pub fn new(collaborators: Collaborators<P>, scheduler: Scheduler) -> Self {
        Self {
            collaborators,
            scheduler,
            polling: PollingConfig::default(),
            registry: ComponentRegistry::default(),
        }
    }

    #[must_use]
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    #[must_use]
    pub fn collaborators(&self) -> &Collaborators<P> {
        &self.collaborators
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Register every enabled automation found in storage.
    ///
    /// A definition that fails to register is logged and skipped. Returns
    /// the number of components registered.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the definitions cannot be loaded.
    #[tracing::instrument(skip(self))]
    pub async fn on_start(&self) -> Result<usize, FleetHubError> {
        let definitions = self.collaborators.automations.get_enabled().await?;
        let total = definitions.len();
        let mut registered = 0;
        for definition in &definitions {
            match self.register_component(definition) {
                Ok(()) => registered += 1,
                Err(err) => tracing::error!(
                    automation_id = %definition.id,
                    name = %definition.name,
                    error = %err,
                    "failed to register automation"
                ),
            }
        }
        tracing::info!(registered, total, "automation engine started");
        Ok(registered)
    }

    /// Build and register the component for `definition`.
    ///
    /// A component already registered under the same id is deregistered
    /// first. On error the registry holds no entry for the id.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FleetHubError::Validation`] when the name or chain is
    /// missing or structurally invalid, and [`FleetHubError::Automation`]
    /// when a required collaborator is not configured.
    #[tracing::instrument(skip(self, definition), fields(automation_id = %definition.id))]
    pub fn register_component(&self, definition: &Automation) -> Result<(), FleetHubError> {
        if definition.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        definition.chain()?;

        if let Some(previous) = self.registry.remove(definition.id) {
            previous.deregister();
        }
        let component = AutomationComponent::init(
            definition,
            &self.collaborators,
            &self.scheduler,
            self.polling,
        )?;
        if let Some(raced) = self.registry.insert(component) {
            raced.deregister();
        }
        Ok(())
    }

    /// Deregister the component for `id`, if any. Returns whether one was
    /// registered; an unknown id is not an error.
    #[tracing::instrument(skip(self))]
    pub fn deregister_component(&self, id: AutomationId) -> bool {
        let Some(component) = self.registry.remove(id) else {
            tracing::debug!("no live component to deregister");
            return false;
        };
        component.deregister();
        true
    }

    /// Run the automation now and wait for the whole chain to finish.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::ComponentNotFound`] when no component is
    /// registered for `id` (disabled, or its registration failed), and
    /// [`AutomationError::RunFailed`] when at least one action failed. The
    /// outcome is recorded on the definition in both run cases.
    #[tracing::instrument(skip(self))]
    pub async fn execute_automation(&self, id: AutomationId) -> Result<RunReport, FleetHubError> {
        let component = self
            .registry
            .get(id)
            .ok_or(AutomationError::ComponentNotFound(id))?;
        let report = component.run().await?;
        if report.is_success() {
            return Ok(report);
        }
        Err(AutomationError::RunFailed {
            id,
            failures: report.failures.iter().map(ToString::to_string).collect(),
        }
        .into())
    }

    #[must_use]
    pub fn registered_ids(&self) -> Vec<AutomationId> {
        self.registry.ids()
    }

    #[must_use]
    pub fn is_registered(&self, id: AutomationId) -> bool {
        self.registry.contains(id)
    }

    /// When the live component for `id` fires next, as seen from the
    /// scheduler's clock.
    #[must_use]
    pub fn next_fire_time(&self, id: AutomationId) -> Option<Timestamp> {
        let component = self.registry.get(id)?;
        component.next_fire_after(&self.scheduler.now())
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Deregister every component and cancel all pending scheduler jobs.
    pub fn shutdown(&self) {
        let components = self.registry.drain();
        for component in &components {
            component.deregister();
        }
        self.scheduler.shutdown();
        tracing::info!(components = components.len(), "automation engine stopped");
    }
}
