//! Adapter wiring.

use std::sync::Arc;

use anyhow::Context;
use fleethub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, Database, SqliteAutomationRepository,
};
use fleethub_adapter_virtual::VirtualFleet;
use fleethub_app::automation_engine::{AutomationEngine, Collaborators, PollingConfig};
use fleethub_app::ports::Ports;
use fleethub_app::scheduler::Scheduler;
use fleethub_app::services::automation_service::AutomationService;
use fleethub_domain::error::FleetHubError;

use crate::config::Config;

/// Adapter types used by the daemon.
pub struct DaemonPorts;

impl Ports for DaemonPorts {
    type Automations = SqliteAutomationRepository;
    type Containers = VirtualFleet;
    type Volumes = VirtualFleet;
    type Playbooks = VirtualFleet;
    type TaskStatuses = VirtualFleet;
    type Users = VirtualFleet;
}

/// The running application: engine, service and the fleet they act on.
pub struct App {
    pub engine: Arc<AutomationEngine<DaemonPorts>>,
    pub automations: AutomationService<DaemonPorts>,
    pub fleet: Option<Arc<VirtualFleet>>,
}

impl App {
    /// Open the database and wire every adapter enabled in `config`.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened or migrated.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = StorageConfig {
            database_url: config.database_url().to_string(),
        }
        .build()
        .await
        .with_context(|| format!("failed to open database {}", config.database_url()))?;

        let fleet = config
            .integrations
            .virtual_enabled
            .then(|| Arc::new(VirtualFleet::default()));
        Ok(Self::assemble(&db, fleet, config.polling()))
    }

    /// Wire the engine over `db`, with `fleet` as every fleet collaborator.
    ///
    /// Without a fleet only the automation repository is wired, so
    /// definitions whose actions need the fleet fail to register.
    #[must_use]
    pub fn assemble(
        db: &Database,
        fleet: Option<Arc<VirtualFleet>>,
        polling: PollingConfig,
    ) -> Self {
        let repo = Arc::new(SqliteAutomationRepository::new(db.pool().clone()));
        let mut collaborators = Collaborators::<DaemonPorts>::new(repo);
        if let Some(fleet) = &fleet {
            collaborators = collaborators
                .with_containers(Arc::clone(fleet))
                .with_volumes(Arc::clone(fleet))
                .with_playbooks(Arc::clone(fleet))
                .with_task_statuses(Arc::clone(fleet))
                .with_users(Arc::clone(fleet));
        } else {
            tracing::warn!("virtual fleet disabled, fleet actions will not register");
        }

        let engine = AutomationEngine::new(collaborators, Scheduler::new());
        let engine = Arc::new(engine.with_polling(polling));
        let automations = AutomationService::new(Arc::clone(&engine));
        Self {
            engine,
            automations,
            fleet,
        }
    }

    /// Register every enabled automation. Returns how many went live.
    ///
    /// # Errors
    ///
    /// Fails when the stored definitions cannot be read.
    pub async fn start(&self) -> Result<usize, FleetHubError> {
        self.engine.on_start().await
    }

    /// Stop every live component and pending scheduler job.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}
