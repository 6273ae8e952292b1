//! # fleethub-adapter-virtual
//!
//! Simulated fleet for demos and end-to-end tests. A single [`VirtualFleet`]
//! implements every collaborator port the automation engine needs.
//!
//! ## Seeded fleet
//!
//! | Kind | Name | Initial state |
//! |------|------|---------------|
//! | Container | `vc-nginx` | running on `edge-a` |
//! | Container | `vc-postgres` | running on `edge-a` |
//! | Container | `vc-worker` | stopped on `edge-b` |
//! | Volume | `nginx-config` | on `edge-a` |
//! | Volume | `postgres-data` | on `edge-a` |
//! | Playbook | `Upgrade packages` | `playbooks/upgrade.yml` |
//! | User | `admin@fleethub.local` | |
//!
//! Playbook executions log `RUNNING` immediately and the configured final
//! status once the configured delay has elapsed.
//!
//! ## Dependency rule
//!
//! Depends on `fleethub-app` (port traits) and `fleethub-domain` only.

mod containers;
mod executions;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fleethub_app::ports::{
    ContainerService, PlaybookService, TaskStatusRepository, UserRepository, VolumeService,
};
use fleethub_domain::container::{Container, ContainerOperation, Volume, VolumeOperation};
use fleethub_domain::error::{FleetHubError, NotFoundError};
use fleethub_domain::id::{DeviceId, PlaybookId, UserId, VolumeId};
use fleethub_domain::playbook::{ExecutionId, ExtraVar, Playbook, TaskStatus, TaskStatusRecord};
use fleethub_domain::time::{self, Timestamp};
use fleethub_domain::user::User;

pub use containers::ContainerState;

use containers::VirtualContainer;
use executions::ExecutionLog;

/// How simulated playbook executions end.
#[derive(Debug, Clone)]
pub struct PlaybookOutcome {
    /// Time between the `RUNNING` entry and the final status.
    pub delay: Duration,
    /// Final status recorded for every execution.
    pub status: TaskStatus,
}

impl Default for PlaybookOutcome {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            status: TaskStatus::Success,
        }
    }
}

/// A backup taken by a volume action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBackup {
    pub volume_id: VolumeId,
    pub taken_at: Timestamp,
}

/// In-memory fleet implementing the container, volume, playbook, task
/// status and user ports.
pub struct VirtualFleet {
    devices: Vec<DeviceId>,
    containers: Mutex<HashMap<String, VirtualContainer>>,
    volumes: HashMap<VolumeId, Volume>,
    backups: Mutex<Vec<VolumeBackup>>,
    playbooks: HashMap<PlaybookId, Playbook>,
    users: Vec<User>,
    outcome: Mutex<PlaybookOutcome>,
    executions: ExecutionLog,
    next_execution: AtomicU64,
}

impl Default for VirtualFleet {
    fn default() -> Self {
        let edge_a = DeviceId::new();
        let edge_b = DeviceId::new();

        let containers = [
            ("vc-nginx", "nginx", edge_a, ContainerState::Running),
            ("vc-postgres", "postgres", edge_a, ContainerState::Running),
            ("vc-worker", "worker", edge_b, ContainerState::Stopped),
        ]
        .into_iter()
        .map(|(id, name, device_id, state)| {
            let container = Container {
                id: id.to_string(),
                name: name.to_string(),
                device_id,
            };
            (id.to_string(), VirtualContainer { container, state })
        })
        .collect();

        let volumes = ["nginx-config", "postgres-data"]
            .into_iter()
            .map(|name| {
                let volume = Volume {
                    id: VolumeId::new(),
                    name: name.to_string(),
                    device_id: edge_a,
                };
                (volume.id, volume)
            })
            .collect();

        let upgrade = Playbook {
            id: PlaybookId::new(),
            name: "Upgrade packages".to_string(),
            path: "playbooks/upgrade.yml".to_string(),
        };

        Self {
            devices: vec![edge_a, edge_b],
            containers: Mutex::new(containers),
            volumes,
            backups: Mutex::new(Vec::new()),
            playbooks: HashMap::from([(upgrade.id, upgrade)]),
            users: vec![User {
                id: UserId::new(),
                email: "admin@fleethub.local".to_string(),
            }],
            outcome: Mutex::new(PlaybookOutcome::default()),
            executions: ExecutionLog::default(),
            next_execution: AtomicU64::new(1),
        }
    }
}

impl VirtualFleet {
    /// Replace how subsequent playbook executions end.
    #[must_use]
    pub fn with_playbook_outcome(self, outcome: PlaybookOutcome) -> Self {
        self.set_playbook_outcome(outcome);
        self
    }

    /// Drop every user, so automated playbook runs have no identity.
    #[must_use]
    pub fn without_users(mut self) -> Self {
        self.users.clear();
        self
    }

    pub fn set_playbook_outcome(&self, outcome: PlaybookOutcome) {
        *lock(&self.outcome) = outcome;
    }

    #[must_use]
    pub fn device_ids(&self) -> &[DeviceId] {
        &self.devices
    }

    /// Ids of the containers still present, sorted.
    #[must_use]
    pub fn container_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = lock(&self.containers).keys().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn container_state(&self, id: &str) -> Option<ContainerState> {
        lock(&self.containers).get(id).map(|c| c.state)
    }

    /// Seeded volumes, sorted by name.
    #[must_use]
    pub fn volumes(&self) -> Vec<Volume> {
        let mut volumes: Vec<_> = self.volumes.values().cloned().collect();
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        volumes
    }

    #[must_use]
    pub fn backups(&self) -> Vec<VolumeBackup> {
        lock(&self.backups).clone()
    }

    #[must_use]
    pub fn playbooks(&self) -> Vec<Playbook> {
        self.playbooks.values().cloned().collect()
    }

    /// Every status recorded for an execution, oldest first.
    #[must_use]
    pub fn execution_history(&self, execution_id: &ExecutionId) -> Vec<TaskStatus> {
        self.executions.history(execution_id)
    }

    fn next_execution_id(&self) -> ExecutionId {
        let n = self.next_execution.fetch_add(1, Ordering::Relaxed);
        ExecutionId::new(format!("vexec-{n}"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ContainerService for VirtualFleet {
    async fn get_container_by_id(&self, id: &str) -> Result<Option<Container>, FleetHubError> {
        Ok(lock(&self.containers).get(id).map(|c| c.container.clone()))
    }

    async fn execute_container_action(
        &self,
        id: &str,
        operation: ContainerOperation,
    ) -> Result<(), FleetHubError> {
        let mut containers = lock(&self.containers);
        let current = containers
            .get(id)
            .map(|c| c.state)
            .ok_or_else(|| NotFoundError {
                entity: "Container",
                id: id.to_string(),
            })?;

        match current.apply(operation) {
            Ok(Some(state)) => {
                tracing::info!(container_id = id, %operation, ?state, "container updated");
                if let Some(container) = containers.get_mut(id) {
                    container.state = state;
                }
                Ok(())
            }
            Ok(None) => {
                tracing::info!(container_id = id, "container removed");
                containers.remove(id);
                Ok(())
            }
            Err(reason) => Err(FleetHubError::collaborator(format!(
                "{operation} rejected for container {id}: {reason}"
            ))),
        }
    }
}

impl VolumeService for VirtualFleet {
    async fn get_volume_by_id(&self, id: VolumeId) -> Result<Option<Volume>, FleetHubError> {
        Ok(self.volumes.get(&id).cloned())
    }

    async fn perform_volume_action(
        &self,
        volume: &Volume,
        operation: VolumeOperation,
    ) -> Result<(), FleetHubError> {
        if !self.volumes.contains_key(&volume.id) {
            return Err(NotFoundError {
                entity: "Volume",
                id: volume.id.to_string(),
            }
            .into());
        }
        match operation {
            VolumeOperation::Backup => {
                tracing::info!(volume = %volume.name, "volume backup taken");
                lock(&self.backups).push(VolumeBackup {
                    volume_id: volume.id,
                    taken_at: time::now(),
                });
            }
        }
        Ok(())
    }
}

impl PlaybookService for VirtualFleet {
    async fn get_playbook_by_id(&self, id: PlaybookId) -> Result<Option<Playbook>, FleetHubError> {
        Ok(self.playbooks.get(&id).cloned())
    }

    async fn execute_playbook(
        &self,
        playbook: &Playbook,
        user: &User,
        targets: &[DeviceId],
        forced_extra_vars: &[ExtraVar],
    ) -> Result<ExecutionId, FleetHubError> {
        if !self.playbooks.contains_key(&playbook.id) {
            return Err(NotFoundError {
                entity: "Playbook",
                id: playbook.id.to_string(),
            }
            .into());
        }

        let execution_id = self.next_execution_id();
        let PlaybookOutcome { delay, status } = lock(&self.outcome).clone();
        tracing::info!(
            %execution_id,
            playbook = %playbook.name,
            user = %user.email,
            targets = targets.len(),
            extra_vars = forced_extra_vars.len(),
            "playbook execution started"
        );

        self.executions.record(&execution_id, TaskStatus::Running);
        let log = self.executions.clone();
        let finished = execution_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            log.record(&finished, status);
        });

        Ok(execution_id)
    }
}

impl TaskStatusRepository for VirtualFleet {
    async fn find_latest_by_execution_id(
        &self,
        execution_id: &ExecutionId,
    ) -> Result<Option<TaskStatusRecord>, FleetHubError> {
        Ok(self.executions.latest(execution_id))
    }
}

impl UserRepository for VirtualFleet {
    async fn find_first(&self) -> Result<Option<User>, FleetHubError> {
        Ok(self.users.first().cloned())
    }
}
