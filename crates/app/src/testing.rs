//! In-memory fakes of every port, shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleethub_domain::automation::{Automation, ExecutionStatus};
use fleethub_domain::container::{Container, ContainerOperation, Volume, VolumeOperation};
use fleethub_domain::error::FleetHubError;
use fleethub_domain::id::{AutomationId, DeviceId, PlaybookId, UserId, VolumeId};
use fleethub_domain::playbook::{ExecutionId, ExtraVar, Playbook, TaskStatus, TaskStatusRecord};
use fleethub_domain::time::{self, Timestamp};
use fleethub_domain::user::User;

use crate::automation_engine::{AutomationEngine, Collaborators};
use crate::ports::{
    AutomationRepository, ContainerService, PlaybookService, Ports, TaskStatusRepository,
    UserRepository, VolumeService,
};
use crate::scheduler::Scheduler;

pub(crate) struct FakePorts;

impl Ports for FakePorts {
    type Automations = InMemoryAutomations;
    type Containers = FakeContainers;
    type Volumes = FakeVolumes;
    type Playbooks = FakePlaybooks;
    type TaskStatuses = FakeTaskStatuses;
    type Users = FakeUsers;
}

/// Every fake plus the scheduler, wired together.
pub(crate) struct Fixture {
    pub automations: Arc<InMemoryAutomations>,
    pub containers: Arc<FakeContainers>,
    pub volumes: Arc<FakeVolumes>,
    pub playbooks: Arc<FakePlaybooks>,
    pub task_statuses: Arc<FakeTaskStatuses>,
    pub users: Arc<FakeUsers>,
    pub scheduler: Scheduler,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            automations: Arc::new(InMemoryAutomations::default()),
            containers: Arc::new(FakeContainers::default()),
            volumes: Arc::new(FakeVolumes::default()),
            playbooks: Arc::new(FakePlaybooks::default()),
            task_statuses: Arc::new(FakeTaskStatuses::terminal_after(1, TaskStatus::Success)),
            users: Arc::new(FakeUsers::admin()),
            scheduler: Scheduler::new(),
        }
    }

    pub fn with_automations(self, automations: Vec<Automation>) -> Self {
        for automation in automations {
            self.automations.insert(automation);
        }
        self
    }

    pub fn with_containers(self, ids: &[&str]) -> Self {
        for id in ids {
            self.containers.add(id);
        }
        self
    }

    pub fn with_container_delay(self, delay: Duration) -> Self {
        *self.containers.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn with_volume(self, volume: Volume) -> Self {
        self.volumes.known.lock().unwrap().insert(volume.id, volume);
        self
    }

    pub fn with_playbook(self, playbook: Playbook) -> Self {
        self.playbooks
            .known
            .lock()
            .unwrap()
            .insert(playbook.id, playbook);
        self
    }

    pub fn with_task_statuses(mut self, statuses: FakeTaskStatuses) -> Self {
        self.task_statuses = Arc::new(statuses);
        self
    }

    pub fn without_users(mut self) -> Self {
        self.users = Arc::new(FakeUsers { user: None });
        self
    }

    pub fn collaborators(&self) -> Collaborators<FakePorts> {
        Collaborators::new(Arc::clone(&self.automations))
            .with_containers(Arc::clone(&self.containers))
            .with_volumes(Arc::clone(&self.volumes))
            .with_playbooks(Arc::clone(&self.playbooks))
            .with_task_statuses(Arc::clone(&self.task_statuses))
            .with_users(Arc::clone(&self.users))
    }

    pub fn engine(&self) -> AutomationEngine<FakePorts> {
        AutomationEngine::new(self.collaborators(), self.scheduler.clone())
    }
}

// ── Automations ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryAutomations {
    store: Mutex<HashMap<AutomationId, Automation>>,
    status_writes: Mutex<Vec<(AutomationId, ExecutionStatus)>>,
}

impl InMemoryAutomations {
    pub fn insert(&self, automation: Automation) {
        self.store.lock().unwrap().insert(automation.id, automation);
    }

    pub fn stored(&self, id: AutomationId) -> Option<Automation> {
        self.store.lock().unwrap().get(&id).cloned()
    }

    pub fn status_writes(&self) -> Vec<(AutomationId, ExecutionStatus)> {
        self.status_writes.lock().unwrap().clone()
    }
}

impl AutomationRepository for InMemoryAutomations {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, FleetHubError>> + Send {
        self.insert(automation.clone());
        async { Ok(automation) }
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, FleetHubError>> + Send {
        let found = self.stored(id);
        async { Ok(found) }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Automation>, FleetHubError>> + Send {
        let found = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|a| a.name == name.trim())
            .cloned();
        async { Ok(found) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, FleetHubError>> + Send {
        let all: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(all) }
    }

    fn get_enabled(&self) -> impl Future<Output = Result<Vec<Automation>, FleetHubError>> + Send {
        let enabled: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.enabled)
            .cloned()
            .collect();
        async { Ok(enabled) }
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, FleetHubError>> + Send {
        self.insert(automation.clone());
        async { Ok(automation) }
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), FleetHubError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }

    fn set_last_execution_status(
        &self,
        id: AutomationId,
        status: ExecutionStatus,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send {
        if let Some(automation) = self.store.lock().unwrap().get_mut(&id) {
            automation.last_execution_status = Some(status);
            automation.last_execution_time = Some(at);
        }
        self.status_writes.lock().unwrap().push((id, status));
        async { Ok(()) }
    }
}

// ── Containers ─────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeContainers {
    known: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    lookups: AtomicUsize,
    invoked: Mutex<Vec<(String, ContainerOperation)>>,
}

impl FakeContainers {
    pub fn add(&self, id: &str) {
        self.known.lock().unwrap().insert(id.to_string());
    }

    /// Make the runtime reject every operation on `id`.
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn invoked(&self) -> Vec<(String, ContainerOperation)> {
        self.invoked.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.invoked()
            .into_iter()
            .filter(|(_, op)| *op == ContainerOperation::Start)
            .map(|(id, _)| id)
            .collect()
    }
}

impl ContainerService for FakeContainers {
    fn get_container_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Container>, FleetHubError>> + Send {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let found = self
            .known
            .lock()
            .unwrap()
            .contains(id)
            .then(|| Container {
                id: id.to_string(),
                name: format!("{id}-name"),
                device_id: DeviceId::new(),
            });
        let delay = *self.delay.lock().unwrap();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(found)
        }
    }

    fn execute_container_action(
        &self,
        id: &str,
        operation: ContainerOperation,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send {
        self.invoked
            .lock()
            .unwrap()
            .push((id.to_string(), operation));
        let result = if self.failing.lock().unwrap().contains(id) {
            Err(FleetHubError::collaborator(format!("device rejected {operation} on {id}")))
        } else {
            Ok(())
        };
        async { result }
    }
}

// ── Volumes ────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeVolumes {
    known: Mutex<HashMap<VolumeId, Volume>>,
    performed: Mutex<Vec<(VolumeId, VolumeOperation)>>,
}

impl FakeVolumes {
    pub fn performed(&self) -> Vec<(VolumeId, VolumeOperation)> {
        self.performed.lock().unwrap().clone()
    }
}

impl VolumeService for FakeVolumes {
    fn get_volume_by_id(
        &self,
        id: VolumeId,
    ) -> impl Future<Output = Result<Option<Volume>, FleetHubError>> + Send {
        let found = self.known.lock().unwrap().get(&id).cloned();
        async { Ok(found) }
    }

    fn perform_volume_action(
        &self,
        volume: &Volume,
        operation: VolumeOperation,
    ) -> impl Future<Output = Result<(), FleetHubError>> + Send {
        self.performed.lock().unwrap().push((volume.id, operation));
        async { Ok(()) }
    }
}

// ── Playbooks ──────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakePlaybooks {
    known: Mutex<HashMap<PlaybookId, Playbook>>,
    executions: Mutex<Vec<PlaybookRun>>,
}

#[derive(Debug, Clone)]
pub(crate) struct PlaybookRun {
    pub playbook_id: PlaybookId,
    pub user_id: UserId,
    pub targets: Vec<DeviceId>,
    pub forced_extra_vars: Vec<ExtraVar>,
}

impl FakePlaybooks {
    pub fn executions(&self) -> Vec<PlaybookRun> {
        self.executions.lock().unwrap().clone()
    }
}

impl PlaybookService for FakePlaybooks {
    fn get_playbook_by_id(
        &self,
        id: PlaybookId,
    ) -> impl Future<Output = Result<Option<Playbook>, FleetHubError>> + Send {
        let found = self.known.lock().unwrap().get(&id).cloned();
        async { Ok(found) }
    }

    fn execute_playbook(
        &self,
        playbook: &Playbook,
        user: &User,
        targets: &[DeviceId],
        forced_extra_vars: &[ExtraVar],
    ) -> impl Future<Output = Result<ExecutionId, FleetHubError>> + Send {
        let mut executions = self.executions.lock().unwrap();
        executions.push(PlaybookRun {
            playbook_id: playbook.id,
            user_id: user.id,
            targets: targets.to_vec(),
            forced_extra_vars: forced_extra_vars.to_vec(),
        });
        let execution_id = ExecutionId::new(format!("exec-{}", executions.len()));
        async { Ok(execution_id) }
    }
}

// ── Task statuses ──────────────────────────────────────────────────

enum StatusScript {
    TerminalAfter(u32, TaskStatus),
    NeverTerminal,
    Failing,
}

pub(crate) struct FakeTaskStatuses {
    script: StatusScript,
    polls: AtomicU32,
}

impl FakeTaskStatuses {
    /// Report RUNNING until poll `n`, then `status`.
    pub fn terminal_after(n: u32, status: TaskStatus) -> Self {
        Self::scripted(StatusScript::TerminalAfter(n, status))
    }

    /// Nothing is observed on the first poll, RUNNING afterwards.
    pub fn never_terminal() -> Self {
        Self::scripted(StatusScript::NeverTerminal)
    }

    pub fn failing() -> Self {
        Self::scripted(StatusScript::Failing)
    }

    fn scripted(script: StatusScript) -> Self {
        Self {
            script,
            polls: AtomicU32::new(0),
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl TaskStatusRepository for FakeTaskStatuses {
    fn find_latest_by_execution_id(
        &self,
        execution_id: &ExecutionId,
    ) -> impl Future<Output = Result<Option<TaskStatusRecord>, FleetHubError>> + Send {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let record = |status: TaskStatus| TaskStatusRecord {
            execution_id: execution_id.clone(),
            status,
            created_at: time::now(),
        };
        let result = match &self.script {
            StatusScript::TerminalAfter(n, status) if poll >= *n => {
                Ok(Some(record(status.clone())))
            }
            StatusScript::NeverTerminal if poll == 1 => Ok(None),
            StatusScript::TerminalAfter(..) | StatusScript::NeverTerminal => {
                Ok(Some(record(TaskStatus::Running)))
            }
            StatusScript::Failing => Err(FleetHubError::Storage("status store unavailable".into())),
        };
        async { result }
    }
}

// ── Users ──────────────────────────────────────────────────────────

pub(crate) struct FakeUsers {
    user: Option<User>,
}

impl FakeUsers {
    pub fn admin() -> Self {
        Self {
            user: Some(User {
                id: UserId::new(),
                email: "admin@fleethub.local".to_string(),
            }),
        }
    }

    pub fn admin_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }
}

impl UserRepository for FakeUsers {
    fn find_first(&self) -> impl Future<Output = Result<Option<User>, FleetHubError>> + Send {
        let user = self.user.clone();
        async { Ok(user) }
    }
}
