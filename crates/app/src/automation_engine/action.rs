//! Live actions built from [`ActionSpec`]s.
//!
//! Item-level failures never escape [`Action::execute`]: they are logged and
//! folded into a single failure message for the whole action.

use std::sync::Arc;

use fleethub_domain::automation::ActionSpec;
use fleethub_domain::container::{ContainerOperation, VolumeOperation};
use fleethub_domain::error::{FleetHubError, ValidationError};
use fleethub_domain::id::{DeviceId, PlaybookId, VolumeId};
use fleethub_domain::playbook::ExtraVar;

use super::polling::StatusPoll;
use super::{Collaborators, PollingConfig};
use crate::ports::{ContainerService, PlaybookService, Ports, UserRepository, VolumeService};
use crate::scheduler::Scheduler;

/// Outcome of one action: `Err` carries a human-readable failure summary.
pub(crate) type ActionOutcome = Result<(), String>;

pub(crate) enum Action<P: Ports> {
    Container(ContainerAction<P>),
    Volume(VolumeAction<P>),
    Playbook(PlaybookAction<P>),
}

impl<P: Ports> Action<P> {
    /// Build the action at position `index` of a chain.
    ///
    /// Fails when the spec is invalid or the collaborator its kind needs was
    /// not configured.
    pub(crate) fn build(
        index: usize,
        spec: &ActionSpec,
        collaborators: &Collaborators<P>,
        scheduler: &Scheduler,
        polling: PollingConfig,
    ) -> Result<Self, FleetHubError> {
        spec.validate(index)?;
        let action = match spec {
            ActionSpec::Container {
                operation,
                container_ids,
            } => Self::Container(ContainerAction {
                containers: collaborators.containers()?,
                operation: *operation,
                container_ids: container_ids.clone(),
            }),
            ActionSpec::Volume {
                operation,
                volume_ids,
            } => Self::Volume(VolumeAction {
                volumes: collaborators.volumes()?,
                operation: *operation,
                volume_ids: volume_ids.clone(),
            }),
            ActionSpec::Playbook {
                playbook_id,
                targets,
                forced_extra_vars,
            } => Self::Playbook(PlaybookAction {
                playbooks: collaborators.playbooks()?,
                users: collaborators.users()?,
                poll: StatusPoll::new(collaborators.task_statuses()?, scheduler.clone(), polling),
                playbook_id: *playbook_id,
                targets: targets.clone(),
                forced_extra_vars: forced_extra_vars.clone(),
            }),
            ActionSpec::Unsupported => {
                return Err(ValidationError::UnsupportedAction { index }.into());
            }
        };
        Ok(action)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::Volume(_) => "volume",
            Self::Playbook(_) => "playbook",
        }
    }

    pub(crate) async fn execute(&self) -> ActionOutcome {
        match self {
            Self::Container(action) => action.execute().await,
            Self::Volume(action) => action.execute().await,
            Self::Playbook(action) => action.execute().await,
        }
    }
}

pub(crate) struct ContainerAction<P: Ports> {
    containers: Arc<P::Containers>,
    operation: ContainerOperation,
    container_ids: Vec<String>,
}

impl<P: Ports> ContainerAction<P> {
    async fn execute(&self) -> ActionOutcome {
        let mut failed = 0_usize;
        for id in &self.container_ids {
            let container = match self.containers.get_container_by_id(id).await {
                Ok(Some(container)) => container,
                Ok(None) => {
                    tracing::warn!(container_id = %id, "container not found");
                    failed += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(container_id = %id, error = %err, "container lookup failed");
                    failed += 1;
                    continue;
                }
            };
            if let Err(err) = self
                .containers
                .execute_container_action(&container.id, self.operation)
                .await
            {
                tracing::warn!(
                    container_id = %container.id,
                    operation = %self.operation,
                    error = %err,
                    "container action failed"
                );
                failed += 1;
            }
        }
        summarize(failed, self.container_ids.len(), || {
            format!("{} failed on one or more containers", self.operation)
        })
    }
}

pub(crate) struct VolumeAction<P: Ports> {
    volumes: Arc<P::Volumes>,
    operation: VolumeOperation,
    volume_ids: Vec<VolumeId>,
}

impl<P: Ports> VolumeAction<P> {
    async fn execute(&self) -> ActionOutcome {
        let mut failed = 0_usize;
        for &id in &self.volume_ids {
            let volume = match self.volumes.get_volume_by_id(id).await {
                Ok(Some(volume)) => volume,
                Ok(None) => {
                    tracing::warn!(volume_id = %id, "volume not found");
                    failed += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(volume_id = %id, error = %err, "volume lookup failed");
                    failed += 1;
                    continue;
                }
            };
            if let Err(err) = self
                .volumes
                .perform_volume_action(&volume, self.operation)
                .await
            {
                tracing::warn!(
                    volume_id = %id,
                    operation = %self.operation,
                    error = %err,
                    "volume action failed"
                );
                failed += 1;
            }
        }
        summarize(failed, self.volume_ids.len(), || {
            format!("{} failed on one or more volumes", self.operation)
        })
    }
}

pub(crate) struct PlaybookAction<P: Ports> {
    playbooks: Arc<P::Playbooks>,
    users: Arc<P::Users>,
    poll: StatusPoll<P::TaskStatuses>,
    playbook_id: PlaybookId,
    targets: Vec<DeviceId>,
    forced_extra_vars: Vec<ExtraVar>,
}

impl<P: Ports> PlaybookAction<P> {
    async fn execute(&self) -> ActionOutcome {
        let playbook = self
            .playbooks
            .get_playbook_by_id(self.playbook_id)
            .await
            .map_err(|err| format!("failed to load playbook {}: {err}", self.playbook_id))?
            .ok_or_else(|| format!("playbook {} does not exist", self.playbook_id))?;
        let user = self
            .users
            .find_first()
            .await
            .map_err(|err| format!("failed to look up the executing user: {err}"))?
            .ok_or_else(|| "no user available to run playbook".to_string())?;

        let execution_id = self
            .playbooks
            .execute_playbook(&playbook, &user, &self.targets, &self.forced_extra_vars)
            .await
            .map_err(|err| format!("failed to start playbook {}: {err}", playbook.name))?;
        tracing::info!(
            playbook = %playbook.name,
            execution_id = %execution_id,
            targets = self.targets.len(),
            "playbook execution started"
        );

        self.poll.wait_for_completion(execution_id).await
    }
}

fn summarize(failed: usize, total: usize, message: impl FnOnce() -> String) -> ActionOutcome {
    if failed == 0 {
        return Ok(());
    }
    Err(format!("{} ({failed} of {total} failed)", message()))
}
