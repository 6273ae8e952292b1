//! Action: one externally-effecting step of an automation chain.

use serde::{Deserialize, Serialize};

use crate::container::{ContainerOperation, VolumeOperation};
use crate::error::ValidationError;
use crate::id::{DeviceId, PlaybookId, VolumeId};
use crate::playbook::ExtraVar;

/// A step executed when the automation runs.
///
/// Like [`TriggerSpec`](super::TriggerSpec), unknown kinds decode as
/// [`ActionSpec::Unsupported`] and fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Apply a lifecycle operation to each listed container.
    Container {
        operation: ContainerOperation,
        container_ids: Vec<String>,
    },
    /// Apply a volume operation to each listed volume.
    Volume {
        operation: VolumeOperation,
        volume_ids: Vec<VolumeId>,
    },
    /// Run a playbook against the target devices.
    Playbook {
        playbook_id: PlaybookId,
        targets: Vec<DeviceId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        forced_extra_vars: Vec<ExtraVar>,
    },
    #[serde(other)]
    Unsupported,
}

impl ActionSpec {
    /// Short name of the action kind, used in logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::Volume { .. } => "volume",
            Self::Playbook { .. } => "playbook",
            Self::Unsupported => "unsupported",
        }
    }

    /// Check that the action is of a known kind and has at least one target.
    ///
    /// `index` is the action's position in the chain, reported back for
    /// unsupported kinds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedAction`] or
    /// [`ValidationError::EmptyTargets`].
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let empty = match self {
            Self::Container { container_ids, .. } => {
                container_ids.is_empty() || container_ids.iter().any(|id| id.trim().is_empty())
            }
            Self::Volume { volume_ids, .. } => volume_ids.is_empty(),
            Self::Playbook { targets, .. } => targets.is_empty(),
            Self::Unsupported => return Err(ValidationError::UnsupportedAction { index }),
        };
        if empty {
            return Err(ValidationError::EmptyTargets { kind: self.kind() });
        }
        Ok(())
    }
}

impl std::fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Container {
                operation,
                container_ids,
            } => write!(f, "container({operation}, {} targets)", container_ids.len()),
            Self::Volume {
                operation,
                volume_ids,
            } => write!(f, "volume({operation}, {} targets)", volume_ids.len()),
            Self::Playbook {
                playbook_id,
                targets,
                ..
            } => write!(f, "playbook({playbook_id}, {} targets)", targets.len()),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}
