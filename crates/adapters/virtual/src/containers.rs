//! Simulated container runtime.

use fleethub_domain::container::{Container, ContainerOperation};

/// Runtime state of a simulated container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Paused,
    Stopped,
}

impl ContainerState {
    /// Apply `operation` the way a container runtime would.
    ///
    /// Returns the new state, `None` once the container is removed, or the
    /// reason the runtime refuses the operation.
    pub(crate) fn apply(self, operation: ContainerOperation) -> Result<Option<Self>, &'static str> {
        match (operation, self) {
            (ContainerOperation::Start, Self::Paused) => Err("container is paused"),
            (ContainerOperation::Start | ContainerOperation::Restart, _)
            | (ContainerOperation::Unpause, Self::Paused) => Ok(Some(Self::Running)),
            (ContainerOperation::Stop, _) => Ok(Some(Self::Stopped)),
            (ContainerOperation::Pause, Self::Running) => Ok(Some(Self::Paused)),
            (ContainerOperation::Pause, _) => Err("container is not running"),
            (ContainerOperation::Unpause, _) => Err("container is not paused"),
            (ContainerOperation::Remove, Self::Running) => {
                Err("cannot remove a running container")
            }
            (ContainerOperation::Remove, _) => Ok(None),
        }
    }
}

pub(crate) struct VirtualContainer {
    pub container: Container,
    pub state: ContainerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_run_container_when_started_from_stopped() {
        let next = ContainerState::Stopped.apply(ContainerOperation::Start);
        assert_eq!(next, Ok(Some(ContainerState::Running)));
    }

    #[test]
    fn should_reject_start_when_container_is_paused() {
        let next = ContainerState::Paused.apply(ContainerOperation::Start);
        assert!(next.is_err());
    }

    #[test]
    fn should_pause_and_unpause_running_container() {
        let paused = ContainerState::Running
            .apply(ContainerOperation::Pause)
            .unwrap()
            .unwrap();
        assert_eq!(paused, ContainerState::Paused);
        assert_eq!(
            paused.apply(ContainerOperation::Unpause),
            Ok(Some(ContainerState::Running))
        );
    }

    #[test]
    fn should_reject_pause_when_container_is_stopped() {
        assert_eq!(
            ContainerState::Stopped.apply(ContainerOperation::Pause),
            Err("container is not running")
        );
    }

    #[test]
    fn should_restart_from_any_state() {
        for state in [
            ContainerState::Running,
            ContainerState::Paused,
            ContainerState::Stopped,
        ] {
            assert_eq!(
                state.apply(ContainerOperation::Restart),
                Ok(Some(ContainerState::Running))
            );
        }
    }

    #[test]
    fn should_remove_only_when_not_running() {
        let running = ContainerState::Running.apply(ContainerOperation::Remove);
        assert!(running.is_err());
        let stopped = ContainerState::Stopped.apply(ContainerOperation::Remove);
        assert_eq!(stopped, Ok(None));
    }
}
