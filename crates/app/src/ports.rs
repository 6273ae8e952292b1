//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod automation_repo;
pub mod fleet;
pub mod playbooks;
pub mod users;

pub use automation_repo::AutomationRepository;
pub use fleet::{ContainerService, VolumeService};
pub use playbooks::{PlaybookService, TaskStatusRepository};
pub use users::UserRepository;

/// The set of adapter types the automation engine is wired with.
///
/// Implemented by the composition root (and by test fixtures) so that the
/// engine, its components and the services carry a single type parameter
/// instead of one per collaborator.
pub trait Ports: Send + Sync + 'static {
    type Automations: AutomationRepository + Send + Sync + 'static;
    type Containers: ContainerService + Send + Sync + 'static;
    type Volumes: VolumeService + Send + Sync + 'static;
    type Playbooks: PlaybookService + Send + Sync + 'static;
    type TaskStatuses: TaskStatusRepository + Send + Sync + 'static;
    type Users: UserRepository + Send + Sync + 'static;
}
