//! # fleethub-app
//!
//! Application layer: use-cases, **port definitions** (traits) and the
//! automation engine.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRepository`: CRUD for automation definitions plus the
//!     last-execution write-back
//!   - `ContainerService` / `VolumeService`: fleet lifecycle operations
//!   - `PlaybookService` / `TaskStatusRepository`: playbook runs and their progress
//!   - `UserRepository`: the identity automated runs execute as
//! - Provide the **automation engine**: a registry of live components, each
//!   owning a cron trigger and an ordered chain of actions
//! - Provide **in-process infrastructure** that doesn't need IO (the
//!   cooperative scheduler)
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AutomationService`: create, update, delete, execute, list, get
//!
//! ## Dependency rule
//! Depends on `fleethub-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod ports;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
