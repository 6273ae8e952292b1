//! # fleethub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `AutomationRepository` port defined in `fleethub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows (the automation chain is
//!   stored as a JSON column)
//!
//! ## Dependency rule
//! Depends on `fleethub-app` (for port traits) and `fleethub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod automation_repo;
pub mod error;
pub mod pool;

pub use automation_repo::SqliteAutomationRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
