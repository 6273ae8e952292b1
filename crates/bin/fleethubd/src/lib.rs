//! # fleethubd: fleethub daemon
//!
//! Composition root that wires all adapters into the automation engine.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct adapter implementations and hand them to the engine as
//!   [`Collaborators`](fleethub_app::automation_engine::Collaborators)
//! - Register every enabled automation at startup
//! - Stop every component and scheduler job on shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod config;
pub mod wiring;
