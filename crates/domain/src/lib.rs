//! # fleethub-domain
//!
//! Pure domain model for the fleethub fleet-management system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Automations** (a trigger plus an ordered chain of actions)
//! - Define the fleet value types automations act upon: **Containers**,
//!   **Volumes**, **Playbooks** and their task statuses, and **Users**
//! - Contain all invariant enforcement and domain logic (chain validation,
//!   cron parsing, terminal-status classification)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod container;
pub mod playbook;
pub mod user;
