//! Application services: use-case implementations.
//!
//! Services accept port trait implementations via a [`Ports`](crate::ports::Ports)
//! type parameter (constructor injection), keeping this layer decoupled from
//! concrete adapters.

pub mod automation_service;
