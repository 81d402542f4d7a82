//! CubeGate Registry
//!
//! Lifecycle management for registered databases: create/update/delete,
//! activate/deactivate, and a connection structural check, all funneled
//! through a single [`RegistryManager`] so every caller sees the same
//! tenant-scoping and event-fanout behavior.
//!
//! The manager holds no direct reference to the filesystem synchronizer or
//! the catalog index — it publishes [`RegistryEvent`]s on a broadcast
//! channel and lets those components subscribe, which keeps the ownership
//! graph acyclic (registry manager -> event bus -> subscribers, never the
//! other way back).

mod events;
mod manager;
mod scope;
mod validate;

pub use events::RegistryEvent;
pub use manager::RegistryManager;
pub use scope::scope_database_id;
pub use validate::validate_connection_shape;
