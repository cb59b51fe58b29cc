//! Host side registry server
//!
//! One [`RegistryServer`] runs per published port. It accepts controller
//! connections and answers list, lookup and invoke requests from the
//! [`BindingTable`](crate::registry::BindingTable) it was given.

pub mod config;
pub mod listener;

pub use config::{HostConfig, HostConfigError, ServerConfig};
pub use listener::RegistryServer;
