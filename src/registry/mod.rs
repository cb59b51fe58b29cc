//! Service bindings and publishing
//!
//! ```text
//!                      ServiceRegistry
//!               ┌───────────────────────────┐
//!               │ port → RunningRegistry {  │
//!               │   bindings: BindingTable, │
//!               │   server task,            │
//!               │ }                         │
//!               └─────────────┬─────────────┘
//!                             │
//!        publish(port, name)  │  rebind under one write lock
//!                             ▼
//!                 BindingTable: name → Arc<dyn RemotePlayback>
//!                             ▲
//!                             │  lookup at call time
//!                      RegistryServer ◄──── controller requests
//! ```

pub mod error;
pub mod publish;
pub mod store;

pub use error::PublishError;
pub use publish::ServiceRegistry;
pub use store::BindingTable;
