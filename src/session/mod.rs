//! Controller sessions
//!
//! ```text
//!   menu ──connect──► SessionRegistry ──resolve──► Transport
//!                          │  id → endpoint
//!   menu ──send────► CommandDispatcher ──invoke──► RemoteEndpoint
//!                          │
//!                          └── evict on communication failure
//! ```

pub mod dispatcher;
pub mod error;
pub mod id;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::CommandDispatcher;
pub use error::{ConnectError, DispatchError};
pub use id::SessionId;
pub use registry::{SessionInfo, SessionRegistry};
