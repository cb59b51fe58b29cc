//! Registry wire protocol
//!
//! A registry listens on a TCP port and answers three requests: list the bound
//! service names, look one up, and invoke a playback operation on one.
//!
//! ```text
//!   Controller                          Host registry
//!       |                                     |
//!       |---- Lookup{"theatre"} ------------->|
//!       |<--- Ok / NotBound ------------------|
//!       |                                     |
//!       |---- Invoke{"theatre", Play} ------->|  enqueue on player context
//!       |<--- Ok / NotBound / Fault ----------|
//! ```

pub mod address;
pub mod codec;
pub mod constants;
pub mod message;

pub use address::{AddressError, ServiceAddress};
pub use codec::CodecError;
pub use message::{PlaybackCommand, Request, Response};
