//! Blocking TCP transport for the vision controller link.
//!
//! This is the lowest layer of pickwire. It knows nothing about the protocol:
//! it connects, optionally listens (loopback controllers in tests), and hands
//! out [`LinkStream`] values that implement `Read + Write`.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::TcpSocket;
pub use traits::LinkStream;
