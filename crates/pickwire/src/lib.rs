//! Client for the vision-guided bin-picking controller protocol.
//!
//! pickwire drives a bin-picking/locating vision controller from a robot
//! program over TCP: framed requests out, multi-part typed responses back,
//! one request in flight at a time.
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking TCP link
//! - [`frame`]: wire codec, frame reader and writer
//! - [`session`]: action catalog, response aggregation and the session
//!   state machine (behind the default `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use pickwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pickwire_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use pickwire_session::*;
}
