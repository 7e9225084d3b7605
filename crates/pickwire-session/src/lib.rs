//! Request/response session for the vision controller protocol.
//!
//! This is the layer callers use. Build a request from the action catalog,
//! send it over a [`Session`], and read back a typed [`Response`]. Only one
//! request may be in flight at a time.

pub mod action;
pub mod connector;
pub mod error;
pub mod handshake;
pub mod request;
pub mod response;
pub mod session;

pub use action::{ActionRequest, Family, PayloadShape};
pub use connector::{connect, connect_with_config};
pub use error::{Result, SessionError};
pub use handshake::{send_brand, DEFAULT_BRAND};
pub use request::{Arg, Request};
pub use response::{
    read_response, Aggregator, Response, ResponseBody, Segment, SegmentPrecision, Trajectory,
    TrajectoryPoint,
};
pub use session::{Session, SessionConfig, SessionState};
