//! Wire codec for the vision controller request/response protocol.
//!
//! Requests travel as a single frame:
//! - a 12-byte brand tag (`P`, `H`, `O` as three little-endian u32 words)
//! - a 4-byte little-endian payload length, counted in 4-byte units
//! - a 4-byte little-endian action id
//!
//! Responses are a 12-byte header followed by sub-messages, each with its own
//! 12-byte sub-header and a payload whose size the sub-header declares.
//! Every read is exact: a short read is a desynchronized stream, never a
//! partial result.

pub mod codec;
pub mod error;
pub mod message;
pub mod payload;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_request, decode_response_header, decode_sub_header, encode_request,
    encode_response_header, encode_sub_header, CodecConfig, IntDecoding, RequestFrame,
    ResponseHeader, SubHeader, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC, REQUEST_HEADER_SIZE,
    SUB_HEADER_SIZE, UNIT_SIZE,
};
pub use error::{FrameError, Result};
pub use message::MessageKind;
pub use payload::{
    decode_error_code, decode_gripper_command, decode_info, decode_pose, decode_waypoint,
    encode_error_code, encode_gripper_command, encode_info, encode_pose, encode_waypoint, Pose,
    Waypoint, CHECKSUM_TOLERANCE, JOINT_COUNT, POSE_LEN, POSE_SIZE, WAYPOINT_SIZE,
};
pub use reader::FrameReader;
pub use writer::FrameWriter;
