use crate::message::MessageKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The request frame does not start with the brand tag.
    #[error("invalid frame magic (expected \"P\" \"H\" \"O\" brand tag)")]
    InvalidMagic,

    /// A request payload is not a whole number of 4-byte units.
    #[error("payload of {len} bytes is not a multiple of 4")]
    UnalignedPayload { len: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The stream ended before the requested number of bytes arrived.
    #[error("connection closed mid-frame (expected {expected} bytes, got {received})")]
    Truncated { expected: usize, received: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sub-header names a message kind outside the catalog.
    #[error("unknown message kind {0}")]
    UnknownMessageKind(u32),

    /// A waypoint's embedded checksum does not match the sum of its joints.
    #[error("waypoint {waypoint_id} checksum mismatch (joint sum {joint_sum}, checksum {checksum})")]
    ChecksumMismatch {
        waypoint_id: i32,
        joint_sum: f64,
        checksum: f32,
    },

    /// A sub-message payload has a size its kind cannot hold.
    #[error("{kind} payload has {actual} bytes, expected {expected}")]
    PayloadSizeMismatch {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    /// Whether the byte stream can no longer be trusted after this error.
    ///
    /// Checksum and size mismatches are detected after the sub-message was
    /// fully consumed, and an unaligned payload is rejected before anything
    /// is written. None of them leaves the stream out of step.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            FrameError::ChecksumMismatch { .. }
                | FrameError::PayloadSizeMismatch { .. }
                | FrameError::UnalignedPayload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
