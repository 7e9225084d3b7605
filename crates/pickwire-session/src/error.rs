use crate::action::ActionRequest;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pickwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pickwire_frame::FrameError),

    /// Arguments do not match any payload shape the action accepts.
    #[error("invalid argument for {action}: {reason}")]
    InvalidArgument {
        action: ActionRequest,
        reason: String,
    },

    /// A request was sent while another one is still awaiting its response.
    #[error("cannot send {requested}: {in_flight} is still awaiting its response")]
    ConcurrentRequest {
        in_flight: ActionRequest,
        requested: ActionRequest,
    },

    /// `receive` was called with nothing in flight.
    #[error("no request in flight")]
    NoRequestInFlight,

    /// The controller answered a different action than the one awaited.
    #[error("unexpected response: expected {expected}, received action id {received}")]
    UnexpectedResponse {
        expected: ActionRequest,
        received: u32,
    },

    /// An earlier fatal error left the stream out of step.
    #[error("session is desynchronized; close it and reconnect")]
    Desynchronized,

    /// The identification handshake could not be performed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

impl SessionError {
    /// Whether the session must be closed after this error.
    ///
    /// Fatal errors leave the byte stream at an unknown position.
    pub fn is_fatal(&self) -> bool {
        match self {
            SessionError::Transport(_) => true,
            SessionError::Frame(err) => err.is_fatal(),
            SessionError::UnexpectedResponse { .. } => true,
            SessionError::Desynchronized => true,
            SessionError::HandshakeFailed(_) => true,
            SessionError::InvalidArgument { .. }
            | SessionError::ConcurrentRequest { .. }
            | SessionError::NoRequestInFlight => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
