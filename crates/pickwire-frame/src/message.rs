//! Sub-message kinds.
//!
//! Every sub-header carries one of these ids. The kind decides both how
//! large one payload unit is and how the payload is interpreted.

use std::fmt;

use crate::codec::UNIT_SIZE;
use crate::error::FrameError;
use crate::payload::WAYPOINT_SIZE;

/// The closed set of sub-message kinds a controller may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Trajectory segment planned with the coarse (continuous) planner.
    TrajectoryCoarse = 0,
    /// Trajectory segment planned with the fine planner.
    TrajectoryFine = 1,
    /// Gripper command.
    Gripper = 2,
    /// Controller error code.
    Error = 3,
    /// Block of 32-bit integers whose meaning depends on the request.
    Info = 4,
    /// Cartesian pose (translation + quaternion).
    ObjectPose = 5,
}

impl MessageKind {
    /// Map a wire id onto a kind.
    pub fn from_wire(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::TrajectoryCoarse),
            1 => Some(Self::TrajectoryFine),
            2 => Some(Self::Gripper),
            3 => Some(Self::Error),
            4 => Some(Self::Info),
            5 => Some(Self::ObjectPose),
            _ => None,
        }
    }

    /// The wire id of this kind.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Human-readable name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::TrajectoryCoarse => "TRAJECTORY_COARSE",
            Self::TrajectoryFine => "TRAJECTORY_FINE",
            Self::Gripper => "GRIPPER",
            Self::Error => "ERROR",
            Self::Info => "INFO",
            Self::ObjectPose => "OBJECT_POSE",
        }
    }

    /// Returns true for both trajectory segment kinds.
    pub fn is_trajectory(self) -> bool {
        matches!(self, Self::TrajectoryCoarse | Self::TrajectoryFine)
    }

    /// Size in bytes of one unit counted by the sub-header.
    pub fn unit_size(self) -> usize {
        if self.is_trajectory() {
            WAYPOINT_SIZE
        } else {
            UNIT_SIZE
        }
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = FrameError;

    fn try_from(id: u32) -> Result<Self, FrameError> {
        Self::from_wire(id).ok_or(FrameError::UnknownMessageKind(id))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
