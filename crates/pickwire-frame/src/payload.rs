//! Sub-message payload layouts.

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::{IntDecoding, UNIT_SIZE};
use crate::error::{FrameError, Result};
use crate::message::MessageKind;

/// Joints per waypoint.
pub const JOINT_COUNT: usize = 6;

/// Waypoint: id (4) + joints (6 * 4) + checksum (4) = 32 bytes.
pub const WAYPOINT_SIZE: usize = UNIT_SIZE + JOINT_COUNT * UNIT_SIZE + UNIT_SIZE;

/// Floats per Cartesian pose: translation (3) + quaternion (4).
pub const POSE_LEN: usize = 7;

/// Object pose: 7 * f32 = 28 bytes.
pub const POSE_SIZE: usize = POSE_LEN * UNIT_SIZE;

/// Largest accepted difference between the joint sum and the checksum.
pub const CHECKSUM_TOLERANCE: f64 = 0.01;

/// Cartesian pose: `[x, y, z, qw, qx, qy, qz]`.
pub type Pose = [f32; POSE_LEN];

/// One trajectory waypoint as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub id: i32,
    pub joints: [f32; JOINT_COUNT],
    /// Sum of `joints` as computed by the sender.
    pub checksum: f32,
}

impl Waypoint {
    /// Build a waypoint whose checksum matches its joints.
    pub fn new(id: i32, joints: [f32; JOINT_COUNT]) -> Self {
        let checksum = joints.iter().map(|&j| f64::from(j)).sum::<f64>() as f32;
        Self {
            id,
            joints,
            checksum,
        }
    }

    /// Sum of the joint values, accumulated in f64.
    pub fn joint_sum(&self) -> f64 {
        self.joints.iter().map(|&j| f64::from(j)).sum()
    }

    /// Check the embedded checksum against the joints.
    ///
    /// A NaN joint or checksum never verifies.
    pub fn verify(&self) -> Result<()> {
        let joint_sum = self.joint_sum();
        let within = (joint_sum - f64::from(self.checksum)).abs() <= CHECKSUM_TOLERANCE;
        if !within {
            return Err(FrameError::ChecksumMismatch {
                waypoint_id: self.id,
                joint_sum,
                checksum: self.checksum,
            });
        }
        Ok(())
    }
}

/// Decode and verify one 32-byte waypoint.
pub fn decode_waypoint(src: &[u8]) -> Result<Waypoint> {
    if src.len() != WAYPOINT_SIZE {
        return Err(FrameError::Truncated {
            expected: WAYPOINT_SIZE,
            received: src.len(),
        });
    }
    let mut buf = src;
    let id = buf.get_i32_le();
    let mut joints = [0f32; JOINT_COUNT];
    for joint in &mut joints {
        *joint = buf.get_f32_le();
    }
    let checksum = buf.get_f32_le();

    let waypoint = Waypoint {
        id,
        joints,
        checksum,
    };
    waypoint.verify()?;
    Ok(waypoint)
}

/// Encode one waypoint, checksum included as stored.
pub fn encode_waypoint(waypoint: &Waypoint, dst: &mut BytesMut) {
    dst.reserve(WAYPOINT_SIZE);
    dst.put_i32_le(waypoint.id);
    for joint in waypoint.joints {
        dst.put_f32_le(joint);
    }
    dst.put_f32_le(waypoint.checksum);
}

/// Decode a 28-byte Cartesian pose.
pub fn decode_pose(src: &[u8]) -> Result<Pose> {
    if src.len() != POSE_SIZE {
        return Err(FrameError::PayloadSizeMismatch {
            kind: MessageKind::ObjectPose,
            expected: POSE_SIZE,
            actual: src.len(),
        });
    }
    let mut buf = src;
    let mut pose = [0f32; POSE_LEN];
    for value in &mut pose {
        *value = buf.get_f32_le();
    }
    Ok(pose)
}

/// Encode a Cartesian pose.
pub fn encode_pose(pose: &Pose, dst: &mut BytesMut) {
    dst.reserve(POSE_SIZE);
    for value in pose {
        dst.put_f32_le(*value);
    }
}

/// Decode an info block into 32-bit integers.
///
/// The count is `ceil(len / 4)`; a trailing partial word is zero padded.
pub fn decode_info(src: &[u8], mode: IntDecoding) -> Vec<i32> {
    src.chunks(UNIT_SIZE)
        .map(|chunk| mode.apply(word_le(chunk)) as i32)
        .collect()
}

/// Encode an info block.
pub fn encode_info(values: &[i32], dst: &mut BytesMut) {
    dst.reserve(values.len() * UNIT_SIZE);
    for value in values {
        dst.put_i32_le(*value);
    }
}

/// Decode an error block as one little-endian integer.
///
/// Only the first unit counts; an empty block reads as code 0.
pub fn decode_error_code(src: &[u8]) -> i32 {
    word_le(&src[..src.len().min(UNIT_SIZE)]) as i32
}

/// Encode an error block (one unit).
pub fn encode_error_code(code: i32, dst: &mut BytesMut) {
    dst.put_i32_le(code);
}

/// Decode a gripper block; the command is its first byte.
pub fn decode_gripper_command(src: &[u8]) -> Result<u8> {
    src.first()
        .copied()
        .ok_or(FrameError::PayloadSizeMismatch {
            kind: MessageKind::Gripper,
            expected: UNIT_SIZE,
            actual: 0,
        })
}

/// Encode a gripper block (one unit, command in the low byte).
pub fn encode_gripper_command(command: u8, dst: &mut BytesMut) {
    dst.put_u32_le(u32::from(command));
}

fn word_le(chunk: &[u8]) -> u32 {
    let mut word = [0u8; UNIT_SIZE];
    word[..chunk.len()].copy_from_slice(chunk);
    u32::from_le_bytes(word)
}
