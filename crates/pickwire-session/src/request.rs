use bytes::{BufMut, Bytes, BytesMut};
use pickwire_frame::{Pose, RequestFrame, JOINT_COUNT, POSE_LEN, UNIT_SIZE};

use crate::action::{ActionRequest, PayloadShape};
use crate::error::{Result, SessionError};

/// One request argument as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i32),
    Floats(Vec<f32>),
}

/// A validated request, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    action: ActionRequest,
    shape: PayloadShape,
    payload: Bytes,
}

impl Request {
    /// Validate `args` against the action's accepted shapes and encode them.
    pub fn build(action: ActionRequest, args: &[Arg]) -> Result<Self> {
        let shape = classify(action, args)?;
        if !action.payload_shapes().contains(&shape) {
            let accepted: Vec<&str> = action
                .payload_shapes()
                .iter()
                .map(|shape| shape.describe())
                .collect();
            return Err(invalid(
                action,
                format!(
                    "arguments form '{}', accepted: {}",
                    shape.describe(),
                    accepted.join(" | ")
                ),
            ));
        }

        let mut payload = BytesMut::with_capacity(shape.unit_count() * UNIT_SIZE);
        for arg in args {
            match arg {
                Arg::Int(value) => payload.put_i32_le(*value),
                Arg::Floats(values) => {
                    for value in values {
                        payload.put_f32_le(*value);
                    }
                }
            }
        }

        Ok(Self {
            action,
            shape,
            payload: payload.freeze(),
        })
    }

    /// A request without payload.
    pub fn empty(action: ActionRequest) -> Result<Self> {
        Self::build(action, &[])
    }

    /// A request carrying one integer.
    pub fn int(action: ActionRequest, value: i32) -> Result<Self> {
        Self::build(action, &[Arg::Int(value)])
    }

    /// A request carrying two integers.
    pub fn int_pair(action: ActionRequest, first: i32, second: i32) -> Result<Self> {
        Self::build(action, &[Arg::Int(first), Arg::Int(second)])
    }

    /// A request carrying an optional pose and nothing else.
    pub fn optional_pose(action: ActionRequest, pose: Option<&Pose>) -> Result<Self> {
        match pose {
            Some(pose) => Self::build(action, &[Arg::Floats(pose.to_vec())]),
            None => Self::empty(action),
        }
    }

    /// A scan-style request: vision system id plus an optional tool pose.
    pub fn int_with_pose(action: ActionRequest, value: i32, pose: Option<&Pose>) -> Result<Self> {
        match pose {
            Some(pose) => Self::build(action, &[Arg::Int(value), Arg::Floats(pose.to_vec())]),
            None => Self::int(action, value),
        }
    }

    /// The bin-picking initialization request.
    pub fn initialization(
        vs_id: i32,
        start: &[f32; JOINT_COUNT],
        end: &[f32; JOINT_COUNT],
    ) -> Result<Self> {
        Self::build(
            ActionRequest::BinpickingInitialization,
            &[
                Arg::Int(vs_id),
                Arg::Floats(start.to_vec()),
                Arg::Floats(end.to_vec()),
            ],
        )
    }

    pub fn action(&self) -> ActionRequest {
        self.action
    }

    pub fn shape(&self) -> PayloadShape {
        self.shape
    }

    /// Encoded payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Convert into a wire frame.
    pub fn into_frame(self) -> RequestFrame {
        RequestFrame::new(self.action.id(), self.payload)
    }
}

fn classify(action: ActionRequest, args: &[Arg]) -> Result<PayloadShape> {
    match args {
        [] => Ok(PayloadShape::None),
        [Arg::Int(_)] => Ok(PayloadShape::Int),
        [Arg::Int(_), Arg::Int(_)] => Ok(PayloadShape::IntPair),
        [Arg::Floats(pose)] => {
            expect_len(action, "pose", pose, POSE_LEN)?;
            Ok(PayloadShape::Pose)
        }
        [Arg::Int(_), Arg::Floats(pose)] => {
            expect_len(action, "pose", pose, POSE_LEN)?;
            Ok(PayloadShape::IntPose)
        }
        [Arg::Int(_), Arg::Floats(start), Arg::Floats(end)] => {
            expect_len(action, "start joints", start, JOINT_COUNT)?;
            expect_len(action, "end joints", end, JOINT_COUNT)?;
            Ok(PayloadShape::IntJointRange)
        }
        _ => Err(invalid(
            action,
            format!("unsupported argument list of {} values", args.len()),
        )),
    }
}

fn expect_len(action: ActionRequest, what: &str, values: &[f32], len: usize) -> Result<()> {
    if values.len() != len {
        return Err(invalid(
            action,
            format!("{what} must carry exactly {len} values, got {}", values.len()),
        ));
    }
    Ok(())
}

fn invalid(action: ActionRequest, reason: String) -> SessionError {
    SessionError::InvalidArgument { action, reason }
}
