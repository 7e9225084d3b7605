//! Response model and the aggregator that builds it.
//!
//! A response is one header followed by `sub_message_count` sub-messages.
//! Each sub-message is folded into the [`Response`] for the awaited action.
//! Trajectories are rebuilt segment by segment, and info blocks following an
//! object pose alternate between dimensions and z-height/angle.

use std::io::Read;

use pickwire_frame::{
    decode_error_code, decode_gripper_command, decode_info, decode_pose, decode_waypoint,
    FrameError, FrameReader, IntDecoding, MessageKind, Pose, ResponseHeader, SubHeader,
    JOINT_COUNT, WAYPOINT_SIZE,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::action::ActionRequest;
use crate::error::Result;

/// Planner that produced a trajectory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPrecision {
    Coarse,
    Fine,
}

/// One verified waypoint of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub id: i32,
    pub joints: [f32; JOINT_COUNT],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub precision: SegmentPrecision,
    pub waypoints: Vec<TrajectoryPoint>,
}

/// Ordered trajectory segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    pub segments: Vec<Segment>,
}

impl Trajectory {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn waypoint_count(&self) -> usize {
        self.segments.iter().map(|s| s.waypoints.len()).sum()
    }
}

/// Family-specific part of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseBody {
    /// The action returns nothing beyond error code and gripper commands.
    Ack,
    Trajectory {
        trajectory: Trajectory,
        gripping_info: Vec<Vec<i32>>,
    },
    /// Bin-picking object pose: dimensions, then optionally z-height/angle.
    ObjectPose {
        dimensions: Option<Vec<i32>>,
        z_height_angle: Option<Vec<i32>>,
    },
    /// Locator objects, one dimension record per object.
    Objects {
        dimensions: Vec<Vec<i32>>,
        z_height_angle: Vec<Vec<i32>>,
    },
    VisionSystemStatus {
        status: Option<Vec<i32>>,
    },
    Calibration {
        result: Option<Vec<i32>>,
        camera_pose: Option<Pose>,
    },
    RunningSolution {
        solution: Option<Vec<i32>>,
    },
    AvailableSolutions {
        solutions: Vec<Vec<i32>>,
    },
}

impl ResponseBody {
    /// Empty body for the given action.
    pub fn for_action(action: ActionRequest) -> Self {
        use ActionRequest::*;
        match action {
            BinpickingTrajectory => ResponseBody::Trajectory {
                trajectory: Trajectory::default(),
                gripping_info: Vec::new(),
            },
            BinpickingObjectPose => ResponseBody::ObjectPose {
                dimensions: None,
                z_height_angle: None,
            },
            LocatorGetObjects => ResponseBody::Objects {
                dimensions: Vec::new(),
                z_height_angle: Vec::new(),
            },
            BinpickingGetVisionSystemStatus | LocatorGetVisionSystemStatus => {
                ResponseBody::VisionSystemStatus { status: None }
            }
            CalibrationSaveAutomatic => ResponseBody::Calibration {
                result: None,
                camera_pose: None,
            },
            SolutionGetRunning => ResponseBody::RunningSolution { solution: None },
            SolutionGetAvailable => ResponseBody::AvailableSolutions {
                solutions: Vec::new(),
            },
            _ => ResponseBody::Ack,
        }
    }
}

/// A fully decoded response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// The awaited action (after aliasing).
    pub action: ActionRequest,
    /// Last error code reported by the controller, if any.
    pub error_code: Option<i32>,
    pub gripper_commands: Vec<u8>,
    /// Detected-object poses, in arrival order.
    pub object_poses: Vec<Pose>,
    pub body: ResponseBody,
}

impl Response {
    pub fn new(action: ActionRequest) -> Self {
        Self {
            action,
            error_code: None,
            gripper_commands: Vec::new(),
            object_poses: Vec::new(),
            body: ResponseBody::for_action(action),
        }
    }

    /// True when the controller reported a non-zero error code.
    pub fn is_error(&self) -> bool {
        self.error_code.is_some_and(|code| code != 0)
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        match &self.body {
            ResponseBody::Trajectory { trajectory, .. } => Some(trajectory),
            _ => None,
        }
    }
}

/// Folds sub-messages into a [`Response`].
#[derive(Debug)]
pub struct Aggregator {
    response: Response,
    int_decoding: IntDecoding,
    segment_index: usize,
    segments: Vec<Segment>,
    dimension_consumed: bool,
    /// First recoverable decode failure, reported once the response is drained.
    deferred: Option<FrameError>,
}

impl Aggregator {
    pub fn new(action: ActionRequest, int_decoding: IntDecoding) -> Self {
        Self {
            response: Response::new(action),
            int_decoding,
            segment_index: 0,
            segments: Vec::new(),
            dimension_consumed: false,
            deferred: None,
        }
    }

    /// Fold one sub-message.
    ///
    /// The payload has already been read in full, so a malformed payload or a
    /// waypoint checksum failure is remembered and reported by
    /// [`Aggregator::finish`]; the caller keeps draining the response.
    pub fn accept(&mut self, sub: &SubHeader, payload: &[u8]) {
        debug!(
            action = %self.response.action,
            kind = %sub.kind,
            sequence = sub.sequence,
            units = sub.unit_count,
            "sub-message"
        );
        match sub.kind {
            MessageKind::TrajectoryCoarse => {
                self.accept_trajectory(SegmentPrecision::Coarse, payload);
            }
            MessageKind::TrajectoryFine => {
                self.accept_trajectory(SegmentPrecision::Fine, payload);
            }
            MessageKind::Gripper => match decode_gripper_command(payload) {
                Ok(command) => self.response.gripper_commands.push(command),
                Err(err) => self.defer(err),
            },
            MessageKind::Error => {
                let code = decode_error_code(payload);
                if code != 0 {
                    warn!(action = %self.response.action, code, "controller reported error");
                }
                self.response.error_code = Some(code);
            }
            MessageKind::Info => {
                let values = decode_info(payload, self.int_decoding);
                self.accept_info(values);
            }
            MessageKind::ObjectPose => match decode_pose(payload) {
                Ok(pose) => self.accept_pose(pose),
                Err(err) => self.defer(err),
            },
        }
    }

    fn defer(&mut self, err: FrameError) {
        warn!(action = %self.response.action, error = %err, "rejected sub-message");
        if self.deferred.is_none() {
            self.deferred = Some(err);
        }
    }

    fn accept_trajectory(&mut self, precision: SegmentPrecision, payload: &[u8]) {
        if self.segment_index >= self.segments.len() {
            self.segments.push(Segment {
                precision,
                waypoints: Vec::new(),
            });
        }
        let index = self.segment_index;

        for chunk in payload.chunks(WAYPOINT_SIZE) {
            match decode_waypoint(chunk) {
                Ok(waypoint) => self.segments[index].waypoints.push(TrajectoryPoint {
                    id: waypoint.id,
                    joints: waypoint.joints,
                }),
                Err(err) => self.defer(err),
            }
        }
        self.segment_index += 1;
    }

    fn accept_info(&mut self, values: Vec<i32>) {
        let action = self.response.action;
        match &mut self.response.body {
            ResponseBody::Trajectory { gripping_info, .. } => gripping_info.push(values),
            ResponseBody::ObjectPose {
                dimensions,
                z_height_angle,
            } => {
                if self.dimension_consumed {
                    *z_height_angle = Some(values);
                } else {
                    *dimensions = Some(values);
                }
                self.dimension_consumed = true;
            }
            ResponseBody::Objects {
                dimensions,
                z_height_angle,
            } => {
                if self.dimension_consumed {
                    z_height_angle.push(values);
                } else {
                    dimensions.push(values);
                }
                self.dimension_consumed = true;
            }
            ResponseBody::VisionSystemStatus { status } => *status = Some(values),
            ResponseBody::Calibration { result, .. } => *result = Some(values),
            ResponseBody::RunningSolution { solution } => *solution = Some(values),
            ResponseBody::AvailableSolutions { solutions } => solutions.push(values),
            ResponseBody::Ack => {
                warn!(action = %action, values = ?values, "ignoring info block");
            }
        }
    }

    fn accept_pose(&mut self, pose: Pose) {
        match &mut self.response.body {
            ResponseBody::Calibration { camera_pose, .. } => *camera_pose = Some(pose),
            _ => self.response.object_poses.push(pose),
        }
        self.dimension_consumed = false;
    }

    /// Finish the response, reporting the first deferred failure if any.
    pub fn finish(mut self) -> Result<Response> {
        if let Some(err) = self.deferred {
            return Err(err.into());
        }

        let segments = std::mem::take(&mut self.segments);
        match &mut self.response.body {
            ResponseBody::Trajectory { trajectory, .. } => trajectory.segments = segments,
            _ if !segments.is_empty() => {
                warn!(
                    action = %self.response.action,
                    segments = segments.len(),
                    "ignoring trajectory segments"
                );
            }
            _ => {}
        }
        Ok(self.response)
    }
}

/// Read every sub-message announced by `header` and aggregate them.
///
/// The header must already have been read and matched against `action`.
pub fn read_response<R: Read>(
    reader: &mut FrameReader<R>,
    action: ActionRequest,
    header: &ResponseHeader,
) -> Result<Response> {
    let mut aggregator = Aggregator::new(action, reader.config().int_decoding);
    for _ in 0..header.sub_message_count {
        let sub = reader.read_sub_header()?;
        let payload = reader.read_sub_payload(&sub)?;
        aggregator.accept(&sub, &payload);
    }
    aggregator.finish()
}
