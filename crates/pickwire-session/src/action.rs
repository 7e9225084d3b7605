//! The action catalog.
//!
//! Every request the controller understands is one [`ActionRequest`]. The
//! catalog fixes its wire id, its family, the payload shapes it accepts and
//! the label used in diagnostics.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Binpicking,
    Locator,
    Calibration,
    Solution,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::Binpicking => "binpicking",
            Family::Locator => "locator",
            Family::Calibration => "calibration",
            Family::Solution => "solution",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload layouts a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// No payload.
    None,
    /// One i32 (vision system id, solution id, scene state).
    Int,
    /// Two i32 values.
    IntPair,
    /// Seven f32 values: translation then quaternion.
    Pose,
    /// One i32 followed by a pose.
    IntPose,
    /// One i32 followed by start and end joint configurations (6 f32 each).
    IntJointRange,
}

impl PayloadShape {
    /// Payload size in 4-byte units.
    pub fn unit_count(self) -> usize {
        match self {
            PayloadShape::None => 0,
            PayloadShape::Int => 1,
            PayloadShape::IntPair => 2,
            PayloadShape::Pose => 7,
            PayloadShape::IntPose => 8,
            PayloadShape::IntJointRange => 13,
        }
    }

    /// Short description used in argument errors and the catalog listing.
    pub fn describe(self) -> &'static str {
        match self {
            PayloadShape::None => "none",
            PayloadShape::Int => "int",
            PayloadShape::IntPair => "int,int",
            PayloadShape::Pose => "pose7",
            PayloadShape::IntPose => "int+pose7",
            PayloadShape::IntJointRange => "int+joints6+joints6",
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

const INT: &[PayloadShape] = &[PayloadShape::Int];
const INT_PAIR: &[PayloadShape] = &[PayloadShape::IntPair];
const NONE: &[PayloadShape] = &[PayloadShape::None];
const SCAN: &[PayloadShape] = &[PayloadShape::Int, PayloadShape::IntPose];
const OPTIONAL_POSE: &[PayloadShape] = &[PayloadShape::None, PayloadShape::Pose];
const INIT: &[PayloadShape] = &[PayloadShape::IntJointRange];

/// A catalog operation, identified on the wire by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum ActionRequest {
    BinpickingInitialization = 4,
    BinpickingScan = 1,
    BinpickingTriggerScan = 28,
    BinpickingLocalizeOnTheLastScan = 29,
    BinpickingTrajectory = 2,
    BinpickingPickFailed = 7,
    BinpickingObjectPose = 8,
    BinpickingChangeSceneState = 15,
    BinpickingGetVisionSystemStatus = 21,
    LocatorScan = 19,
    LocatorTriggerScan = 30,
    LocatorLocalizeOnTheLastScan = 31,
    LocatorGetObjects = 20,
    LocatorGetVisionSystemStatus = 22,
    CalibrationAddPoint = 5,
    CalibrationStartAutomatic = 25,
    CalibrationSaveAutomatic = 27,
    CalibrationStopAutomatic = 26,
    SolutionChange = 9,
    SolutionStart = 10,
    SolutionStop = 11,
    SolutionGetRunning = 12,
    SolutionGetAvailable = 13,
}

impl ActionRequest {
    /// Every catalog entry, grouped by family.
    pub const ALL: [ActionRequest; 23] = [
        ActionRequest::BinpickingInitialization,
        ActionRequest::BinpickingScan,
        ActionRequest::BinpickingTriggerScan,
        ActionRequest::BinpickingLocalizeOnTheLastScan,
        ActionRequest::BinpickingTrajectory,
        ActionRequest::BinpickingPickFailed,
        ActionRequest::BinpickingObjectPose,
        ActionRequest::BinpickingChangeSceneState,
        ActionRequest::BinpickingGetVisionSystemStatus,
        ActionRequest::LocatorScan,
        ActionRequest::LocatorTriggerScan,
        ActionRequest::LocatorLocalizeOnTheLastScan,
        ActionRequest::LocatorGetObjects,
        ActionRequest::LocatorGetVisionSystemStatus,
        ActionRequest::CalibrationAddPoint,
        ActionRequest::CalibrationStartAutomatic,
        ActionRequest::CalibrationSaveAutomatic,
        ActionRequest::CalibrationStopAutomatic,
        ActionRequest::SolutionChange,
        ActionRequest::SolutionStart,
        ActionRequest::SolutionStop,
        ActionRequest::SolutionGetRunning,
        ActionRequest::SolutionGetAvailable,
    ];

    /// Wire id.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Look up an action by its wire id.
    pub fn from_wire(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn family(self) -> Family {
        use ActionRequest::*;
        match self {
            BinpickingInitialization
            | BinpickingScan
            | BinpickingTriggerScan
            | BinpickingLocalizeOnTheLastScan
            | BinpickingTrajectory
            | BinpickingPickFailed
            | BinpickingObjectPose
            | BinpickingChangeSceneState
            | BinpickingGetVisionSystemStatus => Family::Binpicking,
            LocatorScan
            | LocatorTriggerScan
            | LocatorLocalizeOnTheLastScan
            | LocatorGetObjects
            | LocatorGetVisionSystemStatus => Family::Locator,
            CalibrationAddPoint
            | CalibrationStartAutomatic
            | CalibrationSaveAutomatic
            | CalibrationStopAutomatic => Family::Calibration,
            SolutionChange | SolutionStart | SolutionStop | SolutionGetRunning
            | SolutionGetAvailable => Family::Solution,
        }
    }

    /// Diagnostic label. Not part of the protocol.
    pub fn label(self) -> &'static str {
        use ActionRequest::*;
        match self {
            BinpickingInitialization => "INITIALIZATION [BINPICKING]",
            BinpickingScan => "SCAN [BINPICKING]",
            BinpickingTriggerScan => "TRIGGER SCAN [BINPICKING]",
            BinpickingLocalizeOnTheLastScan => "LOCALIZE ON THE LAST SCAN [BINPICKING]",
            BinpickingTrajectory => "TRAJECTORY [BINPICKING]",
            BinpickingPickFailed => "PICK-FAILED [BINPICKING]",
            BinpickingObjectPose => "OBJECT POSE [BINPICKING]",
            BinpickingChangeSceneState => "CHANGE SCENE STATE [BINPICKING]",
            BinpickingGetVisionSystemStatus => "GET VISION SYSTEM STATUS [BINPICKING]",
            LocatorScan => "SCAN [LOCATOR]",
            LocatorTriggerScan => "TRIGGER SCAN [LOCATOR]",
            LocatorLocalizeOnTheLastScan => "LOCALIZE ON THE LAST SCAN [LOCATOR]",
            LocatorGetObjects => "GET OBJECTS [LOCATOR]",
            LocatorGetVisionSystemStatus => "GET VISION SYSTEM STATUS [LOCATOR]",
            CalibrationAddPoint => "ADD CALIBRATION POINT",
            CalibrationStartAutomatic => "START AUTOMATIC CALIBRATION",
            CalibrationSaveAutomatic => "SAVE AUTOMATIC CALIBRATION RESULT",
            CalibrationStopAutomatic => "STOP AUTOMATIC CALIBRATION",
            SolutionChange => "CHANGE SOLUTION",
            SolutionStart => "START SOLUTION",
            SolutionStop => "STOP SOLUTION",
            SolutionGetRunning => "GET RUNNING SOLUTION",
            SolutionGetAvailable => "GET AVAILABLE SOLUTION",
        }
    }

    /// Kebab-case name accepted on the command line.
    pub fn cli_name(self) -> &'static str {
        use ActionRequest::*;
        match self {
            BinpickingInitialization => "binpicking-init",
            BinpickingScan => "binpicking-scan",
            BinpickingTriggerScan => "binpicking-trigger-scan",
            BinpickingLocalizeOnTheLastScan => "binpicking-localize-last-scan",
            BinpickingTrajectory => "binpicking-trajectory",
            BinpickingPickFailed => "binpicking-pick-failed",
            BinpickingObjectPose => "binpicking-object-pose",
            BinpickingChangeSceneState => "binpicking-change-scene-state",
            BinpickingGetVisionSystemStatus => "binpicking-vision-status",
            LocatorScan => "locator-scan",
            LocatorTriggerScan => "locator-trigger-scan",
            LocatorLocalizeOnTheLastScan => "locator-localize-last-scan",
            LocatorGetObjects => "locator-get-objects",
            LocatorGetVisionSystemStatus => "locator-vision-status",
            CalibrationAddPoint => "calibration-add-point",
            CalibrationStartAutomatic => "calibration-start",
            CalibrationSaveAutomatic => "calibration-save",
            CalibrationStopAutomatic => "calibration-stop",
            SolutionChange => "solution-change",
            SolutionStart => "solution-start",
            SolutionStop => "solution-stop",
            SolutionGetRunning => "solution-get-running",
            SolutionGetAvailable => "solution-get-available",
        }
    }

    /// Payload shapes this action accepts, in order of preference.
    pub fn payload_shapes(self) -> &'static [PayloadShape] {
        use ActionRequest::*;
        match self {
            BinpickingInitialization => INIT,
            BinpickingScan
            | BinpickingTriggerScan
            | BinpickingLocalizeOnTheLastScan
            | LocatorScan
            | LocatorTriggerScan
            | LocatorLocalizeOnTheLastScan => SCAN,
            BinpickingTrajectory
            | BinpickingPickFailed
            | BinpickingObjectPose
            | BinpickingChangeSceneState
            | BinpickingGetVisionSystemStatus
            | LocatorGetVisionSystemStatus
            | SolutionChange
            | SolutionStart => INT,
            LocatorGetObjects | CalibrationStartAutomatic => INT_PAIR,
            CalibrationAddPoint => OPTIONAL_POSE,
            CalibrationSaveAutomatic
            | CalibrationStopAutomatic
            | SolutionStop
            | SolutionGetRunning
            | SolutionGetAvailable => NONE,
        }
    }

    /// The action a response to this request is echoed as, after aliasing.
    ///
    /// Trigger-scan and localize-on-last-scan results arrive as the base scan
    /// of their family.
    pub fn response_action(self) -> Self {
        match self {
            ActionRequest::BinpickingTriggerScan | ActionRequest::BinpickingLocalizeOnTheLastScan => {
                ActionRequest::BinpickingScan
            }
            ActionRequest::LocatorTriggerScan | ActionRequest::LocatorLocalizeOnTheLastScan => {
                ActionRequest::LocatorScan
            }
            other => other,
        }
    }

    /// Map an echoed wire id onto the id it should be matched as.
    pub fn alias_wire_id(id: u32) -> u32 {
        Self::from_wire(id)
            .map(|action| action.response_action().id())
            .unwrap_or(id)
    }

    /// Scans are sent first and their result collected later with a separate
    /// wait.
    pub fn is_two_phase(self) -> bool {
        matches!(self.response_action(), ActionRequest::BinpickingScan | ActionRequest::LocatorScan)
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActionRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u32>() {
            return Self::from_wire(id).ok_or_else(|| format!("unknown action id {id}"));
        }
        Self::ALL
            .into_iter()
            .find(|action| action.cli_name() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}
