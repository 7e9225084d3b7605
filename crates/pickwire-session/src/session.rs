use std::io::{Read, Write};
use std::net::SocketAddr;
use std::time::Duration;

use pickwire_frame::{CodecConfig, FrameError, FrameReader, FrameWriter, Pose, JOINT_COUNT};
use pickwire_transport::LinkStream;
use tracing::{debug, info, warn};

use crate::action::ActionRequest;
use crate::error::{Result, SessionError};
use crate::handshake::DEFAULT_BRAND;
use crate::request::Request;
use crate::response::{read_response, Response};

/// Configuration for opening a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Brand identification written right after connect.
    pub brand: String,
    /// Connect timeout. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,
    /// Codec limits and stream timeouts.
    pub codec: CodecConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brand: DEFAULT_BRAND.to_string(),
            connect_timeout: Some(Duration::from_secs(5)),
            codec: CodecConfig::default(),
        }
    }
}

/// Where a session stands in the request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse(ActionRequest),
    /// A fatal error left the stream at an unknown position.
    Desynchronized,
}

/// A single-flight request/response session.
///
/// At most one request is outstanding. A second `send` before the response
/// has been received fails with [`SessionError::ConcurrentRequest`].
pub struct Session<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    active: Option<ActionRequest>,
    desynchronized: bool,
}

impl<R: Read, W: Write> Session<R, W> {
    /// Build a session from an already identified stream pair.
    pub fn from_parts(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self {
            reader,
            writer,
            active: None,
            desynchronized: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.desynchronized {
            return SessionState::Desynchronized;
        }
        match self.active {
            Some(action) => SessionState::AwaitingResponse(action),
            None => SessionState::Idle,
        }
    }

    /// The action awaiting its response, if any.
    pub fn in_flight(&self) -> Option<ActionRequest> {
        self.active
    }

    pub fn is_desynchronized(&self) -> bool {
        self.desynchronized
    }

    /// Send a request without waiting for its response.
    pub fn send(&mut self, request: &Request) -> Result<()> {
        if self.desynchronized {
            return Err(SessionError::Desynchronized);
        }
        if let Some(in_flight) = self.active {
            return Err(SessionError::ConcurrentRequest {
                in_flight,
                requested: request.action(),
            });
        }

        let action = request.action();
        debug!(
            action = %action,
            id = action.id(),
            units = request.shape().unit_count(),
            "sending request"
        );

        self.active = Some(action);
        match self.writer.send_request(action.id(), request.payload()) {
            Ok(()) => Ok(()),
            // Rejected before any byte was written.
            Err(
                err @ (FrameError::UnalignedPayload { .. } | FrameError::PayloadTooLarge { .. }),
            ) => {
                self.active = None;
                Err(SessionError::InvalidArgument {
                    action,
                    reason: err.to_string(),
                })
            }
            Err(err) => {
                self.active = None;
                self.desynchronized = true;
                Err(err.into())
            }
        }
    }

    /// Receive the response to the in-flight request.
    ///
    /// The echoed action is aliased before it is compared with `expected`,
    /// so a trigger-scan result matches the base scan of its family. The
    /// single-flight slot is released as soon as a header has been read.
    pub fn receive(&mut self, expected: ActionRequest) -> Result<Response> {
        if self.desynchronized {
            return Err(SessionError::Desynchronized);
        }
        if self.active.is_none() {
            return Err(SessionError::NoRequestInFlight);
        }

        let header = self.reader.read_response_header();
        self.active = None;
        let header = header.inspect_err(|_| self.desynchronized = true)?;

        debug!(
            action_id = header.action_id,
            sub_messages = header.sub_message_count,
            "response header"
        );

        if ActionRequest::alias_wire_id(header.action_id) != expected.id() {
            self.desynchronized = true;
            return Err(SessionError::UnexpectedResponse {
                expected,
                received: header.action_id,
            });
        }

        read_response(&mut self.reader, expected, &header).inspect_err(|err| {
            if err.is_fatal() {
                self.desynchronized = true;
            }
        })
    }

    /// Send a request and wait for its response.
    pub fn request(&mut self, request: &Request) -> Result<Response> {
        self.send(request)?;
        self.receive(request.action().response_action())
    }

    /// First half of a two-phase request: send only.
    pub fn trigger(&mut self, request: &Request) -> Result<()> {
        self.send(request)
    }

    /// Second half of a two-phase request: wait for the in-flight result.
    pub fn wait_for_result(&mut self) -> Result<Response> {
        if self.desynchronized {
            return Err(SessionError::Desynchronized);
        }
        let action = self.active.ok_or(SessionError::NoRequestInFlight)?;
        self.receive(action.response_action())
    }

    // Bin picking

    pub fn binpicking_init(
        &mut self,
        vs_id: i32,
        start: &[f32; JOINT_COUNT],
        end: &[f32; JOINT_COUNT],
    ) -> Result<Response> {
        self.request(&Request::initialization(vs_id, start, end)?)
    }

    /// Start a scan. Collect it with [`Session::binpicking_wait_for_scan`].
    pub fn binpicking_scan(&mut self, vs_id: i32, tool_pose: Option<&Pose>) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::BinpickingScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn binpicking_trigger_scan(&mut self, vs_id: i32, tool_pose: Option<&Pose>) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::BinpickingTriggerScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn binpicking_localize_on_last_scan(
        &mut self,
        vs_id: i32,
        tool_pose: Option<&Pose>,
    ) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::BinpickingLocalizeOnTheLastScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn binpicking_wait_for_scan(&mut self) -> Result<Response> {
        self.receive(ActionRequest::BinpickingScan)
    }

    pub fn binpicking_trajectory(&mut self, vs_id: i32) -> Result<Response> {
        self.request(&Request::int(ActionRequest::BinpickingTrajectory, vs_id)?)
    }

    pub fn binpicking_pick_failed(&mut self, vs_id: i32) -> Result<Response> {
        self.request(&Request::int(ActionRequest::BinpickingPickFailed, vs_id)?)
    }

    pub fn binpicking_object_pose(&mut self, vs_id: i32) -> Result<Response> {
        self.request(&Request::int(ActionRequest::BinpickingObjectPose, vs_id)?)
    }

    pub fn binpicking_change_scene_state(&mut self, scene_state: i32) -> Result<Response> {
        self.request(&Request::int(
            ActionRequest::BinpickingChangeSceneState,
            scene_state,
        )?)
    }

    pub fn binpicking_vision_system_status(&mut self, vs_id: i32) -> Result<Response> {
        self.request(&Request::int(
            ActionRequest::BinpickingGetVisionSystemStatus,
            vs_id,
        )?)
    }

    // Locator

    /// Start a scan. Collect it with [`Session::locator_wait_for_scan`].
    pub fn locator_scan(&mut self, vs_id: i32, tool_pose: Option<&Pose>) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::LocatorScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn locator_trigger_scan(&mut self, vs_id: i32, tool_pose: Option<&Pose>) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::LocatorTriggerScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn locator_localize_on_last_scan(
        &mut self,
        vs_id: i32,
        tool_pose: Option<&Pose>,
    ) -> Result<()> {
        self.trigger(&Request::int_with_pose(
            ActionRequest::LocatorLocalizeOnTheLastScan,
            vs_id,
            tool_pose,
        )?)
    }

    pub fn locator_wait_for_scan(&mut self) -> Result<Response> {
        self.receive(ActionRequest::LocatorScan)
    }

    pub fn locator_get_objects(&mut self, vs_id: i32, count: i32) -> Result<Response> {
        self.request(&Request::int_pair(
            ActionRequest::LocatorGetObjects,
            vs_id,
            count,
        )?)
    }

    pub fn locator_vision_system_status(&mut self, vs_id: i32) -> Result<Response> {
        self.request(&Request::int(
            ActionRequest::LocatorGetVisionSystemStatus,
            vs_id,
        )?)
    }

    // Calibration

    pub fn calibration_add_point(&mut self, tool_pose: Option<&Pose>) -> Result<Response> {
        self.request(&Request::optional_pose(
            ActionRequest::CalibrationAddPoint,
            tool_pose,
        )?)
    }

    pub fn calibration_start(&mut self, solution_id: i32, vs_id: i32) -> Result<Response> {
        self.request(&Request::int_pair(
            ActionRequest::CalibrationStartAutomatic,
            solution_id,
            vs_id,
        )?)
    }

    pub fn calibration_save(&mut self) -> Result<Response> {
        self.request(&Request::empty(ActionRequest::CalibrationSaveAutomatic)?)
    }

    pub fn calibration_stop(&mut self) -> Result<Response> {
        self.request(&Request::empty(ActionRequest::CalibrationStopAutomatic)?)
    }

    // Solutions

    pub fn solution_change(&mut self, solution_id: i32) -> Result<Response> {
        self.request(&Request::int(ActionRequest::SolutionChange, solution_id)?)
    }

    pub fn solution_start(&mut self, solution_id: i32) -> Result<Response> {
        self.request(&Request::int(ActionRequest::SolutionStart, solution_id)?)
    }

    pub fn solution_stop(&mut self) -> Result<Response> {
        self.request(&Request::empty(ActionRequest::SolutionStop)?)
    }

    pub fn solution_get_running(&mut self) -> Result<Response> {
        self.request(&Request::empty(ActionRequest::SolutionGetRunning)?)
    }

    pub fn solution_get_available(&mut self) -> Result<Response> {
        self.request(&Request::empty(ActionRequest::SolutionGetAvailable)?)
    }

    /// Consume the session and return its frame reader and writer.
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}

impl Session<LinkStream, LinkStream> {
    /// Address of the controller.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.writer.get_ref().peer_addr()?)
    }

    /// Flush and shut the link down.
    ///
    /// Dropping a session also releases the socket; `close` additionally
    /// reports flush and shutdown failures.
    pub fn close(mut self) -> Result<()> {
        if let Some(action) = self.active {
            warn!(action = %action, "closing session with a request in flight");
        }
        let flushed = self.writer.flush();
        self.writer.get_mut().shutdown()?;
        flushed?;
        info!("session closed");
        Ok(())
    }
}

impl<R, W> std::fmt::Debug for Session<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.active)
            .field("desynchronized", &self.desynchronized)
            .finish()
    }
}
