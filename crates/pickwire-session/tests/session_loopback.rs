use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::BytesMut;
use pickwire_frame::{
    encode_error_code, encode_gripper_command, encode_info, encode_pose, encode_response_header,
    encode_sub_header, encode_waypoint, CodecConfig, FrameError, FrameReader, FrameWriter,
    IntDecoding, MessageKind, RequestFrame, ResponseHeader, SubHeader, Waypoint,
};
use pickwire_session::{
    connect_with_config, ActionRequest, ResponseBody, SegmentPrecision, SessionConfig,
    SessionError, SessionState, DEFAULT_BRAND,
};
use pickwire_transport::{LinkStream, TcpSocket};

/// Response bytes a fake controller writes back.
#[derive(Default)]
struct Reply {
    body: BytesMut,
    count: u32,
}

impl Reply {
    fn sub(mut self, kind: MessageKind, units: u32, payload: &[u8]) -> Self {
        encode_sub_header(
            &SubHeader {
                kind,
                sequence: self.count,
                unit_count: units,
            },
            &mut self.body,
        );
        self.body.extend_from_slice(payload);
        self.count += 1;
        self
    }

    fn info(self, values: &[i32]) -> Self {
        let mut payload = BytesMut::new();
        encode_info(values, &mut payload);
        self.sub(MessageKind::Info, values.len() as u32, &payload)
    }

    fn pose(self, x: f32) -> Self {
        let mut payload = BytesMut::new();
        encode_pose(&[x, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0], &mut payload);
        self.sub(MessageKind::ObjectPose, 7, &payload)
    }

    fn waypoints(self, kind: MessageKind, waypoints: &[Waypoint]) -> Self {
        let mut payload = BytesMut::new();
        for waypoint in waypoints {
            encode_waypoint(waypoint, &mut payload);
        }
        self.sub(kind, waypoints.len() as u32, &payload)
    }

    fn encode(&self, action_id: u32) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_response_header(
            &ResponseHeader {
                action_id,
                sub_message_count: self.count,
            },
            &mut wire,
        );
        wire.extend_from_slice(&self.body);
        wire.to_vec()
    }
}

struct Controller {
    reader: FrameReader<LinkStream>,
    writer: FrameWriter<LinkStream>,
}

impl Controller {
    fn next_request(&mut self) -> RequestFrame {
        self.reader.read_request().unwrap()
    }

    fn reply(&mut self, bytes: &[u8]) {
        self.writer.send_raw(bytes).unwrap();
    }
}

/// Bind a loopback controller, verify the brand, then run `script`.
fn spawn_controller<F, T>(script: F) -> (String, JoinHandle<T>)
where
    F: FnOnce(&mut Controller) -> T + Send + 'static,
    T: Send + 'static,
{
    let listener = TcpSocket::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().to_string();

    let handle = thread::spawn(move || {
        let mut stream = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut brand = vec![0u8; DEFAULT_BRAND.len()];
        stream.read_exact(&mut brand).unwrap();
        assert_eq!(brand, DEFAULT_BRAND.as_bytes());

        let mut controller = Controller {
            reader: FrameReader::new(stream.try_clone().unwrap()),
            writer: FrameWriter::new(stream),
        };
        script(&mut controller)
    });

    (addr, handle)
}

fn config() -> SessionConfig {
    SessionConfig {
        codec: CodecConfig {
            read_timeout: Some(Duration::from_secs(5)),
            write_timeout: Some(Duration::from_secs(5)),
            ..CodecConfig::default()
        },
        ..SessionConfig::default()
    }
}

fn i32_at(payload: &[u8], index: usize) -> i32 {
    let start = index * 4;
    i32::from_le_bytes(payload[start..start + 4].try_into().unwrap())
}

#[test]
fn locator_get_objects_collects_poses_and_dimensions_in_order() {
    let (addr, controller) = spawn_controller(|ctl| {
        let request = ctl.next_request();
        let mut reply = Reply::default();
        for i in 0..5 {
            reply = reply.pose(i as f32 * 10.0).info(&[i, 100 + i]);
        }
        ctl.reply(&reply.encode(20));
        request
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let response = session.locator_get_objects(1, 5).unwrap();

    let request = controller.join().unwrap();
    assert_eq!(request.action_id, 20);
    assert_eq!(i32_at(&request.payload, 0), 1);
    assert_eq!(i32_at(&request.payload, 1), 5);

    assert_eq!(response.action, ActionRequest::LocatorGetObjects);
    assert_eq!(response.object_poses.len(), 5);
    assert_eq!(response.object_poses[4][0], 40.0);
    match response.body {
        ResponseBody::Objects { dimensions, .. } => {
            assert_eq!(
                dimensions,
                vec![
                    vec![0, 100],
                    vec![1, 101],
                    vec![2, 102],
                    vec![3, 103],
                    vec![4, 104]
                ]
            );
        }
        other => panic!("unexpected body {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Idle);
    session.close().unwrap();
}

#[test]
fn trigger_scan_then_wait() {
    let (addr, controller) = spawn_controller(|ctl| {
        let request = ctl.next_request();
        ctl.reply(&Reply::default().encode(request.action_id));
        request
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let pose = [100.0, 200.0, 300.0, 1.0, 0.0, 0.0, 0.0];
    session.binpicking_trigger_scan(1, Some(&pose)).unwrap();

    let err = session.binpicking_pick_failed(1).unwrap_err();
    assert!(matches!(err, SessionError::ConcurrentRequest { .. }));

    let response = session.binpicking_wait_for_scan().unwrap();
    assert_eq!(response.action, ActionRequest::BinpickingScan);

    let request = controller.join().unwrap();
    assert_eq!(request.action_id, 28);
    assert_eq!(request.payload.len(), 32);
}

#[test]
fn trajectory_segments_gripper_and_error() {
    let (addr, controller) = spawn_controller(|ctl| {
        ctl.next_request();
        let coarse: Vec<Waypoint> = (0..3)
            .map(|i| Waypoint::new(i, [0.1 * i as f32; 6]))
            .collect();
        let fine: Vec<Waypoint> = (3..5)
            .map(|i| Waypoint::new(i, [-0.2 * i as f32; 6]))
            .collect();
        let mut gripper = BytesMut::new();
        encode_gripper_command(1, &mut gripper);
        let mut error = BytesMut::new();
        encode_error_code(0, &mut error);

        let reply = Reply::default()
            .waypoints(MessageKind::TrajectoryCoarse, &coarse)
            .sub(MessageKind::Gripper, 1, &gripper)
            .waypoints(MessageKind::TrajectoryFine, &fine)
            .info(&[1, 2, 3])
            .sub(MessageKind::Error, 1, &error);
        ctl.reply(&reply.encode(2));
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let response = session.binpicking_trajectory(1).unwrap();
    controller.join().unwrap();

    let trajectory = response.trajectory().unwrap();
    assert_eq!(trajectory.segment_count(), 2);
    assert_eq!(trajectory.segments[0].waypoints.len(), 3);
    assert_eq!(trajectory.segments[1].waypoints.len(), 2);
    assert_eq!(trajectory.segments[1].precision, SegmentPrecision::Fine);
    assert_eq!(response.gripper_commands, vec![1]);
    assert_eq!(response.error_code, Some(0));
}

#[test]
fn checksum_mismatch_keeps_session_usable() {
    let (addr, controller) = spawn_controller(|ctl| {
        ctl.next_request();
        let mut bad = Waypoint::new(9, [1.0; 6]);
        bad.checksum = 9.0;
        let reply = Reply::default()
            .waypoints(MessageKind::TrajectoryCoarse, &[bad])
            .info(&[7]);
        ctl.reply(&reply.encode(2));

        ctl.next_request();
        ctl.reply(&Reply::default().info(&[253]).encode(12));
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let err = session.binpicking_trajectory(1).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Frame(FrameError::ChecksumMismatch { waypoint_id: 9, .. })
    ));
    assert!(!err.is_fatal());
    assert_eq!(session.state(), SessionState::Idle);

    let running = session.solution_get_running().unwrap();
    assert_eq!(
        running.body,
        ResponseBody::RunningSolution {
            solution: Some(vec![253])
        }
    );
    controller.join().unwrap();
}

#[test]
fn truncated_response_is_fatal() {
    let (addr, controller) = spawn_controller(|ctl| {
        ctl.next_request();
        let wire = Reply::default().pose(1.0).encode(8);
        ctl.reply(&wire[..wire.len() - 10]);
        ctl.writer.get_mut().shutdown().unwrap();
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let err = session.binpicking_object_pose(1).unwrap_err();
    controller.join().unwrap();

    assert!(matches!(err, SessionError::Frame(FrameError::Truncated { .. })));
    assert!(err.is_fatal());
    assert_eq!(session.state(), SessionState::Desynchronized);
    assert!(matches!(
        session.solution_get_available().unwrap_err(),
        SessionError::Desynchronized
    ));
}

#[test]
fn legacy_peer_high_bytes_are_ignored_in_low24_mode() {
    let (addr, controller) = spawn_controller(|ctl| {
        ctl.next_request();
        let mut wire = Reply::default().info(&[0x7F00_0005]).encode(22);
        // Garbage in the unused high byte of the action id.
        wire[3] = 0x5A;
        ctl.reply(&wire);
    });

    let mut cfg = config();
    cfg.codec.int_decoding = IntDecoding::Low24;
    let mut session = connect_with_config(&addr, &cfg).unwrap();
    let response = session.locator_vision_system_status(1).unwrap();
    controller.join().unwrap();

    assert_eq!(
        response.body,
        ResponseBody::VisionSystemStatus {
            status: Some(vec![5])
        }
    );
}

#[test]
fn change_scene_state_uses_its_own_action_id() {
    let (addr, controller) = spawn_controller(|ctl| {
        let request = ctl.next_request();
        ctl.reply(&Reply::default().encode(request.action_id));
        request
    });

    let mut session = connect_with_config(&addr, &config()).unwrap();
    let response = session.binpicking_change_scene_state(3).unwrap();
    let request = controller.join().unwrap();

    assert_eq!(request.action_id, 15);
    assert_eq!(i32_at(&request.payload, 0), 3);
    assert_eq!(response.body, ResponseBody::Ack);
}

#[test]
fn close_is_visible_to_controller() {
    let (addr, controller) = spawn_controller(|ctl| {
        let mut byte = [0u8; 1];
        ctl.reader.get_mut().read(&mut byte).unwrap()
    });

    let session = connect_with_config(&addr, &config()).unwrap();
    session.close().unwrap();
    assert_eq!(controller.join().unwrap(), 0);
}
