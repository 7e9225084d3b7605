use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::MessageKind;

/// Brand tag opening every request: `80, 72, 79` ("P", "H", "O") as LE u32 words.
pub const MAGIC: [u8; 12] = [80, 0, 0, 0, 72, 0, 0, 0, 79, 0, 0, 0];

/// Request header: magic (12) + unit count (4) + action id (4) = 20 bytes.
pub const REQUEST_HEADER_SIZE: usize = MAGIC.len() + 8;

/// Response header: action id (4) + sub-message count (4) + reserved (4).
pub const HEADER_SIZE: usize = 12;

/// Sub-header: message kind (4) + sequence number (4) + unit count (4).
pub const SUB_HEADER_SIZE: usize = 12;

/// Size of one generic payload unit.
pub const UNIT_SIZE: usize = 4;

/// Default maximum payload size: 4 MiB (about 130k waypoints).
pub const DEFAULT_MAX_PAYLOAD: usize = 4 * 1024 * 1024;

const LOW_24_MASK: u32 = 0x00FF_FFFF;

/// How 32-bit header, sub-header and info integers are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntDecoding {
    /// All four little-endian bytes.
    #[default]
    Full,
    /// Only the low three bytes, matching peers that ignore the high byte.
    /// Values of 2^24 and above are folded.
    Low24,
}

impl IntDecoding {
    /// Apply this mode to a raw little-endian word.
    pub fn apply(self, raw: u32) -> u32 {
        match self {
            IntDecoding::Full => raw,
            IntDecoding::Low24 => raw & LOW_24_MASK,
        }
    }
}

/// An outbound request: an action id and its payload of 4-byte units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Catalog id of the requested action.
    pub action_id: u32,
    /// Payload bytes; always a whole number of units.
    pub payload: Bytes,
}

impl RequestFrame {
    /// Create a new request frame.
    pub fn new(action_id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            action_id,
            payload: payload.into(),
        }
    }

    /// Number of 4-byte units in the payload.
    pub fn unit_count(&self) -> usize {
        self.payload.len() / UNIT_SIZE
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        REQUEST_HEADER_SIZE + self.payload.len()
    }
}

/// Decoded response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Action id echoed by the controller (not yet aliased).
    pub action_id: u32,
    /// Number of sub-messages that follow.
    pub sub_message_count: u32,
}

/// Decoded sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    pub kind: MessageKind,
    pub sequence: u32,
    /// Number of units; waypoints for trajectory kinds, 4-byte words otherwise.
    pub unit_count: u32,
}

impl SubHeader {
    /// Payload size in bytes declared by this sub-header.
    pub fn payload_len(&self) -> Result<usize> {
        (self.unit_count as usize)
            .checked_mul(self.kind.unit_size())
            .ok_or(FrameError::PayloadTooLarge {
                size: usize::MAX,
                max: usize::MAX,
            })
    }
}

/// Encode a request into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────┬───────────┬──────────────────┐
/// │ Magic (12B)  │ Units       │ Action    │ Payload           │
/// │ 80, 72, 79   │ (4B LE)     │ (4B LE)   │ (Units * 4 bytes) │
/// └──────────────┴─────────────┴───────────┴──────────────────┘
/// ```
pub fn encode_request(action_id: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() % UNIT_SIZE != 0 {
        return Err(FrameError::UnalignedPayload { len: payload.len() });
    }
    let units = payload.len() / UNIT_SIZE;
    if units > i32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: i32::MAX as usize * UNIT_SIZE,
        });
    }
    dst.reserve(REQUEST_HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(units as u32);
    dst.put_u32_le(action_id);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a request from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_request(src: &mut BytesMut, max_payload: usize) -> Result<Option<RequestFrame>> {
    if src.len() < REQUEST_HEADER_SIZE {
        return Ok(None);
    }

    if src[..MAGIC.len()] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let mut fields = &src[MAGIC.len()..REQUEST_HEADER_SIZE];
    let units = fields.get_u32_le() as usize;
    let action_id = fields.get_u32_le();

    let payload_len = units.saturating_mul(UNIT_SIZE);
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = REQUEST_HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(REQUEST_HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(RequestFrame { action_id, payload }))
}

/// Decode a 12-byte response header.
pub fn decode_response_header(src: &[u8], mode: IntDecoding) -> Result<ResponseHeader> {
    let mut fields = exact(src, HEADER_SIZE)?;
    let action_id = mode.apply(fields.get_u32_le());
    let sub_message_count = mode.apply(fields.get_u32_le());
    Ok(ResponseHeader {
        action_id,
        sub_message_count,
    })
}

/// Encode a response header; the reserved word is written as zero.
pub fn encode_response_header(header: &ResponseHeader, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_u32_le(header.action_id);
    dst.put_u32_le(header.sub_message_count);
    dst.put_u32_le(0);
}

/// Decode a 12-byte sub-header.
pub fn decode_sub_header(src: &[u8], mode: IntDecoding) -> Result<SubHeader> {
    let mut fields = exact(src, SUB_HEADER_SIZE)?;
    let kind = MessageKind::try_from(mode.apply(fields.get_u32_le()))?;
    let sequence = mode.apply(fields.get_u32_le());
    let unit_count = mode.apply(fields.get_u32_le());
    Ok(SubHeader {
        kind,
        sequence,
        unit_count,
    })
}

/// Encode a sub-header.
pub fn encode_sub_header(header: &SubHeader, dst: &mut BytesMut) {
    dst.reserve(SUB_HEADER_SIZE);
    dst.put_u32_le(header.kind.id());
    dst.put_u32_le(header.sequence);
    dst.put_u32_le(header.unit_count);
}

fn exact(src: &[u8], len: usize) -> Result<&[u8]> {
    if src.len() != len {
        return Err(FrameError::Truncated {
            expected: len,
            received: src.len(),
        });
    }
    Ok(src)
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Maximum payload size in bytes accepted from a sub-header. Default: 4 MiB.
    pub max_payload_size: usize,
    /// Integer decoding mode for headers, sub-headers and info blocks.
    pub int_decoding: IntDecoding,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            int_decoding: IntDecoding::Full,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1i32.to_le_bytes());
        for v in [100.0f32, 200.0, 300.0, 1.0, 0.0, 0.0, 0.0] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payloads: Vec<Vec<u8>> = vec![
            Vec::new(),
            7i32.to_le_bytes().to_vec(),
            [1i32.to_le_bytes(), 5i32.to_le_bytes()].concat(),
            pose_payload(),
        ];

        for (action_id, payload) in [4u32, 20, 19, 1].into_iter().zip(payloads) {
            let mut buf = BytesMut::new();
            encode_request(action_id, &payload, &mut buf).unwrap();
            assert_eq!(buf.len(), REQUEST_HEADER_SIZE + payload.len());

            let frame = decode_request(&mut buf, DEFAULT_MAX_PAYLOAD)
                .unwrap()
                .unwrap();
            assert_eq!(frame, RequestFrame::new(action_id, payload.clone()));
            assert_eq!(frame.unit_count(), payload.len() / 4);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_request_layout() {
        let mut buf = BytesMut::new();
        encode_request(19, &1i32.to_le_bytes(), &mut buf).unwrap();

        assert_eq!(&buf[..12], &MAGIC);
        assert_eq!(&buf[12..16], &1u32.to_le_bytes());
        assert_eq!(&buf[16..20], &19u32.to_le_bytes());
        assert_eq!(&buf[20..], &1i32.to_le_bytes());
    }

    #[test]
    fn test_empty_payload_has_zero_units() {
        let mut buf = BytesMut::new();
        encode_request(11, &[], &mut buf).unwrap();

        assert_eq!(buf.len(), REQUEST_HEADER_SIZE);
        assert_eq!(&buf[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_unaligned_payload_rejected() {
        let mut buf = BytesMut::new();
        let err = encode_request(1, &[1, 2, 3], &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::UnalignedPayload { len: 3 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&MAGIC[..]);
        assert!(decode_request(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_request(20, &pose_payload(), &mut buf).unwrap();
        buf.truncate(REQUEST_HEADER_SIZE + 6);

        assert!(decode_request(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFFu8; REQUEST_HEADER_SIZE][..]);
        let result = decode_request(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024 * 1024);
        buf.put_u32_le(1);

        let result = decode_request(&mut buf, 1024);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_multiple_requests() {
        let mut buf = BytesMut::new();
        encode_request(10, &254i32.to_le_bytes(), &mut buf).unwrap();
        encode_request(12, &[], &mut buf).unwrap();

        let first = decode_request(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(first.action_id, 10);
        assert_eq!(first.payload.as_ref(), &254i32.to_le_bytes());

        let second = decode_request(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(second.action_id, 12);
        assert!(second.payload.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_response_header_roundtrip() {
        let header = ResponseHeader {
            action_id: 20,
            sub_message_count: 10,
        };
        let mut buf = BytesMut::new();
        encode_response_header(&header, &mut buf);

        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(decode_response_header(&buf, IntDecoding::Full).unwrap(), header);
    }

    #[test]
    fn test_response_header_ignores_reserved_word() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(2);
        buf.put_u32_le(3);
        buf.put_u32_le(0xDEAD_BEEF);

        let header = decode_response_header(&buf, IntDecoding::Full).unwrap();
        assert_eq!(header.action_id, 2);
        assert_eq!(header.sub_message_count, 3);
    }

    #[test]
    fn test_low24_folds_high_byte() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(0x0100_0014);
        buf.put_u32_le(0x0200_0001);
        buf.put_u32_le(0);

        let full = decode_response_header(&buf, IntDecoding::Full).unwrap();
        assert_eq!(full.action_id, 0x0100_0014);
        assert_eq!(full.sub_message_count, 0x0200_0001);

        let legacy = decode_response_header(&buf, IntDecoding::Low24).unwrap();
        assert_eq!(legacy.action_id, 20);
        assert_eq!(legacy.sub_message_count, 1);
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = decode_response_header(&[1, 0, 0, 0, 2], IntDecoding::Full).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: HEADER_SIZE,
                received: 5
            }
        ));
    }

    #[test]
    fn test_sub_header_roundtrip() {
        let header = SubHeader {
            kind: MessageKind::TrajectoryFine,
            sequence: 3,
            unit_count: 17,
        };
        let mut buf = BytesMut::new();
        encode_sub_header(&header, &mut buf);

        let decoded = decode_sub_header(&buf, IntDecoding::Full).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.payload_len().unwrap(), 17 * 32);
    }

    #[test]
    fn test_sub_header_unknown_kind() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(9);
        buf.put_u32_le(0);
        buf.put_u32_le(1);

        let err = decode_sub_header(&buf, IntDecoding::Full).unwrap_err();
        assert!(matches!(err, FrameError::UnknownMessageKind(9)));
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = RequestFrame::new(1, Bytes::from_static(&[0, 0, 0, 0]));
        assert_eq!(frame.wire_size(), REQUEST_HEADER_SIZE + 4);
    }
}
