use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use pickwire_transport::LinkStream;
use tracing::trace;

use crate::codec::{
    decode_request, decode_response_header, decode_sub_header, CodecConfig, IntDecoding,
    RequestFrame, ResponseHeader, SubHeader, HEADER_SIZE, REQUEST_HEADER_SIZE, SUB_HEADER_SIZE,
    UNIT_SIZE,
};
use crate::error::{FrameError, Result};

/// Reads exact-length protocol units from any `Read` stream.
///
/// Handles partial reads internally. A stream that ends early surfaces as
/// [`FrameError::Truncated`], never as a short buffer.
pub struct FrameReader<T> {
    inner: T,
    config: CodecConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self { inner, config }
    }

    /// Read exactly `len` bytes (blocking).
    pub fn read_exact_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        let mut filled = 0usize;
        while filled < len {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(FrameError::Truncated {
                        expected: len,
                        received: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(buf.freeze())
    }

    /// Read and decode a response header.
    pub fn read_response_header(&mut self) -> Result<ResponseHeader> {
        let raw = self.read_exact_bytes(HEADER_SIZE)?;
        let header = decode_response_header(&raw, self.config.int_decoding)?;
        trace!(
            action_id = header.action_id,
            sub_messages = header.sub_message_count,
            "response header"
        );
        Ok(header)
    }

    /// Read and decode a sub-header.
    pub fn read_sub_header(&mut self) -> Result<SubHeader> {
        let raw = self.read_exact_bytes(SUB_HEADER_SIZE)?;
        let sub = decode_sub_header(&raw, self.config.int_decoding)?;
        trace!(
            kind = %sub.kind,
            sequence = sub.sequence,
            units = sub.unit_count,
            "sub-header"
        );
        Ok(sub)
    }

    /// Read the payload a sub-header declares.
    pub fn read_sub_payload(&mut self, sub: &SubHeader) -> Result<Bytes> {
        let len = sub.payload_len()?;
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }
        self.read_exact_bytes(len)
    }

    /// Read one request frame (controller side of the link).
    pub fn read_request(&mut self) -> Result<RequestFrame> {
        let mut buf = BytesMut::from(self.read_exact_bytes(REQUEST_HEADER_SIZE)?.as_ref());
        if let Some(frame) = decode_request(&mut buf, self.config.max_payload_size)? {
            return Ok(frame);
        }

        let units = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]) as usize;
        let payload = self.read_exact_bytes(units * UNIT_SIZE)?;
        buf.extend_from_slice(&payload);
        decode_request(&mut buf, self.config.max_payload_size)?.ok_or(FrameError::Truncated {
            expected: REQUEST_HEADER_SIZE + units * UNIT_SIZE,
            received: buf.len(),
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Switch integer decoding for subsequent headers and info blocks.
    pub fn set_int_decoding(&mut self, mode: IntDecoding) {
        self.config.int_decoding = mode;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for `LinkStream` and apply read timeout from config.
    pub fn with_config_link(inner: LinkStream, config: CodecConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: pickwire_transport::TransportError) -> FrameError {
    match err {
        pickwire_transport::TransportError::Io(io)
        | pickwire_transport::TransportError::Accept(io) => FrameError::Io(io),
        pickwire_transport::TransportError::Bind { source, .. }
        | pickwire_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
