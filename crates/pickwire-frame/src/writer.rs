use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use pickwire_transport::LinkStream;

use crate::codec::{encode_request, CodecConfig, RequestFrame};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete request frame (blocking).
    pub fn write_request(&mut self, frame: &RequestFrame) -> Result<()> {
        self.send_request(frame.action_id, frame.payload.as_ref())
    }

    /// Encode and send a request.
    ///
    /// The payload is validated before any byte reaches the stream.
    pub fn send_request(&mut self, action_id: u32, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_request(action_id, payload, &mut self.buf)?;

        let encoded = self.buf.split().freeze();
        self.send_raw(&encoded)
    }

    /// Send pre-encoded bytes as-is (handshake tag, controller responses).
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => {
                    return Err(FrameError::Truncated {
                        expected: bytes.len(),
                        received: offset,
                    })
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl FrameWriter<LinkStream> {
    /// Create a frame writer for `LinkStream` and apply write timeout from config.
    pub fn with_config_link(inner: LinkStream, config: CodecConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_request, MAGIC};

    #[test]
    fn write_single_request() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send_request(19, &1i32.to_le_bytes()).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let frame = decode_request(&mut wire, usize::MAX).unwrap().unwrap();
        assert_eq!(frame.action_id, 19);
        assert_eq!(frame.payload.as_ref(), &1i32.to_le_bytes());
    }

    #[test]
    fn write_multiple_requests() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send_request(10, &253i32.to_le_bytes()).unwrap();
        writer.send_request(19, &1i32.to_le_bytes()).unwrap();
        writer
            .write_request(&RequestFrame::new(12, Vec::new()))
            .unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let ids: Vec<u32> = std::iter::from_fn(|| decode_request(&mut wire, usize::MAX).unwrap())
            .map(|frame| frame.action_id)
            .collect();
        assert_eq!(ids, vec![10, 19, 12]);
    }

    #[test]
    fn payload_too_large_rejected_before_write() {
        let cfg = CodecConfig {
            max_payload_size: 4,
            ..CodecConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send_request(1, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn unaligned_payload_rejected_before_write() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let err = writer.send_request(1, &[0u8; 5]).unwrap_err();
        assert!(matches!(err, FrameError::UnalignedPayload { len: 5 }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn send_raw_passes_bytes_through() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_raw(b"ABB_IRB/1.8.0").unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"ABB_IRB/1.8.0");
    }

    #[test]
    fn request_starts_with_magic() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_request(11, &[]).unwrap();
        let wire = writer.into_inner().into_inner();
        assert_eq!(&wire[..12], &MAGIC);
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send_request(11, &[]).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert_eq!(writer.config().max_payload_size, crate::DEFAULT_MAX_PAYLOAD);
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send_request(13, &[]).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), crate::REQUEST_HEADER_SIZE);
    }

    #[test]
    fn write_returning_zero_is_truncation() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send_request(1, &[]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { received: 0, .. }));
    }

    #[test]
    fn would_block_write_is_an_error() {
        let mut writer = FrameWriter::new(WouldBlockWriter);
        let err = writer.send_request(1, &[]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct WouldBlockWriter;

    impl Write for WouldBlockWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
