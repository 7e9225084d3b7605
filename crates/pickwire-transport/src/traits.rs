use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected controller stream. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations. Reads
/// and writes after [`LinkStream::shutdown`] fail with `NotConnected`.
pub struct LinkStream {
    inner: TcpStream,
    closed: bool,
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(ErrorKind::NotConnected.into());
        }
        self.inner.read(buf)
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(ErrorKind::NotConnected.into());
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl LinkStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: stream,
            closed: false,
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable Nagle's algorithm. Requests are small and latency-bound.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Local address of this end of the stream.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Shut down both directions of the stream.
    ///
    /// Clones made with [`LinkStream::try_clone`] share the socket, so they
    /// observe EOF afterwards as well.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        self.closed = true;
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => {}
            // The peer may already have torn the connection down.
            Err(err) if err.kind() == ErrorKind::NotConnected => {}
            Err(err) => return Err(err.into()),
        }
        debug!("link stream shut down");
        Ok(())
    }

    /// Whether [`LinkStream::shutdown`] has been called on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("peer", &self.inner.peer_addr().ok())
            .field("closed", &self.closed)
            .finish()
    }
}
