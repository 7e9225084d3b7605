use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// TCP transport.
///
/// The robot side only ever connects; `bind`/`accept` exist so loopback
/// controllers (tests, simulators) can stand up the other end.
pub struct TcpSocket {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpSocket {
    /// Default TCP port of the vision controller.
    pub const DEFAULT_PORT: u16 = 11003;

    /// Bind and listen on `addr` (e.g. `127.0.0.1:0` for an ephemeral port).
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%addr, "listening on tcp socket");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(LinkStream::from_tcp(stream))
    }

    /// Connect to a listening controller (blocking, OS connect timeout).
    pub fn connect(addr: &str) -> Result<LinkStream> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(addr, "connected to tcp socket");
        Ok(LinkStream::from_tcp(stream))
    }

    /// Connect with an explicit timeout, trying each resolved address in turn.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<LinkStream> {
        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            })?
            .collect();

        let mut last_err = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    debug!(%candidate, ?timeout, "connected to tcp socket");
                    return Ok(LinkStream::from_tcp(stream));
                }
                Err(err) => {
                    debug!(%candidate, %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(source) => Err(TransportError::Connect {
                addr: addr.to_string(),
                source,
            }),
            None => Err(TransportError::Unresolved(addr.to_string())),
        }
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
