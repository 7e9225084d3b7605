use std::net::IpAddr;

use pickwire_frame::{FrameReader, FrameWriter};
use pickwire_transport::{LinkStream, TcpSocket};
use tracing::info;

use crate::error::Result;
use crate::handshake::send_brand;
use crate::session::{Session, SessionConfig};

/// Connect to a controller with default configuration.
pub fn connect(addr: &str) -> Result<Session<LinkStream, LinkStream>> {
    connect_with_config(addr, &SessionConfig::default())
}

/// Connect with explicit configuration.
///
/// An address without a port uses [`TcpSocket::DEFAULT_PORT`]. The brand
/// identification is written before the session is handed out.
pub fn connect_with_config(
    addr: &str,
    config: &SessionConfig,
) -> Result<Session<LinkStream, LinkStream>> {
    let addr = with_default_port(addr);
    let stream = match config.connect_timeout {
        Some(timeout) => TcpSocket::connect_timeout(&addr, timeout)?,
        None => TcpSocket::connect(&addr)?,
    };
    stream.set_nodelay(true)?;
    let reader_stream = stream.try_clone()?;

    let reader = FrameReader::with_config_link(reader_stream, config.codec.clone())?;
    let mut writer = FrameWriter::with_config_link(stream, config.codec.clone())?;

    send_brand(&mut writer, &config.brand)?;
    info!(addr = %addr, "connected to controller");

    Ok(Session::from_parts(reader, writer))
}

fn with_default_port(addr: &str) -> String {
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return std::net::SocketAddr::new(ip, TcpSocket::DEFAULT_PORT).to_string();
    }
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{addr}:{}", TcpSocket::DEFAULT_PORT)
    }
}
