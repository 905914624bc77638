use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use super::{Datagram, DatagramSource, SourceError};

/// Receive buffer size; larger than any telemetry datagram the game sends.
pub const MAX_DATAGRAM_LEN: usize = 1024;

/// Blocking UDP listener for the simulator's "Data Out" stream.
///
/// Never exhausts: every call waits for the next datagram.
pub struct UdpSource {
    socket: UdpSocket,
    buffer: Box<[u8; MAX_DATAGRAM_LEN]>,
}

impl UdpSource {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, SourceError> {
        let socket = UdpSocket::bind(addr)?;
        info!(local = %socket.local_addr()?, "listening for telemetry datagrams");
        Ok(Self::from_socket(socket))
    }

    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            buffer: Box::new([0u8; MAX_DATAGRAM_LEN]),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SourceError> {
        Ok(self.socket.local_addr()?)
    }
}

impl DatagramSource for UdpSource {
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError> {
        let (len, src) = self.socket.recv_from(&mut self.buffer[..])?;
        Ok(Some(Datagram {
            ts: wall_clock_seconds(),
            src: Some(src),
            payload: self.buffer[..len].to_vec(),
        }))
    }
}

fn wall_clock_seconds() -> Option<f64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|elapsed| elapsed.as_secs_f64())
}
