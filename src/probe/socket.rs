use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::TraceError;

/// Receive buffer requested from the kernel for the raw socket
const RECV_BUFFER_SIZE: usize = 1024 * 1024;

/// Create a raw ICMPv4 socket.
///
/// The read timeout doubles as the receiver's poll interval.
pub fn create_raw_icmp_socket(read_timeout: Duration) -> Result<Socket, TraceError> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
        .map_err(TraceError::SocketCreation)?;

    socket
        .set_nonblocking(false)
        .map_err(TraceError::SocketCreation)?;
    socket
        .set_read_timeout(Some(read_timeout))
        .map_err(TraceError::SocketCreation)?;

    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
        tracing::debug!(error = %e, "Could not raise receive buffer size");
    }

    Ok(socket)
}

/// Check up front that raw ICMP sockets can be opened
pub fn check_permissions() -> Result<(), TraceError> {
    create_raw_icmp_socket(Duration::from_secs(1)).map(drop)
}

/// Set TTL on a socket
pub fn set_ttl(socket: &Socket, ttl: u8) -> Result<(), TraceError> {
    socket
        .set_ttl(ttl as u32)
        .map_err(|source| TraceError::SetTtl { ttl, source })
}

/// Send ICMP packet to target
pub fn send_icmp(socket: &Socket, packet: &[u8], target: Ipv4Addr) -> io::Result<usize> {
    let addr = SocketAddr::new(IpAddr::V4(target), 0);
    socket.send_to(packet, &SockAddr::from(addr))
}

/// Read one datagram (IPv4 header included) into `buffer`.
///
/// Returns `WouldBlock`/`TimedOut` when the read timeout elapses.
pub fn recv_icmp(socket: &Socket, buffer: &mut [u8]) -> io::Result<usize> {
    let mut reader = socket;
    reader.read(buffer)
}

/// Whether a receive error only means the poll interval elapsed
pub fn is_poll_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
