use socket2::Socket;
use std::net::IpAddr;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::TraceError;
use crate::probe::{is_poll_timeout, parse_icmp_response, recv_icmp};
use crate::state::{IcmpResponseType, ProbeId};

/// Maximum consecutive errors before stopping the receiver
const MAX_CONSECUTIVE_ERRORS: u32 = 50;

/// Reply events buffered between the receiver thread and the coordinator
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Largest datagram we expect on an Ethernet path
const RECV_BUFFER_LEN: usize = 1500;

/// A decoded reply to one of our probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    pub responder: IpAddr,
    pub identifier: u16,
    pub probe_id: ProbeId,
    pub received_at: Instant,
    pub response_type: IcmpResponseType,
}

/// Decode a raw datagram into a reply event, or None if it isn't ours
pub fn decode_reply(data: &[u8], identifier: u16, received_at: Instant) -> Option<ReplyEvent> {
    let parsed = parse_icmp_response(data, identifier)?;
    Some(ReplyEvent {
        responder: parsed.responder,
        identifier: parsed.identifier,
        probe_id: parsed.probe_id,
        received_at,
        response_type: parsed.response_type,
    })
}

/// The receiver reads ICMP datagrams from the raw socket and publishes reply events
pub struct Receiver {
    socket: Socket,
    identifier: u16,
    events: mpsc::Sender<ReplyEvent>,
    cancel: CancellationToken,
    consecutive_errors: u32,
}

impl Receiver {
    /// The socket's read timeout sets how quickly cancellation is noticed
    pub fn new(
        socket: Socket,
        identifier: u16,
        events: mpsc::Sender<ReplyEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            socket,
            identifier,
            events,
            cancel,
            consecutive_errors: 0,
        }
    }

    /// Run the receiver on a dedicated thread (blocking I/O)
    pub fn run_blocking(mut self) -> Result<(), TraceError> {
        let mut buffer = [0u8; RECV_BUFFER_LEN];

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match recv_icmp(&self.socket, &mut buffer) {
                Ok(len) => {
                    self.consecutive_errors = 0;
                    let received_at = Instant::now();

                    let Some(event) = decode_reply(&buffer[..len], self.identifier, received_at)
                    else {
                        continue;
                    };

                    trace!(
                        ttl = event.probe_id.ttl,
                        query = event.probe_id.query,
                        responder = %event.responder,
                        "Reply received"
                    );

                    if self.events.blocking_send(event).is_err() {
                        // Coordinator is gone
                        break;
                    }
                }
                Err(e) if is_poll_timeout(&e) => {
                    self.consecutive_errors = 0;
                }
                Err(e) => {
                    self.consecutive_errors += 1;
                    warn!(
                        error = %e,
                        count = self.consecutive_errors,
                        max = MAX_CONSECUTIVE_ERRORS,
                        "Receive error"
                    );

                    if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(TraceError::Receiver(format!(
                            "{} consecutive errors (last: {})",
                            self.consecutive_errors, e
                        )));
                    }
                }
            }
        }

        debug!("Receiver stopped");
        Ok(())
    }
}

/// Spawn the receiver on a dedicated OS thread
pub fn spawn_receiver(
    socket: Socket,
    identifier: u16,
    events: mpsc::Sender<ReplyEvent>,
    cancel: CancellationToken,
) -> std::thread::JoinHandle<Result<(), TraceError>> {
    std::thread::spawn(move || {
        let receiver = Receiver::new(socket, identifier, events, cancel);

        // Catch panics and convert to error with details
        let result =
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| receiver.run_blocking())) {
                Ok(result) => result,
                Err(panic_payload) => {
                    let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic".to_string()
                    };
                    Err(TraceError::Receiver(format!("panicked: {}", msg)))
                }
            };

        if let Err(ref e) = result {
            warn!(error = %e, "Receiver exited with error");
        }
        result
    })
}
