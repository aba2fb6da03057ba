//! Shared probe and hop tracking.
//!
//! The coordinator registers every probe here before it is written to the
//! socket, and routes each reply event through [`TraceState::correlate`].
//! One coarse lock guards both the registry and the open hops; a trace holds
//! at most `max_ttl * queries` entries, so contention is negligible.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::Instant;

use crate::state::{Hop, IcmpResponseType, ProbeId};
use crate::trace::receiver::ReplyEvent;

/// What the coordinator accepts as one of its own replies
#[derive(Debug, Clone, Copy)]
pub struct ProbeFilter {
    pub identifier: u16,
    pub max_ttl: u8,
    pub queries: u8,
    pub destination: IpAddr,
}

/// Outcome of correlating a reply event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Sample recorded on the open hop for this TTL
    Matched { ttl: u8 },
    /// Identifier belongs to another tracer
    ForeignIdentifier,
    /// Decoded TTL or query index outside what this trace sends
    OutOfRange,
    /// No send was registered for this sequence
    NotSent,
    /// Sequence already answered; duplicated replies add no sample
    Duplicate,
    /// Hop already finalized or not yet started
    HopNotOpen,
}

/// Sent-probe registry plus the hops still collecting replies
#[derive(Debug, Default)]
pub struct TraceState {
    /// Send time by ICMP sequence; entries live for the whole trace
    sent: HashMap<u16, Instant>,
    /// Sequences that already produced a sample
    answered: HashSet<u16>,
    open: BTreeMap<u8, Hop>,
}

/// Thread-safe trace state
pub type SharedTraceState = Arc<Mutex<TraceState>>;

/// Create a new empty trace state
pub fn new_trace_state() -> SharedTraceState {
    Arc::new(Mutex::new(TraceState::default()))
}

impl TraceState {
    /// Start collecting replies for a TTL
    pub fn open_hop(&mut self, ttl: u8) {
        self.open.entry(ttl).or_insert_with(|| Hop::new(ttl));
    }

    /// Register a probe's send time. Must happen before the packet is written.
    pub fn register_sent(&mut self, probe_id: ProbeId, sent_at: Instant) {
        self.sent.insert(probe_id.to_sequence(), sent_at);
    }

    /// Count a probe that actually left the socket
    pub fn record_sent(&mut self, ttl: u8) {
        if let Some(hop) = self.open.get_mut(&ttl) {
            hop.record_sent();
        }
    }

    pub fn hop(&self, ttl: u8) -> Option<&Hop> {
        self.open.get(&ttl)
    }

    /// Replies collected so far for an open hop
    pub fn received(&self, ttl: u8) -> usize {
        self.open.get(&ttl).map_or(0, Hop::received)
    }

    /// Stop collecting for a TTL and hand back its record
    pub fn close_hop(&mut self, ttl: u8) -> Option<Hop> {
        self.open.remove(&ttl)
    }

    /// Apply a reply event to the open hop its sequence decodes to
    pub fn correlate(&mut self, event: &ReplyEvent, filter: &ProbeFilter) -> Correlation {
        if event.identifier != filter.identifier {
            return Correlation::ForeignIdentifier;
        }

        let ProbeId { ttl, query } = event.probe_id;
        if ttl == 0 || ttl > filter.max_ttl || query >= filter.queries {
            return Correlation::OutOfRange;
        }

        let sequence = event.probe_id.to_sequence();
        let Some(&sent_at) = self.sent.get(&sequence) else {
            return Correlation::NotSent;
        };

        let Some(hop) = self.open.get_mut(&ttl) else {
            return Correlation::HopNotOpen;
        };

        if !self.answered.insert(sequence) {
            return Correlation::Duplicate;
        }

        let rtt = event.received_at.saturating_duration_since(sent_at);
        let reached = event.response_type == IcmpResponseType::EchoReply
            || event.responder == filter.destination;
        hop.record_response(event.responder, rtt, reached);

        Correlation::Matched { ttl }
    }
}
