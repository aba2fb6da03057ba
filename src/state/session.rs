use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::config::duration_serde;

/// Identifies a specific probe for correlation
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ProbeId {
    pub ttl: u8,
    /// Index of the probe within its hop
    pub query: u8,
}

impl ProbeId {
    pub fn new(ttl: u8, query: u8) -> Self {
        Self { ttl, query }
    }

    /// Encode TTL and query index into a 16-bit value for ICMP sequence field
    pub fn to_sequence(&self) -> u16 {
        ((self.ttl as u16) << 8) | (self.query as u16)
    }

    /// Decode from a 16-bit ICMP sequence field.
    ///
    /// Every value decodes; callers must still range-check `ttl` against the
    /// trace's max TTL before trusting it.
    pub fn from_sequence(seq: u16) -> Self {
        Self {
            ttl: (seq >> 8) as u8,
            query: (seq & 0xFF) as u8,
        }
    }
}

/// ICMP message types the receiver accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcmpResponseType {
    /// Router at an intermediate hop
    TimeExceeded,
    /// Destination host
    EchoReply,
}

/// Origin AS of a hop address. Empty strings mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsInfo {
    pub asn: String,
    pub org: String,
    pub prefix: String,
    pub country: String,
}

/// A single hop (TTL level) in the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub ttl: u8,
    /// First address that answered for this TTL
    pub ip: Option<IpAddr>,
    /// RTT samples in arrival order
    #[serde(with = "duration_vec_serde")]
    pub rtts: Vec<Duration>,
    /// Probes written to the socket for this TTL
    pub sent: u8,
    pub reached: bool,
    pub timeout: bool,
    pub hostnames: Vec<String>,
    pub asn: String,
    pub org: String,
    /// Announced prefix covering `ip`
    pub prefix: String,
    /// Registry country code
    pub country: String,
}

impl Hop {
    pub fn new(ttl: u8) -> Self {
        Self {
            ttl,
            ip: None,
            rtts: Vec::new(),
            sent: 0,
            reached: false,
            timeout: false,
            hostnames: Vec::new(),
            asn: String::new(),
            org: String::new(),
            prefix: String::new(),
            country: String::new(),
        }
    }

    /// Record a probe was sent for this TTL
    pub fn record_sent(&mut self) {
        self.sent = self.sent.saturating_add(1);
    }

    /// Record a correlated reply.
    ///
    /// The address is only taken from the first reply; later responders at
    /// the same TTL (ECMP) still contribute RTT samples.
    pub fn record_response(&mut self, ip: IpAddr, rtt: Duration, reached: bool) {
        self.rtts.push(rtt);
        if self.ip.is_none() {
            self.ip = Some(ip);
        }
        if reached {
            self.reached = true;
        }
    }

    /// Close the hop's measurement window
    pub fn finalize(&mut self) {
        self.timeout = self.rtts.is_empty();
    }

    pub fn set_as_info(&mut self, info: AsInfo) {
        self.asn = info.asn;
        self.org = info.org;
        self.prefix = info.prefix;
        self.country = info.country;
    }

    pub fn received(&self) -> usize {
        self.rtts.len()
    }

    pub fn min_rtt(&self) -> Option<Duration> {
        self.rtts.iter().min().copied()
    }

    pub fn max_rtt(&self) -> Option<Duration> {
        self.rtts.iter().max().copied()
    }

    pub fn avg_rtt(&self) -> Option<Duration> {
        if self.rtts.is_empty() {
            return None;
        }
        let total: Duration = self.rtts.iter().sum();
        Some(total / self.rtts.len() as u32)
    }

    /// Loss percentage for this hop
    pub fn loss_pct(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            let received = self.received().min(self.sent as usize);
            (1.0 - (received as f64 / self.sent as f64)) * 100.0
        }
    }
}

/// Target being traced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Hostname or address as given by the caller
    pub original: String,
    pub resolved: IpAddr,
}

impl Target {
    pub fn new(original: String, resolved: IpAddr) -> Self {
        Self { original, resolved }
    }
}

/// Why a trace stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    /// A hop answered from the destination
    Reached,
    /// Max TTL probed without reaching the destination
    MaxTtlExceeded,
    /// Caller cancelled; hops hold everything finalized before that
    Cancelled,
    /// The receiver loop exited early
    ReceiverStopped,
}

/// Aggregate outcome of one trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    pub target: Target,
    pub started_at: DateTime<Utc>,
    pub hops: Vec<Hop>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub status: TraceStatus,
}

impl TraceResult {
    pub fn reached(&self) -> bool {
        self.status == TraceStatus::Reached
    }

    pub fn hop(&self, ttl: u8) -> Option<&Hop> {
        self.hops.iter().find(|h| h.ttl == ttl)
    }
}

/// RTT samples serialized as fractional milliseconds
mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde::ser::SerializeSeq;
    use std::time::Duration;

    pub fn serialize<S>(rtts: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(rtts.len()))?;
        for rtt in rtts {
            seq.serialize_element(&(rtt.as_secs_f64() * 1000.0))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<f64>::deserialize(deserializer)?;
        millis
            .into_iter()
            .map(|ms| Duration::try_from_secs_f64(ms / 1000.0).map_err(serde::de::Error::custom))
            .collect()
    }
}
