use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::cli::Args;
use crate::error::TraceError;

/// Default maximum TTL
pub const DEFAULT_MAX_TTL: u8 = 30;
/// Default probes per hop
pub const DEFAULT_QUERIES: u8 = 3;
/// Default per-hop timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Delay between consecutive probes of the same hop
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(10);
/// How long the receiver blocks on a read before re-checking cancellation
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tracer configuration, fixed for the lifetime of a `Tracer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum TTL
    pub max_ttl: u8,
    /// Probes sent per hop
    pub queries: u8,
    /// Per-hop timeout, also bounds enrichment
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Look up origin AS for responding hops
    pub resolve_as: bool,
    /// Reverse DNS for responding hops
    pub resolve_names: bool,
    /// Delay between probes within a hop
    #[serde(with = "duration_serde")]
    pub probe_delay: Duration,
    /// Receiver poll interval
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,
    /// Echo Request payload size in bytes
    pub payload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ttl: DEFAULT_MAX_TTL,
            queries: DEFAULT_QUERIES,
            timeout: DEFAULT_TIMEOUT,
            resolve_as: false,
            resolve_names: true,
            probe_delay: DEFAULT_PROBE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            payload_size: crate::probe::DEFAULT_PAYLOAD_SIZE,
        }
    }
}

impl Config {
    /// Check the invariants the sequence encoding and the coordinator rely on
    pub fn validate(&self) -> Result<(), TraceError> {
        if self.max_ttl == 0 {
            return Err(TraceError::InvalidConfig("max TTL must be at least 1".into()));
        }
        if self.queries == 0 {
            return Err(TraceError::InvalidConfig("queries per hop must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(TraceError::InvalidConfig("timeout must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(TraceError::InvalidConfig("poll interval must be positive".into()));
        }
        Ok(())
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            max_ttl: args.max_ttl,
            queries: args.queries,
            timeout: args.timeout_duration(),
            resolve_as: args.asn,
            resolve_names: !args.no_dns,
            ..Self::default()
        }
    }
}

/// Serde helper for Duration
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
