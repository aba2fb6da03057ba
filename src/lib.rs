//! ICMP traceroute engine.
//!
//! [`Tracer`] probes one TTL at a time with ICMP Echo Requests over a raw
//! socket, correlates Time Exceeded and Echo Reply messages back to the probe
//! that caused them, and reports each hop in order as it is finalized.

// Public API - data types, tracer and export functions
pub mod config;
pub mod error;
pub mod export;
pub mod lookup;
pub mod state;
pub mod trace;

// Internal implementation - exposed for the binary and integration tests
pub mod cli;
pub mod probe;

pub use config::Config;
pub use error::TraceError;
pub use lookup::{DnsLookup, Resolver};
pub use state::{AsInfo, Hop, ProbeId, Target, TraceResult, TraceStatus};
pub use trace::{ProbeSender, ReplyEvent, Tracer};
pub use tokio_util::sync::CancellationToken;
