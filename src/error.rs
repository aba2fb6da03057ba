//! Error types for trace operations.

use std::io;
use thiserror::Error;

/// Errors that abort a trace, or that a single probe step reports upward.
///
/// Only configuration, target resolution and socket creation are fatal for a
/// whole trace. Per-probe errors (`SetTtl`, `Send`) are logged by the
/// coordinator and degrade the affected hop instead.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IPv6 targets are not supported: {0}")]
    Ipv6Unsupported(String),

    #[error("Failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("{host} has no IPv4 address")]
    NoIpv4Address { host: String },

    #[error(
        "Failed to create raw ICMP socket: {0}\n\n\
         Fix options:\n\
         \u{2022} Run with sudo\n\
         \u{2022} Add capability: sudo setcap cap_net_raw+ep <binary>"
    )]
    SocketCreation(#[source] io::Error),

    #[error("Failed to set TTL {ttl}: {source}")]
    SetTtl {
        ttl: u8,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send probe at TTL {ttl}: {source}")]
    Send {
        ttl: u8,
        #[source]
        source: io::Error,
    },

    #[error("Receiver stopped: {0}")]
    Receiver(String),
}

impl TraceError {
    /// True for errors raised before any hop was probed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SetTtl { .. } | Self::Send { .. })
    }
}
