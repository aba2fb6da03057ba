pub mod asn;
pub mod rdns;

pub use asn::*;
pub use rdns::*;

use async_trait::async_trait;
use std::net::IpAddr;

/// DNS operations the tracer depends on.
///
/// Implemented by [`DnsLookup`] for real traces; tests substitute canned
/// answers.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Forward lookup of a hostname
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, String>;

    /// PTR names for an address, trailing dot removed. Empty on any failure.
    async fn reverse_lookup(&self, ip: IpAddr) -> Vec<String>;

    /// TXT records at `name`, each record's strings joined. Empty on any failure.
    async fn txt_lookup(&self, name: &str) -> Vec<String>;
}

/// Sanitize a string for safe terminal display by removing control characters.
///
/// DNS data is attacker-controlled; this keeps escape sequences out of output.
pub(crate) fn sanitize_display(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control())
        .collect()
}
