use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver as HickoryResolver, TokioResolver};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, warn};

use super::{Resolver, sanitize_display};
use crate::error::TraceError;

/// System DNS resolver backed by hickory
pub struct DnsLookup {
    resolver: TokioResolver,
}

impl DnsLookup {
    pub fn new() -> Self {
        // Try system DNS config first, fall back to Google DNS if unavailable
        let resolver = match HickoryResolver::builder_tokio() {
            Ok(builder) => builder.build(),
            Err(e) => {
                warn!(error = %e, "System DNS config unavailable, using Google DNS (8.8.8.8)");
                HickoryResolver::builder_with_config(
                    ResolverConfig::google(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };

        Self { resolver }
    }
}

impl Default for DnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for DnsLookup {
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, String> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| e.to_string())?;
        Ok(lookup.iter().collect())
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Vec<String> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup
                .iter()
                .map(|name| {
                    let s = name.to_string();
                    // Remove trailing dot
                    sanitize_display(s.trim_end_matches('.'))
                })
                .collect(),
            Err(e) => {
                debug!(%ip, error = %e, "Reverse lookup failed");
                Vec::new()
            }
        }
    }

    async fn txt_lookup(&self, name: &str) -> Vec<String> {
        match self.resolver.txt_lookup(name).await {
            Ok(records) => records
                .iter()
                .map(|txt| {
                    // TXT records may be split into multiple strings
                    txt.txt_data()
                        .iter()
                        .filter_map(|bytes| std::str::from_utf8(bytes).ok())
                        .collect::<Vec<_>>()
                        .join("")
                })
                .collect(),
            Err(e) => {
                debug!(name, error = %e, "TXT lookup failed");
                Vec::new()
            }
        }
    }
}

/// Resolve a trace target to the IPv4 address that will be probed.
///
/// Address literals skip DNS entirely.
pub async fn resolve_target<R: Resolver + ?Sized>(
    resolver: &R,
    target: &str,
) -> Result<Ipv4Addr, TraceError> {
    let target = target.trim();
    if let Ok(ip) = target.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => Err(TraceError::Ipv6Unsupported(target.to_string())),
        };
    }

    let addrs = resolver
        .lookup_host(target)
        .await
        .map_err(|reason| TraceError::Resolve {
            host: target.to_string(),
            reason,
        })?;

    addrs
        .into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| TraceError::NoIpv4Address {
            host: target.to_string(),
        })
}
