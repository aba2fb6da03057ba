use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::lookup::{AsnLookup, Resolver};
use crate::state::{AsInfo, Hop};

/// Adds reverse DNS names and origin AS to finalized hops
pub struct HopEnricher<R: Resolver + ?Sized> {
    resolver: Arc<R>,
    asn: AsnLookup<R>,
    resolve_names: bool,
    resolve_as: bool,
    budget: Duration,
}

impl<R: Resolver + ?Sized> HopEnricher<R> {
    pub fn new(resolver: Arc<R>, resolve_names: bool, resolve_as: bool, budget: Duration) -> Self {
        Self {
            asn: AsnLookup::new(Arc::clone(&resolver)),
            resolver,
            resolve_names,
            resolve_as,
            budget,
        }
    }

    /// Fill in hostnames and AS info for a hop that has an address.
    ///
    /// Both lookups run concurrently, each bounded by the budget. A lookup
    /// that runs out is left empty without discarding the other's result.
    pub async fn enrich(&self, hop: &mut Hop) {
        let Some(ip) = hop.ip else {
            return;
        };
        if !self.resolve_names && !self.resolve_as {
            return;
        }

        let names = async {
            if self.resolve_names {
                self.resolver.reverse_lookup(ip).await
            } else {
                Vec::new()
            }
        };
        let as_info = async {
            if self.resolve_as {
                self.asn.lookup(ip).await
            } else {
                AsInfo::default()
            }
        };

        let (hostnames, info) = tokio::join!(
            tokio::time::timeout(self.budget, names),
            tokio::time::timeout(self.budget, as_info),
        );

        match hostnames {
            Ok(hostnames) => hop.hostnames = hostnames,
            Err(_) => debug!(ttl = hop.ttl, %ip, "Reverse lookup timed out"),
        }
        match info {
            Ok(info) => hop.set_as_info(info),
            Err(_) => debug!(ttl = hop.ttl, %ip, "AS lookup timed out"),
        }
    }
}
