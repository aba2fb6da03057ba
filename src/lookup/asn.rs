use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use super::{Resolver, sanitize_display};
use crate::state::AsInfo;

/// Zone answering origin queries for reversed IPv4 addresses
pub const ORIGIN_ZONE: &str = "origin.asn.cymru.com";
/// Zone answering AS description queries
pub const AS_NAME_ZONE: &str = "asn.cymru.com";

/// Reverse the octets of an IPv4 address: 1.2.3.4 -> "4.3.2.1"
///
/// Returns None for IPv6 addresses.
pub fn reverse_octets(ip: IpAddr) -> Option<String> {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            Some(format!(
                "{}.{}.{}.{}",
                octets[3], octets[2], octets[1], octets[0]
            ))
        }
        IpAddr::V6(_) => None,
    }
}

/// ASN lookup via Team Cymru DNS
pub struct AsnLookup<R: Resolver + ?Sized> {
    resolver: Arc<R>,
}

impl<R: Resolver + ?Sized> AsnLookup<R> {
    pub fn new(resolver: Arc<R>) -> Self {
        Self { resolver }
    }

    /// Lookup the origin AS for an IP.
    ///
    /// Best effort: any failure yields an empty `AsInfo`.
    pub async fn lookup(&self, ip: IpAddr) -> AsInfo {
        let Some(reversed) = reverse_octets(ip) else {
            return AsInfo::default();
        };

        // Query TXT record at <reversed_ip>.origin.asn.cymru.com
        let query_name = format!("{}.{}", reversed, ORIGIN_ZONE);
        let records = self.resolver.txt_lookup(&query_name).await;
        let Some(mut info) = records.first().and_then(|txt| parse_origin_record(txt)) else {
            debug!(%ip, "No usable origin record");
            return AsInfo::default();
        };

        // The origin record carries no AS name; ask for it separately
        if let Some(name) = self.lookup_as_name(&info.asn).await {
            info.org = name;
        }

        info
    }

    /// Lookup AS name from AS number
    async fn lookup_as_name(&self, asn: &str) -> Option<String> {
        let query_name = format!("AS{}.{}", asn, AS_NAME_ZONE);
        let records = self.resolver.txt_lookup(&query_name).await;
        records.first().and_then(|txt| parse_as_name_record(txt))
    }
}

fn split_fields(txt: &str) -> Vec<&str> {
    txt.trim_matches('"').split('|').map(|s| s.trim()).collect()
}

/// Parse an origin record.
///
/// Format: "ASN | prefix | country | org | date"
/// Example: "15169 | 8.8.8.0/24 | US | arin | 1992-12-01"
pub fn parse_origin_record(txt: &str) -> Option<AsInfo> {
    let parts = split_fields(txt);
    if parts.len() < 4 {
        return None;
    }

    // May have an "AS" prefix, and multi-origin prefixes list several ASNs
    let asn = parts[0]
        .trim_start_matches("AS")
        .split_whitespace()
        .next()?;
    asn.parse::<u32>().ok()?;

    Some(AsInfo {
        asn: asn.to_string(),
        org: sanitize_display(parts[3]),
        prefix: parts[1].to_string(),
        country: parts[2].to_string(),
    })
}

/// Parse an AS description record.
///
/// Format: "AS | CC | Registry | Allocated | AS Name"
/// Example: "15169 | US | arin | 2000-03-30 | GOOGLE, US"
pub fn parse_as_name_record(txt: &str) -> Option<String> {
    split_fields(txt)
        .get(4)
        .map(|s| sanitize_display(s))
        .filter(|s| !s.is_empty())
}
