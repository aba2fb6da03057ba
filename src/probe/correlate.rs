use crate::state::{IcmpResponseType, ProbeId};
use pnet::packet::icmp::{IcmpPacket, IcmpTypes};
use pnet::packet::ipv4::Ipv4Packet;
use std::net::IpAddr;

// IP protocol number for ICMP
const IPPROTO_ICMP: u8 = 1;

/// Minimum IPv4 header length
const MIN_IPV4_HEADER: usize = 20;

/// Parsed ICMP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub responder: IpAddr,
    pub identifier: u16,
    pub probe_id: ProbeId,
    pub response_type: IcmpResponseType,
}

/// Whether the ICMP checksum in bytes 2-3 matches the message (RFC 1071)
pub(crate) fn validate_icmp_checksum(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    let stored = u16::from_be_bytes([data[2], data[3]]);
    pnet::util::checksum(data, 1) == stored
}

/// Parse a datagram read from a raw ICMPv4 socket and correlate it to our probe
///
/// The responder is taken from the outer IPv4 header.
///
/// Returns None if:
/// - Packet is malformed or truncated
/// - Packet is neither Echo Reply nor Time Exceeded
/// - Packet is not a response to our probe (wrong identifier)
/// - ICMP checksum is invalid (for Echo Reply only)
pub fn parse_icmp_response(data: &[u8], our_identifier: u16) -> Option<ParsedResponse> {
    let ip_packet = Ipv4Packet::new(data)?;
    if ip_packet.get_version() != 4 {
        return None;
    }
    let ip_header_len = (ip_packet.get_header_length() as usize) * 4;
    if ip_header_len < MIN_IPV4_HEADER || data.len() < ip_header_len + 8 {
        return None;
    }
    let responder = IpAddr::V4(ip_packet.get_source());

    let icmp_data = &data[ip_header_len..];
    let icmp_packet = IcmpPacket::new(icmp_data)?;

    let (identifier, sequence, response_type) = match icmp_packet.get_icmp_type() {
        IcmpTypes::EchoReply => {
            if !validate_icmp_checksum(icmp_data) {
                return None;
            }
            // Echo Reply: identifier and sequence are in bytes 4-7
            let identifier = u16::from_be_bytes([icmp_data[4], icmp_data[5]]);
            let sequence = u16::from_be_bytes([icmp_data[6], icmp_data[7]]);
            (identifier, sequence, IcmpResponseType::EchoReply)
        }
        IcmpTypes::TimeExceeded => {
            let (identifier, sequence) = parse_quoted_echo(icmp_data)?;
            (identifier, sequence, IcmpResponseType::TimeExceeded)
        }
        _ => return None,
    };

    if identifier != our_identifier {
        return None;
    }

    Some(ParsedResponse {
        responder,
        identifier,
        probe_id: ProbeId::from_sequence(sequence),
        response_type,
    })
}

/// Pull identifier and sequence out of the Echo Request quoted in an ICMP error
fn parse_quoted_echo(icmp_data: &[u8]) -> Option<(u16, u16)> {
    // ICMP error format:
    // [0]    Type
    // [1]    Code
    // [2-3]  Checksum
    // [4-7]  Unused
    // [8..]  Original IP header + at least 8 bytes of original payload
    let original_ip_data = icmp_data.get(8..)?;
    let original_ip = Ipv4Packet::new(original_ip_data)?;
    let orig_ihl = (original_ip.get_header_length() as usize) * 4;

    if orig_ihl < MIN_IPV4_HEADER || original_ip_data.len() < orig_ihl + 8 {
        return None;
    }
    if original_ip.get_next_level_protocol().0 != IPPROTO_ICMP {
        return None;
    }

    // [0] Type (8 = Echo Request) [1] Code [2-3] Checksum [4-5] Identifier [6-7] Sequence
    let original = &original_ip_data[orig_ihl..];
    if original[0] != IcmpTypes::EchoRequest.0 {
        return None;
    }

    let identifier = u16::from_be_bytes([original[4], original[5]]);
    let sequence = u16::from_be_bytes([original[6], original[7]]);
    Some((identifier, sequence))
}
