use pnet::packet::icmp::IcmpTypes;
use pnet::util::checksum;

/// ICMP header size (fixed)
pub const ICMP_HEADER_SIZE: usize = 8;
/// Default payload size
pub const DEFAULT_PAYLOAD_SIZE: usize = 32;
/// Minimum payload size (identifier + sequence copy)
pub const MIN_PAYLOAD_SIZE: usize = 4;

/// Pick a fresh ICMP identifier for one tracer instance.
///
/// Random rather than process-derived so that several tracers in one process
/// can run side by side without claiming each other's replies.
pub fn new_identifier() -> u16 {
    rand::random::<u16>()
}

/// Build an ICMPv4 Echo Request packet
///
/// Payload layout:
/// - Bytes 0-1: identifier
/// - Bytes 2-3: sequence
/// - Bytes 4+: pattern fill
pub fn build_echo_request(identifier: u16, sequence: u16, payload_size: usize) -> Vec<u8> {
    let payload_size = payload_size.max(MIN_PAYLOAD_SIZE);
    let mut buffer = vec![0u8; ICMP_HEADER_SIZE + payload_size];

    buffer[0] = IcmpTypes::EchoRequest.0;
    buffer[1] = 0;
    buffer[4..6].copy_from_slice(&identifier.to_be_bytes());
    buffer[6..8].copy_from_slice(&sequence.to_be_bytes());

    let payload = &mut buffer[ICMP_HEADER_SIZE..];
    payload[0..2].copy_from_slice(&identifier.to_be_bytes());
    payload[2..4].copy_from_slice(&sequence.to_be_bytes());
    for (i, byte) in payload[4..].iter_mut().enumerate() {
        *byte = (i & 0xFF) as u8;
    }

    // Word 1 holds the checksum field itself
    let cksum = checksum(&buffer, 1);
    buffer[2..4].copy_from_slice(&cksum.to_be_bytes());

    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::correlate::validate_icmp_checksum;

    #[test]
    fn test_build_echo_request() {
        let packet = build_echo_request(0x1234, 0x0301, DEFAULT_PAYLOAD_SIZE);
        assert_eq!(packet.len(), ICMP_HEADER_SIZE + DEFAULT_PAYLOAD_SIZE);
        assert_eq!(packet[0], 8); // Echo Request type
        assert_eq!(packet[1], 0); // Code
        assert_eq!(&packet[4..6], &[0x12, 0x34]);
        assert_eq!(&packet[6..8], &[0x03, 0x01]);
    }

    #[test]
    fn test_build_echo_request_checksum_verifies() {
        let packet = build_echo_request(0xBEEF, 0x1E02, 56);
        assert!(validate_icmp_checksum(&packet));
    }

    #[test]
    fn test_build_echo_request_minimum_payload() {
        let packet = build_echo_request(1, 2, 0);
        assert_eq!(packet.len(), ICMP_HEADER_SIZE + MIN_PAYLOAD_SIZE);
    }
}
