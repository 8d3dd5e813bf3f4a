//! ICMP echo (ping)
//!
//! Sends bare 8-byte echo requests and recognizes the matching echo reply.
//! Replies are matched on source address and sequence number only; the
//! identifier and checksums of inbound packets are not checked.
//!
//! Reference: RFC 792 - <https://www.rfc-editor.org/rfc/rfc792>

use super::checksum::fill_checksum;
use super::endian::{read_u16, write_u16};
use super::error::NetError;
use super::interface::NetworkInterface;
use super::ipv4::{self, Ipv4Address};
use super::protocol;
use log::trace;

pub const TYPE_ECHO_REPLY: u8 = 0;
pub const TYPE_ECHO_REQUEST: u8 = 8;

/// ICMP echo header
///
/// Total size: 8 bytes
/// - Type: 1 byte
/// - Code: 1 byte
/// - Checksum: 2 bytes
/// - Identifier: 2 bytes
/// - Sequence number: 2 bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    pub const SIZE: usize = 8;

    /// Echo request with the checksum computed over the header
    pub fn echo_request(identifier: u16, sequence: u16) -> Self {
        let mut header = Self {
            icmp_type: TYPE_ECHO_REQUEST,
            code: 0,
            checksum: 0,
            identifier,
            sequence,
        };
        let mut bytes = header.to_bytes();
        fill_checksum(&mut bytes, 2);
        header.checksum = read_u16(&bytes, 2);
        header
    }

    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            icmp_type: buffer[0],
            code: buffer[1],
            checksum: read_u16(buffer, 2),
            identifier: read_u16(buffer, 4),
            sequence: read_u16(buffer, 6),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.icmp_type;
        bytes[1] = self.code;
        write_u16(&mut bytes, 2, self.checksum);
        write_u16(&mut bytes, 4, self.identifier);
        write_u16(&mut bytes, 6, self.sequence);
        bytes
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == TYPE_ECHO_REPLY && self.code == 0
    }
}

/// Send one echo request (no payload) to `dest_ip`
pub fn send_ping(
    iface: &mut NetworkInterface,
    dest_ip: Ipv4Address,
    identifier: u16,
    sequence: u16,
) -> Result<(), NetError> {
    let request = IcmpHeader::echo_request(identifier, sequence);
    trace!("[ICMP] echo request to {} id {} seq {}", dest_ip, identifier, sequence);
    ipv4::send_packet(iface, dest_ip, protocol::ICMP, &request.to_bytes())
}

/// Whether `frame` is the echo reply from `expected_ip` for `expected_sequence`
pub fn process_reply(frame: &[u8], expected_ip: Ipv4Address, expected_sequence: u16) -> bool {
    let Some((ip_header, payload)) = ipv4::peek_packet(frame) else {
        return false;
    };
    if ip_header.protocol != protocol::ICMP || ip_header.src_ip != expected_ip {
        return false;
    }

    IcmpHeader::parse(payload)
        .is_some_and(|icmp| icmp.is_echo_reply() && icmp.sequence == expected_sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::net::queue::QueueDevice;
    use crate::net::checksum::checksum;
    use crate::net::ethernet::{ETHERTYPE_IPV4, EthernetFrame, MacAddress};
    use crate::net::interface::InterfaceKind;
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    const OUR_MAC: MacAddress = MacAddress::new([0x08, 0x00, 0x27, 0x00, 0x00, 0x07]);
    const OUR_IP: Ipv4Address = Ipv4Address::new(192, 168, 1, 50);
    const GOOGLE_DNS: Ipv4Address = Ipv4Address::new(8, 8, 8, 8);

    fn reply_frame(src: Ipv4Address, proto: u8, icmp_type: u8, code: u8, sequence: u16) -> Vec<u8> {
        let mut icmp = IcmpHeader {
            icmp_type,
            code,
            checksum: 0,
            identifier: 1234,
            sequence,
        };
        icmp.checksum = checksum(&icmp.to_bytes());
        let packet = ipv4::build_packet(src, OUR_IP, proto, &icmp.to_bytes()).unwrap();
        EthernetFrame::new(OUR_MAC, ipv4::ROUTER_MAC, ETHERTYPE_IPV4, &packet).to_vec()
    }

    #[test]
    fn test_echo_request_checksum() {
        let bytes = IcmpHeader::echo_request(1234, 0).to_bytes();
        assert_eq!(bytes[0], 8);
        assert_eq!(bytes[1], 0);
        assert_eq!(read_u16(&bytes, 4), 1234);
        assert_eq!(read_u16(&bytes, 6), 0);
        // 0x0800 + 0x04D2 = 0x0CD2 -> 0xF32D
        assert_eq!(read_u16(&bytes, 2), 0xF32D);
        assert_eq!(checksum(&bytes), 0);
    }

    #[test]
    fn test_process_reply_correlation() {
        let frame = reply_frame(GOOGLE_DNS, protocol::ICMP, TYPE_ECHO_REPLY, 0, 2);

        assert!(process_reply(&frame, GOOGLE_DNS, 2));
        assert!(!process_reply(&frame, GOOGLE_DNS, 3));
        assert!(!process_reply(&frame, Ipv4Address::new(1, 1, 1, 1), 2));
        assert!(!process_reply(&frame, Ipv4Address::new(8, 8, 8, 9), 2));
    }

    #[test]
    fn test_process_reply_ignores_checksums() {
        let mut frame = reply_frame(GOOGLE_DNS, protocol::ICMP, TYPE_ECHO_REPLY, 0, 2);
        frame[14 + 10] ^= 0xFF;
        write_u16(&mut frame, 34 + 2, 0xDEAD);

        assert!(process_reply(&frame, GOOGLE_DNS, 2));
    }

    #[test]
    fn test_process_reply_rejects_other_messages() {
        let request = reply_frame(GOOGLE_DNS, protocol::ICMP, TYPE_ECHO_REQUEST, 0, 2);
        assert!(!process_reply(&request, GOOGLE_DNS, 2));

        let unreachable = reply_frame(GOOGLE_DNS, protocol::ICMP, 3, 1, 2);
        assert!(!process_reply(&unreachable, GOOGLE_DNS, 2));

        let odd_code = reply_frame(GOOGLE_DNS, protocol::ICMP, TYPE_ECHO_REPLY, 1, 2);
        assert!(!process_reply(&odd_code, GOOGLE_DNS, 2));

        let udp = reply_frame(GOOGLE_DNS, protocol::UDP, TYPE_ECHO_REPLY, 0, 2);
        assert!(!process_reply(&udp, GOOGLE_DNS, 2));
    }

    #[test]
    fn test_process_reply_bounds() {
        let frame = reply_frame(GOOGLE_DNS, protocol::ICMP, TYPE_ECHO_REPLY, 0, 2);

        // ICMP header cut short
        assert!(!process_reply(&frame[..frame.len() - 1], GOOGLE_DNS, 2));
        assert!(!process_reply(&frame[..20], GOOGLE_DNS, 2));
        assert!(!process_reply(&[], GOOGLE_DNS, 2));

        let mut not_ip = frame.clone();
        not_ip[12..14].copy_from_slice(&[0x86, 0xDD]);
        assert!(!process_reply(&not_ip, GOOGLE_DNS, 2));
    }

    #[test]
    fn test_send_ping() {
        let (device, handle) = QueueDevice::new(OUR_MAC);
        let mut iface = NetworkInterface::new("eth0", InterfaceKind::Ethernet);
        iface.attach(Box::new(device));
        iface.ip_addr = OUR_IP;

        send_ping(&mut iface, GOOGLE_DNS, 1234, 5).unwrap();

        let sent = handle.sent();
        assert_eq!(sent[0].len(), 14 + 20 + 8);
        assert_eq!(sent[0][14 + 9], protocol::ICMP);
        assert_eq!(read_u16(&sent[0], 34 + 6), 5);
    }

    #[test]
    fn test_echo_request_accepted_by_smoltcp() {
        use smoltcp::wire::{Icmpv4Message, Icmpv4Packet};

        let bytes = IcmpHeader::echo_request(1234, 7).to_bytes();
        let wire = Icmpv4Packet::new_checked(&bytes[..]).unwrap();

        assert!(wire.verify_checksum());
        assert_eq!(wire.msg_type(), Icmpv4Message::EchoRequest);
        assert_eq!(wire.echo_ident(), 1234);
        assert_eq!(wire.echo_seq_no(), 7);
    }
}
