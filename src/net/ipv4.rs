//! IPv4 layer
//!
//! Builds and parses the fixed 20-byte IPv4 header (no options, no
//! fragmentation) and moves packets through the Ethernet layer.
//!
//! ## Header Layout
//!
//! ```text
//!  0      1      2      3
//! +------+------+-------------+
//! | 0x45 | TOS  | total length|
//! +------+------+-------------+
//! | identification | flags/frag |
//! +------+------+-------------+
//! | TTL  | proto|  checksum   |
//! +------+------+-------------+
//! |      source address       |
//! +---------------------------+
//! |    destination address    |
//! +---------------------------+
//! ```
//!
//! ## Destination MAC Selection
//!
//! There is no ARP. The limited broadcast address 255.255.255.255 goes to the
//! broadcast MAC; every other destination goes to [`ROUTER_MAC`], the fixed
//! address of the virtual router in front of the machine. This is a known
//! limitation: hosts on the local segment are only reachable through it.
//!
//! Reference: RFC 791 - <https://www.rfc-editor.org/rfc/rfc791>

use super::checksum::fill_checksum;
use super::endian::{read_u16, write_u16};
use super::error::NetError;
use super::ethernet::{self, ETHERTYPE_IPV4, EthernetFrame, MacAddress};
use super::interface::NetworkInterface;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use log::{debug, warn};

/// IPv4 address
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct Ipv4Address(pub [u8; 4]);

impl Ipv4Address {
    /// 0.0.0.0
    pub const UNSPECIFIED: Self = Self([0, 0, 0, 0]);

    /// 255.255.255.255
    pub const BROADCAST: Self = Self([255, 255, 255, 255]);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self([a, b, c, d])
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }
}

impl From<[u8; 4]> for Ipv4Address {
    fn from(octets: [u8; 4]) -> Self {
        Self(octets)
    }
}

/// Parse a dotted quad: exactly four decimal octets, each 0-255
impl FromStr for Ipv4Address {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let mut parts = s.split('.');

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or(NetError::InvalidAddress)?;
            if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(NetError::InvalidAddress);
            }
            *octet = part.parse().map_err(|_| NetError::InvalidAddress)?;
        }

        if parts.next().is_some() {
            return Err(NetError::InvalidAddress);
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Version 4, IHL 5 (20 bytes)
pub const VERSION_IHL: u8 = 0x45;

/// Every packet we send carries this identification value
pub const IDENTIFICATION: u16 = 0x1234;

/// Don't Fragment
pub const FLAG_DONT_FRAGMENT: u16 = 0x4000;

pub const DEFAULT_TTL: u8 = 64;

/// Virtual router MAC used for every non-broadcast destination
pub const ROUTER_MAC: MacAddress = MacAddress::new([0x52, 0x54, 0x00, 0x12, 0x35, 0x00]);

/// IPv4 header without options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version_ihl: u8,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_ip: Ipv4Address,
    pub dest_ip: Ipv4Address,
}

impl Ipv4Header {
    /// Size of the header in bytes
    pub const SIZE: usize = 20;

    /// Header for an outgoing packet, checksum already filled in
    pub fn new(protocol: u8, src_ip: Ipv4Address, dest_ip: Ipv4Address, payload_len: u16) -> Self {
        let mut header = Self {
            version_ihl: VERSION_IHL,
            tos: 0,
            total_length: (Self::SIZE as u16).saturating_add(payload_len),
            identification: IDENTIFICATION,
            flags_fragment: FLAG_DONT_FRAGMENT,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_ip,
            dest_ip,
        };
        header.checksum = header.compute_checksum();
        header
    }

    /// Parse the first 20 bytes of `buffer`
    ///
    /// Returns None if the buffer is too short. Nothing is validated.
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::SIZE {
            return None;
        }

        let mut src = [0u8; 4];
        src.copy_from_slice(&buffer[12..16]);
        let mut dest = [0u8; 4];
        dest.copy_from_slice(&buffer[16..20]);

        Some(Self {
            version_ihl: buffer[0],
            tos: buffer[1],
            total_length: read_u16(buffer, 2),
            identification: read_u16(buffer, 4),
            flags_fragment: read_u16(buffer, 6),
            ttl: buffer[8],
            protocol: buffer[9],
            checksum: read_u16(buffer, 10),
            src_ip: Ipv4Address(src),
            dest_ip: Ipv4Address(dest),
        })
    }

    /// Serialize, including the current checksum field
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.version_ihl;
        bytes[1] = self.tos;
        write_u16(&mut bytes, 2, self.total_length);
        write_u16(&mut bytes, 4, self.identification);
        write_u16(&mut bytes, 6, self.flags_fragment);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol;
        write_u16(&mut bytes, 10, self.checksum);
        bytes[12..16].copy_from_slice(&self.src_ip.0);
        bytes[16..20].copy_from_slice(&self.dest_ip.0);
        bytes
    }

    /// Checksum of this header with the checksum field taken as zero
    pub fn compute_checksum(&self) -> u16 {
        let mut bytes = self.to_bytes();
        fill_checksum(&mut bytes, 10);
        read_u16(&bytes, 10)
    }

    pub fn checksum_valid(&self) -> bool {
        self.compute_checksum() == self.checksum
    }

    /// Payload length claimed by the header
    pub fn payload_len(&self) -> usize {
        (self.total_length as usize).saturating_sub(Self::SIZE)
    }
}

/// Destination MAC by convention: broadcast or the virtual router
pub fn resolve_mac(dest_ip: Ipv4Address) -> MacAddress {
    if dest_ip.is_broadcast() {
        MacAddress::broadcast()
    } else {
        ROUTER_MAC
    }
}

/// Header followed by `payload` in one buffer
///
/// Fails with `PayloadTooLarge` when the total length does not fit the
/// 16-bit length field; the Ethernet layer enforces the tighter MTU.
pub fn build_packet(
    src_ip: Ipv4Address,
    dest_ip: Ipv4Address,
    protocol: u8,
    payload: &[u8],
) -> Result<Vec<u8>, NetError> {
    let payload_len = u16::try_from(payload.len())
        .ok()
        .filter(|len| *len as usize <= u16::MAX as usize - Ipv4Header::SIZE)
        .ok_or(NetError::PayloadTooLarge)?;

    let header = Ipv4Header::new(protocol, src_ip, dest_ip, payload_len);

    let mut packet = Vec::with_capacity(Ipv4Header::SIZE + payload.len());
    packet.extend_from_slice(&header.to_bytes());
    packet.extend_from_slice(payload);
    Ok(packet)
}

/// Send `payload` to `dest_ip` with the given IP protocol number.
///
/// Source address is the interface's configured address (0.0.0.0 before
/// DHCP binds, which is what a DISCOVER needs).
pub fn send_packet(
    iface: &mut NetworkInterface,
    dest_ip: Ipv4Address,
    protocol: u8,
    payload: &[u8],
) -> Result<(), NetError> {
    let packet = build_packet(iface.ip_addr, dest_ip, protocol, payload)?;
    let dest_mac = resolve_mac(dest_ip);

    debug!(
        "[IP] {} -> {} proto {} via {} ({} bytes)",
        iface.ip_addr,
        dest_ip,
        protocol,
        dest_mac,
        packet.len()
    );

    ethernet::send_frame(iface, dest_mac, ETHERTYPE_IPV4, &packet)
}

/// Receive one IPv4 packet: header and `total_length - 20` bytes of payload.
///
/// # Errors
///
/// Everything [`ethernet::receive_frame`] reports, plus whatever
/// [`parse_packet`] rejects.
pub fn receive_packet(iface: &mut NetworkInterface) -> Result<(Ipv4Header, Vec<u8>), NetError> {
    let frame = ethernet::receive_frame(iface)?;
    parse_packet(&frame)
}

/// Split a raw Ethernet frame into a verified IPv4 header and its payload.
///
/// # Errors
///
/// - `Truncated` - frame or packet shorter than its headers/length field
/// - `EthertypeMismatch` - not an IPv4 frame
/// - `ChecksumMismatch` - header checksum does not verify
pub fn parse_packet(frame: &[u8]) -> Result<(Ipv4Header, Vec<u8>), NetError> {
    let eth = EthernetFrame::parse(frame).ok_or(NetError::Truncated)?;
    if eth.ethertype != ETHERTYPE_IPV4 {
        return Err(NetError::EthertypeMismatch);
    }

    let header = Ipv4Header::parse(eth.payload).ok_or(NetError::Truncated)?;
    if !header.checksum_valid() {
        warn!(
            "[IP] checksum mismatch from {}: got 0x{:04X}, expected 0x{:04X}",
            header.src_ip,
            header.checksum,
            header.compute_checksum()
        );
        return Err(NetError::ChecksumMismatch);
    }

    let total = header.total_length as usize;
    if total < Ipv4Header::SIZE || total > eth.payload.len() {
        return Err(NetError::Truncated);
    }

    Ok((header, eth.payload[Ipv4Header::SIZE..total].to_vec()))
}

/// Borrowing, non-verifying view of an IPv4 frame for reply matching.
///
/// Checks only the EtherType and that a full header is present; the checksum
/// is not verified. The payload is bounded by both the length field and the
/// bytes actually received.
pub fn peek_packet(frame: &[u8]) -> Option<(Ipv4Header, &[u8])> {
    let eth = EthernetFrame::parse(frame)?;
    if eth.ethertype != ETHERTYPE_IPV4 {
        return None;
    }

    let header = Ipv4Header::parse(eth.payload)?;
    let end = (header.total_length as usize)
        .max(Ipv4Header::SIZE)
        .min(eth.payload.len());
    Some((header, &eth.payload[Ipv4Header::SIZE..end]))
}
