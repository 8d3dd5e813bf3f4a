//! UDP (User Datagram Protocol) layer
//!
//! 8-byte header on top of IPv4. The checksum field is always sent as zero
//! (RFC 768 allows "no checksum" over IPv4) and is never validated on receive.
//!
//! Reference: RFC 768 - <https://www.rfc-editor.org/rfc/rfc768>

use super::endian::{read_u16, write_u16};
use super::error::NetError;
use super::interface::NetworkInterface;
use super::ipv4::{self, Ipv4Address};
use super::protocol;
use alloc::vec::Vec;
use log::trace;

/// UDP header
///
/// Total size: 8 bytes
/// - Source port: 2 bytes
/// - Destination port: 2 bytes
/// - Length: 2 bytes (header + payload)
/// - Checksum: 2 bytes (0 = not computed)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dest_port: u16,
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    /// Size of a UDP header in bytes
    pub const SIZE: usize = 8;

    /// Header for `payload_len` bytes of data, checksum left zero
    pub fn new(src_port: u16, dest_port: u16, payload_len: u16) -> Self {
        Self {
            src_port,
            dest_port,
            length: (Self::SIZE as u16).saturating_add(payload_len),
            checksum: 0,
        }
    }

    /// Parse a header from the start of `buffer`
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            src_port: read_u16(buffer, 0),
            dest_port: read_u16(buffer, 2),
            length: read_u16(buffer, 4),
            checksum: read_u16(buffer, 6),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        write_u16(&mut bytes, 0, self.src_port);
        write_u16(&mut bytes, 2, self.dest_port);
        write_u16(&mut bytes, 4, self.length);
        write_u16(&mut bytes, 6, self.checksum);
        bytes
    }
}

/// Header followed by `data`
pub fn build_datagram(src_port: u16, dest_port: u16, data: &[u8]) -> Result<Vec<u8>, NetError> {
    let data_len = u16::try_from(data.len())
        .ok()
        .filter(|len| *len as usize <= u16::MAX as usize - UdpHeader::SIZE)
        .ok_or(NetError::PayloadTooLarge)?;

    let header = UdpHeader::new(src_port, dest_port, data_len);

    let mut datagram = Vec::with_capacity(UdpHeader::SIZE + data.len());
    datagram.extend_from_slice(&header.to_bytes());
    datagram.extend_from_slice(data);
    Ok(datagram)
}

/// Send `data` from `src_port` to `dest_ip:dest_port`
pub fn send_packet(
    iface: &mut NetworkInterface,
    dest_ip: Ipv4Address,
    src_port: u16,
    dest_port: u16,
    data: &[u8],
) -> Result<(), NetError> {
    let datagram = build_datagram(src_port, dest_port, data)?;

    trace!(
        "[UDP] :{} -> {}:{} ({} bytes)",
        src_port,
        dest_ip,
        dest_port,
        data.len()
    );

    ipv4::send_packet(iface, dest_ip, protocol::UDP, &datagram)
}

/// Receive one UDP datagram: header and `length - 8` bytes of data.
///
/// # Errors
///
/// Everything [`ipv4::receive_packet`] reports, plus `ProtocolMismatch` for
/// non-UDP packets and `Truncated` when the length field is out of range.
pub fn receive_packet(iface: &mut NetworkInterface) -> Result<(UdpHeader, Vec<u8>), NetError> {
    let (ip_header, payload) = ipv4::receive_packet(iface)?;
    if ip_header.protocol != protocol::UDP {
        return Err(NetError::ProtocolMismatch);
    }

    let (header, data) = parse_datagram(&payload)?;
    Ok((header, data.to_vec()))
}

/// Split an IP payload into UDP header and data
pub fn parse_datagram(buffer: &[u8]) -> Result<(UdpHeader, &[u8]), NetError> {
    let header = UdpHeader::parse(buffer).ok_or(NetError::Truncated)?;

    let length = header.length as usize;
    if length < UdpHeader::SIZE || length > buffer.len() {
        return Err(NetError::Truncated);
    }

    Ok((header, &buffer[UdpHeader::SIZE..length]))
}
