//! Ethernet frame handling
//!
//! Provides data structures and utilities for working with Ethernet II frames,
//! plus the two link-facing operations of the stack: [`send_frame`] and
//! [`receive_frame`]. Both go through the interface's [`LinkDevice`].
//!
//! [`LinkDevice`]: crate::drivers::netdev::LinkDevice

use super::error::NetError;
use super::interface::NetworkInterface;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use log::{debug, trace};

/// 48-bit MAC (Media Access Control) address
///
/// Represents a unique hardware address for Ethernet network interfaces.
/// Format: 6 bytes, typically displayed as XX:XX:XX:XX:XX:XX in hexadecimal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Create a new MAC address from 6 bytes
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
    pub const fn broadcast() -> Self {
        Self([0xFF; 6])
    }

    /// Zero MAC address (00:00:00:00:00:00)
    pub const fn zero() -> Self {
        Self([0x00; 6])
    }

    /// Check if this is a broadcast address
    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xFF; 6]
    }

    /// Check if this is a multicast address (bit 0 of first byte is 1)
    pub fn is_multicast(&self) -> bool {
        (self.0[0] & 0x01) != 0
    }

    /// Get the bytes of this MAC address
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

/// Parse a MAC address from a colon-separated hex string
///
/// Example: "52:54:00:12:35:00"
impl FromStr for MacAddress {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');

        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(())?;
            if part.len() != 2 {
                return Err(());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ())?;
        }

        if parts.next().is_some() {
            return Err(());
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Ethernet II frame
///
/// Standard Ethernet frame format:
/// - Destination MAC (6 bytes)
/// - Source MAC (6 bytes)
/// - EtherType (2 bytes, big-endian)
/// - Payload (0-1500 bytes; no minimum-size padding is added)
pub struct EthernetFrame<'a> {
    pub dest_mac: MacAddress,
    pub src_mac: MacAddress,
    pub ethertype: u16,
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Maximum frame size (excluding CRC): 14 byte header + 1500 byte max payload
    pub const MAX_FRAME_SIZE: usize = 1514;

    /// Ethernet header size: dest MAC (6) + src MAC (6) + ethertype (2)
    pub const HEADER_SIZE: usize = 14;

    /// Maximum payload size (MTU)
    pub const MAX_PAYLOAD_SIZE: usize = 1500;

    /// Create a new Ethernet frame
    pub fn new(
        dest_mac: MacAddress,
        src_mac: MacAddress,
        ethertype: u16,
        payload: &'a [u8],
    ) -> Self {
        Self {
            dest_mac,
            src_mac,
            ethertype,
            payload,
        }
    }

    /// Parse an Ethernet frame from raw bytes
    ///
    /// Returns None if the buffer is shorter than the header. The payload is
    /// everything after the header; its contents are not validated.
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < Self::HEADER_SIZE {
            return None;
        }

        let mut dest_bytes = [0u8; 6];
        dest_bytes.copy_from_slice(&buffer[0..6]);

        let mut src_bytes = [0u8; 6];
        src_bytes.copy_from_slice(&buffer[6..12]);

        Some(Self {
            dest_mac: MacAddress(dest_bytes),
            src_mac: MacAddress(src_bytes),
            ethertype: u16::from_be_bytes([buffer[12], buffer[13]]),
            payload: &buffer[Self::HEADER_SIZE..],
        })
    }

    /// Write this frame to a buffer
    ///
    /// Returns the number of bytes written, or None if the buffer is too small.
    pub fn write_to(&self, buffer: &mut [u8]) -> Option<usize> {
        let total_size = self.size();
        if buffer.len() < total_size {
            return None;
        }

        buffer[0..6].copy_from_slice(&self.dest_mac.0);
        buffer[6..12].copy_from_slice(&self.src_mac.0);
        buffer[12..14].copy_from_slice(&self.ethertype.to_be_bytes());
        buffer[Self::HEADER_SIZE..total_size].copy_from_slice(self.payload);

        Some(total_size)
    }

    /// Serialize into a freshly allocated buffer of exactly `size()` bytes
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.size()];
        // Buffer is sized from self.size(), write_to cannot fail
        let _ = self.write_to(&mut buffer);
        buffer
    }

    /// Get the total size of this frame when serialized
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }
}

// EtherType constants
// Source: IEEE 802 Numbers
// <https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml>

/// IPv4 protocol
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// ARP (recognized on the wire, not implemented)
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// Send `payload` to `dest_mac` through the interface's link device.
///
/// The frame is `14 + payload.len()` bytes: destination, the interface's own
/// MAC as source, `ethertype`, payload.
///
/// # Errors
///
/// - `PayloadTooLarge` - payload longer than 1500 bytes (never truncated here)
/// - `NoLinkCapability` - interface has no link device
/// - `Device(_)` - the device refused the frame
pub fn send_frame(
    iface: &mut NetworkInterface,
    dest_mac: MacAddress,
    ethertype: u16,
    payload: &[u8],
) -> Result<(), NetError> {
    if payload.len() > EthernetFrame::MAX_PAYLOAD_SIZE {
        return Err(NetError::PayloadTooLarge);
    }

    let device = iface.device.as_mut().ok_or(NetError::NoLinkCapability)?;
    let frame = EthernetFrame::new(dest_mac, iface.mac_addr, ethertype, payload).to_vec();

    trace!(
        "[ETH] {} -> {} type 0x{:04X} ({} bytes)",
        iface.mac_addr,
        dest_mac,
        ethertype,
        payload.len()
    );

    match device.transmit(&frame) {
        Ok(()) => {
            iface.stats.tx_frames += 1;
            iface.stats.tx_bytes += frame.len() as u64;
            Ok(())
        }
        Err(e) => {
            iface.stats.tx_errors += 1;
            debug!("[ETH] {}: transmit failed: {}", iface.name, e);
            Err(e.into())
        }
    }
}

/// Receive one frame from the interface's link device.
///
/// Returns exactly the bytes the device delivered. No format validation
/// happens here; callers parse with [`EthernetFrame::parse`].
///
/// # Errors
///
/// - `NoLinkCapability` - interface has no link device
/// - `NoFrame` - nothing queued right now
/// - `Device(_)` - the device reported a failure
pub fn receive_frame(iface: &mut NetworkInterface) -> Result<Vec<u8>, NetError> {
    let device = iface.device.as_mut().ok_or(NetError::NoLinkCapability)?;

    let mut buffer = [0u8; EthernetFrame::MAX_FRAME_SIZE];
    let len = match device.receive(&mut buffer) {
        Ok(0) => return Err(NetError::NoFrame),
        Ok(len) => len.min(buffer.len()),
        Err(e) => {
            iface.stats.rx_errors += 1;
            return Err(e.into());
        }
    };

    iface.stats.rx_frames += 1;
    iface.stats.rx_bytes += len as u64;
    Ok(buffer[..len].to_vec())
}
