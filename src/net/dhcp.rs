//! DHCP client
//!
//! Discovers an IPv4 configuration with a single broadcast DISCOVER and a
//! bounded wait for any matching reply (OFFER or ACK alike). The first reply
//! with our transaction id is taken as the lease. If none arrives within the
//! poll budget the interface gets a static fallback configuration, so both
//! paths end in [`DhcpState::Bound`].
//!
//! ```text
//!  Idle --start--> Discover --reply----> Bound (Leased)
//!                           \--timeout--> Bound (Fallback)
//! ```
//!
//! `Offer` and `Request` exist in [`DhcpState`] but are never entered; a
//! caller wanting the explicit four-message exchange can use
//! [`DhcpClient::send_request`] itself.
//!
//! Option 0 is treated as the one-byte pad of RFC 2132 and skipped without
//! a length byte; a plain type/length walk would read the next byte as its
//! length instead.
//!
//! Reference: RFC 2131 - <https://www.rfc-editor.org/rfc/rfc2131>

use super::endian::{read_u16, read_u32, write_u16, write_u32};
use super::error::NetError;
use super::ethernet::{self, MacAddress};
use super::interface::{DhcpState, NetworkInterface};
use super::ipv4::{self, Ipv4Address};
use super::udp::{self, UdpHeader};
use super::{port, protocol};
use crate::drivers::timer::{Clock, PollBudget, poll};
use alloc::vec;
use alloc::vec::Vec;
use log::{debug, info, warn};

/// BOOTREQUEST
pub const OP_REQUEST: u8 = 1;

/// BOOTREPLY
pub const OP_REPLY: u8 = 2;

pub const HTYPE_ETHERNET: u8 = 1;

/// Ask the server to broadcast its reply (we have no address yet)
pub const FLAG_BROADCAST: u16 = 0x8000;

pub const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

// Option codes
// Source: RFC 2132
pub const OPTION_PAD: u8 = 0;
pub const OPTION_SUBNET_MASK: u8 = 1;
pub const OPTION_ROUTER: u8 = 3;
pub const OPTION_DNS_SERVER: u8 = 6;
pub const OPTION_REQUESTED_IP: u8 = 50;
pub const OPTION_MESSAGE_TYPE: u8 = 53;
pub const OPTION_SERVER_ID: u8 = 54;
pub const OPTION_END: u8 = 255;

// DHCP message types (option 53)
pub const MESSAGE_DISCOVER: u8 = 1;
pub const MESSAGE_REQUEST: u8 = 3;

/// Size of the options area, cookie included
pub const OPTIONS_LEN: usize = 312;

/// Options after the cookie are only scanned up to this offset
pub const OPTION_SCAN_LIMIT: usize = 300;

/// DHCP message (BOOTP layout)
///
/// Total size: 548 bytes
/// - op, htype, hlen, hops: 1 byte each
/// - xid: 4 bytes
/// - secs, flags: 2 bytes each
/// - ciaddr, yiaddr, siaddr, giaddr: 4 bytes each
/// - chaddr: 16 bytes
/// - sname: 64 bytes (unused, zero)
/// - file: 128 bytes (unused, zero)
/// - options: 312 bytes, starting with the magic cookie
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DhcpMessage {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Address,
    pub yiaddr: Ipv4Address,
    pub siaddr: Ipv4Address,
    pub giaddr: Ipv4Address,
    pub chaddr: [u8; 16],
    pub options: [u8; OPTIONS_LEN],
}

impl DhcpMessage {
    /// Fixed part before the options area
    pub const FIXED_SIZE: usize = 236;

    pub const OPTIONS_SIZE: usize = OPTIONS_LEN;

    pub const SIZE: usize = Self::FIXED_SIZE + Self::OPTIONS_SIZE;

    /// Empty BOOTREQUEST from `mac` with the cookie in place
    pub fn new(xid: u32, mac: MacAddress) -> Self {
        let mut chaddr = [0u8; 16];
        chaddr[..6].copy_from_slice(mac.as_bytes());

        let mut options = [0u8; Self::OPTIONS_SIZE];
        options[..4].copy_from_slice(&MAGIC_COOKIE);

        Self {
            op: OP_REQUEST,
            htype: HTYPE_ETHERNET,
            hlen: 6,
            hops: 0,
            xid,
            secs: 0,
            flags: FLAG_BROADCAST,
            ciaddr: Ipv4Address::UNSPECIFIED,
            yiaddr: Ipv4Address::UNSPECIFIED,
            siaddr: Ipv4Address::UNSPECIFIED,
            giaddr: Ipv4Address::UNSPECIFIED,
            chaddr,
            options,
        }
    }

    /// DISCOVER: message type 1, nothing else
    pub fn discover(xid: u32, mac: MacAddress) -> Self {
        let mut msg = Self::new(xid, mac);
        msg.options[4..7].copy_from_slice(&[OPTION_MESSAGE_TYPE, 1, MESSAGE_DISCOVER]);
        msg.options[7] = OPTION_END;
        msg
    }

    /// REQUEST for `offered_ip` from the server identified by `server_ip`
    pub fn request(xid: u32, mac: MacAddress, offered_ip: Ipv4Address, server_ip: Ipv4Address) -> Self {
        let mut msg = Self::new(xid, mac);
        msg.options[4..7].copy_from_slice(&[OPTION_MESSAGE_TYPE, 1, MESSAGE_REQUEST]);
        msg.options[7..9].copy_from_slice(&[OPTION_REQUESTED_IP, 4]);
        msg.options[9..13].copy_from_slice(&offered_ip.0);
        msg.options[13..15].copy_from_slice(&[OPTION_SERVER_ID, 4]);
        msg.options[15..19].copy_from_slice(&server_ip.0);
        msg.options[19] = OPTION_END;
        msg
    }

    /// Parse a message from a UDP payload.
    ///
    /// The fixed 236-byte part must be present. A short options area is
    /// zero-filled, which the option scan reads as padding.
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.len() < Self::FIXED_SIZE {
            return None;
        }

        let addr = |offset: usize| {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&buffer[offset..offset + 4]);
            Ipv4Address(octets)
        };

        let mut chaddr = [0u8; 16];
        chaddr.copy_from_slice(&buffer[28..44]);

        let available = &buffer[Self::FIXED_SIZE..];
        let copied = available.len().min(Self::OPTIONS_SIZE);
        let mut options = [0u8; Self::OPTIONS_SIZE];
        options[..copied].copy_from_slice(&available[..copied]);

        Some(Self {
            op: buffer[0],
            htype: buffer[1],
            hlen: buffer[2],
            hops: buffer[3],
            xid: read_u32(buffer, 4),
            secs: read_u16(buffer, 8),
            flags: read_u16(buffer, 10),
            ciaddr: addr(12),
            yiaddr: addr(16),
            siaddr: addr(20),
            giaddr: addr(24),
            chaddr,
            options,
        })
    }

    /// Serialize to the full 548-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::SIZE];
        bytes[0] = self.op;
        bytes[1] = self.htype;
        bytes[2] = self.hlen;
        bytes[3] = self.hops;
        write_u32(&mut bytes, 4, self.xid);
        write_u16(&mut bytes, 8, self.secs);
        write_u16(&mut bytes, 10, self.flags);
        bytes[12..16].copy_from_slice(&self.ciaddr.0);
        bytes[16..20].copy_from_slice(&self.yiaddr.0);
        bytes[20..24].copy_from_slice(&self.siaddr.0);
        bytes[24..28].copy_from_slice(&self.giaddr.0);
        bytes[28..44].copy_from_slice(&self.chaddr);
        bytes[Self::FIXED_SIZE..].copy_from_slice(&self.options);
        bytes
    }

    /// TLV options following the magic cookie (the cookie itself is not checked)
    pub fn options(&self) -> DhcpOptions<'_> {
        DhcpOptions {
            data: &self.options[MAGIC_COOKIE.len()..],
            pos: 0,
        }
    }
}

/// Iterator over `(code, value)` option pairs.
///
/// Stops at the end option, at [`OPTION_SCAN_LIMIT`], or at an option whose
/// value runs past the buffer. Pad bytes are skipped.
pub struct DhcpOptions<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for DhcpOptions<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        loop {
            if self.pos >= OPTION_SCAN_LIMIT {
                return None;
            }

            let code = *data.get(self.pos)?;
            match code {
                OPTION_END => return None,
                OPTION_PAD => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let len = *data.get(self.pos + 1)? as usize;
            let start = self.pos + 2;
            let value = data.get(start..start + len)?;
            self.pos = start + len;
            return Some((code, value));
        }
    }
}

/// First four bytes of `value` as an address
fn first_address(value: &[u8]) -> Option<Ipv4Address> {
    let mut octets = [0u8; 4];
    octets.copy_from_slice(value.get(..4)?);
    Some(Ipv4Address(octets))
}

/// Static configuration applied when no server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackConfig {
    pub ip_addr: Ipv4Address,
    pub subnet_mask: Ipv4Address,
    pub gateway: Ipv4Address,
    pub dns_server: Ipv4Address,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            ip_addr: Ipv4Address::new(192, 168, 1, 100),
            subnet_mask: Ipv4Address::new(255, 255, 255, 0),
            gateway: Ipv4Address::new(192, 168, 1, 1),
            dns_server: Ipv4Address::new(8, 8, 8, 8),
        }
    }
}

/// How a completed `start` bound the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOutcome {
    /// A server replied; address and options came from it
    Leased,
    /// Poll budget exhausted; the fallback configuration was applied
    Fallback,
}

/// DHCP client bound to one transaction id
#[derive(Debug, Clone, Copy)]
pub struct DhcpClient {
    xid: u32,
}

impl DhcpClient {
    pub const fn new(xid: u32) -> Self {
        Self { xid }
    }

    pub fn xid(&self) -> u32 {
        self.xid
    }

    /// Broadcast a DISCOVER from port 68 to 255.255.255.255:67
    pub fn send_discover(&self, iface: &mut NetworkInterface) -> Result<(), NetError> {
        debug!("[DHCP] {}: sending DISCOVER (xid 0x{:08X})", iface.name, self.xid);
        let msg = DhcpMessage::discover(self.xid, iface.mac_addr);
        Self::broadcast(iface, &msg)
    }

    /// Broadcast a REQUEST for `offered_ip`.
    ///
    /// Not used by [`start`](Self::start); available for an explicit
    /// DISCOVER/OFFER/REQUEST/ACK exchange.
    pub fn send_request(
        &self,
        iface: &mut NetworkInterface,
        offered_ip: Ipv4Address,
        server_ip: Ipv4Address,
    ) -> Result<(), NetError> {
        debug!(
            "[DHCP] {}: sending REQUEST for {} to server {}",
            iface.name, offered_ip, server_ip
        );
        let msg = DhcpMessage::request(self.xid, iface.mac_addr, offered_ip, server_ip);
        Self::broadcast(iface, &msg)
    }

    fn broadcast(iface: &mut NetworkInterface, msg: &DhcpMessage) -> Result<(), NetError> {
        udp::send_packet(
            iface,
            Ipv4Address::BROADCAST,
            port::DHCP_CLIENT,
            port::DHCP_SERVER,
            &msg.to_bytes(),
        )
    }

    /// Apply `frame` to `iface` if it is a reply to our transaction.
    ///
    /// Accepts any IPv4/UDP frame to port 68 carrying op 2 and our xid; IP
    /// checksum and DHCP message type are not checked. On a match the
    /// offered address and options 1, 3 and 6 are copied into the interface.
    pub fn process_response(&self, iface: &mut NetworkInterface, frame: &[u8]) -> bool {
        let Some((ip_header, payload)) = ipv4::peek_packet(frame) else {
            return false;
        };
        if ip_header.protocol != protocol::UDP {
            return false;
        }

        let Some(udp_header) = UdpHeader::parse(payload) else {
            return false;
        };
        if udp_header.dest_port != port::DHCP_CLIENT {
            return false;
        }

        let Some(msg) = DhcpMessage::parse(&payload[UdpHeader::SIZE..]) else {
            return false;
        };
        if msg.op != OP_REPLY || msg.xid != self.xid {
            return false;
        }

        iface.ip_addr = msg.yiaddr;
        for (code, value) in msg.options() {
            match code {
                OPTION_SUBNET_MASK if value.len() == 4 => {
                    if let Some(mask) = first_address(value) {
                        iface.subnet_mask = mask;
                    }
                }
                OPTION_ROUTER => {
                    if let Some(gateway) = first_address(value) {
                        iface.gateway = gateway;
                    }
                }
                OPTION_DNS_SERVER => {
                    if let Some(dns) = first_address(value) {
                        iface.dns_server = dns;
                    }
                }
                _ => {}
            }
        }

        debug!(
            "[DHCP] {}: reply from {} offers {}",
            iface.name, ip_header.src_ip, msg.yiaddr
        );
        true
    }

    /// Run discovery on `iface` and bind it.
    ///
    /// The caller checks that the link is Up. Sets the DHCP state to
    /// Discover, broadcasts a DISCOVER, then polls inbound frames within
    /// `budget`. Either way the interface ends Bound; the outcome says which
    /// configuration it got.
    ///
    /// # Errors
    ///
    /// Only a failed DISCOVER send is an error. The state is left at
    /// Discover and no fallback is applied.
    pub fn start(
        &self,
        iface: &mut NetworkInterface,
        clock: &mut dyn Clock,
        budget: PollBudget,
        fallback: &FallbackConfig,
    ) -> Result<DhcpOutcome, NetError> {
        iface.dhcp_state = DhcpState::Discover;

        if let Err(e) = self.send_discover(iface) {
            warn!("[DHCP] {}: DISCOVER failed: {}", iface.name, e);
            return Err(e);
        }

        let replied = poll(clock, budget, |_| {
            let frame = ethernet::receive_frame(iface).ok()?;
            self.process_response(iface, &frame).then_some(())
        });

        let outcome = match replied {
            Some(()) => {
                info!("[DHCP] {}: bound to {}", iface.name, iface.ip_addr);
                DhcpOutcome::Leased
            }
            None => {
                iface.configure(
                    fallback.ip_addr,
                    fallback.subnet_mask,
                    fallback.gateway,
                    fallback.dns_server,
                );
                warn!(
                    "[DHCP] {}: no reply after {} ms, using fallback {}",
                    iface.name,
                    budget.total_us() / 1000,
                    iface.ip_addr
                );
                DhcpOutcome::Fallback
            }
        };

        iface.dhcp_state = DhcpState::Bound;
        Ok(outcome)
    }
}
