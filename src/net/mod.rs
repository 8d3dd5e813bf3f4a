//! Network protocol implementations
//!
//! Layers, leaf-first:
//! - `checksum`, `endian`: RFC 1071 checksum and big-endian field access
//! - `ethernet`: MAC addresses and Ethernet II framing over a link device
//! - `ipv4`: fixed 20-byte IPv4 header, send/receive over Ethernet
//! - `udp`: 8-byte UDP header over IPv4
//! - `dhcp`, `dns`, `icmp`: client logic on top of UDP and IPv4
//! - `interface`: the per-link configuration record every layer mutates
//! - `stack`: interface registry, counters and the process-wide stack

pub mod checksum;
pub mod dhcp;
pub mod dns;
pub mod endian;
pub mod error;
pub mod ethernet;
pub mod icmp;
pub mod interface;
pub mod ipv4;
pub mod stack;
pub mod udp;

// Re-export commonly used types
pub use dhcp::{DhcpClient, DhcpMessage, DhcpOutcome, FallbackConfig};
pub use dns::DnsClient;
pub use error::NetError;
pub use ethernet::{ETHERTYPE_IPV4, EthernetFrame, MacAddress};
pub use interface::{DhcpState, InterfaceKind, InterfaceStats, LinkState, NetworkInterface};
pub use ipv4::{Ipv4Address, Ipv4Header};
pub use stack::{NET_STACK, NetStack, PingReply, PingReport, ProtocolStats, StackConfig};
pub use udp::UdpHeader;

/// IP protocol numbers carried in the IPv4 header
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const UDP: u8 = 17;
}

/// Well-known UDP ports used by the clients
pub mod port {
    pub const DHCP_SERVER: u16 = 67;
    pub const DHCP_CLIENT: u16 = 68;
    pub const DNS: u16 = 53;
}
