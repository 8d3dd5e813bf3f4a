//! Network interface record
//!
//! One `NetworkInterface` per logical link (loopback, Ethernet, Wi-Fi). It is
//! the shared configuration and state container that every protocol layer
//! reads (own MAC, own address, DNS server) and that the DHCP client and the
//! static-configuration calls mutate.
//!
//! An interface is hardware-backed when a [`LinkDevice`] is attached. Send and
//! receive come from the same device, so an interface can either do both or
//! neither.

use super::ethernet::MacAddress;
use super::ipv4::Ipv4Address;
use crate::drivers::netdev::LinkDevice;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Interface link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Up,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Down => "DOWN",
            LinkState::Up => "UP",
            LinkState::Connecting => "CONNECTING",
            LinkState::Connected => "CONNECTED",
            LinkState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// DHCP client state of an interface
///
/// Models the classic four-message exchange. The client only ever moves
/// `Idle -> Discover -> Bound`; `Offer` and `Request` are reserved and no code
/// path enters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpState {
    Idle,
    Discover,
    Offer,
    Request,
    Bound,
}

impl fmt::Display for DhcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DhcpState::Idle => "Disabled",
            DhcpState::Discover => "Discovering...",
            DhcpState::Offer => "Offer received",
            DhcpState::Request => "Requesting...",
            DhcpState::Bound => "Bound",
        };
        f.write_str(s)
    }
}

/// Kind of link behind an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Ethernet,
    Wifi,
    Loopback,
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterfaceKind::Ethernet => "Ethernet",
            InterfaceKind::Wifi => "WiFi",
            InterfaceKind::Loopback => "Loopback",
        };
        f.write_str(s)
    }
}

/// Per-interface traffic counters, maintained by the Ethernet layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub tx_frames: u64,
    pub tx_bytes: u64,
    pub tx_errors: u64,
    pub rx_frames: u64,
    pub rx_bytes: u64,
    pub rx_errors: u64,
}

pub struct NetworkInterface {
    pub name: String,
    pub kind: InterfaceKind,
    pub state: LinkState,
    pub mac_addr: MacAddress,
    pub ip_addr: Ipv4Address,
    pub subnet_mask: Ipv4Address,
    pub gateway: Ipv4Address,
    pub dns_server: Ipv4Address,
    pub dhcp_state: DhcpState,
    pub stats: InterfaceStats,
    pub(crate) device: Option<Box<dyn LinkDevice + Send>>,
}

impl NetworkInterface {
    /// Create an interface with no address configuration and no link device.
    ///
    /// Link state starts Down, DHCP Idle. Until a device is attached the MAC
    /// address is derived from the name, so every interface has a stable one.
    pub fn new(name: &str, kind: InterfaceKind) -> Self {
        Self {
            name: String::from(name),
            kind,
            state: LinkState::Down,
            mac_addr: Self::mac_from_name(name),
            ip_addr: Ipv4Address::UNSPECIFIED,
            subnet_mask: Ipv4Address::UNSPECIFIED,
            gateway: Ipv4Address::UNSPECIFIED,
            dns_server: Ipv4Address::UNSPECIFIED,
            dhcp_state: DhcpState::Idle,
            stats: InterfaceStats::default(),
            device: None,
        }
    }

    /// Placeholder MAC: byte `i` is `name[0] + name[1] + 17 * i` (wrapping)
    fn mac_from_name(name: &str) -> MacAddress {
        let bytes = name.as_bytes();
        let seed = bytes
            .first()
            .copied()
            .unwrap_or(0)
            .wrapping_add(bytes.get(1).copied().unwrap_or(0));

        let mut mac = [0u8; 6];
        for (i, byte) in mac.iter_mut().enumerate() {
            *byte = seed.wrapping_add((i as u8).wrapping_mul(17));
        }
        MacAddress(mac)
    }

    /// Attach a link device and adopt its hardware address
    ///
    /// Replaces any previously attached device. Link state is left alone.
    pub fn attach(&mut self, device: Box<dyn LinkDevice + Send>) {
        self.mac_addr = device.mac_address();
        self.device = Some(device);
    }

    /// Remove the link device, leaving the interface unable to transmit
    pub fn detach(&mut self) -> Option<Box<dyn LinkDevice + Send>> {
        self.device.take()
    }

    /// Whether a link device backs this interface
    pub fn has_link(&self) -> bool {
        self.device.is_some()
    }

    /// Whether an IPv4 address has been configured
    pub fn has_address(&self) -> bool {
        !self.ip_addr.is_unspecified()
    }

    /// Apply an address configuration in one step
    pub fn configure(
        &mut self,
        ip_addr: Ipv4Address,
        subnet_mask: Ipv4Address,
        gateway: Ipv4Address,
        dns_server: Ipv4Address,
    ) {
        self.ip_addr = ip_addr;
        self.subnet_mask = subnet_mask;
        self.gateway = gateway;
        self.dns_server = dns_server;
    }
}

impl fmt::Debug for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkInterface")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("mac_addr", &self.mac_addr)
            .field("ip_addr", &self.ip_addr)
            .field("subnet_mask", &self.subnet_mask)
            .field("gateway", &self.gateway)
            .field("dns_server", &self.dns_server)
            .field("dhcp_state", &self.dhcp_state)
            .field("has_link", &self.has_link())
            .finish()
    }
}

/// ifconfig-style configuration block
impl fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} ({})", self.name, self.state, self.kind)?;
        writeln!(f, "  IP Address: {}", self.ip_addr)?;
        writeln!(f, "  Subnet Mask: {}", self.subnet_mask)?;
        writeln!(f, "  Gateway: {}", self.gateway)?;
        writeln!(f, "  DNS Server: {}", self.dns_server)?;
        writeln!(f, "  MAC Address: {}", self.mac_addr)?;
        write!(f, "  DHCP: {}", self.dhcp_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::net::queue::QueueDevice;
    use alloc::string::ToString;

    #[test]
    fn test_new_interface_defaults() {
        let iface = NetworkInterface::new("eth0", InterfaceKind::Ethernet);
        assert_eq!(iface.state, LinkState::Down);
        assert_eq!(iface.dhcp_state, DhcpState::Idle);
        assert!(!iface.has_link());
        assert!(!iface.has_address());
        assert_eq!(iface.dns_server, Ipv4Address::UNSPECIFIED);
    }

    #[test]
    fn test_mac_derived_from_name() {
        // 'e' + 't' = 0x65 + 0x74 = 0xD9
        let iface = NetworkInterface::new("eth0", InterfaceKind::Ethernet);
        assert_eq!(
            iface.mac_addr,
            MacAddress::new([0xD9, 0xEA, 0xFB, 0x0C, 0x1D, 0x2E])
        );

        // Single-character names use 0 for the missing second byte
        let short = NetworkInterface::new("x", InterfaceKind::Ethernet);
        assert_eq!(short.mac_addr.0[0], b'x');
    }

    #[test]
    fn test_attach_adopts_device_mac() {
        let mac = MacAddress::new([0x08, 0x00, 0x27, 0x01, 0x02, 0x03]);
        let (device, _handle) = QueueDevice::new(mac);
        let mut iface = NetworkInterface::new("eth0", InterfaceKind::Ethernet);

        iface.attach(Box::new(device));
        assert!(iface.has_link());
        assert_eq!(iface.mac_addr, mac);

        assert!(iface.detach().is_some());
        assert!(!iface.has_link());
    }

    #[test]
    fn test_display_config_block() {
        let mut iface = NetworkInterface::new("eth0", InterfaceKind::Ethernet);
        iface.state = LinkState::Up;
        iface.dhcp_state = DhcpState::Bound;
        iface.configure(
            Ipv4Address::new(192, 168, 1, 50),
            Ipv4Address::new(255, 255, 255, 0),
            Ipv4Address::new(192, 168, 1, 1),
            Ipv4Address::new(8, 8, 8, 8),
        );

        let text = iface.to_string();
        assert!(text.starts_with("eth0: UP (Ethernet)\n"));
        assert!(text.contains("  IP Address: 192.168.1.50\n"));
        assert!(text.contains("  Gateway: 192.168.1.1\n"));
        assert!(text.contains("  MAC Address: D9:EA:FB:0C:1D:2E\n"));
        assert!(text.ends_with("  DHCP: Bound"));
    }
}
