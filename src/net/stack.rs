//! Network stack instance
//!
//! `NetStack` owns the interface table, the protocol clients and their
//! counters, and the clock that paces every poll loop. The kernel uses the
//! global [`NET_STACK`]; tests build their own instances so that transaction
//! ids and query ids never leak between them.
//!
//! All operations are synchronous. A DHCP start or a ping blocks the caller
//! until its poll budget is spent or a reply matches.

use super::dhcp::{DhcpClient, DhcpOutcome, FallbackConfig};
use super::dns::DnsClient;
use super::error::NetError;
use super::ethernet;
use super::icmp;
use super::interface::{DhcpState, InterfaceKind, LinkState, NetworkInterface};
use super::ipv4::Ipv4Address;
use crate::drivers::netdev::LinkDevice;
use crate::drivers::timer::{Clock, PollBudget, SpinClock, poll};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use lazy_static::lazy_static;
use log::{info, warn};
use spin::Mutex;

/// Size of the interface table
pub const MAX_INTERFACES: usize = 4;

lazy_static! {
    /// Global network stack with `lo`, `eth0` and `wlan0` registered.
    ///
    /// Attach link devices with `NET_STACK.lock().attach_device(...)`.
    ///
    /// Poll budgets start out on an uncalibrated [`SpinClock`]; a kernel with
    /// a real timer installs it with `NET_STACK.lock().set_clock(...)`.
    pub static ref NET_STACK: Mutex<NetStack> = Mutex::new(NetStack::with_defaults(
        StackConfig::default(),
        Box::new(SpinClock::new()),
    ));
}

/// Tunables of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackConfig {
    /// Wait for a DHCP reply (default 100 x 100 ms)
    pub dhcp_budget: PollBudget,
    /// Wait for each echo reply (default 10 x 100 ms)
    pub ping_budget: PollBudget,
    /// Pause between consecutive echo requests
    pub ping_interval_us: u64,
    pub dhcp_xid: u32,
    /// Fixed source port of every DNS query
    pub dns_src_port: u16,
    pub ping_identifier: u16,
    pub fallback: FallbackConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            dhcp_budget: PollBudget::new(100, 100_000),
            ping_budget: PollBudget::new(10, 100_000),
            ping_interval_us: 1_000_000,
            dhcp_xid: 0x1234_5678,
            dns_src_port: 12345,
            ping_identifier: 1234,
            fallback: FallbackConfig::default(),
        }
    }
}

/// Protocol-level counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    pub dhcp_discovers: u64,
    pub dns_queries: u64,
    pub icmp_echo_sent: u64,
    pub icmp_echo_replies: u64,
    pub udp_sent: u64,
}

impl fmt::Display for ProtocolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Protocol Statistics:")?;
        writeln!(f, "  DHCP discovers: {}", self.dhcp_discovers)?;
        writeln!(f, "  DNS queries: {}", self.dns_queries)?;
        writeln!(
            f,
            "  ICMP echo: {} sent, {} replies",
            self.icmp_echo_sent, self.icmp_echo_replies
        )?;
        write!(f, "  UDP datagrams sent: {}", self.udp_sent)
    }
}

/// One matched echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReply {
    pub sequence: u16,
    /// Time from sending the request to matching the reply
    pub rtt_us: u64,
}

/// Result of a ping session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
    pub target: Ipv4Address,
    pub transmitted: u32,
    pub received: u32,
    pub replies: Vec<PingReply>,
}

impl PingReport {
    /// Share of transmitted requests without a reply, in whole percent
    pub fn loss_percent(&self) -> u32 {
        if self.transmitted == 0 {
            return 0;
        }
        (self.transmitted - self.received) * 100 / self.transmitted
    }
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ping statistics ---", self.target)?;
        write!(
            f,
            "{} packets transmitted, {} received, {}% packet loss",
            self.transmitted,
            self.received,
            self.loss_percent()
        )
    }
}

pub struct NetStack {
    interfaces: Vec<NetworkInterface>,
    config: StackConfig,
    dhcp: DhcpClient,
    dns: DnsClient,
    stats: ProtocolStats,
    clock: Box<dyn Clock + Send>,
}

impl NetStack {
    /// Stack with an empty interface table
    pub fn new(config: StackConfig, clock: Box<dyn Clock + Send>) -> Self {
        Self {
            interfaces: Vec::with_capacity(MAX_INTERFACES),
            dhcp: DhcpClient::new(config.dhcp_xid),
            dns: DnsClient::new(config.dns_src_port),
            config,
            stats: ProtocolStats::default(),
            clock,
        }
    }

    /// Stack with the standard interfaces: `lo` (127.0.0.1/8, up), `eth0`
    /// and `wlan0` (both down, unconfigured, no link device yet)
    pub fn with_defaults(config: StackConfig, clock: Box<dyn Clock + Send>) -> Self {
        let mut stack = Self::new(config, clock);

        let mut lo = NetworkInterface::new("lo", InterfaceKind::Loopback);
        lo.ip_addr = Ipv4Address::new(127, 0, 0, 1);
        lo.subnet_mask = Ipv4Address::new(255, 0, 0, 0);
        lo.state = LinkState::Up;

        stack.interfaces.push(lo);
        stack
            .interfaces
            .push(NetworkInterface::new("eth0", InterfaceKind::Ethernet));
        stack
            .interfaces
            .push(NetworkInterface::new("wlan0", InterfaceKind::Wifi));
        stack
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn stats(&self) -> &ProtocolStats {
        &self.stats
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    /// Replace the clock that paces poll loops and ping timing
    pub fn set_clock(&mut self, clock: Box<dyn Clock + Send>) {
        self.clock = clock;
    }

    /// Register a new interface
    ///
    /// # Errors
    ///
    /// - `InterfaceExists` - name already registered
    /// - `InterfaceTableFull` - [`MAX_INTERFACES`] reached
    pub fn create_interface(
        &mut self,
        name: &str,
        kind: InterfaceKind,
    ) -> Result<&mut NetworkInterface, NetError> {
        if self.get(name).is_some() {
            return Err(NetError::InterfaceExists);
        }
        if self.interfaces.len() >= MAX_INTERFACES {
            return Err(NetError::InterfaceTableFull);
        }

        self.interfaces.push(NetworkInterface::new(name, kind));
        info!("[NET] created interface {} ({})", name, kind);
        let index = self.interfaces.len() - 1;
        Ok(&mut self.interfaces[index])
    }

    pub fn get(&self, name: &str) -> Option<&NetworkInterface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NetworkInterface> {
        self.interfaces.iter_mut().find(|iface| iface.name == name)
    }

    fn lookup(&mut self, name: &str) -> Result<&mut NetworkInterface, NetError> {
        self.get_mut(name).ok_or(NetError::InterfaceNotFound)
    }

    /// All interfaces in creation order
    pub fn interfaces(&self) -> &[NetworkInterface] {
        &self.interfaces
    }

    /// Install the link device backing `name`; the interface adopts its MAC
    pub fn attach_device(&mut self, name: &str, device: Box<dyn LinkDevice + Send>) -> Result<(), NetError> {
        let iface = self.lookup(name)?;
        iface.attach(device);
        info!("[NET] {}: link device attached, MAC {}", name, iface.mac_addr);
        Ok(())
    }

    pub fn interface_up(&mut self, name: &str) -> Result<(), NetError> {
        self.set_link_state(name, LinkState::Up)
    }

    /// Bring `name` down; its DHCP state returns to Idle
    pub fn interface_down(&mut self, name: &str) -> Result<(), NetError> {
        self.set_link_state(name, LinkState::Down)?;
        self.lookup(name)?.dhcp_state = DhcpState::Idle;
        Ok(())
    }

    /// Record a link state reported by the driver (e.g. Wi-Fi association)
    pub fn set_link_state(&mut self, name: &str, state: LinkState) -> Result<(), NetError> {
        self.lookup(name)?.state = state;
        info!("[NET] {} is now {}", name, state);
        Ok(())
    }

    /// Static address configuration from dotted-quad strings.
    ///
    /// Fields are written in order (address, mask, gateway); a string that
    /// does not parse fails with `InvalidAddress` and leaves that field and
    /// the ones after it untouched. On success DHCP goes back to Idle.
    pub fn set_static_ip(
        &mut self,
        name: &str,
        ip: &str,
        mask: &str,
        gateway: Option<&str>,
    ) -> Result<(), NetError> {
        let iface = self.lookup(name)?;

        iface.ip_addr = ip.parse()?;
        iface.subnet_mask = mask.parse()?;
        if let Some(gateway) = gateway {
            iface.gateway = gateway.parse()?;
        }
        iface.dhcp_state = DhcpState::Idle;

        info!(
            "[NET] {}: static {} mask {} gw {}",
            name, iface.ip_addr, iface.subnet_mask, iface.gateway
        );
        Ok(())
    }

    /// Run the DHCP client on `name`, which must be Up
    pub fn start_dhcp(&mut self, name: &str) -> Result<DhcpOutcome, NetError> {
        let Self {
            interfaces,
            config,
            dhcp,
            stats,
            clock,
            ..
        } = self;

        let iface = interfaces
            .iter_mut()
            .find(|iface| iface.name == name)
            .ok_or(NetError::InterfaceNotFound)?;
        if iface.state != LinkState::Up {
            return Err(NetError::InterfaceDown);
        }

        info!("[DHCP] starting on {}", name);
        let outcome = dhcp.start(iface, &mut **clock, config.dhcp_budget, &config.fallback)?;
        stats.dhcp_discovers += 1;
        stats.udp_sent += 1;
        Ok(outcome)
    }

    /// Index of the interface DNS queries go out on
    fn active_interface(&self) -> Result<usize, NetError> {
        let position = |name: &str, state: LinkState| {
            self.interfaces
                .iter()
                .position(|iface| iface.name == name && iface.state == state)
        };

        position("wlan0", LinkState::Connected)
            .or_else(|| position("eth0", LinkState::Up))
            .ok_or(NetError::NoActiveInterface)
    }

    /// Resolve `hostname` through the active interface.
    ///
    /// Uses `wlan0` if Connected, otherwise `eth0` if Up. The query goes on
    /// the wire; the answer comes from the resolver's fixed table.
    pub fn resolve(&mut self, hostname: &str) -> Result<Ipv4Address, NetError> {
        let index = self.active_interface()?;
        let address = self.dns.query(&mut self.interfaces[index], hostname)?;
        self.stats.dns_queries += 1;
        self.stats.udp_sent += 1;
        Ok(address)
    }

    /// Ping `target` (address or hostname) `count` times from `eth0`.
    ///
    /// Each request waits up to the ping budget for its reply; requests are
    /// spaced by `ping_interval_us`. A request that cannot be sent is not
    /// counted as transmitted and the session moves on.
    ///
    /// # Errors
    ///
    /// - resolver errors when `target` is not a dotted quad
    /// - `InterfaceNotFound` / `InterfaceDown` - `eth0` missing or not Up
    /// - `NoAddress` - `eth0` has no address (run DHCP first)
    pub fn ping(&mut self, target: &str, count: u16) -> Result<PingReport, NetError> {
        let target_ip = match target.parse::<Ipv4Address>() {
            Ok(ip) => ip,
            Err(_) => self.resolve(target)?,
        };

        let Self {
            interfaces,
            config,
            stats,
            clock,
            ..
        } = self;

        let iface = interfaces
            .iter_mut()
            .find(|iface| iface.name == "eth0")
            .ok_or(NetError::InterfaceNotFound)?;
        if iface.state != LinkState::Up {
            return Err(NetError::InterfaceDown);
        }
        if !iface.has_address() {
            return Err(NetError::NoAddress);
        }

        info!("[ICMP] PING {} from {}", target_ip, iface.ip_addr);

        let mut report = PingReport {
            target: target_ip,
            transmitted: 0,
            received: 0,
            replies: Vec::new(),
        };

        for sequence in 0..count {
            if sequence > 0 {
                clock.delay_us(config.ping_interval_us);
            }

            if let Err(e) = icmp::send_ping(iface, target_ip, config.ping_identifier, sequence) {
                warn!("[ICMP] failed to send icmp_seq={}: {}", sequence, e);
                continue;
            }
            report.transmitted += 1;
            stats.icmp_echo_sent += 1;

            let sent_at = clock.now_us();
            let matched = poll(&mut **clock, config.ping_budget, |_| {
                let frame = ethernet::receive_frame(iface).ok()?;
                icmp::process_reply(&frame, target_ip, sequence).then_some(())
            });

            match matched {
                Some(()) => {
                    let rtt_us = clock.now_us().saturating_sub(sent_at);
                    info!(
                        "[ICMP] reply from {}: icmp_seq={} time={} ms",
                        target_ip,
                        sequence,
                        rtt_us / 1000
                    );
                    report.received += 1;
                    report.replies.push(PingReply { sequence, rtt_us });
                    stats.icmp_echo_replies += 1;
                }
                None => warn!("[ICMP] request timeout for icmp_seq={}", sequence),
            }
        }

        info!(
            "[ICMP] {}: {} transmitted, {} received, {}% loss",
            target_ip,
            report.transmitted,
            report.received,
            report.loss_percent()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::net::queue::{QueueDevice, QueueHandle};
    use crate::drivers::timer::ManualClock;
    use crate::net::endian::read_u16;
    use crate::net::ethernet::{ETHERTYPE_IPV4, EthernetFrame, MacAddress};
    use crate::net::icmp::{IcmpHeader, TYPE_ECHO_REPLY};
    use crate::net::{ipv4, protocol};
    use alloc::string::ToString;

    const ETH0_MAC: MacAddress = MacAddress::new([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);

    fn stack() -> NetStack {
        NetStack::with_defaults(StackConfig::default(), Box::new(ManualClock::new()))
    }

    /// Default stack with a queue device on eth0, link up
    fn wired_stack() -> (NetStack, QueueHandle) {
        let mut stack = stack();
        let (device, handle) = QueueDevice::new(ETH0_MAC);
        stack.attach_device("eth0", Box::new(device)).unwrap();
        stack.interface_up("eth0").unwrap();
        (stack, handle)
    }

    fn echo_reply(src: Ipv4Address, dest: Ipv4Address, sequence: u16) -> Vec<u8> {
        let mut icmp = IcmpHeader::echo_request(1234, sequence);
        icmp.icmp_type = TYPE_ECHO_REPLY;
        let packet = ipv4::build_packet(src, dest, protocol::ICMP, &icmp.to_bytes()).unwrap();
        EthernetFrame::new(ETH0_MAC, ipv4::ROUTER_MAC, ETHERTYPE_IPV4, &packet).to_vec()
    }

    #[test]
    fn test_default_interfaces() {
        let stack = stack();
        let names: Vec<&str> = stack.interfaces().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["lo", "eth0", "wlan0"]);

        let lo = stack.get("lo").unwrap();
        assert_eq!(lo.state, LinkState::Up);
        assert_eq!(lo.ip_addr, Ipv4Address::new(127, 0, 0, 1));
        assert_eq!(lo.subnet_mask, Ipv4Address::new(255, 0, 0, 0));

        let eth0 = stack.get("eth0").unwrap();
        assert_eq!(eth0.state, LinkState::Down);
        assert!(!eth0.has_address());
        assert!(!eth0.has_link());
        assert_eq!(stack.get("wlan0").unwrap().kind, InterfaceKind::Wifi);
    }

    #[test]
    fn test_create_interface_limits() {
        let mut stack = stack();
        assert_eq!(
            stack.create_interface("eth0", InterfaceKind::Ethernet).err(),
            Some(NetError::InterfaceExists)
        );

        let eth1 = stack.create_interface("eth1", InterfaceKind::Ethernet).unwrap();
        assert_eq!(eth1.state, LinkState::Down);

        assert_eq!(
            stack.create_interface("eth2", InterfaceKind::Ethernet).err(),
            Some(NetError::InterfaceTableFull)
        );
        assert_eq!(stack.interfaces().len(), MAX_INTERFACES);
    }

    #[test]
    fn test_unknown_interface() {
        let mut stack = stack();
        assert_eq!(stack.interface_up("eth9"), Err(NetError::InterfaceNotFound));
        assert_eq!(stack.start_dhcp("eth9"), Err(NetError::InterfaceNotFound));
        assert_eq!(
            stack.set_static_ip("eth9", "10.0.0.1", "255.0.0.0", None),
            Err(NetError::InterfaceNotFound)
        );
    }

    #[test]
    fn test_attach_device_adopts_mac() {
        let (stack, _handle) = wired_stack();
        let eth0 = stack.get("eth0").unwrap();
        assert!(eth0.has_link());
        assert_eq!(eth0.mac_addr, ETH0_MAC);
    }

    #[test]
    fn test_interface_down_resets_dhcp() {
        let (mut stack, _handle) = wired_stack();
        stack.start_dhcp("eth0").unwrap();
        assert_eq!(stack.get("eth0").unwrap().dhcp_state, DhcpState::Bound);

        stack.interface_down("eth0").unwrap();
        let eth0 = stack.get("eth0").unwrap();
        assert_eq!(eth0.state, LinkState::Down);
        assert_eq!(eth0.dhcp_state, DhcpState::Idle);
    }

    #[test]
    fn test_set_static_ip() {
        let mut stack = stack();
        stack
            .set_static_ip("eth0", "10.0.2.15", "255.255.255.0", Some("10.0.2.2"))
            .unwrap();

        let eth0 = stack.get("eth0").unwrap();
        assert_eq!(eth0.ip_addr, Ipv4Address::new(10, 0, 2, 15));
        assert_eq!(eth0.subnet_mask, Ipv4Address::new(255, 255, 255, 0));
        assert_eq!(eth0.gateway, Ipv4Address::new(10, 0, 2, 2));
        assert_eq!(eth0.dhcp_state, DhcpState::Idle);
    }

    #[test]
    fn test_set_static_ip_invalid_mask() {
        let mut stack = stack();
        assert_eq!(
            stack.set_static_ip("eth0", "10.0.2.15", "255.255.0", Some("10.0.2.2")),
            Err(NetError::InvalidAddress)
        );

        // Address was already written; mask and gateway were not
        let eth0 = stack.get("eth0").unwrap();
        assert_eq!(eth0.ip_addr, Ipv4Address::new(10, 0, 2, 15));
        assert_eq!(eth0.subnet_mask, Ipv4Address::UNSPECIFIED);
        assert_eq!(eth0.gateway, Ipv4Address::UNSPECIFIED);
    }

    #[test]
    fn test_start_dhcp_requires_up() {
        let mut stack = stack();
        let (device, handle) = QueueDevice::new(ETH0_MAC);
        stack.attach_device("eth0", Box::new(device)).unwrap();

        assert_eq!(stack.start_dhcp("eth0"), Err(NetError::InterfaceDown));
        assert!(handle.sent().is_empty());
        assert_eq!(stack.get("eth0").unwrap().dhcp_state, DhcpState::Idle);
    }

    #[test]
    fn test_start_dhcp_falls_back_after_budget() {
        let (mut stack, handle) = wired_stack();

        assert_eq!(stack.start_dhcp("eth0"), Ok(DhcpOutcome::Fallback));

        let eth0 = stack.get("eth0").unwrap();
        assert_eq!(eth0.dhcp_state, DhcpState::Bound);
        assert_eq!(eth0.ip_addr, Ipv4Address::new(192, 168, 1, 100));
        assert_eq!(handle.sent().len(), 1);
        assert_eq!(stack.clock().now_us(), 10_000_000);
        assert_eq!(stack.stats().dhcp_discovers, 1);
    }

    #[test]
    fn test_start_dhcp_without_device() {
        let mut stack = stack();
        stack.interface_up("wlan0").unwrap();
        assert_eq!(stack.start_dhcp("wlan0"), Err(NetError::NoLinkCapability));
        assert_eq!(stack.get("wlan0").unwrap().dhcp_state, DhcpState::Discover);
        assert_eq!(stack.stats().dhcp_discovers, 0);
    }

    #[test]
    fn test_resolve_interface_selection() {
        let mut stack = stack();
        assert_eq!(stack.resolve("google.com"), Err(NetError::NoActiveInterface));

        // wlan0 only counts once connected
        stack.interface_up("wlan0").unwrap();
        assert_eq!(stack.resolve("google.com"), Err(NetError::NoActiveInterface));

        let (wlan_device, wlan) = QueueDevice::new(MacAddress::new([2, 0, 0, 0, 0, 2]));
        stack.attach_device("wlan0", Box::new(wlan_device)).unwrap();
        stack.set_link_state("wlan0", LinkState::Connected).unwrap();

        let (eth_device, eth) = QueueDevice::new(ETH0_MAC);
        stack.attach_device("eth0", Box::new(eth_device)).unwrap();
        stack.interface_up("eth0").unwrap();

        assert_eq!(stack.resolve("google.com"), Ok(Ipv4Address::new(8, 8, 8, 8)));
        assert_eq!(wlan.sent().len(), 1);
        assert!(eth.sent().is_empty());

        stack.interface_down("wlan0").unwrap();
        assert_eq!(stack.resolve("example.org"), Ok(Ipv4Address::new(1, 1, 1, 1)));
        assert_eq!(eth.sent().len(), 1);
        assert_eq!(stack.stats().dns_queries, 2);
    }

    #[test]
    fn test_ping_requires_configured_eth0() {
        let mut stack = stack();
        assert_eq!(stack.ping("8.8.8.8", 1), Err(NetError::InterfaceDown));

        let (mut stack, handle) = wired_stack();
        assert_eq!(stack.ping("8.8.8.8", 1), Err(NetError::NoAddress));
        assert!(handle.sent().is_empty());
    }

    #[test]
    fn test_ping_session() {
        let (mut stack, handle) = wired_stack();
        stack
            .set_static_ip("eth0", "192.168.1.50", "255.255.255.0", Some("192.168.1.1"))
            .unwrap();
        let google = Ipv4Address::new(8, 8, 8, 8);
        let ours = Ipv4Address::new(192, 168, 1, 50);

        // seq 0: one unrelated reply first, then the match; seq 1: nothing
        handle.push_rx(echo_reply(Ipv4Address::new(1, 1, 1, 1), ours, 0));
        handle.push_rx(echo_reply(google, ours, 0));

        let report = stack.ping("8.8.8.8", 2).unwrap();

        assert_eq!(report.target, google);
        assert_eq!(report.transmitted, 2);
        assert_eq!(report.received, 1);
        assert_eq!(report.loss_percent(), 50);
        assert_eq!(
            report.replies,
            alloc::vec![PingReply {
                sequence: 0,
                rtt_us: 100_000
            }]
        );

        // 100 ms for seq 0, 1 s pause, 1 s timeout for seq 1
        assert_eq!(stack.clock().now_us(), 2_100_000);

        let sent = handle.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(read_u16(&sent[0], 34 + 4), 1234);
        assert_eq!(read_u16(&sent[1], 34 + 6), 1);
        assert_eq!(stack.stats().icmp_echo_sent, 2);
        assert_eq!(stack.stats().icmp_echo_replies, 1);

        assert_eq!(
            report.to_string(),
            "--- 8.8.8.8 ping statistics ---\n2 packets transmitted, 1 received, 50% packet loss"
        );
    }

    #[test]
    fn test_ping_hostname_resolves_first() {
        let (mut stack, handle) = wired_stack();
        stack
            .set_static_ip("eth0", "192.168.1.50", "255.255.255.0", None)
            .unwrap();
        stack.get_mut("eth0").unwrap().dns_server = Ipv4Address::new(192, 168, 1, 1);

        let report = stack.ping("github.com", 1).unwrap();
        assert_eq!(report.target, Ipv4Address::new(140, 82, 112, 3));

        let sent = handle.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0][14 + 9], protocol::UDP);
        assert_eq!(sent[1][14 + 9], protocol::ICMP);
    }

    #[test]
    fn test_ping_send_failures_not_counted() {
        let (mut stack, handle) = wired_stack();
        stack
            .set_static_ip("eth0", "192.168.1.50", "255.255.255.0", None)
            .unwrap();
        handle.fail_transmit();

        let report = stack.ping("8.8.8.8", 3).unwrap();
        assert_eq!(report.transmitted, 0);
        assert_eq!(report.received, 0);
        assert_eq!(report.loss_percent(), 0);
        assert_eq!(handle.receive_calls(), 0);
        assert_eq!(stack.get("eth0").unwrap().stats.tx_errors, 3);
    }

    #[test]
    fn test_set_clock_replaces_timing_source() {
        let (mut stack, _handle) = wired_stack();
        let mut timer = ManualClock::new();
        timer.delay_us(500);

        stack.set_clock(Box::new(timer));
        assert_eq!(stack.clock().now_us(), 500);

        assert_eq!(stack.start_dhcp("eth0"), Ok(DhcpOutcome::Fallback));
        assert_eq!(stack.clock().now_us(), 500 + 10_000_000);
    }

    #[test]
    fn test_global_stack_has_default_interfaces() {
        let stack = NET_STACK.lock();
        assert!(stack.get("lo").is_some());
        assert!(stack.get("eth0").is_some());
        assert!(stack.get("wlan0").is_some());
        assert_eq!(stack.config().dhcp_xid, 0x1234_5678);
    }
}
