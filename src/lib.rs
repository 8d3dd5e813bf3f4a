#![cfg_attr(not(test), no_std)]

//! Network protocol core for a small bare-metal kernel.
//!
//! A from-scratch Ethernet/IPv4/UDP stack with DHCP, DNS and ICMP clients,
//! running directly over a link device supplied by the kernel's driver layer.
//!
//! - `drivers::net::netdev`: the link capability every hardware-backed interface provides
//! - `drivers::timer`: injectable clock and poll budgets for the bounded wait loops
//! - `net`: wire formats, protocol layers, clients and the interface registry

extern crate alloc;

pub mod drivers;
pub mod net;

pub use drivers::netdev::{LinkDevice, NetworkError};
pub use drivers::timer::{Clock, ManualClock, PollBudget, SpinClock};
pub use net::{
    DhcpOutcome, DhcpState, InterfaceKind, Ipv4Address, LinkState, MacAddress, NET_STACK,
    NetError, NetStack, NetworkInterface, PingReport, StackConfig,
};
