//! Driver-facing boundary of the network core
//!
//! Organized by device class:
//! - `net`: link capability the stack requires from a network adapter driver
//! - `timer`: clock source used to pace the bounded poll loops
//!
//! The adapters themselves (register programming, DMA rings, bus discovery)
//! live in the kernel; this crate only consumes them through these traits.

pub mod net;
pub mod timer;

pub use net::netdev;
