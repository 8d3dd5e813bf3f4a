//! Link Device Abstraction
//!
//! This module provides the trait a network adapter driver implements so that
//! the protocol core can move Ethernet frames through it. It is the only thing
//! the core knows about hardware.
//!
//! ## Design Philosophy
//!
//! The `LinkDevice` trait is the minimal send/receive contract an interface
//! needs from its driver:
//!
//! - **Transmit** takes a ready-made Ethernet frame (header + payload, no CRC)
//! - **Receive** is non-blocking and copies at most one frame into a caller buffer
//! - **No lifecycle**: resetting, initializing or configuring the adapter is
//!   the driver's business, never the stack's
//!
//! An interface either owns a `LinkDevice` (it can transmit and receive) or it
//! does not (loopback, unbound Wi-Fi); there is no half-capable state.
//!
//! ## Example Usage
//!
//! ```ignore
//! use netcore::drivers::netdev::LinkDevice;
//!
//! let mut buffer = [0u8; 1514];
//! match device.receive(&mut buffer) {
//!     Ok(0) => { /* nothing queued */ }
//!     Ok(len) => handle_frame(&buffer[..len]),
//!     Err(e) => log::warn!("[NET] receive failed: {}", e),
//! }
//! ```

use crate::net::ethernet::MacAddress;
use core::fmt;

/// Errors that can occur during link device operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Hardware is not present or not responding
    HardwareNotPresent,

    /// Device is not initialized
    NotInitialized,

    /// Transmit buffer is full (try again later)
    TxBufferFull,

    /// Frame is too large for device
    FrameTooLarge,

    /// Caller's receive buffer cannot hold the pending frame
    BufferTooSmall,

    /// Hardware error during operation
    HardwareError,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::HardwareNotPresent => write!(f, "Hardware not present"),
            NetworkError::NotInitialized => write!(f, "Device not initialized"),
            NetworkError::TxBufferFull => write!(f, "Transmit buffer full"),
            NetworkError::FrameTooLarge => write!(f, "Frame too large"),
            NetworkError::BufferTooSmall => write!(f, "Receive buffer too small"),
            NetworkError::HardwareError => write!(f, "Hardware error"),
        }
    }
}

/// Link capability trait
///
/// Implemented by the kernel's adapter drivers (E1000, PCnet, virtio-net, ...)
/// and by in-memory devices in tests.
///
/// # Buffer Ownership
///
/// Buffers passed to `transmit()` and `receive()` belong to the caller for
/// the duration of the call. Implementations copy what they need and must
/// not keep a reference past return.
///
/// # Thread Safety
///
/// Implementations are not required to be thread-safe at the trait level.
/// The stack is single-threaded; the global stack wraps everything in a `Mutex`.
pub trait LinkDevice {
    /// Transmit an Ethernet frame
    ///
    /// Sends a complete Ethernet frame: destination MAC, source MAC,
    /// EtherType and payload, up to 1514 bytes. The CRC is the hardware's job.
    ///
    /// # Errors
    ///
    /// - `FrameTooLarge` - Frame exceeds what the device can send
    /// - `TxBufferFull` - Hardware ring full, try again
    /// - `HardwareError` - Transmission failed
    #[must_use = "transmit() failure must be handled - frame may not have been sent"]
    fn transmit(&mut self, frame: &[u8]) -> Result<(), NetworkError>;

    /// Receive an Ethernet frame (non-blocking)
    ///
    /// Copies the oldest pending frame into `buffer` and returns its length.
    ///
    /// # Returns
    ///
    /// - `Ok(len)` with `len > 0` - `buffer[..len]` holds one frame
    /// - `Ok(0)` - No frame available
    /// - `Err(_)` - Device failure (treated like "nothing available" by poll loops)
    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, NetworkError>;

    /// Get the device's MAC address
    fn mac_address(&self) -> MacAddress;
}
