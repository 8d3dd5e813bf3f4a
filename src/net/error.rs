//! Errors reported by the protocol core
//!
//! Four kinds of failure, all local and recoverable:
//! - malformed input: size bounds, truncation, checksum, ethertype/protocol mismatch
//! - no data: nothing queued on the link (drives poll loops, never aborts them)
//! - capability absence: interface without a link device
//! - management: registry and configuration misuse
//!
//! A DHCP timeout is not an error; see [`crate::net::dhcp::DhcpOutcome`].

use crate::drivers::netdev::NetworkError;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// Payload larger than the 1500-byte Ethernet MTU
    PayloadTooLarge,

    /// Buffer shorter than the header or length field claims
    Truncated,

    /// Frame does not carry the expected EtherType
    EthertypeMismatch,

    /// Packet does not carry the expected IP protocol
    ProtocolMismatch,

    /// Header checksum does not verify
    ChecksumMismatch,

    /// No frame currently queued on the link
    NoFrame,

    /// Interface has no link device to send or receive through
    NoLinkCapability,

    /// Link device failed
    Device(NetworkError),

    /// No interface with the given name
    InterfaceNotFound,

    /// An interface with the given name already exists
    InterfaceExists,

    /// Interface table is full
    InterfaceTableFull,

    /// Interface link state is not Up
    InterfaceDown,

    /// Interface has no IPv4 address configured
    NoAddress,

    /// Not a dotted-quad IPv4 address
    InvalidAddress,

    /// Hostname cannot be encoded as DNS labels
    InvalidHostname,

    /// Neither wlan0 (connected) nor eth0 (up) is usable
    NoActiveInterface,
}

impl From<NetworkError> for NetError {
    fn from(err: NetworkError) -> Self {
        NetError::Device(err)
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::PayloadTooLarge => write!(f, "Payload exceeds MTU"),
            NetError::Truncated => write!(f, "Truncated packet"),
            NetError::EthertypeMismatch => write!(f, "Unexpected EtherType"),
            NetError::ProtocolMismatch => write!(f, "Unexpected IP protocol"),
            NetError::ChecksumMismatch => write!(f, "Checksum mismatch"),
            NetError::NoFrame => write!(f, "No frame available"),
            NetError::NoLinkCapability => write!(f, "Interface has no link device"),
            NetError::Device(e) => write!(f, "Device error: {}", e),
            NetError::InterfaceNotFound => write!(f, "Interface not found"),
            NetError::InterfaceExists => write!(f, "Interface already exists"),
            NetError::InterfaceTableFull => write!(f, "Interface table full"),
            NetError::InterfaceDown => write!(f, "Interface must be UP"),
            NetError::NoAddress => write!(f, "Interface has no IP address"),
            NetError::InvalidAddress => write!(f, "Invalid IP address"),
            NetError::InvalidHostname => write!(f, "Invalid hostname"),
            NetError::NoActiveInterface => write!(f, "No active network interface"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_device_error_conversion() {
        let err: NetError = NetworkError::TxBufferFull.into();
        assert_eq!(err, NetError::Device(NetworkError::TxBufferFull));
        assert_eq!(err.to_string(), "Device error: Transmit buffer full");
    }
}
