//! DNS client (query side only)
//!
//! Encodes an A/IN question and sends it to the interface's DNS server.
//! Replies are not read: the address handed back comes from a fixed lookup
//! table ([`stub_lookup`]). Anything listening on the network still sees a
//! well-formed query.
//!
//! Names that cannot be encoded as valid labels are refused before anything
//! is sent. That includes a trailing dot (`"example.com."`) and labels over
//! 63 bytes, so such a lookup fails with `InvalidHostname` rather than
//! falling through to the stub answer.
//!
//! Reference: RFC 1035 - <https://www.rfc-editor.org/rfc/rfc1035>

use super::endian::write_u16;
use super::error::NetError;
use super::interface::NetworkInterface;
use super::ipv4::Ipv4Address;
use super::{port, udp};
use alloc::vec::Vec;
use log::{debug, info};

/// Recursion desired, standard query
pub const FLAGS_STANDARD_QUERY: u16 = 0x0100;

pub const TYPE_A: u16 = 1;
pub const CLASS_IN: u16 = 1;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// DNS message header
///
/// Total size: 12 bytes (id, flags, then four section counts)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub questions: u16,
    pub answers: u16,
    pub authority: u16,
    pub additional: u16,
}

impl DnsHeader {
    pub const SIZE: usize = 12;

    /// Header for a single-question standard query
    pub fn query(id: u16) -> Self {
        Self {
            id,
            flags: FLAGS_STANDARD_QUERY,
            questions: 1,
            answers: 0,
            authority: 0,
            additional: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        write_u16(&mut bytes, 0, self.id);
        write_u16(&mut bytes, 2, self.flags);
        write_u16(&mut bytes, 4, self.questions);
        write_u16(&mut bytes, 6, self.answers);
        write_u16(&mut bytes, 8, self.authority);
        write_u16(&mut bytes, 10, self.additional);
        bytes
    }
}

/// Encode `hostname` as a question: labels, zero terminator, type A, class IN.
///
/// `"a.bc"` becomes `[1, 'a', 2, 'b', 'c', 0, 0, 1, 0, 1]`.
///
/// # Errors
///
/// `InvalidHostname` for an empty name, an empty label, a label longer than
/// 63 bytes, or an encoded name longer than 255 bytes.
pub fn encode_question(hostname: &str) -> Result<Vec<u8>, NetError> {
    if hostname.is_empty() {
        return Err(NetError::InvalidHostname);
    }

    let mut question = Vec::with_capacity(hostname.len() + 6);
    for label in hostname.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(NetError::InvalidHostname);
        }
        question.push(label.len() as u8);
        question.extend_from_slice(label.as_bytes());
    }
    question.push(0);

    if question.len() > MAX_NAME_LEN {
        return Err(NetError::InvalidHostname);
    }

    question.extend_from_slice(&TYPE_A.to_be_bytes());
    question.extend_from_slice(&CLASS_IN.to_be_bytes());
    Ok(question)
}

/// Full query message: header followed by the encoded question
pub fn build_query(id: u16, hostname: &str) -> Result<Vec<u8>, NetError> {
    let question = encode_question(hostname)?;

    let mut query = Vec::with_capacity(DnsHeader::SIZE + question.len());
    query.extend_from_slice(&DnsHeader::query(id).to_bytes());
    query.extend_from_slice(&question);
    Ok(query)
}

/// Fixed answers standing in for response parsing
pub fn stub_lookup(hostname: &str) -> Ipv4Address {
    match hostname {
        "google.com" => Ipv4Address::new(8, 8, 8, 8),
        "github.com" => Ipv4Address::new(140, 82, 112, 3),
        _ => Ipv4Address::new(1, 1, 1, 1),
    }
}

/// Query sender with its own id counter
#[derive(Debug, Clone)]
pub struct DnsClient {
    next_id: u16,
    src_port: u16,
}

impl DnsClient {
    /// First query uses id 1; every query goes out from `src_port`
    pub const fn new(src_port: u16) -> Self {
        Self {
            next_id: 1,
            src_port,
        }
    }

    /// Id the next query will carry
    pub fn next_id(&self) -> u16 {
        self.next_id
    }

    /// Send an A query for `hostname` to the interface's DNS server.
    ///
    /// The id is consumed even if the query cannot be sent. On success the
    /// returned address is [`stub_lookup`]'s answer; no reply is awaited.
    pub fn query(&mut self, iface: &mut NetworkInterface, hostname: &str) -> Result<Ipv4Address, NetError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let query = build_query(id, hostname)?;
        let server = iface.dns_server;

        debug!("[DNS] query {} for {} to {}", id, hostname, server);
        udp::send_packet(iface, server, self.src_port, port::DNS, &query)?;

        let address = stub_lookup(hostname);
        info!("[DNS] {} resolved to {}", hostname, address);
        Ok(address)
    }
}
