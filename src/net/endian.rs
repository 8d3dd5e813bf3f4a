//! Big-endian field access for wire headers
//!
//! Every multi-byte field on the wire is network byte order. Header builders
//! and parsers go through these helpers instead of reinterpreting structs.
//! Callers bounds-check the buffer first; the helpers index directly.

/// Host to network order (16-bit)
#[inline]
pub const fn htons(value: u16) -> u16 {
    value.to_be()
}

/// Host to network order (32-bit)
#[inline]
pub const fn htonl(value: u32) -> u32 {
    value.to_be()
}

/// Network to host order (16-bit)
#[inline]
pub const fn ntohs(value: u16) -> u16 {
    u16::from_be(value)
}

/// Network to host order (32-bit)
#[inline]
pub const fn ntohl(value: u32) -> u32 {
    u32::from_be(value)
}

/// Read a big-endian u16 at `offset`
#[inline]
pub fn read_u16(buffer: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buffer[offset], buffer[offset + 1]])
}

/// Read a big-endian u32 at `offset`
#[inline]
pub fn read_u32(buffer: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ])
}

/// Write `value` big-endian at `offset`
#[inline]
pub fn write_u16(buffer: &mut [u8], offset: usize, value: u16) {
    buffer[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Write `value` big-endian at `offset`
#[inline]
pub fn write_u32(buffer: &mut [u8], offset: usize, value: u32) {
    buffer[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_swaps_round_trip() {
        assert_eq!(ntohs(htons(0x1234)), 0x1234);
        assert_eq!(ntohl(htonl(0x1234_5678)), 0x1234_5678);
    }

    #[test]
    fn test_htons_matches_wire_layout() {
        // Stored in memory, a network-order value reads as its wire bytes
        assert_eq!(htons(0x0800).to_ne_bytes(), [0x08, 0x00]);
        assert_eq!(htonl(0x6382_5363).to_ne_bytes(), [99, 130, 83, 99]);
    }

    #[test]
    fn test_read_write_fields() {
        let mut buffer = [0u8; 8];
        write_u16(&mut buffer, 1, 0xABCD);
        write_u32(&mut buffer, 3, 0x0102_0304);

        assert_eq!(buffer, [0x00, 0xAB, 0xCD, 0x01, 0x02, 0x03, 0x04, 0x00]);
        assert_eq!(read_u16(&buffer, 1), 0xABCD);
        assert_eq!(read_u32(&buffer, 3), 0x0102_0304);
    }
}
