//! Internet checksum (RFC 1071)
//!
//! Used by the IPv4 header and ICMP. The buffer is summed as big-endian
//! 16-bit words into a 32-bit accumulator, an odd trailing byte counts as a
//! zero-padded word, carries are folded back into the low 16 bits and the
//! one's complement of the result is returned.
//!
//! Summing a buffer that already carries its correct checksum yields 0.
//!
//! Reference: RFC 1071 - <https://www.rfc-editor.org/rfc/rfc1071>

/// Compute the Internet checksum over `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u32;
        // Fold as we go so arbitrarily long buffers cannot overflow
        if sum > 0xFFFF_0000 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }

    if let [last] = words.remainder() {
        sum += (*last as u32) << 8;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Compute the checksum of `data` and store it big-endian at `offset`.
///
/// The two bytes at `offset` are zeroed before summing.
pub fn fill_checksum(data: &mut [u8], offset: usize) {
    data[offset..offset + 2].copy_from_slice(&[0, 0]);
    let sum = checksum(data);
    data[offset..offset + 2].copy_from_slice(&sum.to_be_bytes());
}
