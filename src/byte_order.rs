//! Helpers for explicit network byte-order conversions.
//!
//! TLS encodes every length and type field big-endian. These helpers keep
//! Clippy expectations scoped to the conversion points so the record and
//! handshake walkers stay explicit about wire endianness without repeating
//! lint annotations. TLS also uses 24-bit lengths, which the standard library
//! has no direct conversion for.

/// Largest value representable by a 24-bit wire integer.
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use sni_peek::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x1234), [0x12, 0x34]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use sni_peek::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x12, 0x34]), 0x1234);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise a 24-bit value in network byte order.
///
/// Returns `None` when `value` does not fit in 24 bits.
///
/// # Examples
///
/// ```
/// use sni_peek::byte_order::write_network_u24;
///
/// assert_eq!(write_network_u24(0x01_0203), Some([0x01, 0x02, 0x03]));
/// assert_eq!(write_network_u24(0x0100_0000), None);
/// ```
#[must_use]
pub fn write_network_u24(value: u32) -> Option<[u8; 3]> {
    if value > U24_MAX {
        return None;
    }
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    let [_, high, middle, low] = value.to_be_bytes();
    Some([high, middle, low])
}

/// Parse a network-order 24-bit integer from its on-wire representation.
///
/// # Examples
///
/// ```
/// use sni_peek::byte_order::read_network_u24;
///
/// assert_eq!(read_network_u24([0x01, 0x02, 0x03]), 0x01_0203);
/// ```
#[must_use]
pub fn read_network_u24(bytes: [u8; 3]) -> u32 {
    let [high, middle, low] = bytes;
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes([0, high, middle, low])
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for network byte-order conversion helpers.

    use rstest::rstest;

    use super::{
        U24_MAX,
        read_network_u16,
        read_network_u24,
        write_network_u16,
        write_network_u24,
    };

    #[rstest]
    #[case::zero(0x0000, [0x00, 0x00])]
    #[case::mixed(0x1234, [0x12, 0x34])]
    #[case::max(u16::MAX, [0xFF, 0xFF])]
    fn u16_round_trips(#[case] value: u16, #[case] wire: [u8; 2]) {
        assert_eq!(write_network_u16(value), wire);
        assert_eq!(read_network_u16(wire), value);
    }

    #[rstest]
    #[case::zero(0, [0x00, 0x00, 0x00])]
    #[case::client_hello_cap(131_396, [0x02, 0x01, 0x44])]
    #[case::max(U24_MAX, [0xFF, 0xFF, 0xFF])]
    fn u24_round_trips(#[case] value: u32, #[case] wire: [u8; 3]) {
        assert_eq!(write_network_u24(value), Some(wire));
        assert_eq!(read_network_u24(wire), value);
    }

    #[test]
    fn u24_rejects_values_wider_than_24_bits() {
        assert_eq!(write_network_u24(U24_MAX + 1), None);
    }
}
