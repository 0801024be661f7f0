//! TLS record framing for synthetic handshakes.

use sni_peek::byte_order::write_network_u16;

/// Record version most clients place on their first record.
pub const RECORD_VERSION_TLS10: u16 = 0x0301;
/// Record version of TLS 1.2.
pub const RECORD_VERSION_TLS12: u16 = 0x0303;

const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;

/// Frame `handshake` into consecutive handshake records.
///
/// A new record starts at every offset in `split_points`. Offsets are sorted
/// first; duplicates and offsets outside `1..handshake.len()` are ignored so
/// every fragment is non-empty.
///
/// ```
/// use sni_peek_testing::{RECORD_VERSION_TLS12, frame_records};
///
/// let framed = frame_records(&[1, 2, 3], RECORD_VERSION_TLS12, &[1]);
/// assert_eq!(
///     framed,
///     [0x16, 0x03, 0x03, 0x00, 0x01, 1, 0x16, 0x03, 0x03, 0x00, 0x02, 2, 3]
/// );
/// ```
///
/// # Panics
///
/// Panics if a fragment is longer than `u16::MAX` bytes.
pub fn frame_records(handshake: &[u8], version: u16, split_points: &[usize]) -> Vec<u8> {
    let mut points: Vec<usize> = split_points
        .iter()
        .copied()
        .filter(|point| (1..handshake.len()).contains(point))
        .collect();
    points.sort_unstable();
    points.dedup();
    points.push(handshake.len());

    let mut framed = Vec::with_capacity(handshake.len() + 5 * points.len());
    let mut start = 0;
    for end in points {
        let fragment = &handshake[start..end];
        let len = u16::try_from(fragment.len()).expect("fragment fits u16");
        framed.push(CONTENT_TYPE_HANDSHAKE);
        framed.extend_from_slice(&write_network_u16(version));
        framed.extend_from_slice(&write_network_u16(len));
        framed.extend_from_slice(fragment);
        start = end;
    }
    framed
}
