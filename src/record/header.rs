//! TLS record header layout and validation.

use crate::{byte_order::read_network_u16, error::RecordViolation};

/// Size of a TLS record header: type, version and fragment length.
pub const RECORD_HEADER_LEN: usize = 5;
/// Content type tag of handshake records.
pub const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
/// Largest plaintext fragment TLS permits (2^14).
pub const MAX_FRAGMENT_LEN: u16 = 16_384;
/// Record version tag used by SSL 2.0 compatible hellos.
pub const VERSION_SSL2: u16 = 0x0002;
/// Record version tag of SSL 3.0.
pub const VERSION_SSL3: u16 = 0x0300;

/// Decoded TLS record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record content type.
    pub content_type: u8,
    /// Record protocol version.
    pub version: u16,
    /// Length of the fragment following the header.
    pub fragment_len: u16,
}

impl RecordHeader {
    /// Decode a header from its wire bytes without validating it.
    ///
    /// # Examples
    ///
    /// ```
    /// use sni_peek::record::RecordHeader;
    ///
    /// let header = RecordHeader::from_bytes([0x16, 0x03, 0x01, 0x00, 0x7a]);
    /// assert_eq!(header.version, 0x0301);
    /// assert_eq!(header.fragment_len, 122);
    /// ```
    #[must_use]
    pub fn from_bytes(bytes: [u8; RECORD_HEADER_LEN]) -> Self {
        let [content_type, v0, v1, l0, l1] = bytes;
        Self {
            content_type,
            version: read_network_u16([v0, v1]),
            fragment_len: read_network_u16([l0, l1]),
        }
    }

    /// Check the header carries a usable handshake fragment.
    ///
    /// Content type and a non-zero length are always required. `strict`
    /// additionally rejects SSL record versions and fragments above
    /// [`MAX_FRAGMENT_LEN`].
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordViolation`] found.
    pub fn validate(self, strict: bool) -> Result<Self, RecordViolation> {
        if self.content_type != CONTENT_TYPE_HANDSHAKE {
            return Err(RecordViolation::ContentType(self.content_type));
        }
        if strict && matches!(self.version, VERSION_SSL2 | VERSION_SSL3) {
            return Err(RecordViolation::Version(self.version));
        }
        if self.fragment_len == 0 {
            return Err(RecordViolation::EmptyFragment);
        }
        if strict && self.fragment_len > MAX_FRAGMENT_LEN {
            return Err(RecordViolation::Oversized(self.fragment_len));
        }
        Ok(self)
    }
}
