//! Sequential byte sources consumed by the record and handshake walkers.
//!
//! A [`ByteSource`] hands out bytes strictly in order. Implementations enter a
//! broken state after their first failure and refuse every later call with
//! [`InspectError::Broken`], so a caller can never make progress on top of a
//! corrupted position.

use std::{borrow::Cow, io};

use crate::{
    byte_order::{read_network_u16, read_network_u24},
    error::{InspectError, Result},
};

/// Forward-only reader over a byte stream.
///
/// If any method returns an error the returned value is unspecified and the
/// source refuses all further operations.
pub trait ByteSource {
    /// Read and return the next byte.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure, or [`InspectError::Broken`] once the
    /// source has already failed.
    fn read_byte(&mut self) -> Result<u8>;

    /// Read exactly `n` bytes.
    ///
    /// Implementations borrow where they can and only allocate when the
    /// bytes are not contiguous. `read_n(0)` yields an empty slice.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure, or [`InspectError::Broken`] once the
    /// source has already failed.
    fn read_n(&mut self, n: usize) -> Result<Cow<'_, [u8]>>;

    /// Skip exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure, or [`InspectError::Broken`] once the
    /// source has already failed.
    fn skip(&mut self, n: usize) -> Result<()>;

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Propagates any [`read_byte`](Self::read_byte) failure.
    fn read_u16(&mut self) -> Result<u16> {
        let high = self.read_byte()?;
        let low = self.read_byte()?;
        Ok(read_network_u16([high, low]))
    }

    /// Read a big-endian 24-bit integer.
    ///
    /// # Errors
    ///
    /// Propagates any [`read_byte`](Self::read_byte) failure.
    fn read_u24(&mut self) -> Result<u32> {
        let high = self.read_byte()?;
        let middle = self.read_byte()?;
        let low = self.read_byte()?;
        Ok(read_network_u24([high, middle, low]))
    }
}

/// [`ByteSource`] over bytes that are already in memory.
///
/// Running out of bytes is reported as an `UnexpectedEof` I/O error, the same
/// way a stream that closes early is.
///
/// # Examples
///
/// ```
/// use sni_peek::source::{ByteSource, SliceSource};
///
/// let mut source = SliceSource::new(&[0x01, 0x02, 0x03]);
/// assert_eq!(source.read_u16().expect("two bytes"), 0x0102);
/// assert!(source.read_u16().is_err());
/// assert!(source.read_byte().is_err());
/// ```
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
    broken: bool,
}

impl<'a> SliceSource<'a> {
    /// Create a source positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            broken: false,
        }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize { self.pos }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        let bytes = self.bytes;
        let taken = self
            .pos
            .checked_add(n)
            .and_then(|end| bytes.get(self.pos..end));
        if let Some(taken) = taken {
            self.pos += n;
            Ok(taken)
        } else {
            self.broken = true;
            Err(io::Error::from(io::ErrorKind::UnexpectedEof).into())
        }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Result<u8> {
        let taken = self.take(1)?;
        Ok(taken[0])
    }

    fn read_n(&mut self, n: usize) -> Result<Cow<'_, [u8]>> { self.take(n).map(Cow::Borrowed) }

    fn skip(&mut self, n: usize) -> Result<()> { self.take(n).map(drop) }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{ByteSource, SliceSource};
    use crate::error::InspectError;

    #[test]
    fn reads_big_endian_integers() {
        let mut source = SliceSource::new(&[0x12, 0x34, 0x01, 0x02, 0x03]);
        assert_eq!(source.read_u16().expect("u16"), 0x1234);
        assert_eq!(source.read_u24().expect("u24"), 0x01_0203);
        assert_eq!(source.position(), 5);
    }

    #[test]
    fn read_n_borrows_without_copying() {
        let bytes = [1_u8, 2, 3, 4];
        let mut source = SliceSource::new(&bytes);
        source.skip(1).expect("skip");
        let data = source.read_n(2).expect("two bytes");
        assert!(matches!(data, Cow::Borrowed(&[2, 3])));
    }

    #[test]
    fn zero_length_read_is_empty() {
        let mut source = SliceSource::new(&[]);
        assert!(source.read_n(0).expect("empty read").is_empty());
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn short_read_breaks_the_source() {
        let mut source = SliceSource::new(&[1, 2]);
        let err = source.read_n(3).expect_err("too short");
        assert!(err.is_eof());
        assert!(matches!(source.read_byte(), Err(InspectError::Broken)));
        assert!(matches!(source.skip(0), Err(InspectError::Broken)));
    }
}
