//! TLS record-layer reassembly.
//!
//! [`RecordReader`] strips record headers from an underlying [`ByteSource`]
//! and presents the concatenated handshake fragments as one continuous byte
//! source. It alternates between two states: when no bytes remain in the
//! current fragment the next header is read and validated before any further
//! byte is returned; otherwise requests are served from the fragment, and a
//! request spanning the fragment end is stitched together across records.
//!
//! An optional budget set with [`RecordReader::set_limit`] is charged for
//! every byte consumed, independently of record boundaries, and catches
//! handshake length fields that disagree with the bytes present.

mod header;

use std::borrow::Cow;

pub use header::{
    CONTENT_TYPE_HANDSHAKE,
    MAX_FRAGMENT_LEN,
    RECORD_HEADER_LEN,
    RecordHeader,
    VERSION_SSL2,
    VERSION_SSL3,
};
use log::trace;

use crate::{
    error::{InspectError, Result},
    source::ByteSource,
};

/// Byte source over the handshake payload of consecutive TLS records.
///
/// # Examples
///
/// ```
/// use sni_peek::{
///     record::RecordReader,
///     source::{ByteSource, SliceSource},
/// };
///
/// let framed = [
///     0x16, 0x03, 0x01, 0x00, 0x02, 0xAA, 0xBB, // first record
///     0x16, 0x03, 0x01, 0x00, 0x01, 0xCC, // second record
/// ];
/// let mut reader = RecordReader::new(SliceSource::new(&framed), false);
/// assert_eq!(&*reader.read_n(3).expect("stitched"), &[0xAA, 0xBB, 0xCC]);
/// assert_eq!(reader.records_read(), 2);
/// ```
#[derive(Debug)]
pub struct RecordReader<S> {
    source: S,
    remain: usize,
    limit: Option<usize>,
    strict: bool,
    broken: bool,
    records: usize,
}

impl<S: ByteSource> RecordReader<S> {
    /// Wrap `source`, expecting a record header first.
    pub fn new(source: S, strict: bool) -> Self {
        Self {
            source,
            remain: 0,
            limit: None,
            strict,
            broken: false,
            records: 0,
        }
    }

    /// Restrict the bytes that may still be consumed to `limit`.
    ///
    /// The budget only ever shrinks.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::OutOfBoundary`] if `limit` exceeds the budget
    /// already in force, which also breaks the reader.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.guarded(|this| {
            match this.limit {
                Some(current) if limit > current => {
                    return Err(InspectError::OutOfBoundary {
                        requested: limit,
                        remaining: current,
                    });
                }
                _ => this.limit = Some(limit),
            }
            Ok(())
        })
    }

    /// Bytes left in the active budget, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> { self.limit }

    /// Number of record headers consumed so far.
    #[must_use]
    pub fn records_read(&self) -> usize { self.records }

    /// Borrow the underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &S { &self.source }

    /// Returns true once an operation has failed.
    #[must_use]
    pub fn is_broken(&self) -> bool { self.broken }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        let result = op(self);
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    /// Debit `n` bytes from the budget.
    fn charge(&mut self, n: usize) -> Result<()> {
        if let Some(remaining) = self.limit {
            if n > remaining {
                return Err(InspectError::OutOfBoundary {
                    requested: n,
                    remaining,
                });
            }
            self.limit = Some(remaining - n);
        }
        Ok(())
    }

    fn next_record(&mut self) -> Result<()> {
        let mut bytes = [0_u8; RECORD_HEADER_LEN];
        bytes.copy_from_slice(&self.source.read_n(RECORD_HEADER_LEN)?);
        let header = RecordHeader::from_bytes(bytes).validate(self.strict)?;
        self.remain = usize::from(header.fragment_len);
        self.records += 1;
        trace!(
            "record header accepted: version={:#06x}, fragment_len={}, records={}",
            header.version, header.fragment_len, self.records
        );
        Ok(())
    }

    /// Charge the budget and make sure a fragment is open.
    fn prepare(&mut self, n: usize) -> Result<()> {
        self.charge(n)?;
        if self.remain == 0 {
            self.next_record()?;
        }
        Ok(())
    }

    /// Collect `n` bytes spanning one or more fragment boundaries.
    fn stitch(&mut self, n: usize, out: &mut Vec<u8>) -> Result<()> {
        while out.len() < n {
            if self.remain == 0 {
                self.next_record()?;
            }
            let take = self.remain.min(n - out.len());
            let chunk = self.source.read_n(take)?;
            out.extend_from_slice(&chunk);
            self.remain -= take;
        }
        Ok(())
    }
}

impl<S: ByteSource> ByteSource for RecordReader<S> {
    fn read_byte(&mut self) -> Result<u8> {
        self.guarded(|this| {
            this.prepare(1)?;
            let byte = this.source.read_byte()?;
            this.remain -= 1;
            Ok(byte)
        })
    }

    fn read_n(&mut self, n: usize) -> Result<Cow<'_, [u8]>> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        if n == 0 {
            return Ok(Cow::Borrowed(&[]));
        }
        if let Err(error) = self.prepare(n) {
            self.broken = true;
            return Err(error);
        }
        if n <= self.remain {
            self.remain -= n;
            let bytes = self.source.read_n(n);
            if bytes.is_err() {
                self.broken = true;
            }
            return bytes;
        }
        // `n` is caller supplied; reserve no more than the next record can add.
        let reserve = n.min(self.remain + usize::from(MAX_FRAGMENT_LEN));
        let mut stitched = Vec::with_capacity(reserve);
        if let Err(error) = self.stitch(n, &mut stitched) {
            self.broken = true;
            return Err(error);
        }
        Ok(Cow::Owned(stitched))
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.guarded(|this| {
            this.charge(n)?;
            let mut left = n;
            while left > 0 {
                if this.remain == 0 {
                    this.next_record()?;
                }
                let take = this.remain.min(left);
                this.source.skip(take)?;
                this.remain -= take;
                left -= take;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests;
