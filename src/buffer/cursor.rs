//! Forward-only view over a [`PooledBuffer`].

use std::{borrow::Cow, io};

use super::PooledBuffer;
use crate::{
    error::{InspectError, Result},
    source::ByteSource,
};

/// Cursor translating "give me the next `n` bytes" into
/// `ensure(position + n)` followed by a slice of the captured bytes.
///
/// The cursor borrows the buffer and never copies. After its first failure
/// it answers every call with [`InspectError::Broken`] without touching the
/// buffer again.
#[derive(Debug)]
pub struct BufferCursor<'b, R> {
    buffer: &'b mut PooledBuffer<R>,
    pos: usize,
    broken: bool,
}

impl<'b, R: io::Read> BufferCursor<'b, R> {
    /// Create a cursor at offset zero of `buffer`.
    pub fn new(buffer: &'b mut PooledBuffer<R>) -> Self {
        Self {
            buffer,
            pos: 0,
            broken: false,
        }
    }

    /// Offset of the next byte to be returned.
    #[must_use]
    pub fn position(&self) -> usize { self.pos }

    /// Advance by `n` bytes, returning the consumed range.
    fn advance(&mut self, n: usize) -> Result<(usize, usize)> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        let begin = self.pos;
        let Some(end) = begin.checked_add(n) else {
            self.broken = true;
            return Err(InspectError::OutOfBoundary {
                requested: n,
                remaining: usize::MAX - begin,
            });
        };
        if let Err(error) = self.buffer.ensure(end) {
            self.broken = true;
            return Err(error);
        }
        self.pos = end;
        Ok((begin, end))
    }

    fn captured(&self, begin: usize, end: usize) -> Result<&[u8]> {
        let bytes = self.buffer.filled().get(begin..end);
        debug_assert!(bytes.is_some(), "ensure left fewer bytes than requested");
        bytes.ok_or(InspectError::Broken)
    }
}

impl<R: io::Read> ByteSource for BufferCursor<'_, R> {
    fn read_byte(&mut self) -> Result<u8> {
        let (begin, end) = self.advance(1)?;
        let byte = self.captured(begin, end)?;
        Ok(byte[0])
    }

    fn read_n(&mut self, n: usize) -> Result<Cow<'_, [u8]>> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        if n == 0 {
            return Ok(Cow::Borrowed(&[]));
        }
        let (begin, end) = self.advance(n)?;
        self.captured(begin, end).map(Cow::Borrowed)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.broken {
            return Err(InspectError::Broken);
        }
        if n == 0 {
            return Ok(());
        }
        self.advance(n).map(drop)
    }
}
