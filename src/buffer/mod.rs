//! Pool-backed, growable capture buffer over a byte stream.
//!
//! A [`PooledBuffer`] records every byte read from its source so the exact
//! bytes consumed while inspecting a handshake can later be replayed. It
//! starts with one region from a [`BufferPool`], reads more on demand through
//! [`PooledBuffer::ensure`], and doubles its storage when a request does not
//! fit. [`PooledBuffer::hijack`] moves the captured bytes into a [`Replay`]
//! without copying.
//!
//! The buffer is always in exactly one of three states: active (owns a
//! source and storage), broken (a fill failed; storage already released) or
//! detached (storage moved into a replay).

mod cursor;
mod replay;

use std::{fmt, io, sync::Arc};

pub use cursor::BufferCursor;
use log::trace;
pub use replay::Replay;

use crate::{
    error::{InspectError, Result},
    pool::{BufferPool, Region},
};

enum BufferState<R> {
    Active(ActiveBuffer<R>),
    Broken,
    Detached,
}

struct ActiveBuffer<R> {
    source: R,
    region: Region,
    filled: usize,
}

impl<R: io::Read> ActiveBuffer<R> {
    fn ensure(&mut self, n: usize, max_buffered: usize) -> Result<()> {
        if n <= self.filled {
            return Ok(());
        }
        if n > self.region.capacity() {
            self.grow(n, max_buffered)?;
        }
        while self.filled < n {
            self.read_some()?;
        }
        Ok(())
    }

    fn grow(&mut self, n: usize, max_buffered: usize) -> Result<()> {
        if n > max_buffered {
            return Err(InspectError::BufferExhausted {
                limit: max_buffered,
            });
        }
        let mut capacity = self.region.capacity().max(1);
        while capacity < n {
            capacity = capacity.saturating_mul(2);
        }
        let capacity = capacity.min(max_buffered);
        trace!(
            "growing capture buffer: from={}, to={capacity}, filled={}",
            self.region.capacity(),
            self.filled
        );
        let mut grown = Region::unpooled(capacity);
        grown[..self.filled].copy_from_slice(&self.region[..self.filled]);
        // The replaced region goes back to its pool here.
        self.region = grown;
        Ok(())
    }

    /// Perform one successful read into the free tail of the region.
    fn read_some(&mut self) -> Result<usize> {
        loop {
            match self.source.read(&mut self.region[self.filled..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                Ok(read) => {
                    self.filled += read;
                    return Ok(read);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
    }
}

/// Growable capture buffer backed by a pooled region.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sni_peek::{buffer::PooledBuffer, pool::BufferPool};
///
/// let pool = Arc::new(BufferPool::new());
/// let mut buffer = PooledBuffer::new(&b"hello world"[..], &pool, 4096);
/// buffer.ensure(5).expect("five bytes available");
/// assert_eq!(&buffer.filled()[..5], b"hello");
///
/// let replay = buffer.hijack().expect("first hijack succeeds");
/// assert_eq!(replay.as_bytes(), b"hello world");
/// assert!(buffer.hijack().is_none());
/// ```
pub struct PooledBuffer<R> {
    state: BufferState<R>,
    max_buffered: usize,
}

impl<R: io::Read> PooledBuffer<R> {
    /// Create an empty buffer reading from `source`.
    ///
    /// Acquires one region from `pool`. Growth beyond `max_buffered` bytes
    /// fails with [`InspectError::BufferExhausted`].
    pub fn new(source: R, pool: &Arc<BufferPool>, max_buffered: usize) -> Self {
        Self {
            state: BufferState::Active(ActiveBuffer {
                source,
                region: pool.acquire(),
                filled: 0,
            }),
            max_buffered,
        }
    }

    /// Perform a single read from the source into free capacity.
    ///
    /// Returns the number of bytes read, or `0` if the storage is already
    /// full.
    ///
    /// # Errors
    ///
    /// An I/O failure or end of stream breaks the buffer and is returned.
    /// Calling this on a broken or detached buffer fails without touching
    /// the source.
    pub fn fill_once(&mut self) -> Result<usize> {
        let result = match &mut self.state {
            BufferState::Active(active) if active.filled == active.region.capacity() => {
                return Ok(0);
            }
            BufferState::Active(active) => active.read_some(),
            BufferState::Broken => return Err(InspectError::Broken),
            BufferState::Detached => return Err(InspectError::AlreadyDetached),
        };
        if result.is_err() {
            self.state = BufferState::Broken;
        }
        result
    }

    /// Make sure at least `n` bytes have been captured.
    ///
    /// Reads from the source until `n` bytes are held, doubling the storage
    /// first if `n` exceeds the current capacity. Only the captured prefix
    /// is copied when growing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error (end of stream is `UnexpectedEof`) or
    /// [`InspectError::BufferExhausted`], and the buffer becomes broken.
    /// A broken buffer answers [`InspectError::Broken`] and a detached one
    /// [`InspectError::AlreadyDetached`], both without touching the source.
    pub fn ensure(&mut self, n: usize) -> Result<()> {
        let result = match &mut self.state {
            BufferState::Active(active) => active.ensure(n, self.max_buffered),
            BufferState::Broken => return Err(InspectError::Broken),
            BufferState::Detached => return Err(InspectError::AlreadyDetached),
        };
        if result.is_err() {
            // Dropping the active state returns its region to the pool.
            self.state = BufferState::Broken;
        }
        result
    }
}

impl<R> PooledBuffer<R> {
    /// Bytes captured so far. Empty once broken or detached.
    #[must_use]
    pub fn filled(&self) -> &[u8] {
        match &self.state {
            BufferState::Active(active) => &active.region[..active.filled],
            BufferState::Broken | BufferState::Detached => &[],
        }
    }

    /// Number of bytes captured so far.
    #[must_use]
    pub fn len(&self) -> usize { self.filled().len() }

    /// Returns true if nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Size of the current storage. Zero once broken or detached.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.state {
            BufferState::Active(active) => active.region.capacity(),
            BufferState::Broken | BufferState::Detached => 0,
        }
    }

    /// Returns true if a fill has failed.
    #[must_use]
    pub fn is_broken(&self) -> bool { matches!(self.state, BufferState::Broken) }

    /// Returns true if the contents were handed to a [`Replay`].
    #[must_use]
    pub fn is_detached(&self) -> bool { matches!(self.state, BufferState::Detached) }

    /// Move the captured bytes into a [`Replay`], leaving the buffer empty.
    ///
    /// Returns `None` if the buffer is broken or was already hijacked. The
    /// source is released along with the storage.
    pub fn hijack(&mut self) -> Option<Replay> {
        match std::mem::replace(&mut self.state, BufferState::Detached) {
            BufferState::Active(ActiveBuffer { region, filled, .. }) => {
                Some(Replay::new(region, filled))
            }
            BufferState::Broken => {
                self.state = BufferState::Broken;
                None
            }
            BufferState::Detached => None,
        }
    }
}

impl<R> fmt::Debug for PooledBuffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            BufferState::Active(_) => "active",
            BufferState::Broken => "broken",
            BufferState::Detached => "detached",
        };
        f.debug_struct("PooledBuffer")
            .field("state", &state)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("max_buffered", &self.max_buffered)
            .finish()
    }
}

#[cfg(test)]
mod tests;
