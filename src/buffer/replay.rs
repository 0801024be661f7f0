//! Detached, read-only view over captured handshake bytes.

use std::{fmt, io};

use bytes::Buf;

use crate::{
    error::{InspectError, Result},
    pool::Region,
};

/// The exact bytes read from a stream while inspecting it.
///
/// A `Replay` is produced by [`PooledBuffer::hijack`](super::PooledBuffer::hijack)
/// and tracks a read position so it can be drained through [`io::Read`] or
/// [`Buf`] before the rest of the stream. Chaining it in front of the stream
/// reconstructs the original byte sequence:
///
/// ```no_run
/// use std::{io::Read, net::TcpStream};
///
/// # fn forward(mut client: TcpStream) -> sni_peek::Result<()> {
/// let (hostname, replay) = sni_peek::read_hostname(&mut client)?;
/// let mut original = replay.chain(client);
/// # let _ = (&hostname, &mut original);
/// # Ok(())
/// # }
/// ```
///
/// [`close`](Self::close) returns the storage to its pool; dropping an
/// unclosed replay does the same.
pub struct Replay {
    region: Option<Region>,
    len: usize,
    pos: usize,
}

impl Replay {
    pub(crate) fn new(region: Region, len: usize) -> Self {
        debug_assert!(len <= region.capacity(), "replay longer than its region");
        Self {
            region: Some(region),
            len,
            pos: 0,
        }
    }

    /// All captured bytes, regardless of the read position.
    ///
    /// Empty once closed.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.region
            .as_ref()
            .map_or(&[][..], |region| &region[..self.len])
    }

    /// Captured bytes not yet read.
    #[must_use]
    pub fn unread(&self) -> &[u8] { self.as_bytes().get(self.pos..).unwrap_or_default() }

    /// Total number of captured bytes. Zero once closed.
    #[must_use]
    pub fn len(&self) -> usize { self.as_bytes().len() }

    /// Returns true if nothing was captured or the replay is closed.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Current read position.
    #[must_use]
    pub fn position(&self) -> usize { self.pos }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.region.is_none() }

    /// Release the storage back to its pool.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::AlreadyClosed`] if the replay was already
    /// closed; the storage is never released twice.
    pub fn close(&mut self) -> Result<()> {
        match self.region.take() {
            Some(region) => {
                drop(region);
                Ok(())
            }
            None => Err(InspectError::AlreadyClosed),
        }
    }
}

impl io::Read for Replay {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_closed() {
            return Err(io::Error::other(InspectError::AlreadyClosed));
        }
        let unread = self.unread();
        let count = unread.len().min(buf.len());
        buf[..count].copy_from_slice(&unread[..count]);
        self.pos += count;
        Ok(count)
    }
}

impl Buf for Replay {
    fn remaining(&self) -> usize { self.unread().len() }

    fn chunk(&self) -> &[u8] { self.unread() }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining(),
            "cannot advance past the end of a replay: cnt={cnt}, remaining={}",
            self.remaining()
        );
        self.pos += cnt;
    }
}

impl fmt::Debug for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replay")
            .field("len", &self.len)
            .field("pos", &self.pos)
            .field("closed", &self.is_closed())
            .finish()
    }
}
