//! Async stream adapter that replays inspected bytes.
//!
//! `RewindStream` emits the bytes captured while peeking at a `ClientHello`
//! before delegating reads and writes to the underlying stream, so the peer
//! behind it sees the connection exactly as the client sent it.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Buf;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::buffer::Replay;

/// A stream adapter that drains a [`Replay`] before reading from the
/// underlying stream.
///
/// The replay's storage returns to its pool as soon as it has been drained.
#[derive(Debug)]
pub struct RewindStream<S> {
    replay: Option<Replay>,
    inner: S,
}

impl<S> RewindStream<S> {
    /// Create a new `RewindStream` that will yield the unread bytes of
    /// `replay` before delegating to `inner`.
    pub fn new(replay: Replay, inner: S) -> Self {
        Self {
            replay: Some(replay),
            inner,
        }
    }

    /// Replayed bytes not yet read.
    #[must_use]
    pub fn pending(&self) -> usize { self.replay.as_ref().map_or(0, Buf::remaining) }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S { &self.inner }

    /// Consume the adapter, returning the underlying stream.
    ///
    /// Replayed bytes not yet read are discarded.
    pub fn into_inner(self) -> S { self.inner }
}

impl<S: AsyncRead + Unpin> AsyncRead for RewindStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(replay) = this.replay.as_mut() {
            if replay.has_remaining() {
                let count = replay.remaining().min(buf.remaining());
                buf.put_slice(&replay.chunk()[..count]);
                replay.advance(count);
                if !replay.has_remaining() {
                    this.replay = None;
                }
                return Poll::Ready(Ok(()));
            }
            this.replay = None;
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for RewindStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
