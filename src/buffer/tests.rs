//! Tests for the pooled capture buffer, its cursor and the replay view.

use std::{
    borrow::Cow,
    io::{self, ErrorKind, Read},
    sync::{Arc, atomic::Ordering},
};

use bytes::Buf;
use rstest::{fixture, rstest};
use sni_peek_testing::ScriptedReader;

use super::{BufferCursor, PooledBuffer};
use crate::{
    error::InspectError,
    pool::{BufferPool, DEFAULT_BUFFER_SIZE},
    source::ByteSource,
};

const MAX_BUFFERED: usize = 8 * DEFAULT_BUFFER_SIZE;

#[fixture]
fn pool() -> Arc<BufferPool> { Arc::new(BufferPool::new()) }

fn sequence(len: usize) -> Vec<u8> { (0..=250_u8).cycle().take(len).collect() }

#[rstest]
fn fill_once_performs_a_single_read(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(100)).with_chunks(vec![40]);
    let counter = reader.read_counter();
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    assert_eq!(buffer.fill_once().expect("first segment"), 40);
    assert_eq!(buffer.len(), 40);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[rstest]
fn ensure_reads_until_enough_bytes(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(100)).with_chunks(vec![10, 10, 10]);
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    buffer.ensure(25).expect("enough data");
    assert!(buffer.len() >= 25);
    assert_eq!(&buffer.filled()[..25], &sequence(25)[..]);
    buffer.ensure(5).expect("already satisfied");
}

#[rstest]
fn growth_doubles_and_preserves_contents(pool: Arc<BufferPool>) {
    let data = sequence(2000);
    let mut buffer = PooledBuffer::new(ScriptedReader::new(data.clone()), &pool, MAX_BUFFERED);
    buffer.ensure(DEFAULT_BUFFER_SIZE + 1).expect("growable");
    assert_eq!(buffer.capacity(), 2 * DEFAULT_BUFFER_SIZE);
    buffer.ensure(2000).expect("growable");
    assert_eq!(buffer.capacity(), 4 * DEFAULT_BUFFER_SIZE);
    assert_eq!(buffer.filled(), &data[..]);
    // The original pooled region went back when the buffer first grew.
    assert_eq!(pool.stats().outstanding(), 0);
}

#[rstest]
fn growth_beyond_ceiling_is_exhaustion(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(ScriptedReader::new(sequence(4000)), &pool, 1000);
    let err = buffer.ensure(1001).expect_err("over ceiling");
    assert!(matches!(err, InspectError::BufferExhausted { limit: 1000 }));
    assert!(buffer.is_broken());
}

#[rstest]
fn growth_is_capped_at_ceiling(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(ScriptedReader::new(sequence(4000)), &pool, 1000);
    buffer.ensure(1000).expect("exactly at ceiling");
    assert_eq!(buffer.capacity(), 1000);
}

#[rstest]
fn short_stream_breaks_buffer_and_releases_region(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(10));
    let counter = reader.read_counter();
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    let err = buffer.ensure(11).expect_err("stream too short");
    assert!(err.is_eof());
    assert!(buffer.is_broken());
    assert_eq!(pool.stats().outstanding(), 0);

    let reads = counter.load(Ordering::SeqCst);
    assert!(matches!(buffer.ensure(1), Err(InspectError::Broken)));
    assert!(matches!(buffer.fill_once(), Err(InspectError::Broken)));
    assert_eq!(counter.load(Ordering::SeqCst), reads);
    assert!(buffer.hijack().is_none());
    assert!(buffer.is_broken());
}

#[rstest]
fn read_errors_are_propagated(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(3)).then_fail(ErrorKind::ConnectionReset);
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    let err = buffer.ensure(4).expect_err("reset");
    assert!(matches!(err, InspectError::Io(ref e) if e.kind() == ErrorKind::ConnectionReset));
}

struct InterruptOnce<R> {
    inner: R,
    interrupted: bool,
}

impl<R: Read> Read for InterruptOnce<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(io::Error::from(ErrorKind::Interrupted));
        }
        self.inner.read(buf)
    }
}

#[rstest]
fn interrupted_reads_are_retried(pool: Arc<BufferPool>) {
    let reader = InterruptOnce {
        inner: &b"abc"[..],
        interrupted: false,
    };
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    assert_eq!(buffer.fill_once().expect("retried"), 3);
}

#[rstest]
fn hijack_moves_region_without_release(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(ScriptedReader::new(sequence(50)), &pool, MAX_BUFFERED);
    buffer.ensure(50).expect("data");
    let mut replay = buffer.hijack().expect("active buffer");
    assert!(buffer.is_detached());
    assert!(buffer.is_empty());
    assert!(matches!(buffer.ensure(1), Err(InspectError::AlreadyDetached)));
    assert!(matches!(buffer.fill_once(), Err(InspectError::AlreadyDetached)));
    assert!(buffer.hijack().is_none());

    drop(buffer);
    assert_eq!(pool.stats().released, 0);
    assert_eq!(replay.as_bytes(), &sequence(50)[..]);

    replay.close().expect("first close");
    assert_eq!(pool.stats().released, 1);
    assert!(matches!(replay.close(), Err(InspectError::AlreadyClosed)));
    drop(replay);
    assert_eq!(pool.stats().released, 1);
}

#[rstest]
fn unhijacked_buffer_releases_on_drop(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(ScriptedReader::new(sequence(5)), &pool, MAX_BUFFERED);
    buffer.ensure(5).expect("data");
    drop(buffer);
    assert_eq!(pool.stats().acquired, 1);
    assert_eq!(pool.stats().released, 1);
}

#[rstest]
fn replay_reads_in_order_then_reports_end(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(&b"hello world"[..], &pool, MAX_BUFFERED);
    buffer.ensure(11).expect("data");
    let mut replay = buffer.hijack().expect("active buffer");

    let mut head = [0; 5];
    replay.read_exact(&mut head).expect("head");
    assert_eq!(&head, b"hello");
    assert_eq!(replay.position(), 5);
    assert_eq!(replay.unread(), b" world");

    replay.advance(1);
    assert_eq!(replay.chunk(), b"world");
    let mut rest = Vec::new();
    replay.read_to_end(&mut rest).expect("rest");
    assert_eq!(rest, b"world");
    assert_eq!(replay.remaining(), 0);
    assert_eq!(replay.as_bytes(), b"hello world");
}

#[rstest]
fn closed_replay_refuses_reads(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(&b"abc"[..], &pool, MAX_BUFFERED);
    buffer.fill_once().expect("data");
    let mut replay = buffer.hijack().expect("active buffer");
    replay.close().expect("close");
    assert!(replay.is_empty());
    let err = replay.read(&mut [0; 4]).expect_err("closed");
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[rstest]
fn cursor_borrows_consecutive_ranges(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(64)).with_chunks(vec![3, 3, 3]);
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    let mut cursor = BufferCursor::new(&mut buffer);
    assert_eq!(cursor.read_byte().expect("byte"), 0);
    assert_eq!(cursor.read_u16().expect("u16"), 0x0102);
    assert!(matches!(
        cursor.read_n(4).expect("four bytes"),
        Cow::Borrowed(&[3, 4, 5, 6])
    ));
    cursor.skip(10).expect("skip");
    assert_eq!(cursor.position(), 17);
    assert_eq!(cursor.read_byte().expect("byte"), 17);
}

#[rstest]
fn cursor_zero_length_requests_do_not_read(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(Vec::new());
    let counter = reader.read_counter();
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    let mut cursor = BufferCursor::new(&mut buffer);
    assert!(cursor.read_n(0).expect("empty").is_empty());
    cursor.skip(0).expect("empty skip");
    assert_eq!(cursor.position(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[rstest]
fn cursor_failure_is_sticky(pool: Arc<BufferPool>) {
    let reader = ScriptedReader::new(sequence(4));
    let counter = reader.read_counter();
    let mut buffer = PooledBuffer::new(reader, &pool, MAX_BUFFERED);
    let mut cursor = BufferCursor::new(&mut buffer);
    cursor.skip(2).expect("skip");
    assert!(cursor.read_n(3).expect_err("short").is_eof());

    let reads = counter.load(Ordering::SeqCst);
    assert!(matches!(cursor.read_byte(), Err(InspectError::Broken)));
    assert!(matches!(cursor.read_n(0), Err(InspectError::Broken)));
    assert!(matches!(cursor.skip(0), Err(InspectError::Broken)));
    assert_eq!(counter.load(Ordering::SeqCst), reads);
}

#[rstest]
fn cursor_position_overflow_is_out_of_boundary(pool: Arc<BufferPool>) {
    let mut buffer = PooledBuffer::new(&b"ab"[..], &pool, MAX_BUFFERED);
    let mut cursor = BufferCursor::new(&mut buffer);
    cursor.skip(1).expect("skip");
    let err = cursor.skip(usize::MAX).expect_err("overflow");
    assert!(matches!(err, InspectError::OutOfBoundary { .. }));
}
