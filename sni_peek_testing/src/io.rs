//! Readers delivering bytes in scripted chunks.

use std::{
    io::{self, Read},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// In-memory [`Read`] implementation with scripted segmentation.
///
/// Each `read` call returns at most the next scripted chunk size, mimicking
/// TCP segments arriving separately. Once the data is exhausted the reader
/// reports end of stream, or the configured error. Every call is counted,
/// including calls after exhaustion, so tests can assert that a broken
/// parser stopped reading.
///
/// ```
/// use std::io::Read;
///
/// use sni_peek_testing::ScriptedReader;
///
/// let mut reader = ScriptedReader::new(b"abcdef".to_vec()).with_chunks(vec![2]);
/// let mut buf = [0; 8];
/// assert_eq!(reader.read(&mut buf).expect("first chunk"), 2);
/// assert_eq!(reader.read(&mut buf).expect("rest"), 4);
/// assert_eq!(reader.reads(), 2);
/// ```
#[derive(Debug)]
pub struct ScriptedReader {
    data: Vec<u8>,
    pos: usize,
    chunks: Vec<usize>,
    next_chunk: usize,
    failure: Option<io::ErrorKind>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedReader {
    /// Deliver `data` in as few reads as the caller's buffer allows.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunks: Vec::new(),
            next_chunk: 0,
            failure: None,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Limit successive reads to the given sizes; after the list runs out
    /// reads are unrestricted. Zero-sized entries are skipped.
    #[must_use]
    pub fn with_chunks(mut self, chunks: Vec<usize>) -> Self {
        self.chunks = chunks.into_iter().filter(|chunk| *chunk > 0).collect();
        self
    }

    /// Fail with `kind` instead of reporting end of stream.
    #[must_use]
    pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    /// Number of `read` calls made so far.
    pub fn reads(&self) -> usize { self.reads.load(Ordering::SeqCst) }

    /// Shared handle to the read counter, usable after the reader is moved.
    pub fn read_counter(&self) -> Arc<AtomicUsize> { Arc::clone(&self.reads) }
}

impl Read for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            return match self.failure {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(0),
            };
        }
        let mut count = remaining.len().min(buf.len());
        if let Some(chunk) = self.chunks.get(self.next_chunk) {
            count = count.min(*chunk);
            self.next_chunk += 1;
        }
        buf[..count].copy_from_slice(&remaining[..count]);
        self.pos += count;
        Ok(count)
    }
}
