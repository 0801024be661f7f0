//! Top-level SNI inspection.
//!
//! An [`Inspector`] ties the layers together: it captures the stream into a
//! pooled buffer, tries the fast path on the first read, and otherwise walks
//! the records from the start of the same buffer with the general path. On
//! success the buffer is hijacked, so the caller receives every byte read
//! from the stream for verbatim replay.

use std::{io, sync::Arc};

use log::{debug, trace};

use crate::{
    buffer::{BufferCursor, PooledBuffer, Replay},
    config::InspectConfig,
    error::{InspectError, RecordViolation, Result},
    handshake::{
        decode_hostname,
        fast_path::{self, Verdict},
        read_server_name,
        read_server_name_bytes,
    },
    metrics,
    pool::BufferPool,
    record::{CONTENT_TYPE_HANDSHAKE, RecordReader},
    source::SliceSource,
};

/// Extracts SNI hostnames using a fixed configuration and buffer pool.
///
/// An inspector holds no per-connection state and can be shared freely
/// across threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sni_peek::{InspectConfig, Inspector, pool::BufferPool};
///
/// let pool = Arc::new(BufferPool::new());
/// let inspector = Inspector::with_pool(InspectConfig::default().with_strict(true), pool);
/// let err = inspector
///     .read_hostname(&b"\x17\x03\x03\x00\x01\x00"[..])
///     .expect_err("application data is not a handshake");
/// assert_eq!(err.label(), "invalid_record");
/// ```
#[derive(Clone, Debug)]
pub struct Inspector {
    config: InspectConfig,
    pool: Arc<BufferPool>,
}

impl Inspector {
    /// Create an inspector drawing buffers from the global pool.
    #[must_use]
    pub fn new(config: InspectConfig) -> Self { Self::with_pool(config, BufferPool::global()) }

    /// Create an inspector drawing buffers from `pool`.
    #[must_use]
    pub fn with_pool(config: InspectConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            config: config.normalized(),
            pool,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &InspectConfig { &self.config }

    /// Pool buffers are drawn from.
    #[must_use]
    pub fn pool(&self) -> &Arc<BufferPool> { &self.pool }

    /// Read a `ClientHello` from `stream` and extract its SNI hostname.
    ///
    /// Returns the hostname together with a [`Replay`] holding every byte
    /// read from `stream`, which may extend past the hostname up to the end
    /// of the last read. Blocking reads are bounded only by whatever timeout
    /// the stream itself applies.
    ///
    /// # Errors
    ///
    /// Returns the first failure met while reading or validating. On error
    /// the consumed bytes are released and not returned.
    pub fn read_hostname<R: io::Read>(&self, stream: R) -> Result<(String, Replay)> {
        let result = self.inspect(stream).and_then(|(name, replay)| {
            let hostname = decode_hostname(&name)?;
            Ok((hostname, replay))
        });
        Self::observe(result)
    }

    /// Like [`read_hostname`](Self::read_hostname), but returns the
    /// hostname exactly as sent, without requiring it to be UTF-8.
    ///
    /// # Errors
    ///
    /// As for [`read_hostname`](Self::read_hostname), minus the encoding
    /// check.
    pub fn read_hostname_bytes<R: io::Read>(&self, stream: R) -> Result<(Vec<u8>, Replay)> {
        Self::observe(self.inspect(stream))
    }

    fn observe<N: AsRef<[u8]>>(result: Result<(N, Replay)>) -> Result<(N, Replay)> {
        match &result {
            Ok((name, replay)) => {
                debug!(
                    "SNI hostname extracted: hostname={}, consumed={}",
                    String::from_utf8_lossy(name.as_ref()),
                    replay.len()
                );
                metrics::inc_inspections("ok");
            }
            Err(e) => {
                debug!("SNI inspection failed: error={e}");
                metrics::inc_inspections(e.label());
            }
        }
        result
    }

    fn inspect<R: io::Read>(&self, stream: R) -> Result<(Vec<u8>, Replay)> {
        let strict = self.config.strict;
        let mut buffer = PooledBuffer::new(stream, &self.pool, self.config.max_buffered);

        if self.config.fast_path {
            buffer.fill_once()?;
            let verdict = fast_path::resolve(buffer.filled(), strict);
            trace!(
                "fast path verdict: verdict={}, buffered={}",
                verdict.label(),
                buffer.len()
            );
            metrics::inc_fast_path(verdict.label());
            match verdict {
                Verdict::Resolved(range) => {
                    let name = buffer.filled().get(range).ok_or(InspectError::Broken)?.to_vec();
                    return Self::detach(name, &mut buffer);
                }
                // A non-handshake first byte is final; no further read happens.
                Verdict::NotFound => {
                    if let Some(&content_type) = buffer.filled().first()
                        && content_type != CONTENT_TYPE_HANDSHAKE
                    {
                        return Err(RecordViolation::ContentType(content_type).into());
                    }
                }
                Verdict::Retry => {}
            }
        }

        // The general path restarts at offset 0; bytes already buffered by
        // the fast path are read again from memory.
        let mut reader = RecordReader::new(BufferCursor::new(&mut buffer), strict);
        let name = read_server_name_bytes(&mut reader, strict)?;
        trace!("general path finished: records={}", reader.records_read());
        Self::detach(name, &mut buffer)
    }

    fn detach<R>(name: Vec<u8>, buffer: &mut PooledBuffer<R>) -> Result<(Vec<u8>, Replay)> {
        let replay = buffer.hijack().ok_or(InspectError::AlreadyDetached)?;
        Ok((name, replay))
    }

    /// Extract the SNI hostname from bytes already in memory.
    ///
    /// `bytes` must start with the first record header. Bytes after the
    /// hostname are ignored.
    ///
    /// # Errors
    ///
    /// As for [`read_hostname`](Self::read_hostname); running out of bytes is
    /// an `UnexpectedEof` I/O error.
    pub fn parse_hostname(&self, bytes: &[u8]) -> Result<String> {
        let strict = self.config.strict;
        let mut reader = RecordReader::new(SliceSource::new(bytes), strict);
        let result = read_server_name(&mut reader, strict);
        if let Err(e) = &result {
            debug!("SNI parse failed: error={e}, records={}", reader.records_read());
        }
        result
    }
}

impl Default for Inspector {
    fn default() -> Self { Self::new(InspectConfig::default()) }
}

/// Read a `ClientHello` from `stream` with the default configuration.
///
/// See [`Inspector::read_hostname`].
///
/// # Errors
///
/// Returns the first failure met while reading or validating.
pub fn read_hostname<R: io::Read>(stream: R) -> Result<(String, Replay)> {
    Inspector::default().read_hostname(stream)
}

/// Extract the SNI hostname from buffered bytes with the default
/// configuration.
///
/// # Errors
///
/// Returns the first failure met while validating.
pub fn parse_hostname(bytes: &[u8]) -> Result<String> { Inspector::default().parse_hostname(bytes) }
