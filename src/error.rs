//! Canonical error and result types for the crate.
//!
//! Every layer (buffer, cursor, record reassembler, handshake walker) reports
//! failures through the single [`InspectError`] surface so the top-level
//! inspection can propagate them unchanged with `?`.

use std::io;

use thiserror::Error;

use crate::handshake::CLIENT_HELLO_MAX_LEN;

/// Ways a TLS record header can be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RecordViolation {
    /// The record does not carry handshake content.
    #[error("content type {0:#04x} is not handshake")]
    ContentType(u8),
    /// The record advertises SSL 2.0 or 3.0, which predate SNI.
    #[error("record version {0:#06x} is SSL, not TLS")]
    Version(u16),
    /// Zero-length handshake fragments are prohibited.
    #[error("zero-length handshake fragment")]
    EmptyFragment,
    /// The fragment exceeds the 2^14 byte plaintext limit.
    #[error("fragment length {0} exceeds 16384")]
    Oversized(u16),
}

/// Ways a `ClientHello` can violate a structural bound.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HandshakeViolation {
    /// The handshake message is not a `ClientHello`.
    #[error("handshake type {0:#04x} is not client_hello")]
    MessageType(u8),
    /// The declared message length exceeds the accepted maximum.
    #[error("message length {0} exceeds {CLIENT_HELLO_MAX_LEN}")]
    MessageTooLong(u32),
    /// The session id is longer than 32 bytes.
    #[error("session id length {0} exceeds 32")]
    SessionIdTooLong(u8),
    /// The cipher suite list is empty, odd, or claims every slot.
    #[error("cipher suites length {0} is out of range")]
    CipherSuitesLength(u16),
    /// No compression method is offered.
    #[error("no compression methods offered")]
    NoCompressionMethods,
    /// The server name is not valid UTF-8.
    #[error("server name is not valid UTF-8")]
    HostnameEncoding,
}

/// Errors produced while inspecting a `ClientHello`.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The underlying stream failed or ended early.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// A record header failed validation.
    #[error("invalid TLS record: {0}")]
    InvalidRecord(RecordViolation),
    /// The handshake message failed validation.
    #[error("invalid TLS handshake: {0}")]
    InvalidHandshake(HandshakeViolation),
    /// A nested length field disagrees with the bytes actually present.
    #[error("request for {requested} bytes exceeds remaining budget of {remaining}")]
    OutOfBoundary {
        /// Bytes the caller asked for.
        requested: usize,
        /// Bytes left in the active budget.
        remaining: usize,
    },
    /// The SNI entry is not a `host_name`.
    #[error("unsupported SNI name type {0:#04x}")]
    UnsupportedNameType(u8),
    /// The `ClientHello` carries no SNI extension.
    #[error("SNI hostname not found")]
    NotFound,
    /// Buffering the handshake would exceed the configured ceiling.
    #[error("buffered handshake would exceed {limit} bytes")]
    BufferExhausted {
        /// Configured ceiling in bytes.
        limit: usize,
    },
    /// The reader already failed and refuses further operations.
    #[error("reader already broken")]
    Broken,
    /// The buffer contents were already handed to a [`Replay`](crate::Replay).
    #[error("buffer already detached")]
    AlreadyDetached,
    /// The replay was already closed.
    #[error("replay already closed")]
    AlreadyClosed,
}

impl InspectError {
    /// Returns true if the stream ended before the handshake was complete.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(error) if error.kind() == io::ErrorKind::UnexpectedEof)
    }

    /// Short, stable label used for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidRecord(_) => "invalid_record",
            Self::InvalidHandshake(_) => "invalid_handshake",
            Self::OutOfBoundary { .. } => "out_of_boundary",
            Self::UnsupportedNameType(_) => "unsupported_name_type",
            Self::NotFound => "not_found",
            Self::BufferExhausted { .. } => "buffer_exhausted",
            Self::Broken | Self::AlreadyDetached | Self::AlreadyClosed => "internal",
        }
    }
}

impl From<RecordViolation> for InspectError {
    fn from(violation: RecordViolation) -> Self { Self::InvalidRecord(violation) }
}

impl From<HandshakeViolation> for InspectError {
    fn from(violation: HandshakeViolation) -> Self { Self::InvalidHandshake(violation) }
}

/// Canonical result alias used by `sni_peek` public APIs.
pub type Result<T> = std::result::Result<T, InspectError>;
