#![doc(html_root_url = "https://docs.rs/sni_peek/latest")]
//! Peek at the SNI hostname of a TLS `ClientHello` without consuming it.
//!
//! [`read_hostname`] reads just enough of a stream to find the `server_name`
//! extension and returns the hostname alongside a [`Replay`] holding every
//! byte it read, so the connection can be handed on unchanged. Bytes are
//! captured in buffers drawn from a shared [`pool::BufferPool`].
//!
//! ```
//! let err = sni_peek::parse_hostname(b"\x16\x03\x01\x00").expect_err("truncated");
//! assert!(err.is_eof());
//! ```

pub mod buffer;
pub mod byte_order;
pub mod config;
pub mod error;
pub mod handshake;
pub mod inspect;
pub mod metrics;
pub mod pool;
pub mod record;
pub mod rewind_stream;
pub mod server;
pub mod source;

pub use buffer::Replay;
pub use config::InspectConfig;
pub use error::{HandshakeViolation, InspectError, RecordViolation, Result};
pub use inspect::{Inspector, parse_hostname, read_hostname};
