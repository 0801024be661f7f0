//! Fixtures for exercising [`sni_peek`] against synthetic handshakes.
//!
//! The helpers build `ClientHello` messages byte by byte, re-frame them into
//! arbitrary TLS record splits, and feed them through readers that deliver
//! data in scripted chunks, so tests can reproduce segmented and truncated
//! streams deterministically.
//!
//! ```rust
//! use sni_peek_testing::{ClientHelloBuilder, ScriptedReader};
//!
//! let bytes = ClientHelloBuilder::new("example.com").record();
//! let (hostname, _replay) =
//!     sni_peek::read_hostname(ScriptedReader::new(bytes)).expect("hostname");
//! assert_eq!(hostname, "example.com");
//! ```

pub mod client_hello;
pub mod io;
pub mod logging;
pub mod records;

pub use client_hello::{ClientHelloBuilder, EXTENSION_ALPN, EXTENSION_SUPPORTED_GROUPS};
pub use io::ScriptedReader;
pub use logging::{LoggerHandle, logger};
pub use records::{RECORD_VERSION_TLS10, RECORD_VERSION_TLS12, frame_records};
