//! Byte-level builder for synthetic `ClientHello` messages.
//!
//! The defaults produce a small, well-formed TLS 1.3 style `ClientHello`
//! with a `supported_groups` extension before SNI and an ALPN extension after
//! it. Each field can be overridden, including with values a real client
//! would never send, so tests can target individual validation steps.

use sni_peek::byte_order::{write_network_u16, write_network_u24};

use crate::records::{RECORD_VERSION_TLS10, frame_records};

/// Extension type of `supported_groups`.
pub const EXTENSION_SUPPORTED_GROUPS: u16 = 0x000a;
/// Extension type of `application_layer_protocol_negotiation`.
pub const EXTENSION_ALPN: u16 = 0x0010;

const EXTENSION_SERVER_NAME: u16 = 0x0000;
const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
const CLIENT_VERSION_TLS12: u16 = 0x0303;

#[derive(Clone, Debug)]
enum ServerName {
    Entry { name_type: u8, name: Vec<u8> },
    Raw { declared_len: u16, body: Vec<u8> },
    Absent,
}

/// Builder for `ClientHello` handshake messages and their record framing.
///
/// ```
/// use sni_peek_testing::ClientHelloBuilder;
///
/// let record = ClientHelloBuilder::new("example.com").record();
/// assert_eq!(record[0], 0x16);
/// assert_eq!(record.len(), 127);
/// ```
#[derive(Clone, Debug)]
pub struct ClientHelloBuilder {
    handshake_type: u8,
    declared_len: Option<u32>,
    record_version: u16,
    client_version: u16,
    random: [u8; 32],
    session_id: Vec<u8>,
    cipher_suites: Vec<u8>,
    compression_methods: Vec<u8>,
    leading: Vec<(u16, Vec<u8>)>,
    server_name: ServerName,
    trailing: Vec<(u16, Vec<u8>)>,
    trailer: Vec<u8>,
}

impl ClientHelloBuilder {
    /// Start from the default message carrying `hostname` as its SNI.
    pub fn new(hostname: impl AsRef<str>) -> Self {
        let mut random = [0_u8; 32];
        for (byte, value) in random.iter_mut().zip(0_u8..) {
            *byte = value;
        }
        Self {
            handshake_type: HANDSHAKE_CLIENT_HELLO,
            declared_len: None,
            record_version: RECORD_VERSION_TLS10,
            client_version: CLIENT_VERSION_TLS12,
            random,
            session_id: vec![0x5a; 32],
            cipher_suites: vec![0x13, 0x01, 0x13, 0x02, 0xc0, 0x2f],
            compression_methods: vec![0x00],
            leading: vec![(
                EXTENSION_SUPPORTED_GROUPS,
                vec![0x00, 0x04, 0x00, 0x1d, 0x00, 0x17],
            )],
            server_name: ServerName::Entry {
                name_type: 0,
                name: hostname.as_ref().as_bytes().to_vec(),
            },
            trailing: vec![(EXTENSION_ALPN, vec![0x00, 0x03, 0x02, b'h', b'2'])],
            trailer: Vec::new(),
        }
    }

    /// Replace the handshake message type byte.
    #[must_use]
    pub fn handshake_type(mut self, handshake_type: u8) -> Self {
        self.handshake_type = handshake_type;
        self
    }

    /// Declare a message length other than the encoded body length.
    #[must_use]
    pub fn declared_len(mut self, len: u32) -> Self {
        self.declared_len = Some(len);
        self
    }

    /// Replace the version written into every record header.
    #[must_use]
    pub fn record_version(mut self, version: u16) -> Self {
        self.record_version = version;
        self
    }

    /// Replace the session id. Its length byte follows the vector length.
    #[must_use]
    pub fn session_id(mut self, session_id: Vec<u8>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Replace the raw cipher suite list.
    #[must_use]
    pub fn cipher_suites(mut self, cipher_suites: Vec<u8>) -> Self {
        self.cipher_suites = cipher_suites;
        self
    }

    /// Replace the compression method list.
    #[must_use]
    pub fn compression_methods(mut self, methods: Vec<u8>) -> Self {
        self.compression_methods = methods;
        self
    }

    /// Add an extension placed before the SNI extension.
    #[must_use]
    pub fn extension(mut self, extension_type: u16, body: Vec<u8>) -> Self {
        self.leading.push((extension_type, body));
        self
    }

    /// Add an extension placed after the SNI extension.
    #[must_use]
    pub fn trailing_extension(mut self, extension_type: u16, body: Vec<u8>) -> Self {
        self.trailing.push((extension_type, body));
        self
    }

    /// Replace the single server name entry.
    #[must_use]
    pub fn server_name_entry(mut self, name_type: u8, name: impl Into<Vec<u8>>) -> Self {
        self.server_name = ServerName::Entry {
            name_type,
            name: name.into(),
        };
        self
    }

    /// Emit an SNI extension whose header declares `declared_len` bytes but
    /// whose encoded body is `body`.
    #[must_use]
    pub fn raw_server_name_extension(mut self, declared_len: u16, body: Vec<u8>) -> Self {
        self.server_name = ServerName::Raw { declared_len, body };
        self
    }

    /// Omit the SNI extension entirely.
    #[must_use]
    pub fn without_server_name(mut self) -> Self {
        self.server_name = ServerName::Absent;
        self
    }

    /// Append bytes inside the message body after the extensions block.
    #[must_use]
    pub fn trailer(mut self, trailer: Vec<u8>) -> Self {
        self.trailer = trailer;
        self
    }

    /// Encoded extensions block without its length prefix.
    fn extensions(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (extension_type, body) in &self.leading {
            push_extension(&mut out, *extension_type, body);
        }
        match &self.server_name {
            ServerName::Entry { name_type, name } => {
                let name_len = u16::try_from(name.len()).expect("hostname fits u16");
                let mut body = Vec::with_capacity(name.len() + 5);
                body.extend_from_slice(&write_network_u16(name_len + 3));
                body.push(*name_type);
                body.extend_from_slice(&write_network_u16(name_len));
                body.extend_from_slice(name);
                push_extension(&mut out, EXTENSION_SERVER_NAME, &body);
            }
            ServerName::Raw { declared_len, body } => {
                out.extend_from_slice(&write_network_u16(EXTENSION_SERVER_NAME));
                out.extend_from_slice(&write_network_u16(*declared_len));
                out.extend_from_slice(body);
            }
            ServerName::Absent => {}
        }
        for (extension_type, body) in &self.trailing {
            push_extension(&mut out, *extension_type, body);
        }
        out
    }

    /// The `ClientHello` body following the 4-byte handshake header.
    fn body(&self) -> Vec<u8> {
        let extensions = self.extensions();
        let mut body = Vec::with_capacity(128 + extensions.len());
        body.extend_from_slice(&write_network_u16(self.client_version));
        body.extend_from_slice(&self.random);
        body.push(u8::try_from(self.session_id.len()).expect("session id fits u8"));
        body.extend_from_slice(&self.session_id);
        let suites_len = u16::try_from(self.cipher_suites.len()).expect("cipher suites fit u16");
        body.extend_from_slice(&write_network_u16(suites_len));
        body.extend_from_slice(&self.cipher_suites);
        body.push(u8::try_from(self.compression_methods.len()).expect("methods fit u8"));
        body.extend_from_slice(&self.compression_methods);
        let extensions_len = u16::try_from(extensions.len()).expect("extensions fit u16");
        body.extend_from_slice(&write_network_u16(extensions_len));
        body.extend_from_slice(&extensions);
        body.extend_from_slice(&self.trailer);
        body
    }

    /// The complete handshake message: type, 24-bit length and body.
    pub fn handshake(&self) -> Vec<u8> {
        let body = self.body();
        let len = self
            .declared_len
            .unwrap_or_else(|| u32::try_from(body.len()).expect("body fits u32"));
        let mut message = Vec::with_capacity(body.len() + 4);
        message.push(self.handshake_type);
        message.extend_from_slice(&write_network_u24(len).expect("length fits 24 bits"));
        message.extend_from_slice(&body);
        message
    }

    /// The handshake framed as a single TLS record.
    pub fn record(&self) -> Vec<u8> { self.records(&[]) }

    /// The handshake framed as several records, starting a new record at
    /// each offset in `split_points`.
    pub fn records(&self, split_points: &[usize]) -> Vec<u8> {
        frame_records(&self.handshake(), self.record_version, split_points)
    }
}

fn push_extension(out: &mut Vec<u8>, extension_type: u16, body: &[u8]) {
    let len = u16::try_from(body.len()).expect("extension body fits u16");
    out.extend_from_slice(&write_network_u16(extension_type));
    out.extend_from_slice(&write_network_u16(len));
    out.extend_from_slice(body);
}

#[cfg(test)]
mod tests {
    use super::ClientHelloBuilder;

    #[test]
    fn default_message_layout() {
        let handshake = ClientHelloBuilder::new("example.com").handshake();
        assert_eq!(handshake.len(), 122);
        assert_eq!(&handshake[..4], &[0x01, 0x00, 0x00, 118]);
        assert_eq!(handshake[38], 32);
        assert_eq!(&handshake[102..113], b"example.com");
    }

    #[test]
    fn declared_length_override_keeps_body() {
        let handshake = ClientHelloBuilder::new("a.test")
            .declared_len(131_397)
            .handshake();
        assert_eq!(&handshake[1..4], &[0x02, 0x01, 0x45]);
    }
}
