//! `ClientHello` walker locating the SNI hostname.
//!
//! [`read_server_name`] performs a single forward pass over the handshake
//! payload delivered by a [`RecordReader`], validating each length field as
//! it goes and stopping as soon as the hostname has been read. Nothing after
//! the hostname is consumed. The validation steps are shared with the
//! fixed-offset [`fast_path`], so both paths accept and reject the same
//! inputs.

pub mod fast_path;

use log::trace;

use crate::{
    error::{HandshakeViolation, InspectError, Result},
    record::RecordReader,
    source::ByteSource,
};

/// Largest `ClientHello` message length accepted (OpenSSL's limit).
pub const CLIENT_HELLO_MAX_LEN: u32 = 131_396;
/// Handshake type of `ClientHello`.
pub const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
/// Extension type of `server_name`.
pub const EXTENSION_SERVER_NAME: u16 = 0x0000;
/// SNI name type of a DNS hostname.
pub const NAME_TYPE_HOST_NAME: u8 = 0x00;

pub(crate) const EXTENSION_HEADER_LEN: usize = 4;
/// `client_version` followed by `random`.
pub(crate) const VERSION_AND_RANDOM_LEN: usize = 2 + 32;
const MAX_SESSION_ID_LEN: u8 = 32;

type Check<T = ()> = std::result::Result<T, HandshakeViolation>;

pub(crate) fn check_message_type(message_type: u8) -> Check {
    if message_type == HANDSHAKE_CLIENT_HELLO {
        Ok(())
    } else {
        Err(HandshakeViolation::MessageType(message_type))
    }
}

/// Returns the message length as a budget in bytes.
pub(crate) fn check_message_len(len: u32) -> Check<usize> {
    if len > CLIENT_HELLO_MAX_LEN {
        return Err(HandshakeViolation::MessageTooLong(len));
    }
    usize::try_from(len).map_err(|_| HandshakeViolation::MessageTooLong(len))
}

pub(crate) fn check_session_id_len(len: u8) -> Check {
    if len > MAX_SESSION_ID_LEN {
        return Err(HandshakeViolation::SessionIdTooLong(len));
    }
    Ok(())
}

/// Strict mode wants a non-empty, even list that leaves at least one slot
/// unused.
pub(crate) fn check_cipher_suites_len(len: u16, strict: bool) -> Check {
    if strict && (len < 2 || len > u16::MAX - 1 || len % 2 != 0) {
        return Err(HandshakeViolation::CipherSuitesLength(len));
    }
    Ok(())
}

pub(crate) fn check_compression_methods_len(len: u8, strict: bool) -> Check {
    if strict && len == 0 {
        return Err(HandshakeViolation::NoCompressionMethods);
    }
    Ok(())
}

pub(crate) fn decode_hostname(bytes: &[u8]) -> Check<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| HandshakeViolation::HostnameEncoding)
}

/// Read the SNI hostname from the handshake payload behind `reader`.
///
/// With `strict` set, the message, extensions block, SNI extension and
/// server name list lengths are installed as successive budgets on the
/// reader, so a length field that disagrees with the bytes present fails
/// with [`InspectError::OutOfBoundary`].
///
/// # Errors
///
/// Returns [`InspectError::InvalidHandshake`] for a structural violation,
/// [`InspectError::UnsupportedNameType`] if the first server name is not a
/// hostname, [`InspectError::NotFound`] if the extensions block ends without
/// an SNI extension, and any error raised by the reader.
///
/// # Examples
///
/// ```
/// use sni_peek::{
///     handshake::read_server_name,
///     record::RecordReader,
///     source::SliceSource,
/// };
///
/// // A record holding only the start of a handshake of another type.
/// let bytes = [0x16, 0x03, 0x01, 0x00, 0x04, 0x02, 0x00, 0x00, 0x00];
/// let mut reader = RecordReader::new(SliceSource::new(&bytes), false);
/// assert!(read_server_name(&mut reader, false).is_err());
/// ```
pub fn read_server_name<S: ByteSource>(
    reader: &mut RecordReader<S>,
    strict: bool,
) -> Result<String> {
    let name = read_server_name_bytes(reader, strict)?;
    Ok(decode_hostname(&name)?)
}

/// Read the SNI hostname as the raw bytes carried on the wire.
///
/// Identical to [`read_server_name`] except that the name is not required
/// to be UTF-8.
///
/// # Errors
///
/// As for [`read_server_name`], minus the encoding check.
pub fn read_server_name_bytes<S: ByteSource>(
    reader: &mut RecordReader<S>,
    strict: bool,
) -> Result<Vec<u8>> {
    check_message_type(reader.read_byte()?)?;
    let message_len = check_message_len(reader.read_u24()?)?;
    if strict {
        reader.set_limit(message_len)?;
    }
    reader.skip(VERSION_AND_RANDOM_LEN)?;

    let session_id_len = reader.read_byte()?;
    check_session_id_len(session_id_len)?;
    reader.skip(usize::from(session_id_len))?;

    let cipher_suites_len = reader.read_u16()?;
    check_cipher_suites_len(cipher_suites_len, strict)?;
    reader.skip(usize::from(cipher_suites_len))?;

    let compression_methods_len = reader.read_byte()?;
    check_compression_methods_len(compression_methods_len, strict)?;
    reader.skip(usize::from(compression_methods_len))?;

    let extensions_len = usize::from(reader.read_u16()?);
    if strict {
        reader.set_limit(extensions_len)?;
    }
    let extension_len = find_server_name_extension(reader, extensions_len)?;
    if strict {
        reader.set_limit(extension_len)?;
    }

    let list_len = reader.read_u16()?;
    if strict {
        reader.set_limit(usize::from(list_len))?;
    }
    // A ServerName entry of unknown type cannot be skipped: its length field
    // is type specific.
    let name_type = reader.read_byte()?;
    let name_len = reader.read_u16()?;
    if name_type != NAME_TYPE_HOST_NAME {
        return Err(InspectError::UnsupportedNameType(name_type));
    }
    Ok(reader.read_n(usize::from(name_len))?.into_owned())
}

/// Skip extensions until `server_name`, returning its declared length.
///
/// Walks at most `extensions_len` bytes of extensions; the first SNI
/// extension wins.
///
/// # Errors
///
/// Returns [`InspectError::NotFound`] once fewer than an extension header's
/// worth of bytes remain in the block.
pub fn find_server_name_extension<S: ByteSource>(
    reader: &mut RecordReader<S>,
    extensions_len: usize,
) -> Result<usize> {
    let mut remaining = extensions_len;
    while remaining >= EXTENSION_HEADER_LEN {
        let extension_type = reader.read_u16()?;
        let extension_len = usize::from(reader.read_u16()?);
        if extension_type == EXTENSION_SERVER_NAME {
            return Ok(extension_len);
        }
        trace!("skipping extension: type={extension_type:#06x}, len={extension_len}");
        reader.skip(extension_len)?;
        remaining = remaining.saturating_sub(EXTENSION_HEADER_LEN + extension_len);
    }
    Err(InspectError::NotFound)
}
