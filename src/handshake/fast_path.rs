//! Fixed-offset parse of a single buffered read.
//!
//! Most clients send their `ClientHello` as one small record in one TCP
//! segment. [`resolve`] handles that case directly on the bytes of the first
//! read, without record reassembly and without allocating. It applies the
//! same checks as [`read_server_name`](super::read_server_name), and
//! whenever the bytes at hand cannot settle the outcome, or the general path
//! would reject them, it answers [`Verdict::Retry`] so the authoritative
//! answer comes from the general path.

use std::ops::Range;

use super::{
    EXTENSION_HEADER_LEN,
    EXTENSION_SERVER_NAME,
    NAME_TYPE_HOST_NAME,
    VERSION_AND_RANDOM_LEN,
    check_cipher_suites_len,
    check_compression_methods_len,
    check_message_len,
    check_message_type,
    check_session_id_len,
};
use crate::{
    byte_order::{read_network_u16, read_network_u24},
    record::{CONTENT_TYPE_HANDSHAKE, RECORD_HEADER_LEN, RecordHeader},
};

/// Outcome of a fast-path attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The hostname occupies this range of the buffered bytes.
    Resolved(Range<usize>),
    /// The bytes cannot be settled here; run the general path.
    Retry,
    /// The bytes are not a handshake record, or the extensions block ends
    /// without SNI.
    NotFound,
}

impl Verdict {
    /// Short, stable label used for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resolved(_) => "resolved",
            Self::Retry => "retry",
            Self::NotFound => "not_found",
        }
    }
}

type Step<T> = Result<T, Verdict>;

/// Bounds-checked walker over the fragment of the first record.
struct Offsets<'a> {
    buf: &'a [u8],
    at: usize,
    /// End of the innermost strict-mode budget.
    budget: Option<usize>,
}

impl Offsets<'_> {
    fn take(&mut self, n: usize) -> Step<Range<usize>> {
        let end = self.at.checked_add(n).ok_or(Verdict::Retry)?;
        if end > self.buf.len() || self.budget.is_some_and(|limit| end > limit) {
            return Err(Verdict::Retry);
        }
        let range = self.at..end;
        self.at = end;
        Ok(range)
    }

    fn bytes<const N: usize>(&mut self) -> Step<[u8; N]> {
        let range = self.take(N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(&self.buf[range]);
        Ok(out)
    }

    fn u8(&mut self) -> Step<u8> { self.bytes::<1>().map(|[byte]| byte) }

    fn u16(&mut self) -> Step<u16> { self.bytes().map(read_network_u16) }

    fn u24(&mut self) -> Step<u32> { self.bytes().map(read_network_u24) }

    fn skip(&mut self, n: usize) -> Step<()> { self.take(n).map(drop) }

    /// Install a budget of `len` bytes from the current offset.
    fn narrow(&mut self, len: usize) -> Step<()> {
        let end = self.at.checked_add(len).ok_or(Verdict::Retry)?;
        if self.budget.is_some_and(|limit| end > limit) {
            return Err(Verdict::Retry);
        }
        self.budget = Some(end);
        Ok(())
    }
}

/// Try to locate the SNI hostname within `buf`, the bytes of one read.
///
/// # Examples
///
/// ```
/// use sni_peek::handshake::fast_path::{Verdict, resolve};
///
/// assert_eq!(resolve(b"GET / HTTP/1.1\r\n", false), Verdict::NotFound);
/// assert_eq!(resolve(&[0x16, 0x03, 0x01], false), Verdict::Retry);
/// ```
#[must_use]
pub fn resolve(buf: &[u8], strict: bool) -> Verdict {
    match walk(buf, strict) {
        Ok(range) => Verdict::Resolved(range),
        Err(verdict) => verdict,
    }
}

fn walk(buf: &[u8], strict: bool) -> Step<Range<usize>> {
    let Some(&content_type) = buf.first() else {
        return Err(Verdict::Retry);
    };
    if content_type != CONTENT_TYPE_HANDSHAKE {
        return Err(Verdict::NotFound);
    }
    let mut header = [0_u8; RECORD_HEADER_LEN];
    header.copy_from_slice(buf.get(..RECORD_HEADER_LEN).ok_or(Verdict::Retry)?);
    let header = RecordHeader::from_bytes(header)
        .validate(strict)
        .map_err(|_| Verdict::Retry)?;
    // More than one record arrived; only the general path can stitch them.
    if buf.len() > RECORD_HEADER_LEN + usize::from(header.fragment_len) {
        return Err(Verdict::Retry);
    }

    let mut at = Offsets {
        buf,
        at: RECORD_HEADER_LEN,
        budget: None,
    };
    check_message_type(at.u8()?).map_err(|_| Verdict::Retry)?;
    let message_len = check_message_len(at.u24()?).map_err(|_| Verdict::Retry)?;
    if strict {
        at.narrow(message_len)?;
    }
    at.skip(VERSION_AND_RANDOM_LEN)?;

    let session_id_len = at.u8()?;
    check_session_id_len(session_id_len).map_err(|_| Verdict::Retry)?;
    at.skip(usize::from(session_id_len))?;

    let cipher_suites_len = at.u16()?;
    check_cipher_suites_len(cipher_suites_len, strict).map_err(|_| Verdict::Retry)?;
    at.skip(usize::from(cipher_suites_len))?;

    let compression_methods_len = at.u8()?;
    check_compression_methods_len(compression_methods_len, strict)
        .map_err(|_| Verdict::Retry)?;
    at.skip(usize::from(compression_methods_len))?;

    let extensions_len = usize::from(at.u16()?);
    if strict {
        at.narrow(extensions_len)?;
    }
    let mut remaining = extensions_len;
    let extension_len = loop {
        if remaining < EXTENSION_HEADER_LEN {
            return Err(Verdict::NotFound);
        }
        let extension_type = at.u16()?;
        let extension_len = usize::from(at.u16()?);
        if extension_type == EXTENSION_SERVER_NAME {
            break extension_len;
        }
        at.skip(extension_len)?;
        remaining = remaining.saturating_sub(EXTENSION_HEADER_LEN + extension_len);
    };
    if strict {
        at.narrow(extension_len)?;
    }

    let list_len = at.u16()?;
    if strict {
        at.narrow(usize::from(list_len))?;
    }
    let name_type = at.u8()?;
    let name_len = at.u16()?;
    if name_type != NAME_TYPE_HOST_NAME {
        return Err(Verdict::Retry);
    }
    let name = at.take(usize::from(name_len))?;
    if std::str::from_utf8(&buf[name.clone()]).is_err() {
        return Err(Verdict::Retry);
    }
    Ok(name)
}
