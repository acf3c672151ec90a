//! Line and byte primitives over a blocking byte stream.
//!
//! Writes:
//! - `send_raw`: UTF-8 bytes, no framing
//! - `send_normalized`: every line sent as `content\r\n`, one write per line
//! - `send_crlf`: a bare `\r\n`
//!
//! Reads:
//! - `read_line`: one byte per read call until `\n`
//! - `read_sized`: up to N bytes, short if the peer closes first
//! - `read_until_close`: 1024-byte chunks until the peer closes
//!
//! All reads block without a timeout. Received bytes are collected before
//! decoding, so a character split across reads still decodes.

use bytes::{BufMut, BytesMut};
use std::io::{self, ErrorKind, Read, Write};
use std::string::FromUtf8Error;
use tracing::trace;

/// Line terminator on the wire.
pub const CRLF: &str = "\r\n";

/// Read size used when draining until close.
pub const CHUNK_SIZE: usize = 1024;

/// Transport errors.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying stream error.
    Io(io::Error),
    /// Received bytes are not valid UTF-8.
    Decode(FromUtf8Error),
    /// Peer closed the stream before a line terminator arrived.
    Closed,
    /// Proxy handle whose connection attempt failed.
    NotConnected,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
            TransportError::Decode(e) => write!(f, "Invalid UTF-8 from peer: {}", e),
            TransportError::Closed => write!(f, "Connection closed before end of line"),
            TransportError::NotConnected => write!(f, "Handle has no connected stream"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<FromUtf8Error> for TransportError {
    fn from(e: FromUtf8Error) -> Self {
        TransportError::Decode(e)
    }
}

/// Write `text` as UTF-8 with no framing.
pub fn send_raw<W: Write>(writer: &mut W, text: &str) -> Result<(), TransportError> {
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Write a bare CRLF.
pub fn send_crlf<W: Write>(writer: &mut W) -> Result<(), TransportError> {
    send_raw(writer, CRLF)
}

/// Write `text` line by line, each line terminated by CRLF.
///
/// Each line is a separate write.
pub fn send_normalized<W: Write>(writer: &mut W, text: &str) -> Result<(), TransportError> {
    for line in normalized_lines(text) {
        let mut framed = String::with_capacity(line.len() + CRLF.len());
        framed.push_str(line);
        framed.push_str(CRLF);
        writer.write_all(framed.as_bytes())?;
    }
    Ok(())
}

/// Split `text` into the lines `send_normalized` transmits.
///
/// Lines split on `\n`; a `\r` directly before the `\n` belongs to the
/// terminator, any other `\r` is content. A trailing unterminated line is
/// kept. Empty input yields no lines.
pub fn normalized_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        match rest.find('\n') {
            Some(lf) => {
                let line = &rest[..lf];
                lines.push(line.strip_suffix('\r').unwrap_or(line));
                rest = &rest[lf + 1..];
            }
            None => {
                lines.push(rest);
                rest = "";
            }
        }
    }

    lines
}

/// Read one line, one byte per read call.
///
/// The `\n` is kept unless `strip_eol` is set, in which case a preceding
/// `\r` is dropped as well.
pub fn read_line<R: Read>(reader: &mut R, strip_eol: bool) -> Result<String, TransportError> {
    let mut line = BytesMut::with_capacity(128);
    let mut byte = [0u8; 1];

    loop {
        if read_some(reader, &mut byte)? == 0 {
            return Err(TransportError::Closed);
        }
        line.put_u8(byte[0]);
        if byte[0] == b'\n' {
            break;
        }
    }

    if strip_eol {
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
    }

    Ok(String::from_utf8(line.into())?)
}

/// Read `size` bytes, or fewer if the peer closes first.
///
/// A short result is not an error.
pub fn read_sized<R: Read>(
    reader: &mut R,
    size: usize,
    normalize_eol: bool,
) -> Result<String, TransportError> {
    // Capacity is capped; the size is whatever the peer claimed.
    let mut collected = BytesMut::with_capacity(size.min(CHUNK_SIZE * 8));
    let mut chunk = vec![0u8; size.min(CHUNK_SIZE * 8)];
    let mut remaining = size;

    while remaining > 0 {
        let want = remaining.min(chunk.len());
        let n = read_some(reader, &mut chunk[..want])?;
        if n == 0 {
            trace!(expected = size, received = size - remaining, "Peer closed during sized read");
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
        remaining -= n;
    }

    decode(collected, normalize_eol)
}

/// Read until the peer closes the stream.
pub fn read_until_close<R: Read>(
    reader: &mut R,
    normalize_eol: bool,
) -> Result<String, TransportError> {
    let mut collected = BytesMut::with_capacity(CHUNK_SIZE);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = read_some(reader, &mut chunk)?;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
    }

    trace!(bytes = collected.len(), "Peer closed");
    decode(collected, normalize_eol)
}

/// Replace every CRLF pair with a bare LF.
pub fn crlf_to_lf(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn decode(bytes: BytesMut, normalize_eol: bool) -> Result<String, TransportError> {
    let text = String::from_utf8(bytes.into())?;
    if normalize_eol {
        Ok(crlf_to_lf(&text))
    } else {
        Ok(text)
    }
}

/// Single read that retries on `Interrupted`.
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
