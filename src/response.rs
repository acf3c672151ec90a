//! HTTP/1.x response framing.
//!
//! Reads a response off a blocking stream in a fixed order:
//!
//! ```text
//! StartLine -> Headers -> [BodyByLength] -> [BodyByClose] -> Done
//! ```
//!
//! The body length comes from `Content-Length`, from `Connection: close`, or
//! is empty when neither header is present. When both are present the sized
//! read runs first and the stream is then drained until the peer closes.

use std::io::Read;
use tracing::trace;

use crate::transport::{self, TransportError};

/// Response framing errors
#[derive(Debug)]
pub enum FrameError {
    /// Error from the underlying transport
    Transport(TransportError),
    /// Header line not of the form `Name: value`
    MalformedHeader(String),
    /// Content-Length value is not a base-10 integer
    InvalidContentLength(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Transport(e) => write!(f, "{}", e),
            FrameError::MalformedHeader(line) => write!(f, "Malformed header line: {:?}", line),
            FrameError::InvalidContentLength(value) => {
                write!(f, "Invalid Content-Length: {:?}", value)
            }
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for FrameError {
    fn from(e: TransportError) -> Self {
        FrameError::Transport(e)
    }
}

/// A header field decoded from one `Name: value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    /// Parse a header line with its terminator already removed.
    ///
    /// The name must be non-empty and consist of ASCII letters, digits, `_`
    /// and `-`, followed by exactly `": "`. The value is the rest of the line.
    pub fn parse(line: &str) -> Result<Self, FrameError> {
        let malformed = || FrameError::MalformedHeader(line.to_string());

        let colon = line.find(':').ok_or_else(malformed)?;
        let name = &line[..colon];
        if name.is_empty() || !name.bytes().all(is_name_byte) {
            return Err(malformed());
        }

        let value = line[colon + 1..].strip_prefix(' ').ok_or_else(malformed)?;

        Ok(Header {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Framer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartLine,
    Headers,
    BodyByLength(usize),
    BodyByClose,
    Done,
}

/// Response text plus what the headers said about the body.
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    content_length: Option<usize>,
    connection_close: bool,
}

impl Accumulator {
    fn record(&mut self, header: &Header) -> Result<(), FrameError> {
        if header.is("content-length") {
            let length = header
                .value
                .trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(header.value.clone()))?;
            self.content_length = Some(length);
        }
        if header.is("connection") && header.value.trim().eq_ignore_ascii_case("close") {
            self.connection_close = true;
        }
        Ok(())
    }

    /// First body state once the blank line has been read.
    fn body_state(&self) -> State {
        match self.content_length {
            Some(length) if length > 0 => State::BodyByLength(length),
            _ => self.after_length(),
        }
    }

    fn after_length(&self) -> State {
        if self.connection_close {
            State::BodyByClose
        } else {
            State::Done
        }
    }
}

/// Read one complete response from `reader`.
///
/// Status and header lines are kept verbatim, terminators included. Body
/// reads translate CRLF to LF when `normalize_eol` is set. A body shorter
/// than its Content-Length (peer closed early) is returned as is.
pub fn read_response<R: Read>(reader: &mut R, normalize_eol: bool) -> Result<String, FrameError> {
    let mut acc = Accumulator::default();
    let mut state = State::StartLine;

    loop {
        state = match state {
            State::StartLine => {
                let line = transport::read_line(reader, false)?;
                trace!(status = %line.trim_end(), "Status line");
                acc.text.push_str(&line);
                State::Headers
            }
            State::Headers => {
                let line = transport::read_line(reader, false)?;
                let content = strip_eol(&line);
                let next = if content.is_empty() {
                    acc.body_state()
                } else {
                    let header = Header::parse(content)?;
                    trace!(name = %header.name, value = %header.value, "Header");
                    acc.record(&header)?;
                    State::Headers
                };
                acc.text.push_str(&line);
                next
            }
            State::BodyByLength(length) => {
                let body = transport::read_sized(reader, length, normalize_eol)?;
                trace!(expected = length, received = body.len(), "Sized body");
                acc.text.push_str(&body);
                acc.after_length()
            }
            State::BodyByClose => {
                let body = transport::read_until_close(reader, normalize_eol)?;
                trace!(received = body.len(), "Body until close");
                acc.text.push_str(&body);
                State::Done
            }
            State::Done => return Ok(acc.text),
        };
    }
}

/// Split a response into its head (status line, headers, blank line) and
/// body.
///
/// Returns the whole text as head when no blank line is found.
pub fn split_head(response: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in response.split_inclusive('\n') {
        offset += line.len();
        if offset > line.len() && strip_eol(line).is_empty() {
            return response.split_at(offset);
        }
    }
    (response, "")
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(raw: &str, normalize_eol: bool) -> Result<String, FrameError> {
        let mut reader = Cursor::new(raw.as_bytes().to_vec());
        read_response(&mut reader, normalize_eol)
    }

    #[test]
    fn test_parse_header() {
        let header = Header::parse("Content-Length: 42").unwrap();
        assert_eq!(header.name, "Content-Length");
        assert_eq!(header.value, "42");
        assert!(header.is("content-length"));

        let header = Header::parse("X_Custom-1: a: b ").unwrap();
        assert_eq!(header.name, "X_Custom-1");
        assert_eq!(header.value, "a: b ");

        let header = Header::parse("Empty: ").unwrap();
        assert_eq!(header.value, "");
    }

    #[test]
    fn test_parse_header_malformed() {
        for line in [
            "no separator",
            "Name:value",
            ": value",
            "Bad Name: value",
            "Name :value",
            "Ünïcode: value",
            "Name:",
        ] {
            assert!(
                matches!(Header::parse(line), Err(FrameError::MalformedHeader(_))),
                "accepted {:?}",
                line
            );
        }
    }

    #[test]
    fn test_length_framed() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloEXTRA";
        let mut reader = Cursor::new(raw.as_bytes().to_vec());
        let response = read_response(&mut reader, true).unwrap();
        assert_eq!(
            response,
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello"
        );
        // Nothing past the declared length is consumed.
        assert_eq!(reader.position() as usize, raw.len() - "EXTRA".len());
    }

    #[test]
    fn test_length_framed_eol_translation() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\na\r\nb\r\ncd";
        assert_eq!(
            read(raw, true).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\na\nb\ncd"
        );
        assert_eq!(
            read(raw, false).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\na\r\nb\r\ncd"
        );
    }

    #[test]
    fn test_close_framed() {
        let raw = "HTTP/1.0 200 OK\r\nConnection: close\r\n\r\nall of this\r\nuntil the end";
        assert_eq!(
            read(raw, false).unwrap(),
            raw
        );
    }

    #[test]
    fn test_close_flag_case_insensitive() {
        let raw = "HTTP/1.1 200 OK\r\nCONNECTION: Close\r\n\r\nbody";
        assert!(read(raw, false).unwrap().ends_with("\r\n\r\nbody"));
    }

    #[test]
    fn test_connection_keep_alive_reads_no_body() {
        let raw = "HTTP/1.1 204 No Content\r\nConnection: keep-alive\r\n\r\nleftover";
        assert_eq!(
            read(raw, false).unwrap(),
            "HTTP/1.1 204 No Content\r\nConnection: keep-alive\r\n\r\n"
        );
    }

    #[test]
    fn test_no_framing_headers_means_empty_body() {
        let raw = "HTTP/1.1 304 Not Modified\r\nETag: \"abc\"\r\n\r\nignored";
        assert_eq!(
            read(raw, true).unwrap(),
            "HTTP/1.1 304 Not Modified\r\nETag: \"abc\"\r\n\r\n"
        );
    }

    #[test]
    fn test_zero_content_length() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\nignored";
        assert!(read(raw, true).unwrap().ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_last_content_length_wins() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\ncontent-length: 4\r\n\r\nabcdef";
        assert!(read(raw, true).unwrap().ends_with("\r\n\r\nabcd"));
    }

    #[test]
    fn test_length_and_close_both_read() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabcdef";
        assert!(read(raw, true).unwrap().ends_with("\r\n\r\nabcdef"));
    }

    #[test]
    fn test_short_body() {
        let body = "x".repeat(40);
        let raw = format!("HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{}", body);
        let response = read(&raw, true).unwrap();
        let (_, got) = split_head(&response);
        assert_eq!(got, body);
    }

    #[test]
    fn test_huge_content_length_short_body() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 18446744073709551615\r\n\r\nhello";
        let response = read(raw, true).unwrap();
        assert_eq!(split_head(&response).1, "hello");

        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 1099511627776000\r\n\r\nhello";
        assert!(read(raw, true).unwrap().ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nbroken header\r\n\r\nok";
        match read(raw, true) {
            Err(FrameError::MalformedHeader(line)) => assert_eq!(line, "broken header"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_content_length() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: ten\r\n\r\n";
        assert!(matches!(
            read(raw, true),
            Err(FrameError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_bare_lf_header_block() {
        let raw = "HTTP/1.1 200 OK\nContent-Length: 2\n\nhi";
        assert_eq!(read(raw, true).unwrap(), raw);
    }

    #[test]
    fn test_truncated_headers() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n";
        assert!(matches!(
            read(raw, true),
            Err(FrameError::Transport(TransportError::Closed))
        ));
    }

    #[test]
    fn test_split_head() {
        let response = "HTTP/1.1 200 OK\r\nA: b\r\n\r\nbody\r\n\r\nmore";
        let (head, body) = split_head(response);
        assert_eq!(head, "HTTP/1.1 200 OK\r\nA: b\r\n\r\n");
        assert_eq!(body, "body\r\n\r\nmore");

        assert_eq!(split_head("HTTP/1.1 200 OK\r\n"), ("HTTP/1.1 200 OK\r\n", ""));
    }
}
