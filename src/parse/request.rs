use crate::common::header::{CONTENT_LENGTH, Header, HeaderMap, HeaderMapOps, TRANSFER_ENCODING};
use crate::common::method::Method;
use crate::common::request::Request;
use crate::common::version::Version;
use crate::parse::chunked::decode_chunked;
use crate::parse::error::ParsingError;
use crate::parse::line::crlf_line;

/// The maximum size of the request line and headers together.
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

/// The maximum size of a body.
pub const MAX_BODY_SIZE: usize = 3 * 1024 * 1024; // 3 megabytes

/// The result of a decode call.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Not enough data has arrived for a full request.
    Incomplete,
    /// A full request was decoded and its bytes removed from the buffer.
    Request(Request),
}

/// Decodes requests out of a connection's read buffer. Keeps the parsed head between calls so a body
/// arriving in pieces does not cause the head to be parsed again.
pub struct RequestDecoder {
    head: Option<Head>,
}

/// A parsed request line and headers.
#[derive(Debug)]
struct Head {
    method: Method,
    uri: String,
    version: Version,
    headers: HeaderMap,
    framing: Framing,
    /// Number of bytes the head takes up in the buffer.
    length: usize,
}

/// How the body of a request is delimited.
#[derive(Debug, Copy, Clone)]
enum Framing {
    Empty,
    Length(usize),
    Chunked,
}

impl RequestDecoder {
    /// Creates a new request decoder.
    pub fn new() -> RequestDecoder {
        RequestDecoder { head: None }
    }

    /// Tries decoding one request from the start of the buffer. The bytes of a decoded request are drained from the
    /// buffer, leaving any pipelined requests behind it in place.
    pub fn decode(&mut self, buf: &mut Vec<u8>) -> Result<Decoded, ParsingError> {
        let head = match self.head.take() {
            Some(head) => head,
            None => match decode_head(buf)? {
                Some(head) => head,
                None => return Ok(Decoded::Incomplete)
            }
        };

        let body = match head.framing {
            Framing::Empty => Some((vec![], head.length)),
            Framing::Length(size) if buf.len() >= head.length + size =>
                Some((buf[head.length..head.length + size].to_vec(), head.length + size)),
            Framing::Length(_) => None,
            Framing::Chunked => decode_chunked(buf, head.length, MAX_BODY_SIZE)?
        };

        match body {
            Some((body, end)) => {
                buf.drain(..end);
                let Head { method, uri, version, headers, .. } = head;
                Ok(Decoded::Request(Request { method, uri, version, headers, body }))
            }
            None => {
                self.head = Some(head);
                Ok(Decoded::Incomplete)
            }
        }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        RequestDecoder::new()
    }
}

/// Parses the request line and headers if all of them have arrived.
fn decode_head(buf: &[u8]) -> Result<Option<Head>, ParsingError> {
    let (first_line, mut pos) = match crlf_line(buf, 0)? {
        Some(line) => line,
        None => return incomplete_head(buf.len())
    };
    let (method, uri, version) = parse_first_line(as_str(first_line)?)?;

    let mut headers = HeaderMap::new();
    loop {
        match crlf_line(buf, pos)? {
            Some((line, next)) if line.is_empty() => {
                pos = next;
                break;
            }
            Some((line, next)) => {
                let (header, value) = parse_header(as_str(line)?)?;
                headers.add_header(header, value);
                pos = next;
            }
            None => return incomplete_head(buf.len())
        }
    }

    if pos > MAX_HEAD_SIZE {
        return Err(ParsingError::HeadTooLarge);
    }

    let framing = framing(&headers)?;
    Ok(Some(Head { method, uri, version, headers, framing, length: pos }))
}

/// A head that has not fully arrived is only worth waiting on while it is under the size limit.
fn incomplete_head<T>(buffered: usize) -> Result<Option<T>, ParsingError> {
    if buffered > MAX_HEAD_SIZE {
        Err(ParsingError::HeadTooLarge)
    } else {
        Ok(None)
    }
}

fn as_str(raw: &[u8]) -> Result<&str, ParsingError> {
    std::str::from_utf8(raw).map_err(|_| ParsingError::InvalidUtf8)
}

/// Parses the first line of a request. Verifies the HTTP version and returns the method, URI and version.
fn parse_first_line(line: &str) -> Result<(Method, String, Version), ParsingError> {
    let mut split = line.split(' ');

    let method_raw = split.next().ok_or(ParsingError::BadSyntax)?;
    let uri = split.next().ok_or(ParsingError::BadSyntax)?;
    let version_raw = split.next().ok_or(ParsingError::BadSyntax)?;

    let version = Version::parse(version_raw).ok_or(ParsingError::InvalidHttpVersion)?;
    let method = Method::try_from_str(method_raw).ok_or(ParsingError::UnrecognizedMethod)?;

    Ok((method, uri.to_string(), version))
}

/// Parses a header line, splitting it at the first colon. Whitespace around the value is dropped.
fn parse_header(line: &str) -> Result<(Header, String), ParsingError> {
    let (name, value) = line.split_once(':').ok_or(ParsingError::BadSyntax)?;
    Ok((Header::from(name), value.trim().to_string()))
}

/// Works out how the body is delimited from the content-length and transfer-encoding headers. A request carrying
/// both, or a transfer-encoding other than chunked, is rejected since the body boundary would be ambiguous.
fn framing(headers: &HeaderMap) -> Result<Framing, ParsingError> {
    if headers.contains_key(&TRANSFER_ENCODING) {
        if headers.contains_key(&CONTENT_LENGTH) || !headers.contains_token(&TRANSFER_ENCODING, "chunked") {
            return Err(ParsingError::BadSyntax);
        }
        return Ok(Framing::Chunked);
    }

    if let Some(raw) = headers.get_first_header_value(&CONTENT_LENGTH) {
        let size: usize = raw.parse().map_err(|_| ParsingError::InvalidHeaderValue)?;
        if size > MAX_BODY_SIZE {
            return Err(ParsingError::ContentLengthTooLarge);
        }
        Ok(Framing::Length(size))
    } else {
        Ok(Framing::Empty)
    }
}
