//! Chunked transfer-encoding. A chunked body might look like:
//! A\r\n
//! 0123456789\r\n
//! 0\r\n
//! \r\n

use crate::parse::error::ParsingError;
use crate::parse::line::crlf_line;

/// Longest chunk size line accepted, including extensions.
const MAX_SIZE_LINE: usize = 1024;

/// Decodes a chunked body that starts at `start` in the buffer.
/// Returns the body and the position right after the final CRLF, or None if the body has not fully arrived.
pub fn decode_chunked(buf: &[u8], start: usize, max_size: usize) -> Result<Option<(Vec<u8>, usize)>, ParsingError> {
    let mut body = vec![];
    let mut pos = start;

    loop {
        let (raw_size, next) = match crlf_line(buf, pos)? {
            Some(line) => line,
            None if buf.len() - pos > MAX_SIZE_LINE => return Err(ParsingError::InvalidChunkSize),
            None => return Ok(None)
        };

        let size = parse_chunk_size(raw_size)?;
        if size > max_size.saturating_sub(body.len()) {
            return Err(ParsingError::ContentLengthTooLarge);
        }
        pos = next;

        if size == 0 {
            return Ok(skip_trailers(buf, pos)?.map(|end| (body, end)));
        }

        // size is at most max_size here, so the offsets below cannot overflow
        let data_end = pos + size;
        if buf.len() < data_end + 2 {
            return Ok(None);
        }
        body.extend_from_slice(&buf[pos..data_end]);
        if &buf[data_end..data_end + 2] != b"\r\n" {
            return Err(ParsingError::BadSyntax);
        }
        pos = data_end + 2;
    }
}

/// Skips trailer fields after the last chunk. Returns the position after the terminating empty line.
fn skip_trailers(buf: &[u8], mut pos: usize) -> Result<Option<usize>, ParsingError> {
    loop {
        match crlf_line(buf, pos)? {
            Some((line, next)) if line.is_empty() => return Ok(Some(next)),
            Some((_, next)) => pos = next,
            None => return Ok(None)
        }
    }
}

/// Parses a hex chunk size, ignoring chunk extensions after ';'.
fn parse_chunk_size(raw: &[u8]) -> Result<usize, ParsingError> {
    let raw = std::str::from_utf8(raw).map_err(|_| ParsingError::InvalidChunkSize)?;
    let raw = raw.split(';').next().unwrap_or_default().trim();
    usize::from_str_radix(raw, 16).map_err(|_| ParsingError::InvalidChunkSize)
}
