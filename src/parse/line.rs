use crate::parse::error::ParsingError;

/// Finds the CRLF terminated line starting at `start`.
/// Returns the line without its CRLF and the position right after it, or None if no '\n' has arrived yet.
/// A '\n' that is not preceded by '\r' is bad syntax.
pub fn crlf_line(buf: &[u8], start: usize) -> Result<Option<(&[u8], usize)>, ParsingError> {
    let rest = &buf[start..];
    let newline = match rest.iter().position(|b| *b == b'\n') {
        Some(newline) => newline,
        None => return Ok(None)
    };

    match newline.checked_sub(1).map(|i| rest[i]) {
        Some(b'\r') => Ok(Some((&rest[..newline - 1], start + newline + 1))),
        _ => Err(ParsingError::BadSyntax)
    }
}
