use thiserror::Error;

/// Error for when an HTTP request can't be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsingError {
    /// Invalid syntax in the message.
    #[error("bad syntax")]
    BadSyntax,
    /// Message has wrong HTTP version.
    #[error("unsupported HTTP version")]
    InvalidHttpVersion,
    /// Header has invalid value.
    #[error("invalid header value")]
    InvalidHeaderValue,
    /// Size of chunk in chunked transfer encoding can not be parsed as a number.
    #[error("invalid chunk size")]
    InvalidChunkSize,
    /// Content length exceeds maximum size.
    #[error("content length exceeds the maximum body size")]
    ContentLengthTooLarge,
    /// Request line and headers exceed maximum size.
    #[error("request head exceeds the maximum size")]
    HeadTooLarge,
    /// Method is unrecognized.
    #[error("unrecognized method")]
    UnrecognizedMethod,
    /// Data is not valid UTF8.
    #[error("request head is not valid UTF-8")]
    InvalidUtf8,
}
