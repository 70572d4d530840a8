/// Parsing errors.
pub mod error;
/// Incremental request decoding over a connection's read buffer.
pub mod request;

/// Line splitting shared by the head and chunk decoders.
mod line;
/// Decoder for chunked transfer-encoding bodies.
mod chunked;
