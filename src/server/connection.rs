use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;

use crate::common::request::Request;
use crate::parse::error::ParsingError;
use crate::parse::request::{Decoded, RequestDecoder};
use crate::server::connection::ReadRequestResult::{Closed, Error, NotReady, Ready};

/// Size of the chunks read off the stream.
const READ_CHUNK_SIZE: usize = 4096;

/// The result of attempting to read a request.
#[derive(Debug)]
pub enum ReadRequestResult {
    /// There is not enough data yet for a request to be fully decoded.
    NotReady,
    /// A new request has been decoded.
    Ready(Request),
    /// An error occurred while trying to read a request.
    Error(ReadRequestError),
    /// The connection was closed.
    Closed,
}

/// An error that may result from trying to read a request.
#[derive(thiserror::Error, Debug)]
pub enum ReadRequestError {
    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    ParseErr(#[from] ParsingError),
    /// The client closed its side of the connection in the middle of a request.
    #[error("connection closed with an incomplete request")]
    Truncated,
    /// An unhandled IO error.
    #[error("io error: {0}")]
    IoErr(#[from] std::io::Error),
}

/// A connection to a client. Holds the bytes read but not yet decoded, and the bytes written but not yet
/// accepted by the stream.
pub struct Connection<S: Read + Write> {
    /// The address of the client.
    pub addr: SocketAddr,
    stream: S,
    inbound: Vec<u8>,
    outbound: Vec<u8>,
    decoder: RequestDecoder,
    read_closed: bool,
    closing: bool,
}

impl<S: Read + Write> Connection<S> {
    /// Creates a new connection out of the given address and stream.
    pub fn new(addr: SocketAddr, stream: S) -> Connection<S> {
        Connection {
            addr,
            stream,
            inbound: vec![],
            outbound: vec![],
            decoder: RequestDecoder::new(),
            read_closed: false,
            closing: false,
        }
    }

    /// Attempts to decode a request from the data read so far, reading more from the stream until a request is
    /// complete or the stream blocks.
    pub fn read_request(&mut self) -> ReadRequestResult {
        loop {
            match self.decoder.decode(&mut self.inbound) {
                Ok(Decoded::Request(request)) => return Ready(request),
                Ok(Decoded::Incomplete) => {}
                Err(err) => return Error(err.into()),
            }

            if self.read_closed {
                return if self.inbound.is_empty() { Closed } else { Error(ReadRequestError::Truncated) };
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match self.stream.read(&mut chunk) {
                Ok(0) => self.read_closed = true,
                Ok(size) => self.inbound.extend_from_slice(&chunk[..size]),
                Err(err) if err.kind() == ErrorKind::WouldBlock => return NotReady,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) if is_closed(&err) => return Closed,
                Err(err) => return Error(err.into()),
            }
        }
    }

    /// Marks the connection to be dropped once everything written to it has been flushed.
    pub fn close_after_flush(&mut self) {
        self.closing = true;
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Checks if written data is still waiting for the stream to accept it.
    pub fn has_pending_output(&self) -> bool {
        !self.outbound.is_empty()
    }
}

impl<S: Read + Write> Write for Connection<S> {
    /// Buffers the data. Nothing reaches the stream until flushed.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// Writes buffered data to the stream until done or until the stream blocks. Data the stream did not accept
    /// stays buffered for the next flush.
    fn flush(&mut self) -> std::io::Result<()> {
        let mut written = 0;
        while written < self.outbound.len() {
            match self.stream.write(&self.outbound[written..]) {
                Ok(0) => {
                    self.outbound.drain(..written);
                    return Err(ErrorKind::WriteZero.into());
                }
                Ok(size) => written += size,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.outbound.drain(..written);
                    return Err(err);
                }
            }
        }
        self.outbound.drain(..written);

        match self.stream.flush() {
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            result => result
        }
    }
}

/// Checks if the given IO error means the client is gone.
fn is_closed(error: &std::io::Error) -> bool {
    matches!(error.kind(), ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe)
}
