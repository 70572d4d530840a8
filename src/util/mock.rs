use std::cell::RefCell;
use std::cmp::min;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Read, Write};
use std::rc::Rc;

/// An in-memory stream standing in for a socket. Reads hand out the input fragments one read at a time.
pub struct MockStream {
    input: VecDeque<Vec<u8>>,
    /// Whether reads block once the input runs out, instead of reporting the peer closed the connection.
    pub would_block_when_empty: bool,
    /// Everything written to the stream.
    pub output: Rc<RefCell<Vec<u8>>>,
    /// Number of bytes writes accept before blocking. None accepts everything.
    pub write_capacity: Option<usize>,
}

impl MockStream {
    pub fn from_strs(input: Vec<&str>) -> MockStream {
        MockStream::from_bytes(input.into_iter().map(str::as_bytes).collect())
    }

    pub fn from_bytes(input: Vec<&[u8]>) -> MockStream {
        MockStream {
            input: input.into_iter().map(<[u8]>::to_vec).collect(),
            would_block_when_empty: false,
            output: Rc::new(RefCell::new(vec![])),
            write_capacity: None,
        }
    }

    /// Makes reads block when the input runs out, like an open socket with nothing to read.
    pub fn blocking(mut self) -> MockStream {
        self.would_block_when_empty = true;
        self
    }

    /// Adds more input, as if the peer sent it.
    pub fn push(&mut self, data: &str) {
        self.input.push_back(data.as_bytes().to_vec());
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let next = match self.input.front_mut() {
            Some(next) => next,
            None if self.would_block_when_empty => return Err(Error::from(ErrorKind::WouldBlock)),
            None => return Ok(0),
        };

        let amount = min(buf.len(), next.len());
        buf[..amount].copy_from_slice(&next[..amount]);
        next.drain(..amount);

        if next.is_empty() {
            self.input.pop_front();
        }

        Ok(amount)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let amount = match self.write_capacity {
            Some(0) => return Err(Error::from(ErrorKind::WouldBlock)),
            Some(capacity) => min(capacity, buf.len()),
            None => buf.len(),
        };
        if let Some(capacity) = self.write_capacity.as_mut() {
            *capacity -= amount;
        }
        self.output.borrow_mut().extend_from_slice(&buf[..amount]);
        Ok(amount)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};

    use crate::util::mock::MockStream;

    fn test_read(reader: &mut impl Read, expected: &str, buf_size: usize) {
        let mut buf = vec![0u8; buf_size];
        let len = reader.read(&mut buf).unwrap();
        assert_eq!(expected, String::from_utf8_lossy(&buf[..len]));
    }

    #[test]
    fn reads_fragments() {
        let mut stream = MockStream::from_strs(vec!["hello", "world"]);

        test_read(&mut stream, "hel", 3);
        test_read(&mut stream, "lo", 10);
        test_read(&mut stream, "world", 10);
        test_read(&mut stream, "", 10);
    }

    #[test]
    fn blocks_when_empty() {
        let mut stream = MockStream::from_strs(vec!["a"]).blocking();

        test_read(&mut stream, "a", 10);
        let err = stream.read(&mut [0u8; 10]).unwrap_err();
        assert_eq!(ErrorKind::WouldBlock, err.kind());

        stream.push("b");
        test_read(&mut stream, "b", 10);
    }

    #[test]
    fn write_capacity() {
        let mut stream = MockStream::from_strs(vec![]);
        stream.write_capacity = Some(3);

        assert_eq!(3, stream.write(b"hello").unwrap());
        assert_eq!(ErrorKind::WouldBlock, stream.write(b"lo").unwrap_err().kind());
        assert_eq!(b"hel".to_vec(), *stream.output.borrow());
    }
}
