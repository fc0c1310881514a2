use std::io::{self, Read};

/// The size of the chunks that [`ByteSource`] reads from its reader by default.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// A buffered byte reader with one byte of lookahead.
///
/// Unlike `io::Bytes`, peeking does not consume anything, and read errors are
/// handed to the caller instead of ending the stream.
pub struct ByteSource<R> {
    reader: R,
    buf: Box<[u8]>,
    valid_slice_start: usize,
    valid_slice_end: usize,
}

impl<R: Read> ByteSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            valid_slice_start: 0,
            valid_slice_end: 0,
        }
    }

    /// Returns the next byte without consuming it, or `None` at the end of the input.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.valid_slice_start == self.valid_slice_end && !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.valid_slice_start]))
    }

    /// Consumes and returns the next byte.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.valid_slice_start += 1;
        }
        Ok(b)
    }

    /// Drops the byte returned by the last successful `peek()`.
    pub fn consume(&mut self) {
        debug_assert!(self.valid_slice_start < self.valid_slice_end);
        self.valid_slice_start += 1;
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns the reader. Bytes that were already buffered are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> io::Result<bool> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(false),
                Ok(read_len) => {
                    self.valid_slice_start = 0;
                    self.valid_slice_end = read_len;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Chunked<'a> {
        chunks: Vec<io::Result<&'a [u8]>>,
    }

    impl Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0)?;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut source = ByteSource::with_capacity(&b"ab"[..], 1);
        assert_eq!(source.peek().unwrap(), Some(b'a'));
        assert_eq!(source.peek().unwrap(), Some(b'a'));
        assert_eq!(source.next_byte().unwrap(), Some(b'a'));
        assert_eq!(source.next_byte().unwrap(), Some(b'b'));
        assert_eq!(source.next_byte().unwrap(), None);
        assert_eq!(source.peek().unwrap(), None);
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let mut source = ByteSource::new(Chunked {
            chunks: vec![
                Err(io::Error::from(io::ErrorKind::Interrupted)),
                Ok(&b"x"[..]),
            ],
        });
        assert_eq!(source.next_byte().unwrap(), Some(b'x'));
    }

    #[test]
    fn test_read_errors_surface() {
        let mut source = ByteSource::new(Chunked {
            chunks: vec![Ok(&b"x"[..]), Err(io::Error::other("disk on fire"))],
        });
        assert_eq!(source.next_byte().unwrap(), Some(b'x'));
        let err = source.peek().unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }
}
