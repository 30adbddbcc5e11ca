use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// Largest line handed to the logger before it is split without a delimiter.
pub const MAX_LINE_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Splits a byte stream into newline delimited lines.
///
/// Lines are returned without their `\n` (and a preceding `\r`). When no
/// newline shows up within `max_line_size` bytes, the buffered bytes are
/// returned as a line of their own and scanning continues right after them.
/// A trailing fragment without newline is returned once the source is
/// exhausted.
///
/// A read error is yielded once, after which the iterator is fused.
pub struct LineSplitter<R> {
    reader: R,
    buf: BytesMut,
    chunk: Box<[u8]>,
    scanned: usize,
    max_line_size: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line_size(reader, MAX_LINE_SIZE)
    }

    pub fn with_max_line_size(reader: R, max_line_size: usize) -> Self {
        let max_line_size = max_line_size.max(1);

        Self {
            reader,
            buf: BytesMut::with_capacity(max_line_size.min(READ_CHUNK)),
            chunk: vec![0; max_line_size.min(READ_CHUNK)].into_boxed_slice(),
            scanned: 0,
            max_line_size,
            eof: false,
            done: false,
        }
    }

    pub fn max_line_size(&self) -> usize {
        self.max_line_size
    }

    fn take_line(&mut self, at: usize) -> Bytes {
        self.scanned = 0;
        self.buf.split_to(at).freeze()
    }

    fn take_delimited(&mut self, newline: usize) -> Bytes {
        self.scanned = 0;

        let mut line = self.buf.split_to(newline + 1);
        line.truncate(newline);
        drop_cr(&mut line);
        line.freeze()
    }

    /// Reads at most one chunk, never past `max_line_size` buffered bytes.
    fn fill(&mut self) -> io::Result<()> {
        let room = (self.max_line_size - self.buf.len()).min(self.chunk.len());

        let n = loop {
            match self.reader.read(&mut self.chunk[..room]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other?,
            }
        };

        self.buf.extend_from_slice(&self.chunk[..n]);
        self.eof = n == 0;

        Ok(())
    }
}

impl<R: Read> Iterator for LineSplitter<R> {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let unscanned = &self.buf[self.scanned..];
            if let Some(pos) = unscanned.iter().position(|b| *b == b'\n') {
                let newline = self.scanned + pos;
                return Some(Ok(self.take_delimited(newline)));
            }
            self.scanned = self.buf.len();

            if self.buf.len() >= self.max_line_size {
                return Some(Ok(self.take_line(self.max_line_size)));
            }

            if self.eof {
                if self.buf.is_empty() {
                    self.done = true;
                    return None;
                }

                self.scanned = 0;
                let mut line = self.buf.split();
                drop_cr(&mut line);
                return Some(Ok(line.freeze()));
            }

            if let Err(err) = self.fill() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

fn drop_cr(line: &mut BytesMut) {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
}
