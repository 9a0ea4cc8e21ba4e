//! Splitting of multi-document YAML streams
//!
//! A document boundary is a line consisting of exactly `---`. The marker
//! anywhere else (inside a line, `----`, `--- foo`) is ordinary content.

use std::io::{BufRead, Read};
use std::iter::FusedIterator;

use crate::error::{CoreError, Result};

/// Default upper bound for a single document (5 MiB)
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 5 * 1024 * 1024;

const SEPARATOR: &[u8] = b"---";

/// Slack read past the size limit so a separator line is still recognized
/// when the buffer is exactly full.
const SEPARATOR_SLACK: usize = 8;

/// Lazy iterator over the raw documents of a stream
///
/// Yields each document as the bytes between two separators, leading and
/// trailing whitespace untouched. The trailing segment is yielded even
/// without a closing separator. After the first error the iterator is
/// exhausted.
pub struct DocumentSplitter<R> {
    reader: R,
    max_size: usize,
    buffer: Vec<u8>,
    line: Vec<u8>,
    done: bool,
}

impl<R: BufRead> DocumentSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_size(reader, DEFAULT_MAX_DOCUMENT_SIZE)
    }

    pub fn with_max_size(reader: R, max_size: usize) -> Self {
        Self {
            reader,
            max_size,
            buffer: Vec::with_capacity(4 * 1024),
            line: Vec::new(),
            done: false,
        }
    }

    fn read_line(&mut self) -> std::io::Result<usize> {
        self.line.clear();
        let allowance = self.max_size.saturating_sub(self.buffer.len()) + SEPARATOR_SLACK;
        (&mut self.reader)
            .take(allowance as u64)
            .read_until(b'\n', &mut self.line)
    }

    fn fail(&mut self, err: CoreError) -> Option<Result<Vec<u8>>> {
        self.done = true;
        self.buffer.clear();
        Some(Err(err))
    }
}

fn is_separator(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == SEPARATOR
}

impl<R: BufRead> Iterator for DocumentSplitter<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let read = match self.read_line() {
                Ok(n) => n,
                Err(e) => return self.fail(e.into()),
            };

            if read == 0 {
                self.done = true;
                if self.buffer.is_empty() {
                    return None;
                }
                return Some(Ok(std::mem::take(&mut self.buffer)));
            }

            if is_separator(&self.line) {
                return Some(Ok(std::mem::take(&mut self.buffer)));
            }

            if self.buffer.len() + self.line.len() > self.max_size {
                let limit = self.max_size;
                return self.fail(CoreError::OversizedDocument { limit });
            }

            self.buffer.extend_from_slice(&self.line);
        }
    }
}

impl<R: BufRead> FusedIterator for DocumentSplitter<R> {}
