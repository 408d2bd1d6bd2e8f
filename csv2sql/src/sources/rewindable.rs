//! Rewindable line source.
//!
//! [`RewindableLines`] reads lines from a forward-only source and keeps a copy
//! of everything it has read in a spill buffer: memory first, an anonymous
//! temporary file once the buffer grows past its size limit. This lets the
//! same input (stdin included) be read twice, once for type inference and once
//! for the data dump.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};

use tempfile::SpooledTempFile;
use tracing::debug;

/// Default size of the in-memory part of the buffer (10 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Options for [`RewindableLines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewindOptions {
    /// Bytes kept in memory before the buffer spills to a temporary file.
    /// Larger values trade memory for speed.
    pub buffer_size: usize,
}

impl Default for RewindOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl RewindOptions {
    /// Sets the in-memory buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

type SpillBuffer = BufReader<SpooledTempFile>;

/// A line iterator that can be rewound to its first line.
///
/// Lines keep their terminators, so the replayed bytes are identical to the
/// bytes read from the source. The buffer is released when the value is
/// dropped, on every path.
///
/// # Examples
///
/// ```rust
/// use csv2sql::sources::RewindableLines;
///
/// let mut lines = RewindableLines::new("A\nB\n".as_bytes());
/// assert_eq!(lines.next().unwrap().unwrap(), "A\n");
///
/// lines.rewind().unwrap();
/// let frozen: Vec<String> = lines.freeze().collect::<Result<_, _>>().unwrap();
/// assert_eq!(frozen, vec!["A\n", "B\n"]);
/// ```
#[derive(Debug)]
pub struct RewindableLines<R> {
    source: R,
    buffer: Option<SpillBuffer>,
    replaying: bool,
}

impl<R: BufRead> RewindableLines<R> {
    /// Wraps a source with the default buffer size.
    pub fn new(source: R) -> Self {
        Self::with_options(source, RewindOptions::default())
    }

    /// Wraps a source.
    pub fn with_options(source: R, options: RewindOptions) -> Self {
        Self {
            source,
            buffer: Some(BufReader::new(SpooledTempFile::new(options.buffer_size))),
            replaying: false,
        }
    }

    /// Moves the read position back to the first buffered line.
    ///
    /// Nothing buffered is discarded; reading continues from the live source
    /// once the buffered lines are replayed.
    pub fn rewind(&mut self) -> io::Result<()> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "rewind on a closed buffer"))?;
        buffer.get_mut().flush()?;
        buffer.seek(SeekFrom::Start(0))?;
        self.replaying = true;
        Ok(())
    }

    /// Stops buffering and returns the rest of the input.
    ///
    /// The returned iterator yields the buffered lines not read yet, then the
    /// remaining lines of the source.
    pub fn freeze(mut self) -> FrozenLines<R> {
        let replay = if self.replaying {
            self.buffer.take()
        } else {
            None
        };
        FrozenLines {
            replay,
            source: self.source,
        }
    }

    /// Returns true once the buffer has been released.
    pub fn is_closed(&self) -> bool {
        self.buffer.is_none()
    }

    /// Releases the buffer. Later reads come straight from the source.
    pub fn close(&mut self) {
        self.buffer = None;
        self.replaying = false;
    }

    /// Returns true if the buffer has moved from memory to a temporary file.
    pub fn is_spilled(&self) -> bool {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.get_ref().is_rolled())
            .unwrap_or(false)
    }

    fn read_live(&mut self) -> io::Result<Option<String>> {
        let Some(line) = read_line(&mut self.source)? else {
            return Ok(None);
        };
        if let Some(buffer) = self.buffer.as_mut() {
            let was_spilled = buffer.get_ref().is_rolled();
            buffer.get_mut().write_all(line.as_bytes())?;
            if !was_spilled && buffer.get_ref().is_rolled() {
                debug!("Rewind buffer spilled to a temporary file");
            }
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for RewindableLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.replaying {
            if let Some(buffer) = self.buffer.as_mut() {
                match read_line(buffer) {
                    Ok(Some(line)) => return Some(Ok(line)),
                    Ok(None) => self.replaying = false,
                    Err(e) => return Some(Err(e)),
                }
            }
        }
        self.read_live().transpose()
    }
}

/// The rest of a [`RewindableLines`] after [`RewindableLines::freeze`].
#[derive(Debug)]
pub struct FrozenLines<R> {
    replay: Option<SpillBuffer>,
    source: R,
}

impl<R> FrozenLines<R> {
    /// Returns true once the replayed part is exhausted and its buffer released.
    pub fn is_closed(&self) -> bool {
        self.replay.is_none()
    }
}

impl<R: BufRead> Iterator for FrozenLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(replay) = self.replay.as_mut() {
            match read_line(replay) {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => self.replay = None,
                Err(e) => return Some(Err(e)),
            }
        }
        read_line(&mut self.source).transpose()
    }
}

fn read_line<B: BufRead>(reader: &mut B) -> io::Result<Option<String>> {
    let mut line = String::new();
    match reader.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}

/// Adapts an iterator of lines into a byte reader.
///
/// The CSV reader consumes bytes, while the rewind buffer hands out lines.
#[derive(Debug)]
pub struct LinesReader<I> {
    lines: I,
    pending: Vec<u8>,
    offset: usize,
}

impl<I> LinesReader<I> {
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            pending: Vec::new(),
            offset: 0,
        }
    }
}

impl<I: Iterator<Item = io::Result<String>>> Read for LinesReader<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.offset >= self.pending.len() {
            match self.lines.next() {
                Some(line) => {
                    self.pending = line?.into_bytes();
                    self.offset = 0;
                }
                None => return Ok(0),
            }
        }

        let available = &self.pending[self.offset..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.offset += count;
        Ok(count)
    }
}
