//! Input/output plumbing: where `READ` gets its lines from, and where
//! `WRITE`/`DPRINT`/`BREAK` send their output.
//!
//! Grounded on `vm.rs`'s `FileState`/mount abstraction, which keeps file
//! access behind a narrow seam instead of scattering `std::fs` calls
//! through the dispatch loop.

use std::fmt;
use std::io::{self, BufRead, BufReader};

/// Where `READ` pulls its lines from.
///
/// Opened lazily by the engine on the first `READ`, then kept open for the
/// rest of execution (SPEC_FULL.md §4.4/§5).
pub trait InputSource {
    /// Returns the next line with its terminator stripped, or `None` at
    /// end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads lines from an already-open reader (a file, or anything else that
/// implements `BufRead`).
pub struct BufferedInput<R: BufRead> {
    reader: R,
}

impl<R: BufRead> BufferedInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl BufferedInput<BufReader<std::fs::File>> {
    pub fn open_file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(std::fs::File::open(path)?)))
    }
}

impl<R: BufRead> InputSource for BufferedInput<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        // Trim only the line terminator, never surrounding whitespace
        // (SPEC_FULL.md §9, open question 3).
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Reads lines from the process's real standard input.
pub struct StdinInput {
    stdin: io::Stdin,
}

impl StdinInput {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for StdinInput {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// An input source that never has a line, for runs that never call `READ`.
#[derive(Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(None)
    }
}

impl fmt::Debug for NoInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoInput")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_input_strips_newline_only() {
        let mut input = BufferedInput::new(io::Cursor::new(b"  hello  \nworld\n".to_vec()));
        assert_eq!(input.read_line().unwrap(), Some("  hello  ".to_string()));
        assert_eq!(input.read_line().unwrap(), Some("world".to_string()));
        assert_eq!(input.read_line().unwrap(), None);
    }

    #[test]
    fn buffered_input_strips_crlf() {
        let mut input = BufferedInput::new(io::Cursor::new(b"a\r\nb".to_vec()));
        assert_eq!(input.read_line().unwrap(), Some("a".to_string()));
        assert_eq!(input.read_line().unwrap(), Some("b".to_string()));
    }

    #[test]
    fn no_input_is_always_eof() {
        let mut input = NoInput;
        assert_eq!(input.read_line().unwrap(), None);
    }
}
