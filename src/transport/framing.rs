//! Splitting the received byte stream into status lines.

use std::{collections::VecDeque, fmt};

use hexplay::HexViewBuilder;
use log::{log_enabled, trace, Level::Trace};

use super::Transport;

/// A partial line longer than this is handed over as is.
const MAX_LINE: usize = 1024;

/// Maximum amount of data read from the port at once.
const READ_CHUNK: usize = 4096;

// =============================================================================
// Public Interface
// =============================================================================

/// A status line as received from the device, decoded and trimmed but not
/// interpreted yet. Never empty.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawLine(String);
impl RawLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
impl fmt::Display for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads complete lines from a transport without blocking.
pub struct LineReader {
    transport: Box<dyn Transport>,
    framer: LineFramer,
    ready: VecDeque<RawLine>,
}
impl LineReader {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        LineReader {
            transport,
            framer: LineFramer::default(),
            ready: VecDeque::new(),
        }
    }

    /// Return the next complete line, or `None` if the device has not sent
    /// one yet.
    ///
    /// To handle the unreliable blocking behavior of reads over the serial
    /// port, the amount of data available in the port's input buffer is
    /// checked first and only that much is read, so the read always returns
    /// immediately.
    pub fn read_line(&mut self) -> std::io::Result<Option<RawLine>> {
        if self.ready.is_empty() {
            let available = self.transport.bytes_to_read()?;
            if available > 0 {
                let mut buf = vec![0; available.min(READ_CHUNK)];
                let count = self.transport.read(&mut buf)?;
                trace!("{} bytes received", count);
                if log_enabled!(Trace) {
                    let view = HexViewBuilder::new(&buf[..count])
                        .address_offset(0)
                        .row_width(16)
                        .finish();
                    trace!("\n{}", view);
                }
                self.framer.push(&buf[..count], &mut self.ready);
            }
        }
        Ok(self.ready.pop_front())
    }
}

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Accumulates bytes until a `\n` terminates a line.
#[derive(Debug, Default)]
pub(crate) struct LineFramer {
    pending: Vec<u8>,
}
impl LineFramer {
    pub(crate) fn push(&mut self, bytes: &[u8], out: &mut VecDeque<RawLine>) {
        for &byte in bytes {
            if byte == b'\n' {
                self.flush(out);
            } else {
                self.pending.push(byte);
                if self.pending.len() >= MAX_LINE {
                    self.flush(out);
                }
            }
        }
    }

    fn flush(&mut self, out: &mut VecDeque<RawLine>) {
        let text = decode(&self.pending);
        self.pending.clear();
        let text = text.trim();
        if !text.is_empty() {
            out.push_back(RawLine(text.to_owned()));
        }
    }
}

/// Decode UTF-8, dropping invalid sequences instead of replacing them.
pub(crate) fn decode(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    text.push_str(valid);
                }
                match err.error_len() {
                    Some(len) => rest = &after[len..],
                    // truncated sequence at the end
                    None => return text,
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
