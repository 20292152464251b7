//! Writer adapter: relays console-style output line by line.
//!
//! The hosting application injects a [`RelayWriter`] wherever it controls
//! the output stream of a component; the writer buffers bytes until a
//! newline, strips ANSI colors, and enqueues one event per complete line.
//! Unlike the usual console-capture tricks this never touches global
//! process streams.

use std::io::{self, Write};
use std::sync::Arc;

use channel_relay::{ChannelRelay, LogEvent, LogLevel};

/// `io::Write` implementation that forwards complete lines to the relay.
pub struct RelayWriter {
    relay: Arc<ChannelRelay>,
    logger: String,
    level: LogLevel,
    buffer: Vec<u8>,
}

impl RelayWriter {
    pub fn new(relay: Arc<ChannelRelay>, logger: impl Into<String>, level: LogLevel) -> Self {
        RelayWriter {
            relay,
            logger: logger.into(),
            level,
            buffer: Vec::new(),
        }
    }

    /// Writer for standard-output style text, logged as `SOUT` at info.
    pub fn stdout(relay: Arc<ChannelRelay>) -> Self {
        Self::new(relay, "SOUT", LogLevel::Info)
    }

    /// Writer for standard-error style text, logged as `SERR` at error.
    pub fn stderr(relay: Arc<ChannelRelay>) -> Self {
        Self::new(relay, "SERR", LogLevel::Error)
    }

    fn emit(&self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = LogEvent::strip_ansi(text.trim_end_matches(['\n', '\r']));
        if line.is_empty() {
            return;
        }
        self.relay
            .enqueue(LogEvent::new(self.logger.clone(), self.level, line));
    }
}

impl Write for RelayWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RelayWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.emit(&rest);
        }
    }
}
