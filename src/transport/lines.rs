//! Reassembly of newline-terminated lines from arbitrary byte chunks.

use crate::utf8::Utf8Decoder;

const LINE_TERMINATOR: char = '\n';

/// Holds output that has arrived but is not yet terminated.
///
/// A line is released exactly once, when its terminator arrives. Bytes after
/// the last terminator stay buffered until a later chunk completes them.
#[derive(Debug, Default)]
pub struct LineAssembler {
    decoder: Utf8Decoder,
    partial: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one inbound chunk and return every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decoder.decode(chunk);
        if text.is_empty() {
            return Vec::new();
        }
        self.partial.push_str(&text);

        let Some(last_break) = self.partial.rfind(LINE_TERMINATOR) else {
            return Vec::new();
        };

        let remainder = self.partial.split_off(last_break + LINE_TERMINATOR.len_utf8());
        let complete = std::mem::replace(&mut self.partial, remainder);
        complete
            .strip_suffix(LINE_TERMINATOR)
            .unwrap_or(&complete)
            .split(LINE_TERMINATOR)
            .map(str::to_string)
            .collect()
    }

    /// The unterminated tail currently held back.
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Throw away the unterminated tail without emitting it.
    ///
    /// Returns the number of bytes discarded.
    pub fn discard(&mut self) -> usize {
        let dropped = self.partial.len() + self.decoder.pending_len();
        self.partial.clear();
        self.decoder.reset();
        dropped
    }
}
