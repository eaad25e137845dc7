use crate::transport::OutputLine;

/// Append-only terminal log.
///
/// Insertion order is the only order. `take_unseen` lets a renderer pick up
/// just the lines appended since its last call.
#[derive(Debug, Default)]
pub struct OutputLog {
    lines: Vec<OutputLine>,
    seen: usize,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: OutputLine) {
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = OutputLine>) {
        self.lines.extend(lines);
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines appended since the previous call.
    pub fn take_unseen(&mut self) -> Vec<OutputLine> {
        let unseen = self.lines[self.seen..].to_vec();
        self.seen = self.lines.len();
        unseen
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.seen = 0;
    }
}
