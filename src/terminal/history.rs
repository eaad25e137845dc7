//! Cursor-addressable history of submitted commands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards older commands.
    Prev,
    /// Towards newer commands.
    Next,
}

/// Submitted commands, oldest first, with a navigation cursor.
///
/// The cursor ranges over `-1..=len`. Both ends are sentinels ("before the
/// oldest" and "past the newest") and read back as an empty string.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: isize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `command` and park the cursor past the newest entry.
    pub fn push(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        self.cursor = self.len_isize();
    }

    /// Move the cursor one step and return the command under it.
    ///
    /// Returns `None` only when the history is empty. Repeated moves at
    /// either boundary stay put and keep returning `""`.
    pub fn navigate(&mut self, direction: Direction) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let len = self.len_isize();
        self.cursor = match direction {
            Direction::Prev => (self.cursor - 1).max(-1),
            Direction::Next => (self.cursor + 1).min(len),
        };

        let entry = usize::try_from(self.cursor)
            .ok()
            .and_then(|index| self.entries.get(index));
        Some(entry.cloned().unwrap_or_default())
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len_isize(&self) -> isize {
        isize::try_from(self.entries.len()).unwrap_or(isize::MAX)
    }
}
