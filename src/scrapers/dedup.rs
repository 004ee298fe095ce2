//! First-write-wins title uniqueness for one scan session.
//!
//! Identity is the trimmed title, compared byte for byte. Two different
//! stories that share a headline collapse into whichever was seen first;
//! that coarseness is accepted rather than papered over with a second key.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct DeduplicationSet {
    seen: HashSet<String>,
}

impl DeduplicationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `title` and return `true` if it has not been seen before.
    ///
    /// Blank titles are never accepted.
    pub fn accept(&mut self, title: &str) -> bool {
        let key = title.trim();
        if key.is_empty() {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
