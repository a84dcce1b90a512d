// ABOUTME: Append-only log of completed exchanges for one engine.
// ABOUTME: Entries are only ever appended; clear() is the sole removal.

use crate::types::HistoryEntry;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All entries, oldest first
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(user: &str) -> HistoryEntry {
        HistoryEntry {
            user: user.to_string(),
            agent: format!("answer to {user}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut history = History::default();
        history.append(entry("first"));
        history.append(entry("second"));
        history.append(entry("third"));

        let users: Vec<&str> = history.all().iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["first", "second", "third"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut history = History::default();
        history.append(entry("one"));
        history.append(entry("two"));
        history.clear();

        assert_eq!(history.len(), 0);
        assert!(history.all().is_empty());
    }
}
