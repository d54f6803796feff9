use chrono::{DateTime, Local};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A single transcript entry. Immutable once appended; the conversation is
/// append-only and insertion order is display order.
#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    /// Supporting excerpts returned alongside an answer; empty = none.
    pub chunks: String,
    /// How many chunks the backend retrieved in total, when it said.
    pub total_chunks: Option<usize>,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(text: String) -> Self {
        Self {
            sender: Sender::User,
            text,
            chunks: String::new(),
            total_chunks: None,
            timestamp: Local::now(),
        }
    }

    pub fn bot(text: String, chunks: String, total_chunks: Option<usize>) -> Self {
        Self {
            sender: Sender::Bot,
            text,
            chunks,
            total_chunks,
            timestamp: Local::now(),
        }
    }

    pub fn has_chunks(&self) -> bool {
        !self.chunks.is_empty()
    }
}
