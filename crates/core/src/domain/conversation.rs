use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_HISTORY: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Customer,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryRecord {
    /// `Customer: ...` or `<assistant name>: ...`.
    pub fn render(&self, assistant_name: &str) -> String {
        match self.speaker {
            Speaker::Customer => format!("Customer: {}", self.text),
            Speaker::Assistant => format!("{assistant_name}: {}", self.text),
        }
    }
}

/// Bounded FIFO of utterances. Appending past `max_len` drops the oldest records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationHistory {
    records: VecDeque<HistoryRecord>,
    max_len: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::with_max_len(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationHistory {
    pub fn with_max_len(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self { records: VecDeque::with_capacity(max_len + 1), max_len }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.records.push_back(HistoryRecord { speaker, text: text.into() });
        while self.records.len() > self.max_len {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> + '_ {
        self.records.iter()
    }

    /// The last `window` records rendered one per line.
    pub fn context(&self, window: usize, assistant_name: &str) -> String {
        let skip = self.records.len().saturating_sub(window);
        self.records
            .iter()
            .skip(skip)
            .map(|record| record.render(assistant_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
