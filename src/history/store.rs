use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::content::QrKind;

/// Characters of the payload kept in an entry
pub const SUMMARY_CHARS: usize = 50;

pub const DEFAULT_CAPACITY: usize = 50;

/// One successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub kind: QrKind,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(kind: QrKind, payload: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            summary: payload.chars().take(SUMMARY_CHARS).collect(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindCount {
    pub kind: QrKind,
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub by_kind: Vec<KindCount>,
}

/// Bounded in-memory log of generations, oldest evicted first
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryStore {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, evicting the oldest ones beyond capacity
    pub fn record(&mut self, entry: HistoryEntry) {
        debug!(id = %entry.id, kind = entry.kind.as_str(), "Recorded history entry");
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(id = %evicted.id, "Evicted history entry");
            }
        }
    }

    /// Entries, newest first
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    /// Counts per kind, most frequent first
    pub fn stats(&self) -> HistoryStats {
        let total = self.entries.len();
        let mut counts: BTreeMap<QrKind, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_default() += 1;
        }

        let mut by_kind: Vec<KindCount> = counts
            .into_iter()
            .map(|(kind, count)| KindCount {
                kind,
                label: kind.label(),
                count,
                percent: if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                },
            })
            .collect();
        // Stable sort keeps kind order among ties.
        by_kind.sort_by(|a, b| b.count.cmp(&a.count));

        HistoryStats { total, by_kind }
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}
