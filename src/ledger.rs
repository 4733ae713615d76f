use std::collections::VecDeque;
use std::fmt;

use tabled::{settings::Style, Table, Tabled};

use crate::types::LedgerEntry;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default)]
pub struct SessionLedger {
    entries: VecDeque<LedgerEntry>,
    capacity: Option<usize>,
    evicted: u64,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that drops its oldest entries once `capacity` is reached.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
            evicted: 0,
        }
    }

    pub fn append(&mut self, entry: LedgerEntry) {
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.pop_front();
                self.evicted += 1;
            }
        }
        self.entries.push_back(entry);
    }

    /// Entries in insertion (chronological) order.
    pub fn snapshot(&self) -> Vec<LedgerEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct LedgerRow {
    #[tabled(rename = "Face ID")]
    pub face_id: String,
    #[tabled(rename = "Event")]
    pub event: String,
    #[tabled(rename = "Time")]
    pub time: String,
}

impl From<&LedgerEntry> for LedgerRow {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            face_id: entry.subject.to_string(),
            event: entry.event.label().to_string(),
            time: entry.at.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Read-only tabular view over a ledger snapshot.
#[derive(Debug, Clone)]
pub struct LedgerReport {
    rows: Vec<LedgerRow>,
}

impl LedgerReport {
    pub fn new(entries: &[LedgerEntry]) -> Self {
        Self {
            rows: entries.iter().map(LedgerRow::from).collect(),
        }
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }
}

impl fmt::Display for LedgerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "No activity logged yet.");
        }
        let table = Table::new(&self.rows).with(Style::psql()).to_string();
        writeln!(f, "{table}")
    }
}
