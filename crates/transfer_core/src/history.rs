use shared::domain::HistoryEntry;

/// In-memory log of finished runs, most recent first.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
