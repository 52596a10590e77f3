//! The rendered log list.
//!
//! Two writers touch it: a bulk load (`GET /api/logs`) that replaces the
//! loaded rows wholesale, and the live feed that prepends one row per push.
//! Pushed rows are kept apart from loaded rows so a bulk load finishing after
//! a push cannot erase it; a pushed row only goes away once the bulk result
//! itself contains that entry.

use std::collections::VecDeque;

use crate::models::LogEvent;

#[derive(Debug, Clone, Default)]
pub struct LogList {
    /// Live rows, newest first
    pushed: VecDeque<LogEvent>,
    /// Last bulk load, in server order
    loaded: Vec<LogEvent>,
}

impl LogList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded rows. Pushed rows not contained in `rows` stay on top.
    pub fn bulk_load(&mut self, rows: Vec<LogEvent>) {
        let before = self.pushed.len();
        self.pushed
            .retain(|live| !rows.iter().any(|row| row.same_entry(live)));
        if self.pushed.len() != before {
            tracing::debug!(
                merged = before - self.pushed.len(),
                "live log rows superseded by bulk load"
            );
        }
        self.loaded = rows;
    }

    /// Put a freshly pushed row in front of everything shown
    pub fn prepend(&mut self, row: LogEvent) {
        self.pushed.push_front(row);
    }

    /// Rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &LogEvent> {
        self.pushed.iter().chain(self.loaded.iter())
    }

    pub fn to_vec(&self) -> Vec<LogEvent> {
        self.rows().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pushed.len() + self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pushed_len(&self) -> usize {
        self.pushed.len()
    }
}
