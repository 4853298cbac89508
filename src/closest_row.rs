//! src/closest_row.rs
//!
//! Memoized nearest-row lookup used by hover and tooltips.

use std::collections::HashMap;

use crate::payload::Row;

/// Bound on memoized queries before the memo starts over.
const MAX_ENTRIES: usize = 4_096;

/// Index of the row whose timestamp is closest to `timestamp`.
///
/// Rows must be ascending by timestamp. Ties go to the earlier row.
pub fn closest_row_index(rows: &[Row], timestamp: i64) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    let next = rows.partition_point(|row| row.timestamp < timestamp);
    if next == 0 {
        return Some(0);
    }
    if next == rows.len() {
        return Some(rows.len() - 1);
    }
    let to_prev = timestamp - rows[next - 1].timestamp;
    let to_next = rows[next].timestamp - timestamp;
    Some(if to_next < to_prev { next } else { next - 1 })
}

/// Memo of `closest_row_index` keyed by query timestamp (ms).
///
/// Must be invalidated whenever the rows it was computed over change.
#[derive(Debug, Default)]
pub struct ClosestRowCache {
    memo: HashMap<i64, Option<usize>>,
}

impl ClosestRowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, rows: &[Row], timestamp: i64) -> Option<usize> {
        if let Some(hit) = self.memo.get(&timestamp) {
            return *hit;
        }
        if self.memo.len() >= MAX_ENTRIES {
            self.memo.clear();
        }
        let index = closest_row_index(rows, timestamp);
        self.memo.insert(timestamp, index);
        index
    }

    pub fn invalidate(&mut self) {
        self.memo.clear();
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}
