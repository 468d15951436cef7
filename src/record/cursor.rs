//! Iteration state of a record
//!
//! ```text
//!            find_set()                    find_set_buffered()
//!   Idle ───────────────▶ Streaming      Idle ──────────────────▶ Buffered
//!    ▲                        │           ▲                          │
//!    └── exhausted / reset ───┘           └──────── reset ───────────┘
//! ```
//!
//! Streaming reads one page at a time with keyset pagination, so no
//! statement outlives a call. Buffered holds the whole filtered result.

use rusqlite::types::Value as SqlValue;
use std::collections::VecDeque;

use crate::error::Result;
use crate::query::executor::{self, Query};
use crate::storage::Binding;
use crate::table::Table;

#[derive(Debug)]
pub(crate) enum Cursor<T> {
    Idle,
    Streaming(Stream<T>),
    Buffered(Buffer<T>),
}

impl<T> Default for Cursor<T> {
    fn default() -> Self {
        Cursor::Idle
    }
}

impl<T> Cursor<T> {
    pub(crate) fn is_streaming(&self) -> bool {
        matches!(self, Cursor::Streaming(_))
    }
}

/// Forward-only, paged
#[derive(Debug)]
pub(crate) struct Stream<T> {
    query: Query,
    page: VecDeque<T>,
    /// Position of the last row handed out
    after: Option<Vec<SqlValue>>,
    page_size: usize,
    exhausted: bool,
}

impl<T: Table> Stream<T> {
    pub(crate) fn new(query: Query, page_size: usize) -> Self {
        Self {
            query,
            page: VecDeque::new(),
            after: None,
            page_size: page_size.max(1),
            exhausted: false,
        }
    }

    /// Advance one row
    pub(crate) fn advance(&mut self, binding: &Binding<'_>) -> Result<Option<T>> {
        if self.page.is_empty() && !self.exhausted {
            self.fill(binding)?;
        }
        let row = self.page.pop_front();
        if let Some(row) = &row {
            self.after = Some(self.query.position_of(row));
        }
        Ok(row)
    }

    fn fill(&mut self, binding: &Binding<'_>) -> Result<()> {
        let rows = executor::fetch::<T>(
            binding,
            &self.query,
            self.after.as_deref(),
            Some(self.page_size),
        )?;
        if rows.len() < self.page_size {
            self.exhausted = true;
        }
        self.page.extend(rows);
        Ok(())
    }
}

/// Fully materialized, bidirectional
#[derive(Debug)]
pub(crate) struct Buffer<T> {
    rows: Vec<T>,
    pos: usize,
}

impl<T: Clone> Buffer<T> {
    pub(crate) fn new(rows: Vec<T>) -> Self {
        Self { rows, pos: 0 }
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.rows.get(self.pos)
    }

    /// Move by `steps`; out of bounds leaves the position unchanged
    pub(crate) fn seek(&mut self, steps: i64) -> Option<&T> {
        let target = i64::try_from(self.pos).ok()?.checked_add(steps)?;
        let target = usize::try_from(target).ok()?;
        if target >= self.rows.len() {
            return None;
        }
        self.pos = target;
        self.rows.get(target)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
