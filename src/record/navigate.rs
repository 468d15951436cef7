//! Find, iterate and count

use super::cursor::{Buffer, Cursor, Stream};
use super::{logged, Record};
use crate::error::{Error, Result};
use crate::query::executor;
use crate::table::Table;

impl<'s, T: Table> Record<'s, T> {
    /// Load the first row in current-key order
    pub fn find_first(&mut self) -> Result<bool> {
        self.find_one(false)
    }

    /// Load the last row in current-key order
    pub fn find_last(&mut self) -> Result<bool> {
        self.find_one(true)
    }

    fn find_one(&mut self, last: bool) -> Result<bool> {
        let binding = self.binding()?.clone();
        self.cursor = Cursor::Idle;

        let mut query = self.query()?;
        if last {
            query = query.reversed();
        }
        let mut rows = logged::<T, _>("find", executor::fetch::<T>(&binding, &query, None, Some(1)))?;
        if rows.is_empty() {
            return Ok(false);
        }
        self.load(rows.swap_remove(0));
        Ok(true)
    }

    /// Start a forward-only pass and load its first row
    pub fn find_set(&mut self) -> Result<bool> {
        let binding = self.binding()?.clone();
        self.cursor = Cursor::Idle;

        let page_size = binding.store().config().stream_page_size;
        let mut stream = Stream::new(self.query()?, page_size);
        match logged::<T, _>("find_set", stream.advance(&binding))? {
            Some(row) => {
                self.load(row);
                self.cursor = Cursor::Streaming(stream);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Materialize every matching row and load the first
    pub fn find_set_buffered(&mut self) -> Result<bool> {
        let binding = self.binding()?.clone();
        self.cursor = Cursor::Idle;

        let limit = binding.store().config().max_buffered_rows;
        let query = self.query()?;
        let rows = logged::<T, _>(
            "find_set_buffered",
            executor::fetch::<T>(&binding, &query, None, limit.map(|n| n.saturating_add(1))),
        )?;
        if let Some(limit) = limit {
            if rows.len() > limit {
                return Err(Error::BufferLimit {
                    table: T::TABLE_NAME.to_string(),
                    limit,
                });
            }
        }

        let buffer = Buffer::new(rows);
        match buffer.current().cloned() {
            Some(row) => {
                self.load(row);
                self.cursor = Cursor::Buffered(buffer);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move to the next row
    pub fn next(&mut self) -> Result<bool> {
        self.next_by(1)
    }

    /// Move `steps` rows; negative steps need a buffered set
    ///
    /// On failure the field values stay as they were. A stream that runs
    /// out is released; a buffer keeps its position.
    pub fn next_by(&mut self, steps: i64) -> Result<bool> {
        let binding = self.binding()?.clone();

        let row = match &mut self.cursor {
            Cursor::Idle => return Ok(false),
            Cursor::Streaming(stream) => {
                if steps <= 0 {
                    tracing::warn!(
                        table = T::TABLE_NAME,
                        steps,
                        "streaming sets only move forward; use find_set_buffered"
                    );
                    return Ok(false);
                }
                let mut row = None;
                for _ in 0..steps {
                    row = logged::<T, _>("next", stream.advance(&binding))?;
                    if row.is_none() {
                        break;
                    }
                }
                row
            }
            Cursor::Buffered(buffer) => buffer.seek(steps).cloned(),
        };

        match row {
            Some(row) => {
                self.load(row);
                Ok(true)
            }
            None => {
                if self.cursor.is_streaming() {
                    self.cursor = Cursor::Idle;
                }
                Ok(false)
            }
        }
    }

    /// Rows matching the current filters
    pub fn count(&self) -> Result<usize> {
        let binding = self.binding()?;
        logged::<T, _>("count", executor::count::<T>(binding, &self.predicate()?))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }
}
