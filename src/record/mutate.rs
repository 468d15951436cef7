//! Insert, modify, delete, rename and the bulk operations

use chrono::{NaiveDateTime, Utc};

use super::{coerce_key, filter_column, logged, Record};
use crate::error::{Error, Result};
use crate::query::executor;
use crate::storage::value::Value;
use crate::table::{Table, Triggers};

impl<'s, T: Triggers> Record<'s, T> {
    /// Write the current values as a new row
    pub fn insert(&mut self, run_triggers: bool) -> Result<bool> {
        let binding = self.binding()?.clone();
        if run_triggers {
            self.data.on_insert()?;
        }

        self.stamp(now())?;
        logged::<T, _>("insert", executor::insert(&binding, &self.data))?;
        self.snapshot = Some(self.data.clone());
        Ok(true)
    }

    /// Write the columns that differ from the snapshot
    ///
    /// Without a snapshot every non-key column is written. With nothing
    /// changed no statement is issued. Returns `Ok(false)` if the row no
    /// longer exists.
    pub fn modify(&mut self, run_triggers: bool) -> Result<bool> {
        let binding = self.binding()?.clone();
        if run_triggers {
            self.data.on_modify()?;
        }

        let mut changed = match &self.snapshot {
            Some(old) => {
                if old.key_values() != self.data.key_values() {
                    return Err(Error::PrimaryKeyChanged {
                        table: T::TABLE_NAME.to_string(),
                    });
                }
                self.data.changed_fields(old)
            }
            None => T::COLUMNS
                .iter()
                .filter(|c| !c.primary_key)
                .map(|c| c.db_name)
                .collect(),
        };
        if changed.is_empty() {
            return Ok(true);
        }

        self.stamp(now())?;
        for column in T::COLUMNS.iter().filter(|c| c.auto_timestamp) {
            if !changed.contains(&column.db_name) {
                changed.push(column.db_name);
            }
        }

        let key = self.data.key_values();
        let affected = logged::<T, _>(
            "modify",
            executor::update(&binding, &key, &self.data, &changed),
        )?;
        if affected == 0 {
            return Ok(false);
        }
        self.snapshot = Some(self.data.clone());
        Ok(true)
    }

    /// Delete the row with the current primary key
    pub fn delete(&mut self, run_triggers: bool) -> Result<bool> {
        let binding = self.binding()?.clone();
        if run_triggers {
            self.data.on_delete(&binding)?;
        }

        let key = self.data.key_values();
        let affected = logged::<T, _>("delete", executor::delete::<T>(&binding, &key))?;
        self.snapshot = None;
        Ok(affected > 0)
    }

    /// Change the primary key of the loaded row
    ///
    /// Only key columns are written. If the trigger fails or the row is
    /// gone, the record keeps its old key.
    pub fn rename(&mut self, new_key: &[Value], run_triggers: bool) -> Result<bool> {
        let binding = self.binding()?.clone();
        let new_key = coerce_key::<T>(new_key)?;
        let old_key = match &self.snapshot {
            Some(old) => old.key_values(),
            None => self.data.key_values(),
        };

        let before = self.data.clone();
        let outcome = self.apply_rename(&binding, &old_key, &new_key, run_triggers);
        match outcome {
            Ok(true) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    for (column, value) in T::primary_key().into_iter().zip(&new_key) {
                        snapshot.set_value(column.db_name, value.clone())?;
                    }
                }
                Ok(true)
            }
            other => {
                self.data = before;
                other
            }
        }
    }

    fn apply_rename(
        &mut self,
        binding: &crate::storage::Binding<'_>,
        old_key: &[Value],
        new_key: &[Value],
        run_triggers: bool,
    ) -> Result<bool> {
        for (column, value) in T::primary_key().into_iter().zip(new_key) {
            self.data.set_value(column.db_name, value.clone())?;
        }
        if run_triggers {
            self.data.on_rename()?;
        }
        let affected = logged::<T, _>("rename", executor::update_key::<T>(binding, old_key, new_key))?;
        Ok(affected > 0)
    }
}

impl<'s, T: Table> Record<'s, T> {
    /// Assign `value` to `field` on every row matching the filters
    ///
    /// No triggers, no validation, no change tracking.
    pub fn modify_all(&mut self, field: &str, value: impl Into<Value>) -> Result<usize> {
        let binding = self.binding()?.clone();
        let column = filter_column::<T>(field)?;
        if column.primary_key {
            return Err(Error::PrimaryKeyField {
                table: T::TABLE_NAME.to_string(),
                field: column.db_name.to_string(),
            });
        }
        let value = column.coerce(value.into())?;
        let predicate = self.predicate()?;
        logged::<T, _>(
            "modify_all",
            executor::update_where::<T>(&binding, &predicate, column, &value),
        )
    }

    /// Delete every row matching the filters, without triggers
    pub fn delete_all(&mut self) -> Result<usize> {
        let binding = self.binding()?.clone();
        let predicate = self.predicate()?;
        logged::<T, _>("delete_all", executor::delete_where::<T>(&binding, &predicate))
    }

    /// Set every auto-timestamp column to `at`
    fn stamp(&mut self, at: NaiveDateTime) -> Result<()> {
        for column in T::COLUMNS.iter().filter(|c| c.auto_timestamp) {
            self.data.set_value(column.db_name, Value::DateTime(at))?;
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
