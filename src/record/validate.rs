//! Field validation

use super::Record;
use crate::error::{Error, Result};
use crate::storage::value::Value;
use crate::table::Table;

impl<'s, T: Table> Record<'s, T> {
    /// Assign `value` to `field` and run the field's validator
    ///
    /// The value is converted to the field's type first. For relation
    /// fields the validator checks that the related row exists before the
    /// custom hook runs. If any step fails the record is left exactly as
    /// it was before the call.
    pub fn validate_field(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        if let Some(flow) = T::flow_field(field) {
            return Err(Error::FlowFieldNotEditable {
                table: T::TABLE_NAME.to_string(),
                field: flow.db_name.to_string(),
            });
        }
        let column = T::column(field).ok_or_else(|| Error::unknown_field(T::TABLE_NAME, field))?;
        let binding = self.binding()?.clone();

        let before = self.data.clone();
        let result = column
            .coerce(value.into())
            .and_then(|value| self.data.set_value(column.db_name, value))
            .and_then(|()| self.data.on_validate(column.db_name, &binding));

        if let Err(err) = &result {
            tracing::debug!(table = T::TABLE_NAME, field = column.db_name, error = %err, "validation rejected");
            self.data = before;
        }
        result
    }
}
