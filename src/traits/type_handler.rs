use std::fmt;

use crate::error::Result;
use crate::types::{FieldType, ParameterSlot, SqlValue};

/// Converts between the caller's value representation and what a provider binds.
pub trait TypeHandler: Send + Sync + fmt::Debug {
    /// The semantic type this handler binds values as.
    fn field_type(&self) -> FieldType;

    /// Stores `value` into the provider slot. NULL is always accepted.
    fn set_parameter(
        &self,
        slot: &mut ParameterSlot,
        value: SqlValue,
        db_type: Option<&str>,
    ) -> Result<()>;

    /// Equality used to detect a configured null sentinel.
    fn equals(&self, value: &SqlValue, sentinel: &SqlValue) -> bool;

    /// Parses a literal from a mapping declaration, `None` if the text is not a valid value.
    fn value_of(&self, text: &str) -> Option<SqlValue>;
}
