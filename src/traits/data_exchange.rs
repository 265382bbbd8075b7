use crate::error::Result;
use crate::parameters::ParameterProperty;
use crate::types::{ParameterObject, SqlValue};

/// Strategy for reading a property out of, and writing one into, a caller's parameter object.
pub trait DataExchange: Send + Sync {
    fn get_data(&self, property: &ParameterProperty, source: &ParameterObject) -> Result<SqlValue>;

    fn set_data(
        &self,
        target: &mut ParameterObject,
        property: &ParameterProperty,
        value: SqlValue,
    ) -> Result<()>;
}
