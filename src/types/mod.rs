mod parameter;
mod result_set;
mod sql_value;

pub use parameter::{ParameterDirection, ParameterObject, ParameterSlot};
pub use result_set::{ColumnMetadata, ResultSet};
pub use sql_value::{FieldType, SqlValue};
