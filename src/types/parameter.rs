use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{FieldType, SqlValue};

/// Direction of a statement parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// Parses the `direction` attribute of a parameter declaration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "input" => Some(ParameterDirection::Input),
            "output" => Some(ParameterDirection::Output),
            "inputoutput" => Some(ParameterDirection::InputOutput),
            "returnvalue" => Some(ParameterDirection::ReturnValue),
            _ => None,
        }
    }

    /// True if the provider writes a value back into the slot.
    pub fn is_output(&self) -> bool {
        !matches!(self, ParameterDirection::Input)
    }

    /// True if the slot carries a value into the statement.
    pub fn is_input(&self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }
}

/// A provider parameter, populated by a type handler and bound by a driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSlot {
    pub name: String,
    pub direction: ParameterDirection,
    pub value: SqlValue,
    /// Type the handler bound the value as. Drivers use it to type NULLs.
    pub field_type: Option<FieldType>,
    /// Provider type declared in the mapping, e.g. `varchar`
    pub db_type: Option<String>,
    pub size: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

impl ParameterSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The caller-supplied parameter object a statement is executed with.
pub enum ParameterObject {
    Null,
    /// A single value, bound to every property of the map.
    Scalar(SqlValue),
    /// A dictionary keyed by property name.
    Map(BTreeMap<String, SqlValue>),
    /// An array addressed by bracket-indexed property names such as `[0]`.
    List(Vec<SqlValue>),
    /// A typed object read and written through a registered class descriptor.
    Object(Box<dyn Any + Send>),
}

impl ParameterObject {
    pub fn object<T: Any + Send>(value: T) -> Self {
        ParameterObject::Object(Box::new(value))
    }

    /// Borrows the typed object, if this is an object of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ParameterObject::Object(object) => object.downcast_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for ParameterObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterObject::Null => f.write_str("Null"),
            ParameterObject::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            ParameterObject::Map(map) => f.debug_tuple("Map").field(map).finish(),
            ParameterObject::List(list) => f.debug_tuple("List").field(list).finish(),
            ParameterObject::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<SqlValue> for ParameterObject {
    fn from(value: SqlValue) -> Self {
        ParameterObject::Scalar(value)
    }
}

impl From<BTreeMap<String, SqlValue>> for ParameterObject {
    fn from(map: BTreeMap<String, SqlValue>) -> Self {
        ParameterObject::Map(map)
    }
}

impl From<Vec<SqlValue>> for ParameterObject {
    fn from(list: Vec<SqlValue>) -> Self {
        ParameterObject::List(list)
    }
}
