use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::{DataMapperError, Result};
use crate::traits::TypeHandler;
use crate::types::{FieldType, ParameterSlot, SqlValue};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Built-in type handlers, one per supported scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarTypeHandler {
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Char,
    Bytes,
    Timestamp,
    Uuid,
    /// Passes values through untouched. Used when nothing is known about the property's type.
    Object,
}

impl From<FieldType> for ScalarTypeHandler {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Bool => ScalarTypeHandler::Bool,
            FieldType::Byte => ScalarTypeHandler::Byte,
            FieldType::Int16 => ScalarTypeHandler::Int16,
            FieldType::Int32 => ScalarTypeHandler::Int32,
            FieldType::Int64 => ScalarTypeHandler::Int64,
            FieldType::Float32 => ScalarTypeHandler::Float32,
            FieldType::Float64 => ScalarTypeHandler::Float64,
            FieldType::Text => ScalarTypeHandler::Text,
            FieldType::Char => ScalarTypeHandler::Char,
            FieldType::Bytes => ScalarTypeHandler::Bytes,
            FieldType::Timestamp => ScalarTypeHandler::Timestamp,
            FieldType::Uuid => ScalarTypeHandler::Uuid,
            FieldType::Unknown => ScalarTypeHandler::Object,
        }
    }
}

impl TypeHandler for ScalarTypeHandler {
    fn field_type(&self) -> FieldType {
        match self {
            ScalarTypeHandler::Bool => FieldType::Bool,
            ScalarTypeHandler::Byte => FieldType::Byte,
            ScalarTypeHandler::Int16 => FieldType::Int16,
            ScalarTypeHandler::Int32 => FieldType::Int32,
            ScalarTypeHandler::Int64 => FieldType::Int64,
            ScalarTypeHandler::Float32 => FieldType::Float32,
            ScalarTypeHandler::Float64 => FieldType::Float64,
            ScalarTypeHandler::Text => FieldType::Text,
            ScalarTypeHandler::Char => FieldType::Char,
            ScalarTypeHandler::Bytes => FieldType::Bytes,
            ScalarTypeHandler::Timestamp => FieldType::Timestamp,
            ScalarTypeHandler::Uuid => FieldType::Uuid,
            ScalarTypeHandler::Object => FieldType::Unknown,
        }
    }

    fn set_parameter(
        &self,
        slot: &mut ParameterSlot,
        value: SqlValue,
        db_type: Option<&str>,
    ) -> Result<()> {
        let field_type = match self {
            ScalarTypeHandler::Object => value.field_type(),
            _ => Some(self.field_type()),
        };
        slot.value = value.convert_to(self.field_type())?;
        slot.field_type = field_type;
        if let Some(db_type) = db_type {
            slot.db_type = Some(db_type.to_string());
        }
        Ok(())
    }

    fn equals(&self, value: &SqlValue, sentinel: &SqlValue) -> bool {
        if value.is_null() || sentinel.is_null() {
            return false;
        }
        if let ScalarTypeHandler::Object = self {
            return value == sentinel;
        }
        let field_type = self.field_type();
        match (
            value.clone().convert_to(field_type),
            sentinel.clone().convert_to(field_type),
        ) {
            (Ok(value), Ok(sentinel)) => value == sentinel,
            _ => false,
        }
    }

    fn value_of(&self, text: &str) -> Option<SqlValue> {
        let value = match self {
            ScalarTypeHandler::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => SqlValue::Bool(true),
                "false" | "0" => SqlValue::Bool(false),
                _ => return None,
            },
            ScalarTypeHandler::Byte => SqlValue::Byte(text.trim().parse().ok()?),
            ScalarTypeHandler::Int16 => SqlValue::Int16(text.trim().parse().ok()?),
            ScalarTypeHandler::Int32 => SqlValue::Int32(text.trim().parse().ok()?),
            ScalarTypeHandler::Int64 => SqlValue::Int64(text.trim().parse().ok()?),
            ScalarTypeHandler::Float32 => SqlValue::Float32(text.trim().parse().ok()?),
            ScalarTypeHandler::Float64 => SqlValue::Float64(text.trim().parse().ok()?),
            ScalarTypeHandler::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => SqlValue::Char(c),
                    _ => return None,
                }
            }
            ScalarTypeHandler::Bytes => SqlValue::Bytes(text.as_bytes().to_vec()),
            ScalarTypeHandler::Timestamp => TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text.trim(), format).ok())
                .map(SqlValue::Timestamp)?,
            ScalarTypeHandler::Uuid => SqlValue::Uuid(Uuid::parse_str(text.trim()).ok()?),
            ScalarTypeHandler::Text | ScalarTypeHandler::Object => SqlValue::Text(text.to_string()),
        };
        Some(value)
    }
}

/// Resolves type handlers by type name, with support for custom handlers.
#[derive(Debug, Default)]
pub struct TypeHandlerRegistry {
    custom: HashMap<String, Arc<dyn TypeHandler>>,
}

impl TypeHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a name usable in `type` and `typeHandler` attributes.
    /// Custom handlers take precedence over the built-in type names.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        self.custom.insert(name.into(), handler);
    }

    pub fn for_field_type(&self, field_type: FieldType) -> Arc<dyn TypeHandler> {
        Arc::new(ScalarTypeHandler::from(field_type))
    }

    /// Handler for a declared type name such as `int` or a registered custom name.
    pub fn for_type_name(&self, name: &str) -> Result<Arc<dyn TypeHandler>> {
        if let Some(handler) = self.custom.get(name) {
            return Ok(Arc::clone(handler));
        }
        FieldType::from_type_name(name)
            .map(|field_type| self.for_field_type(field_type))
            .ok_or_else(|| DataMapperError::UnknownTypeHandler(name.to_string()))
    }

    /// A handler registered by name only, as referenced by a `typeHandler` attribute.
    pub fn custom(&self, name: &str) -> Result<Arc<dyn TypeHandler>> {
        self.custom
            .get(name)
            .cloned()
            .ok_or_else(|| DataMapperError::UnknownTypeHandler(name.to_string()))
    }
}
