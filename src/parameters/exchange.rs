use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DataMapperError, Result};
use crate::parameters::{parameter_index, ClassDescriptor, ParameterProperty};
use crate::traits::DataExchange;
use crate::types::{ParameterObject, SqlValue};

fn object_kind(object: &ParameterObject) -> &'static str {
    match object {
        ParameterObject::Null => "NULL",
        ParameterObject::Scalar(_) => "scalar",
        ParameterObject::Map(_) => "map",
        ParameterObject::List(_) => "list",
        ParameterObject::Object(_) => "object",
    }
}

/// Exchange for simple value classes: the parameter object is the value itself.
#[derive(Debug, Default)]
pub struct PrimitiveDataExchange;

impl DataExchange for PrimitiveDataExchange {
    fn get_data(&self, _property: &ParameterProperty, source: &ParameterObject) -> Result<SqlValue> {
        match source {
            ParameterObject::Null => Ok(SqlValue::Null),
            ParameterObject::Scalar(value) => Ok(value.clone()),
            other => Err(DataMapperError::TypeMismatch {
                expected: "scalar",
                actual: object_kind(other),
            }),
        }
    }

    fn set_data(
        &self,
        target: &mut ParameterObject,
        _property: &ParameterProperty,
        value: SqlValue,
    ) -> Result<()> {
        *target = ParameterObject::Scalar(value);
        Ok(())
    }
}

/// Exchange for typed objects, through the getters and setters of their class descriptor.
#[derive(Debug)]
pub struct ObjectDataExchange {
    class: Arc<ClassDescriptor>,
}

impl ObjectDataExchange {
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        Self { class }
    }
}

impl DataExchange for ObjectDataExchange {
    fn get_data(&self, property: &ParameterProperty, source: &ParameterObject) -> Result<SqlValue> {
        match source {
            ParameterObject::Null => Ok(SqlValue::Null),
            ParameterObject::Object(object) => self.class.get(object.as_ref(), property.property_name()),
            _ => Err(DataMapperError::ObjectMismatch(self.class.name().to_string())),
        }
    }

    fn set_data(
        &self,
        target: &mut ParameterObject,
        property: &ParameterProperty,
        value: SqlValue,
    ) -> Result<()> {
        if let ParameterObject::Null = target {
            let instance = self
                .class
                .instantiate()
                .ok_or_else(|| DataMapperError::ObjectMismatch(self.class.name().to_string()))?;
            *target = ParameterObject::Object(instance);
        }
        match target {
            ParameterObject::Object(object) => {
                self.class.set(object.as_mut(), property.property_name(), value)
            }
            _ => Err(DataMapperError::ObjectMismatch(self.class.name().to_string())),
        }
    }
}

/// Exchange used when a parameter map declares no class. Dispatches on the shape of the
/// parameter object at runtime: scalars bind as themselves, maps by property name and lists by
/// bracket index such as `[2]`.
#[derive(Debug, Default)]
pub struct ComplexDataExchange;

impl DataExchange for ComplexDataExchange {
    fn get_data(&self, property: &ParameterProperty, source: &ParameterObject) -> Result<SqlValue> {
        let name = property.property_name();
        match source {
            ParameterObject::Null => Ok(SqlValue::Null),
            ParameterObject::Scalar(value) => Ok(value.clone()),
            ParameterObject::Map(map) => Ok(map.get(name).cloned().unwrap_or_default()),
            ParameterObject::List(list) => {
                let index = parameter_index(name)?;
                list.get(index)
                    .cloned()
                    .ok_or(DataMapperError::PropertyIndexOutOfRange {
                        index,
                        len: list.len(),
                    })
            }
            ParameterObject::Object(_) => Err(DataMapperError::Unsupported(
                "reading a typed object without a parameter class",
            )),
        }
    }

    fn set_data(
        &self,
        target: &mut ParameterObject,
        property: &ParameterProperty,
        value: SqlValue,
    ) -> Result<()> {
        let name = property.property_name();
        match target {
            ParameterObject::Null => {
                let mut map = BTreeMap::new();
                map.insert(name.to_string(), value);
                *target = ParameterObject::Map(map);
            }
            ParameterObject::Scalar(scalar) => *scalar = value,
            ParameterObject::Map(map) => {
                map.insert(name.to_string(), value);
            }
            ParameterObject::List(list) => {
                let index = parameter_index(name)?;
                if index >= list.len() {
                    list.resize(index + 1, SqlValue::Null);
                }
                list[index] = value;
            }
            ParameterObject::Object(_) => {
                return Err(DataMapperError::Unsupported(
                    "writing a typed object without a parameter class",
                ))
            }
        }
        Ok(())
    }
}

/// Selects the data exchange for a parameter class.
#[derive(Debug, Default)]
pub struct DataExchangeFactory;

impl DataExchangeFactory {
    pub fn new() -> Self {
        Self
    }

    /// No class binds the complex exchange, a simple value class the primitive exchange and
    /// any other class an exchange through its descriptor.
    pub fn exchange_for(&self, class: Option<&Arc<ClassDescriptor>>) -> Arc<dyn DataExchange> {
        match class {
            None => Arc::new(ComplexDataExchange),
            Some(class) if class.scalar_type().is_some() => Arc::new(PrimitiveDataExchange),
            Some(class) => Arc::new(ObjectDataExchange::new(Arc::clone(class))),
        }
    }
}
