use std::str::FromStr;
use std::sync::Arc;

use crate::config::{ConfigNode, ConfigurationScope};
use crate::error::{DataMapperError, Result};
use crate::parameters::{ClassDescriptor, ScalarTypeHandler};
use crate::traits::TypeHandler;
use crate::types::{FieldType, ParameterDirection, SqlValue};

/// Mapping of one property of the parameter object to one statement parameter.
#[derive(Debug, Clone)]
pub struct ParameterProperty {
    property_name: String,
    column_name: Option<String>,
    direction: ParameterDirection,
    db_type: Option<String>,
    type_name: Option<String>,
    type_handler_name: Option<String>,
    null_value_text: Option<String>,
    null_value: Option<SqlValue>,
    size: Option<u32>,
    precision: Option<u8>,
    scale: Option<u8>,
    type_handler: Arc<dyn TypeHandler>,
}

impl ParameterProperty {
    /// Creates an input property bound through the pass-through handler.
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            column_name: None,
            direction: ParameterDirection::Input,
            db_type: None,
            type_name: None,
            type_handler_name: None,
            null_value_text: None,
            null_value: None,
            size: None,
            precision: None,
            scale: None,
            type_handler: Arc::new(ScalarTypeHandler::Object),
        }
    }

    /// Reads a `parameter` element. The handler is chosen later by [`ParameterProperty::initialize`].
    pub fn from_node(node: &ConfigNode) -> Result<Self> {
        let property_name = node
            .attribute("property")
            .ok_or_else(|| DataMapperError::MissingAttribute {
                element: node.name().to_string(),
                attribute: "property",
            })?;

        let mut property = Self::new(property_name);
        property.column_name = node.attribute("column").map(str::to_string);
        property.db_type = node.attribute("dbType").map(str::to_string);
        property.type_name = node.attribute("type").map(str::to_string);
        property.type_handler_name = node.attribute("typeHandler").map(str::to_string);
        property.null_value_text = node.attribute("nullValue").map(str::to_string);
        if let Some(direction) = node.attribute("direction") {
            property.direction = ParameterDirection::from_name(direction).ok_or_else(|| {
                DataMapperError::MalformedAttribute {
                    element: node.name().to_string(),
                    attribute: "direction",
                    value: direction.to_string(),
                }
            })?;
        }
        property.size = parse_attribute(node, "size")?;
        property.precision = parse_attribute(node, "precision")?;
        property.scale = parse_attribute(node, "scale")?;
        Ok(property)
    }

    /// Selects the type handler against the parameter class and resolves the null sentinel.
    ///
    /// The handler comes from, in order: the `typeHandler` attribute, the `type` attribute, the
    /// class field's type, the class itself if it is a simple value class. Otherwise values pass
    /// through untouched.
    pub fn initialize(
        &mut self,
        scope: &ConfigurationScope,
        parameter_class: Option<&ClassDescriptor>,
    ) -> Result<()> {
        let handlers = scope.type_handlers();
        self.type_handler = if let Some(name) = &self.type_handler_name {
            handlers.custom(name)?
        } else if let Some(name) = &self.type_name {
            handlers.for_type_name(name)?
        } else {
            let field_type = parameter_class
                .and_then(|class| {
                    class
                        .field_type(&self.property_name)
                        .or_else(|| class.scalar_type())
                })
                .unwrap_or(FieldType::Unknown);
            handlers.for_field_type(field_type)
        };

        if let Some(text) = &self.null_value_text {
            let sentinel = self.type_handler.value_of(text).ok_or_else(|| {
                DataMapperError::MalformedNullValue {
                    property: self.property_name.clone(),
                    value: text.clone(),
                }
            })?;
            self.null_value = Some(sentinel);
        }
        Ok(())
    }

    pub fn with_column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }

    pub fn with_type_handler(mut self, handler: Arc<dyn TypeHandler>) -> Self {
        self.type_handler = handler;
        self
    }

    /// Value that stands for SQL NULL when bound.
    pub fn with_null_value(mut self, sentinel: impl Into<SqlValue>) -> Self {
        self.null_value = Some(sentinel.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    pub fn db_type(&self) -> Option<&str> {
        self.db_type.as_deref()
    }

    pub fn has_null_value(&self) -> bool {
        self.null_value.is_some()
    }

    pub fn null_value(&self) -> Option<&SqlValue> {
        self.null_value.as_ref()
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn scale(&self) -> Option<u8> {
        self.scale
    }

    pub fn type_handler(&self) -> &Arc<dyn TypeHandler> {
        &self.type_handler
    }
}

fn parse_attribute<T: FromStr>(node: &ConfigNode, attribute: &'static str) -> Result<Option<T>> {
    node.attribute(attribute)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| DataMapperError::MalformedAttribute {
                    element: node.name().to_string(),
                    attribute,
                    value: value.to_string(),
                })
        })
        .transpose()
}
