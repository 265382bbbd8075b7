use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::config::ConfigurationScope;
use crate::error::{DataMapperError, Result};
use crate::parameters::{
    ClassDescriptor, ComplexDataExchange, ParameterProperties, ParameterProperty,
};
use crate::traits::DataExchange;
use crate::types::{ParameterObject, ParameterSlot, SqlValue};

/// Element name of a property declaration inside a parameter map.
const PARAMETER_ELEMENT: &str = "parameter";

/// Extracts the array slot from a bracket-indexed property name, e.g. `[3]` yields 3.
pub fn parameter_index(property_name: &str) -> Result<usize> {
    property_name
        .replace(['[', ']'], "")
        .trim()
        .parse()
        .map_err(|_| DataMapperError::MalformedIndex(property_name.to_string()))
}

/// A named set of mappings from the properties of a parameter object to statement parameters.
///
/// Depending on the provider, parameters are addressed by position or by name. Positional
/// providers bind every declared property, repeats included, so index based lookups go to the
/// ordered sequence. Otherwise each property is bound once and index based lookups go to the
/// deduplicated view.
pub struct ParameterMap {
    id: String,
    class_name: Option<String>,
    parameter_class: Option<Arc<ClassDescriptor>>,
    extends: Option<String>,
    use_positional_parameters: bool,
    properties: ParameterProperties,
    data_exchange: Arc<dyn DataExchange>,
}

impl ParameterMap {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DataMapperError::MissingId);
        }
        Ok(Self {
            id,
            class_name: None,
            parameter_class: None,
            extends: None,
            use_positional_parameters: false,
            properties: ParameterProperties::new(),
            data_exchange: Arc::new(ComplexDataExchange),
        })
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        self.class_name = if class_name.trim().is_empty() {
            None
        } else {
            Some(class_name)
        };
        self
    }

    /// Id of the base map whose properties this map extends.
    pub fn with_extends(mut self, base_id: impl Into<String>) -> Self {
        let base_id = base_id.into();
        self.extends = if base_id.trim().is_empty() {
            None
        } else {
            Some(base_id)
        };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn parameter_class(&self) -> Option<&Arc<ClassDescriptor>> {
        self.parameter_class.as_ref()
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn use_positional_parameters(&self) -> bool {
        self.use_positional_parameters
    }

    pub fn properties(&self) -> &ParameterProperties {
        &self.properties
    }

    /// Replaces the data exchange bound by [`ParameterMap::initialize`].
    pub fn set_data_exchange(&mut self, data_exchange: Arc<dyn DataExchange>) {
        self.data_exchange = data_exchange;
    }

    /// Resolves the parameter class and binds the data exchange for it.
    pub fn initialize(
        &mut self,
        use_positional_parameters: bool,
        scope: &ConfigurationScope,
    ) -> Result<()> {
        self.use_positional_parameters = use_positional_parameters;
        self.parameter_class = match &self.class_name {
            Some(name) => Some(scope.classes().resolve(name)?),
            None => {
                info!(
                    "The class attribute is recommended for better performance in parameter map '{}'.",
                    self.id
                );
                None
            }
        };
        self.data_exchange = scope
            .data_exchange_factory()
            .exchange_for(self.parameter_class.as_ref());
        Ok(())
    }

    /// Registers the `parameter` elements of the scope's current node, in document order.
    ///
    /// A declaration redeclaring an inherited property replaces it in place, any other is added
    /// through [`ParameterMap::add_parameter_property`].
    pub fn build_properties(&mut self, scope: &ConfigurationScope) -> Result<()> {
        for node in scope.select_nodes(PARAMETER_ELEMENT) {
            let mut property = ParameterProperty::from_node(node)?;
            property.initialize(scope, self.parameter_class.as_deref())?;
            let property = Arc::new(property);
            if !self.properties.override_inherited(&property) {
                self.properties.add(property);
            }
        }
        Ok(())
    }

    /// Copies the deduplicated properties of `base` ahead of this map's own declarations.
    pub fn inherit_from(&mut self, base: &ParameterMap, scope: &ConfigurationScope) -> Result<()> {
        debug!(
            "Parameter map '{}' inherits {} propert(ies) from '{}'.",
            self.id,
            base.properties.deduped_len(),
            base.id
        );
        for inherited in base.properties.deduped() {
            let mut property = ParameterProperty::clone(inherited);
            property.initialize(scope, self.parameter_class.as_deref())?;
            self.properties.inherit(Arc::new(property));
        }
        Ok(())
    }

    /// Adds a property. Lookups by name return the last property added under a name, the
    /// deduplicated view keeps the first.
    pub fn add_parameter_property(&mut self, property: impl Into<Arc<ParameterProperty>>) {
        self.properties.add(property.into());
    }

    /// Inserts a property at `index` of the ordered sequence.
    pub fn insert_parameter_property(
        &mut self,
        index: usize,
        property: impl Into<Arc<ParameterProperty>>,
    ) -> Result<()> {
        self.properties.insert(index, property.into())
    }

    /// Property at `index` of the ordered sequence in positional mode, of the deduplicated
    /// view otherwise.
    pub fn get_property(&self, index: usize) -> Result<&Arc<ParameterProperty>> {
        let (property, len) = if self.use_positional_parameters {
            (self.properties.get_ordered(index), self.properties.ordered_len())
        } else {
            (self.properties.get_deduped(index), self.properties.deduped_len())
        };
        property.ok_or(DataMapperError::PropertyIndexOutOfRange { index, len })
    }

    pub fn get_property_by_name(&self, name: &str) -> Result<&Arc<ParameterProperty>> {
        self.properties
            .get(name)
            .ok_or_else(|| DataMapperError::UnknownProperty(name.to_string()))
    }

    pub fn parameter_index(&self, property_name: &str) -> Result<usize> {
        parameter_index(property_name)
    }

    /// Property names in deduplicated order.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.names()
    }

    /// Number of statement parameters this map binds.
    pub fn property_count(&self) -> usize {
        if self.use_positional_parameters {
            self.properties.ordered_len()
        } else {
            self.properties.deduped_len()
        }
    }

    /// Properties in binding order for the current addressing mode.
    pub fn binding_properties(&self) -> Box<dyn Iterator<Item = &Arc<ParameterProperty>> + '_> {
        if self.use_positional_parameters {
            Box::new(self.properties.ordered())
        } else {
            Box::new(self.properties.deduped())
        }
    }

    /// Reads the property's value out of the parameter object and stores it into `slot`.
    /// A value equal to the property's null sentinel is bound as NULL.
    pub fn set_parameter(
        &self,
        property: &ParameterProperty,
        slot: &mut ParameterSlot,
        parameter_object: &ParameterObject,
    ) -> Result<()> {
        let mut value = self.data_exchange.get_data(property, parameter_object)?;
        let handler = property.type_handler();

        if let Some(sentinel) = property.null_value() {
            if handler.equals(&value, sentinel) {
                value = SqlValue::Null;
            }
        }

        handler.set_parameter(slot, value, property.db_type())
    }

    /// Writes a value returned for an output parameter back into the parameter object.
    pub fn set_output_parameter(
        &self,
        target: &mut ParameterObject,
        property: &ParameterProperty,
        value: SqlValue,
    ) -> Result<()> {
        self.data_exchange.set_data(target, property, value)
    }

    /// Creates and populates one slot per binding property.
    ///
    /// Pure output parameters carry no input value, their slot is only typed.
    pub fn bind(&self, parameter_object: &ParameterObject) -> Result<Vec<ParameterSlot>> {
        let mut slots = Vec::with_capacity(self.property_count());
        for property in self.binding_properties() {
            let mut slot = ParameterSlot::new(
                property
                    .column_name()
                    .unwrap_or_else(|| property.property_name()),
            );
            slot.direction = property.direction();
            slot.size = property.size();
            slot.precision = property.precision();
            slot.scale = property.scale();

            if property.direction().is_input() {
                self.set_parameter(property, &mut slot, parameter_object)?;
            } else {
                property
                    .type_handler()
                    .set_parameter(&mut slot, SqlValue::Null, property.db_type())?;
            }
            slots.push(slot);
        }
        Ok(slots)
    }
}

impl fmt::Debug for ParameterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterMap")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("extends", &self.extends)
            .field("use_positional_parameters", &self.use_positional_parameters)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
