use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::error::{DataMapperError, Result};
use crate::parameters::{
    ClassRegistry, DataExchangeFactory, ParameterMap, ParameterMapRegistry, TypeHandlerRegistry,
};

const PARAMETER_MAP_ELEMENT: &str = "parameterMap";

/// Capabilities of the database provider statements run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub name: String,
    /// Whether a connection may keep more than one cursor open at a time. Cursors of providers
    /// without this capability are buffered before output parameters are read.
    pub allow_multiple_active_cursors: bool,
    /// Whether parameters are bound by position instead of by name.
    pub use_positional_parameters: bool,
    /// Prepended to parameter names when binding by name, e.g. `@`.
    pub parameter_prefix: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            allow_multiple_active_cursors: false,
            use_positional_parameters: false,
            parameter_prefix: String::new(),
        }
    }
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Settings matching [`crate::drivers::TokioPostgresDriver`]: `$n` placeholders bound by
    /// position, one open portal per connection.
    pub fn postgres() -> Self {
        Self::new("postgres").with_positional_parameters(true)
    }

    pub fn with_multiple_active_cursors(mut self, allow: bool) -> Self {
        self.allow_multiple_active_cursors = allow;
        self
    }

    pub fn with_positional_parameters(mut self, positional: bool) -> Self {
        self.use_positional_parameters = positional;
        self
    }

    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = prefix.into();
        self
    }
}

/// An element of a mapping document: a name, attributes and child elements.
///
/// Names may carry a namespace prefix, as in `mapper:parameter`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigNode {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }
}

/// State shared while mapping configuration is read: the element being processed and the
/// registries maps are built against.
#[derive(Debug, Default)]
pub struct ConfigurationScope {
    node_context: Option<ConfigNode>,
    namespace_prefix: Option<String>,
    settings: ProviderSettings,
    classes: ClassRegistry,
    type_handlers: TypeHandlerRegistry,
    data_exchange_factory: DataExchangeFactory,
    parameter_maps: ParameterMapRegistry,
}

impl ConfigurationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: ProviderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Restricts child selection to elements without a prefix or with this one.
    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = Some(prefix.into());
        self
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn type_handlers(&self) -> &TypeHandlerRegistry {
        &self.type_handlers
    }

    pub fn type_handlers_mut(&mut self) -> &mut TypeHandlerRegistry {
        &mut self.type_handlers
    }

    pub fn data_exchange_factory(&self) -> &DataExchangeFactory {
        &self.data_exchange_factory
    }

    pub fn parameter_maps(&self) -> &ParameterMapRegistry {
        &self.parameter_maps
    }

    /// Makes `node` the element whose children [`ConfigurationScope::select_nodes`] returns.
    /// Returns the previous one.
    pub fn set_node_context(&mut self, node: Option<ConfigNode>) -> Option<ConfigNode> {
        std::mem::replace(&mut self.node_context, node)
    }

    pub fn node_context(&self) -> Option<&ConfigNode> {
        self.node_context.as_ref()
    }

    /// Children of the current node with the given local name, in document order.
    pub fn select_nodes<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
        self.node_context
            .iter()
            .flat_map(|node| node.children())
            .filter(move |child| {
                child.local_name() == local_name
                    && match (child.prefix(), self.namespace_prefix.as_deref()) {
                        (None, _) => true,
                        (Some(prefix), Some(expected)) => prefix == expected,
                        (Some(_), None) => false,
                    }
            })
    }

    /// Registers a `parameterMap` element. It is built on first lookup.
    pub fn declare_parameter_map(&mut self, node: ConfigNode) -> Result<String> {
        self.parameter_maps.declare(node)
    }

    /// Declares every `parameterMap` child of `root`, then builds them all.
    pub fn load_parameter_maps(&mut self, root: &ConfigNode) -> Result<()> {
        let previous = self.set_node_context(Some(root.clone()));
        let declarations: Vec<ConfigNode> = self
            .select_nodes(PARAMETER_MAP_ELEMENT)
            .cloned()
            .collect();
        self.set_node_context(previous);

        let mut ids = Vec::with_capacity(declarations.len());
        for node in declarations {
            ids.push(self.declare_parameter_map(node)?);
        }
        for id in ids {
            self.parameter_map(&id)?;
        }
        Ok(())
    }

    /// The built parameter map with the given id, building it and its bases on first use.
    pub fn parameter_map(&mut self, id: &str) -> Result<Arc<ParameterMap>> {
        let mut chain = Vec::new();
        self.resolve_parameter_map(id, &mut chain)
    }

    fn resolve_parameter_map(
        &mut self,
        id: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<ParameterMap>> {
        if let Some(map) = self.parameter_maps.built(id) {
            return Ok(map);
        }
        if chain.iter().any(|link| link == id) {
            chain.push(id.to_string());
            return Err(DataMapperError::CyclicExtension(chain.join(" -> ")));
        }
        let node = self
            .parameter_maps
            .declaration(id)
            .cloned()
            .ok_or_else(|| DataMapperError::UnknownParameterMap(id.to_string()))?;
        chain.push(id.to_string());

        let mut map = ParameterMap::new(id)?
            .with_class_name(node.attribute("class").unwrap_or_default())
            .with_extends(node.attribute("extends").unwrap_or_default());
        map.initialize(self.settings.use_positional_parameters, self)?;

        if let Some(base_id) = map.extends().map(str::to_string) {
            let base = self.resolve_parameter_map(&base_id, chain)?;
            debug!("Parameter map '{}' extends '{}'.", id, base_id);
            map.inherit_from(&base, self)?;
        }

        let previous = self.set_node_context(Some(node));
        let built = map.build_properties(self);
        self.set_node_context(previous);
        built?;

        chain.pop();
        let map = Arc::new(map);
        self.parameter_maps.publish(Arc::clone(&map));
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(property: &str) -> ConfigNode {
        ConfigNode::new("parameter").with_attribute("property", property)
    }

    #[test]
    fn test_select_nodes_is_namespace_aware() {
        let root = ConfigNode::new("parameterMap")
            .with_child(parameter("a"))
            .with_child(ConfigNode::new("mapper:parameter").with_attribute("property", "b"))
            .with_child(ConfigNode::new("other:parameter").with_attribute("property", "c"))
            .with_child(ConfigNode::new("result"));

        let mut scope = ConfigurationScope::new().with_namespace_prefix("mapper");
        scope.set_node_context(Some(root.clone()));
        let names: Vec<_> = scope
            .select_nodes("parameter")
            .filter_map(|n| n.attribute("property"))
            .collect();
        assert_eq!(names, ["a", "b"]);

        let mut plain = ConfigurationScope::new();
        plain.set_node_context(Some(root));
        assert_eq!(plain.select_nodes("parameter").count(), 1);
    }

    #[test]
    fn test_parameter_map_is_built_once() {
        let mut scope = ConfigurationScope::new();
        scope
            .declare_parameter_map(
                ConfigNode::new("parameterMap")
                    .with_attribute("id", "account")
                    .with_child(parameter("id"))
                    .with_child(parameter("name")),
            )
            .unwrap();

        let first = scope.parameter_map("account").unwrap();
        let second = scope.parameter_map("account").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.property_names(), ["id", "name"]);
        assert!(matches!(
            scope.parameter_map("missing"),
            Err(DataMapperError::UnknownParameterMap(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_redeclared_base_rebuilds_derived_maps() {
        let mut scope = ConfigurationScope::new();
        scope
            .declare_parameter_map(
                ConfigNode::new("parameterMap")
                    .with_attribute("id", "base")
                    .with_child(parameter("id")),
            )
            .unwrap();
        scope
            .declare_parameter_map(
                ConfigNode::new("parameterMap")
                    .with_attribute("id", "derived")
                    .with_attribute("extends", "base")
                    .with_child(parameter("name")),
            )
            .unwrap();
        assert_eq!(scope.parameter_map("derived").unwrap().property_names(), ["id", "name"]);

        scope
            .declare_parameter_map(
                ConfigNode::new("parameterMap")
                    .with_attribute("id", "base")
                    .with_child(parameter("id"))
                    .with_child(parameter("version")),
            )
            .unwrap();
        assert!(scope.parameter_maps().built("derived").is_none());
        assert_eq!(
            scope.parameter_map("derived").unwrap().property_names(),
            ["id", "version", "name"]
        );
    }

    #[test]
    fn test_provider_settings() {
        let defaults = ProviderSettings::default();
        assert!(!defaults.allow_multiple_active_cursors);
        assert!(!defaults.use_positional_parameters);
        assert_eq!(defaults.parameter_prefix, "");

        let named = ProviderSettings::new("sqlserver")
            .with_multiple_active_cursors(true)
            .with_parameter_prefix("@");
        assert!(named.allow_multiple_active_cursors);
        assert_eq!(named.parameter_prefix, "@");
        assert!(ProviderSettings::postgres().use_positional_parameters);
    }
}
