use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConfigNode;
use crate::error::{DataMapperError, Result};
use crate::parameters::ParameterMap;

/// Parameter map declarations by id, and the maps built from them.
///
/// Maps are built on first lookup through [`crate::config::ConfigurationScope::parameter_map`]
/// and shared from then on.
#[derive(Debug, Default)]
pub struct ParameterMapRegistry {
    declarations: HashMap<String, ConfigNode>,
    built: HashMap<String, Arc<ParameterMap>>,
}

impl ParameterMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a `parameterMap` element under its `id` attribute, replacing any earlier
    /// declaration. The map built from it and every built map extending it are dropped, so they
    /// are rebuilt on next lookup. Maps already handed out keep their old properties.
    pub fn declare(&mut self, node: ConfigNode) -> Result<String> {
        let id = node
            .attribute("id")
            .filter(|id| !id.trim().is_empty())
            .ok_or(DataMapperError::MissingId)?
            .to_string();
        self.evict(&id);
        self.declarations.insert(id.clone(), node);
        Ok(id)
    }

    fn evict(&mut self, id: &str) {
        let mut stale = vec![id.to_string()];
        while let Some(id) = stale.pop() {
            self.built.remove(&id);
            stale.extend(
                self.built
                    .values()
                    .filter(|map| map.extends() == Some(id.as_str()))
                    .map(|map| map.id().to_string()),
            );
        }
    }

    pub fn declaration(&self, id: &str) -> Option<&ConfigNode> {
        self.declarations.get(id)
    }

    pub fn built(&self, id: &str) -> Option<Arc<ParameterMap>> {
        self.built.get(id).cloned()
    }

    pub(crate) fn publish(&mut self, map: Arc<ParameterMap>) {
        self.built.insert(map.id().to_string(), map);
    }

    /// Ids of every declared map, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.declarations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
