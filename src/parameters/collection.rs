use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DataMapperError, Result};
use crate::parameters::ParameterProperty;

#[derive(Debug, Clone)]
struct Entry {
    property: Arc<ParameterProperty>,
    /// First registered occurrence of its name, part of the deduplicated view.
    canonical: bool,
    /// Copied from a base map and not yet redeclared.
    inherited: bool,
}

/// The properties of a parameter map.
///
/// One ordered sequence holds every registered property, repeats included. Two views are
/// derived from it after each mutation:
/// - the deduplicated view keeps the first occurrence of each name, in order
/// - the name index returns the last property registered under a name
#[derive(Debug, Clone, Default)]
pub struct ParameterProperties {
    entries: Vec<Entry>,
    deduped: Vec<usize>,
    by_name: HashMap<String, Arc<ParameterProperty>>,
}

impl ParameterProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property.
    pub fn add(&mut self, property: Arc<ParameterProperty>) {
        let index = self.entries.len();
        self.insert_entry(index, property, false);
    }

    /// Inserts a property at `index` of the ordered sequence.
    pub fn insert(&mut self, index: usize, property: Arc<ParameterProperty>) -> Result<()> {
        if index > self.entries.len() {
            return Err(DataMapperError::PropertyIndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.insert_entry(index, property, false);
        Ok(())
    }

    /// Appends a property copied from a base map.
    pub(crate) fn inherit(&mut self, property: Arc<ParameterProperty>) {
        let index = self.entries.len();
        self.insert_entry(index, property, true);
    }

    /// Replaces the inherited property of the same name in every view.
    /// Returns false, leaving everything untouched, if no such inherited property exists.
    pub(crate) fn override_inherited(&mut self, property: &Arc<ParameterProperty>) -> bool {
        let name = property.property_name();
        let mut replaced = false;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.inherited && e.property.property_name() == name)
        {
            entry.property = Arc::clone(property);
            entry.inherited = false;
            replaced = true;
        }
        if replaced {
            self.by_name.insert(name.to_string(), Arc::clone(property));
        }
        replaced
    }

    fn insert_entry(&mut self, index: usize, property: Arc<ParameterProperty>, inherited: bool) {
        let name = property.property_name().to_string();
        let canonical = !self.contains(&name);
        self.by_name.insert(name, Arc::clone(&property));
        self.entries.insert(
            index,
            Entry {
                property,
                canonical,
                inherited,
            },
        );
        self.rebuild_deduped();
    }

    fn rebuild_deduped(&mut self) {
        self.deduped = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.canonical)
            .map(|(i, _)| i)
            .collect();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Every registered property in registration order, repeats included.
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<ParameterProperty>> {
        self.entries.iter().map(|e| &e.property)
    }

    /// First occurrence of each property name, in registration order.
    pub fn deduped(&self) -> impl Iterator<Item = &Arc<ParameterProperty>> {
        self.deduped.iter().map(move |&i| &self.entries[i].property)
    }

    pub fn ordered_len(&self) -> usize {
        self.entries.len()
    }

    pub fn deduped_len(&self) -> usize {
        self.deduped.len()
    }

    pub fn get_ordered(&self, index: usize) -> Option<&Arc<ParameterProperty>> {
        self.entries.get(index).map(|e| &e.property)
    }

    pub fn get_deduped(&self, index: usize) -> Option<&Arc<ParameterProperty>> {
        self.deduped
            .get(index)
            .map(|&i| &self.entries[i].property)
    }

    /// Last property registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<ParameterProperty>> {
        self.by_name.get(name)
    }

    /// Property names in deduplicated order.
    pub fn names(&self) -> Vec<&str> {
        self.deduped().map(|p| p.property_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str) -> Arc<ParameterProperty> {
        Arc::new(ParameterProperty::new(name))
    }

    #[test]
    fn test_add_same_name_twice() {
        let mut properties = ParameterProperties::new();
        let first = property("id");
        let second = property("id");
        properties.add(Arc::clone(&first));
        properties.add(Arc::clone(&second));

        assert_eq!(properties.ordered_len(), 2);
        assert_eq!(properties.deduped_len(), 1);
        assert!(Arc::ptr_eq(properties.get_deduped(0).unwrap(), &first));
        assert!(Arc::ptr_eq(properties.get("id").unwrap(), &second));
    }

    #[test]
    fn test_insert_keeps_views_in_order() {
        let mut properties = ParameterProperties::new();
        properties.add(property("a"));
        properties.add(property("c"));
        properties.insert(1, property("b")).unwrap();
        properties.insert(0, property("c")).unwrap();

        let ordered: Vec<_> = properties.ordered().map(|p| p.property_name()).collect();
        assert_eq!(ordered, ["c", "a", "b", "c"]);
        // the earlier registered "c" stays canonical
        assert_eq!(properties.names(), ["a", "b", "c"]);
        assert!(properties.insert(9, property("d")).is_err());
    }

    #[test]
    fn test_override_inherited() {
        let mut properties = ParameterProperties::new();
        properties.inherit(property("id"));
        properties.inherit(property("name"));

        let own = property("name");
        assert!(properties.override_inherited(&own));
        assert!(!properties.override_inherited(&property("email")));
        assert!(!properties.override_inherited(&property("name")));

        assert_eq!(properties.names(), ["id", "name"]);
        assert!(Arc::ptr_eq(properties.get_deduped(1).unwrap(), &own));
        assert!(Arc::ptr_eq(properties.get("name").unwrap(), &own));
        assert_eq!(properties.ordered_len(), 2);
    }
}
