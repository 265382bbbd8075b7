use std::collections::BTreeMap;
use std::sync::Arc;

use datamapper::config::{ConfigNode, ConfigurationScope, ProviderSettings};
use datamapper::error::DataMapperError;
use datamapper::parameters::ClassDescriptor;
use datamapper::types::{FieldType, ParameterObject, SqlValue};

fn parameter(property: &str) -> ConfigNode {
    ConfigNode::new("parameter").with_attribute("property", property)
}

fn parameter_map(id: &str, extends: Option<&str>, properties: &[&str]) -> ConfigNode {
    let mut node = ConfigNode::new("parameterMap").with_attribute("id", id);
    if let Some(base) = extends {
        node = node.with_attribute("extends", base);
    }
    properties
        .iter()
        .fold(node, |node, property| node.with_child(parameter(property)))
}

#[test]
fn test_extends_puts_base_properties_first() {
    let root = ConfigNode::new("sqlMap")
        .with_child(parameter_map("B", None, &["id", "name"]))
        .with_child(parameter_map("A", Some("B"), &["email"]));
    let mut scope = ConfigurationScope::new();
    scope.load_parameter_maps(&root).unwrap();

    let derived = scope.parameter_map("A").unwrap();
    assert_eq!(derived.property_names(), ["id", "name", "email"]);
    assert_eq!(derived.property_count(), 3);
    assert_eq!(derived.extends(), Some("B"));
}

#[test]
fn test_extends_chain() {
    let mut scope = ConfigurationScope::new();
    scope
        .declare_parameter_map(parameter_map("A", Some("B"), &["a"]))
        .unwrap();
    scope
        .declare_parameter_map(parameter_map("B", Some("C"), &["b"]))
        .unwrap();
    scope
        .declare_parameter_map(parameter_map("C", None, &["c"]))
        .unwrap();

    let map = scope.parameter_map("A").unwrap();
    assert_eq!(map.property_names(), ["c", "b", "a"]);
    assert_eq!(scope.parameter_map("B").unwrap().property_names(), ["c", "b"]);
}

#[test]
fn test_cyclic_extension_names_the_chain() {
    let mut scope = ConfigurationScope::new();
    scope
        .declare_parameter_map(parameter_map("A", Some("B"), &["a"]))
        .unwrap();
    scope
        .declare_parameter_map(parameter_map("B", Some("A"), &["b"]))
        .unwrap();

    match scope.parameter_map("A") {
        Err(DataMapperError::CyclicExtension(chain)) => assert_eq!(chain, "A -> B -> A"),
        other => panic!("Expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_map_extending_itself() {
    let mut scope = ConfigurationScope::new();
    scope
        .declare_parameter_map(parameter_map("A", Some("A"), &["a"]))
        .unwrap();

    match scope.parameter_map("A") {
        Err(DataMapperError::CyclicExtension(chain)) => assert_eq!(chain, "A -> A"),
        other => panic!("Expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_inherits_first_declaration_of_repeated_name() {
    let base = ConfigNode::new("parameterMap")
        .with_attribute("id", "A")
        .with_child(parameter("id").with_attribute("column", "first"))
        .with_child(parameter("id").with_attribute("column", "second"));
    let mut scope = ConfigurationScope::new();
    scope.declare_parameter_map(base).unwrap();
    scope
        .declare_parameter_map(parameter_map("B", Some("A"), &["name"]))
        .unwrap();

    let base = scope.parameter_map("A").unwrap();
    let derived = scope.parameter_map("B").unwrap();
    assert_eq!(base.get_property(0).unwrap().column_name(), Some("first"));
    assert_eq!(
        derived.get_property(0).unwrap().column_name(),
        base.get_property(0).unwrap().column_name()
    );
    assert_eq!(derived.property_names(), ["id", "name"]);
}

#[test]
fn test_unknown_base() {
    let mut scope = ConfigurationScope::new();
    scope
        .declare_parameter_map(parameter_map("A", Some("missing"), &["a"]))
        .unwrap();
    assert!(matches!(
        scope.parameter_map("A"),
        Err(DataMapperError::UnknownParameterMap(id)) if id == "missing"
    ));
}

#[test]
fn test_own_declaration_overrides_inherited_in_place() {
    let base = parameter_map("base", None, &["id", "name"]);
    let derived = ConfigNode::new("parameterMap")
        .with_attribute("id", "derived")
        .with_attribute("extends", "base")
        .with_child(
            parameter("name")
                .with_attribute("column", "full_name")
                .with_attribute("type", "string"),
        )
        .with_child(parameter("email"));
    let mut scope = ConfigurationScope::new();
    scope.declare_parameter_map(base).unwrap();
    scope.declare_parameter_map(derived).unwrap();

    let map = scope.parameter_map("derived").unwrap();
    assert_eq!(map.property_names(), ["id", "name", "email"]);
    assert_eq!(map.get_property(1).unwrap().column_name(), Some("full_name"));
    assert_eq!(
        map.get_property_by_name("name").unwrap().column_name(),
        Some("full_name")
    );
    assert_eq!(
        map.get_property(1).unwrap().type_handler().field_type(),
        FieldType::Text
    );
}

#[test]
fn test_inherited_properties_use_derived_class() {
    #[derive(Default)]
    struct Account {
        id: i64,
    }

    let mut scope = ConfigurationScope::new();
    scope.classes_mut().register(
        ClassDescriptor::builder::<Account>("Account")
            .field(
                "id",
                FieldType::Int64,
                |a| SqlValue::Int64(a.id),
                |a, v| {
                    a.id = i64::try_from(&v)?;
                    Ok(())
                },
            )
            .build(),
    );
    scope
        .declare_parameter_map(parameter_map("base", None, &["id"]))
        .unwrap();
    scope
        .declare_parameter_map(
            parameter_map("account", Some("base"), &[]).with_attribute("class", "Account"),
        )
        .unwrap();

    let base = scope.parameter_map("base").unwrap();
    let account = scope.parameter_map("account").unwrap();
    assert_eq!(
        base.get_property(0).unwrap().type_handler().field_type(),
        FieldType::Unknown
    );
    assert_eq!(
        account.get_property(0).unwrap().type_handler().field_type(),
        FieldType::Int64
    );

    let slots = account
        .bind(&ParameterObject::object(Account { id: 5 }))
        .unwrap();
    assert_eq!(slots[0].value, SqlValue::Int64(5));
}

#[test]
fn test_positional_binding_repeats_properties() {
    let mut scope =
        ConfigurationScope::new().with_settings(ProviderSettings::postgres());
    scope
        .declare_parameter_map(parameter_map("range", None, &["bound", "other", "bound"]))
        .unwrap();
    let map = scope.parameter_map("range").unwrap();

    let mut values = BTreeMap::new();
    values.insert("bound".to_string(), SqlValue::Int32(10));
    values.insert("other".to_string(), SqlValue::Int32(20));
    let slots = map.bind(&ParameterObject::Map(values)).unwrap();

    let bound: Vec<_> = slots.iter().map(|s| s.value.clone()).collect();
    assert_eq!(
        bound,
        [SqlValue::Int32(10), SqlValue::Int32(20), SqlValue::Int32(10)]
    );
    assert_eq!(map.property_names(), ["bound", "other"]);
    assert!(Arc::ptr_eq(
        map.get_property(2).unwrap(),
        map.get_property_by_name("bound").unwrap()
    ));
}
