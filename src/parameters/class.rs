use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DataMapperError, Result};
use crate::types::{FieldType, SqlValue};

type Getter = Arc<dyn Fn(&dyn Any) -> Option<SqlValue> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, SqlValue) -> Option<Result<()>> + Send + Sync>;
type Constructor = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

struct FieldAccessor {
    field_type: FieldType,
    getter: Getter,
    setter: Option<Setter>,
}

/// Compiled description of a parameter class: its fields, their types and how to read and
/// write them on an instance.
///
/// Descriptors are registered once in a [`ClassRegistry`] while configuration loads and are
/// looked up by class name afterwards.
pub struct ClassDescriptor {
    name: String,
    scalar: Option<FieldType>,
    fields: Vec<String>,
    accessors: HashMap<String, FieldAccessor>,
    constructor: Option<Constructor>,
}

impl ClassDescriptor {
    /// Descriptor of a simple value class such as `int` or `string`.
    pub fn scalar(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            scalar: Some(field_type),
            fields: Vec::new(),
            accessors: HashMap::new(),
            constructor: None,
        }
    }

    /// Start describing the object type `T`.
    ///
    /// # Example
    /// ```
    /// use datamapper::parameters::ClassDescriptor;
    /// use datamapper::types::{FieldType, SqlValue};
    ///
    /// #[derive(Default)]
    /// struct Account {
    ///     id: i32,
    /// }
    ///
    /// let class = ClassDescriptor::builder::<Account>("Account")
    ///     .field(
    ///         "id",
    ///         FieldType::Int32,
    ///         |a| SqlValue::Int32(a.id),
    ///         |a, v| {
    ///             a.id = i32::try_from(&v)?;
    ///             Ok(())
    ///         },
    ///     )
    ///     .build();
    /// assert_eq!(class.field_type("id"), Some(FieldType::Int32));
    /// ```
    pub fn builder<T: Any + Send + Default>(name: impl Into<String>) -> ClassDescriptorBuilder<T> {
        ClassDescriptorBuilder {
            descriptor: Self {
                name: name.into(),
                scalar: None,
                fields: Vec::new(),
                accessors: HashMap::new(),
                constructor: Some(Arc::new(|| Box::new(T::default()) as Box<dyn Any + Send>)),
            },
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value type, if this describes a simple value class.
    pub fn scalar_type(&self) -> Option<FieldType> {
        self.scalar
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.accessors.get(field).map(|a| a.field_type)
    }

    /// Creates a default instance, `None` for scalar classes.
    pub fn instantiate(&self) -> Option<Box<dyn Any + Send>> {
        self.constructor.as_ref().map(|constructor| constructor())
    }

    fn accessor(&self, field: &str) -> Result<&FieldAccessor> {
        self.accessors
            .get(field)
            .ok_or_else(|| DataMapperError::UnknownProperty(format!("{}.{}", self.name, field)))
    }

    /// Reads `field` from an instance of this class.
    pub fn get(&self, object: &dyn Any, field: &str) -> Result<SqlValue> {
        (self.accessor(field)?.getter)(object)
            .ok_or_else(|| DataMapperError::ObjectMismatch(self.name.clone()))
    }

    /// Writes `field` on an instance of this class.
    pub fn set(&self, object: &mut dyn Any, field: &str, value: SqlValue) -> Result<()> {
        let setter = self
            .accessor(field)?
            .setter
            .as_ref()
            .ok_or_else(|| DataMapperError::UnknownProperty(format!("{}.{} (read-only)", self.name, field)))?;
        setter(object, value).unwrap_or_else(|| Err(DataMapperError::ObjectMismatch(self.name.clone())))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("scalar", &self.scalar)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`ClassDescriptor::builder`].
pub struct ClassDescriptorBuilder<T> {
    descriptor: ClassDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Default> ClassDescriptorBuilder<T> {
    /// Add a readable and writable field.
    pub fn field<G, S>(mut self, name: &str, field_type: FieldType, getter: G, setter: S) -> Self
    where
        G: Fn(&T) -> SqlValue + Send + Sync + 'static,
        S: Fn(&mut T, SqlValue) -> Result<()> + Send + Sync + 'static,
    {
        let setter: Setter = Arc::new(move |object: &mut dyn Any, value| {
            object.downcast_mut::<T>().map(|target| setter(target, value))
        });
        self.push(name, field_type, getter, Some(setter));
        self
    }

    /// Add a field that can only be read, e.g. a computed value.
    pub fn read_only_field<G>(mut self, name: &str, field_type: FieldType, getter: G) -> Self
    where
        G: Fn(&T) -> SqlValue + Send + Sync + 'static,
    {
        self.push(name, field_type, getter, None);
        self
    }

    fn push<G>(&mut self, name: &str, field_type: FieldType, getter: G, setter: Option<Setter>)
    where
        G: Fn(&T) -> SqlValue + Send + Sync + 'static,
    {
        let getter: Getter =
            Arc::new(move |object: &dyn Any| object.downcast_ref::<T>().map(|source| getter(source)));
        if !self.descriptor.accessors.contains_key(name) {
            self.descriptor.fields.push(name.to_string());
        }
        self.descriptor.accessors.insert(
            name.to_string(),
            FieldAccessor {
                field_type,
                getter,
                setter,
            },
        );
    }

    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

/// Registry of parameter classes by name.
///
/// Names of simple value types (`int`, `string`, `DateTime`, ...) resolve to scalar descriptors
/// without registration.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassDescriptor) -> Arc<ClassDescriptor> {
        let class = Arc::new(class);
        self.classes
            .insert(class.name().to_string(), Arc::clone(&class));
        class
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ClassDescriptor>> {
        if let Some(class) = self.classes.get(name) {
            return Ok(Arc::clone(class));
        }
        FieldType::from_type_name(name)
            .map(|field_type| Arc::new(ClassDescriptor::scalar(name, field_type)))
            .ok_or_else(|| DataMapperError::UnknownClass(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Account {
        id: i32,
        email: Option<String>,
    }

    fn account_class() -> ClassDescriptor {
        ClassDescriptor::builder::<Account>("Account")
            .field(
                "id",
                FieldType::Int32,
                |a| SqlValue::Int32(a.id),
                |a, v| {
                    a.id = i32::try_from(&v)?;
                    Ok(())
                },
            )
            .field(
                "email",
                FieldType::Text,
                |a| SqlValue::from(a.email.clone()),
                |a, v| {
                    a.email = if v.is_null() { None } else { Some(String::try_from(&v)?) };
                    Ok(())
                },
            )
            .read_only_field("has_email", FieldType::Bool, |a| {
                SqlValue::Bool(a.email.is_some())
            })
            .build()
    }

    #[test]
    fn test_get_and_set() {
        let class = account_class();
        let mut account = Account {
            id: 5,
            email: None,
        };

        assert_eq!(class.get(&account, "id").unwrap(), SqlValue::Int32(5));
        assert!(class.get(&account, "email").unwrap().is_null());

        class
            .set(&mut account, "email", SqlValue::from("a@b.c"))
            .unwrap();
        assert_eq!(account.email.as_deref(), Some("a@b.c"));
        assert_eq!(class.get(&account, "has_email").unwrap(), SqlValue::Bool(true));
        assert!(class.set(&mut account, "has_email", SqlValue::Bool(false)).is_err());
        assert_eq!(class.field_names(), ["id", "email", "has_email"]);
    }

    #[test]
    fn test_wrong_instance_type() {
        let class = account_class();
        let mut other = 5_u32;
        assert!(matches!(
            class.get(&other, "id"),
            Err(DataMapperError::ObjectMismatch(name)) if name == "Account"
        ));
        assert!(class.set(&mut other, "id", SqlValue::Int32(1)).is_err());
        assert!(matches!(
            class.get(&Account::default(), "missing"),
            Err(DataMapperError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_registry_resolves_scalars() {
        let mut registry = ClassRegistry::new();
        registry.register(account_class());

        assert!(registry.resolve("Account").unwrap().scalar_type().is_none());
        assert_eq!(
            registry.resolve("int").unwrap().scalar_type(),
            Some(FieldType::Int32)
        );
        assert!(matches!(
            registry.resolve("Widget"),
            Err(DataMapperError::UnknownClass(_))
        ));
    }
}
