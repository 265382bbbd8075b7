//! Parameter maps: how the properties of a parameter object become statement parameters.

mod class;
mod collection;
mod exchange;
mod handlers;
mod map;
mod property;
mod registry;

pub use class::{ClassDescriptor, ClassDescriptorBuilder, ClassRegistry};
pub use collection::ParameterProperties;
pub use exchange::{
    ComplexDataExchange, DataExchangeFactory, ObjectDataExchange, PrimitiveDataExchange,
};
pub use handlers::{ScalarTypeHandler, TypeHandlerRegistry};
pub use map::{parameter_index, ParameterMap};
pub use property::ParameterProperty;
pub use registry::ParameterMapRegistry;
