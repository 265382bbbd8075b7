//! datamapper - parameter maps and result buffering for mapped SQL statements
//!
//! # Example
//! ```ignore
//! use datamapper::{ConfigNode, ConfigurationScope, DataMapperClient, ParameterObject, SqlValue};
//!
//! let mut scope = ConfigurationScope::new();
//! scope.declare_parameter_map(
//!     ConfigNode::new("parameterMap")
//!         .with_attribute("id", "account-by-name")
//!         .with_child(ConfigNode::new("parameter").with_attribute("property", "[0]")),
//! )?;
//! let parameter_map = scope.parameter_map("account-by-name")?;
//!
//! let client = DataMapperClient::connect("postgres://localhost/mydb").await?;
//! let mut parameters = ParameterObject::List(vec![SqlValue::from("John")]);
//! let mut cursor = client
//!     .executor()
//!     .execute_query("SELECT id FROM accounts WHERE name = $1", &parameter_map, &mut parameters)
//!     .await?;
//!
//! while cursor.read()? {
//!     let id = cursor.get_i32(0)?;
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod parameters;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use client::DataMapperClient;
pub use config::{ConfigNode, ConfigurationScope, ProviderSettings};
pub use cursor::BufferedCursor;
pub use error::{DataMapperError, Result};
pub use executor::StatementExecutor;
pub use parameters::{ParameterMap, ParameterProperty};
pub use traits::{Cursor, DataExchange, DatabaseDriver, TypeHandler};
pub use types::{FieldType, ParameterObject, ParameterSlot, ResultSet, SqlValue};
