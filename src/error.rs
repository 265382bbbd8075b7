use thiserror::Error;

/// Error type for datamapper operations
#[derive(Debug, Error)]
pub enum DataMapperError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("There was a problem copying the provider cursor into memory: {source}")]
    CursorCopy {
        #[source]
        source: Box<DataMapperError>,
    },

    #[error("The cursor is not positioned on a row")]
    InvalidCursorPosition,

    #[error("No column with the specified name was found: {0}")]
    UnknownColumn(String),

    #[error("Column ordinal {ordinal} is out of range for {field_count} column(s)")]
    ColumnOutOfRange { ordinal: usize, field_count: usize },

    #[error("The cursor is closed")]
    ClosedCursor,

    #[error("{0} is not supported by this cursor")]
    Unsupported(&'static str),

    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("The id attribute is mandatory in a parameter map")]
    MissingId,

    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Unknown parameter property: {0}")]
    UnknownProperty(String),

    #[error("Property index {index} is out of range for {len} propert(ies)")]
    PropertyIndexOutOfRange { index: usize, len: usize },

    #[error("Malformed parameter index: {0}")]
    MalformedIndex(String),

    #[error("Malformed null value '{value}' for property {property}")]
    MalformedNullValue { property: String, value: String },

    #[error("Cyclic parameter map extension: {0}")]
    CyclicExtension(String),

    #[error("Unknown parameter map: {0}")]
    UnknownParameterMap(String),

    #[error("Malformed value '{value}' for attribute '{attribute}' on <{element}>")]
    MalformedAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Unknown type handler: {0}")]
    UnknownTypeHandler(String),

    #[error("Parameter object is not an instance of {0}")]
    ObjectMismatch(String),
}

/// Result type alias for datamapper operations
pub type Result<T> = std::result::Result<T, DataMapperError>;
