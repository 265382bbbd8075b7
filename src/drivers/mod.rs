mod tokio_postgres;

pub use self::in_memory_test::{
    InMemoryCursor, InMemoryTestDriver, InMemoryTestResponse, InMemoryTestResponseBuilder,
    RawResultSet, RecordedQuery,
};
pub use self::tokio_postgres::{PgCursor, TokioPostgresDriver};
