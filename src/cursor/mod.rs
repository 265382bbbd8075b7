mod buffered;

pub use buffered::BufferedCursor;
