use log::{debug, warn};

use crate::error::{DataMapperError, Result};
use crate::traits::Cursor;
use crate::types::{ColumnMetadata, FieldType, ResultSet, SqlValue};

/// Row position within the current result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPosition {
    BeforeFirst,
    On(usize),
    AfterLast,
}

/// A [`Cursor`] over result sets copied into memory.
///
/// Used when the provider does not allow more than one open cursor per connection: the live
/// cursor is drained and released up front, and the mapping layer walks the copy instead. All
/// result sets and rows are held in memory for the lifetime of the cursor.
#[derive(Debug)]
pub struct BufferedCursor {
    /// `None` once the cursor has been closed.
    results: Option<Vec<ResultSet>>,
    depth: usize,
    position: RowPosition,
}

/// Closes the source cursor when dropped, on every exit path of the copy. A source that was
/// closed before the copy started is left alone.
struct CloseOnDrop<C: Cursor> {
    source: C,
    release: bool,
}

impl<C: Cursor> CloseOnDrop<C> {
    fn new(source: C) -> Self {
        let release = !source.is_closed();
        Self { source, release }
    }
}

impl<C: Cursor> Drop for CloseOnDrop<C> {
    fn drop(&mut self) {
        if !self.release {
            return;
        }
        if let Err(err) = self.source.close() {
            warn!("Failed to close source cursor after buffering: {}", err);
        }
    }
}

impl BufferedCursor {
    /// Copies every result set of `source`, which must be positioned before its first row.
    /// The source is closed before this returns, whether copying succeeds or not. A source that
    /// is already closed is rejected without being closed again.
    pub fn new<C: Cursor>(source: C) -> Result<Self> {
        Self::copy(source, false)
    }

    /// Like [`BufferedCursor::new`], for a source already positioned on the first row of its
    /// first result set. That row is copied without advancing the source first.
    pub fn midstream<C: Cursor>(source: C) -> Result<Self> {
        Self::copy(source, true)
    }

    fn copy<C: Cursor>(source: C, positioned: bool) -> Result<Self> {
        let mut guard = CloseOnDrop::new(source);
        let results = Self::drain(&mut guard.source, positioned)
            .map_err(|err| DataMapperError::CursorCopy {
                source: Box::new(err),
            })?;
        drop(guard);

        debug!(
            "Buffered {} result set(s) with {} row(s) in memory.",
            results.len(),
            results.iter().map(ResultSet::row_count).sum::<usize>()
        );

        Ok(Self {
            results: Some(results),
            depth: 0,
            position: RowPosition::BeforeFirst,
        })
    }

    fn drain<C: Cursor>(source: &mut C, positioned: bool) -> Result<Vec<ResultSet>> {
        if source.is_closed() {
            return Err(DataMapperError::ClosedCursor);
        }

        let mut results = vec![Self::copy_result_set(source, positioned)?];
        while source.next_result()? {
            results.push(Self::copy_result_set(source, false)?);
        }
        Ok(results)
    }

    fn copy_result_set<C: Cursor>(source: &mut C, positioned: bool) -> Result<ResultSet> {
        let field_count = source.field_count()?;
        let columns = (0..field_count)
            .map(|i| {
                Ok(ColumnMetadata::new(
                    source.name(i)?,
                    source.field_type(i)?,
                    source.data_type_name(i)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        let mut on_row = positioned;
        while on_row || source.read()? {
            rows.push(source.values()?);
            on_row = false;
        }

        ResultSet::new(columns, rows)
    }

    fn results(&self) -> Result<&[ResultSet]> {
        self.results.as_deref().ok_or(DataMapperError::ClosedCursor)
    }

    fn current(&self) -> Result<&ResultSet> {
        let results = self.results()?;
        // depth never moves past the last result set
        Ok(&results[self.depth])
    }

    /// Borrows a value of the current row without copying it.
    pub fn value_ref(&self, ordinal: usize) -> Result<&SqlValue> {
        let current = self.current()?;
        match self.position {
            RowPosition::On(row) => current.value(row, ordinal),
            _ => Err(DataMapperError::InvalidCursorPosition),
        }
    }

    /// Number of result sets copied from the source.
    pub fn result_set_count(&self) -> Result<usize> {
        Ok(self.results()?.len())
    }

    /// Number of rows in the current result set.
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.current()?.row_count())
    }
}

impl Cursor for BufferedCursor {
    fn read(&mut self) -> Result<bool> {
        let row_count = self.current()?.row_count();
        let next = match self.position {
            RowPosition::BeforeFirst => 0,
            RowPosition::On(row) => row + 1,
            RowPosition::AfterLast => return Ok(false),
        };
        if next < row_count {
            self.position = RowPosition::On(next);
            Ok(true)
        } else {
            self.position = RowPosition::AfterLast;
            Ok(false)
        }
    }

    fn next_result(&mut self) -> Result<bool> {
        if self.depth + 1 >= self.results()?.len() {
            return Ok(false);
        }
        self.depth += 1;
        self.position = RowPosition::BeforeFirst;
        Ok(true)
    }

    /// Keeps reporting the last depth after the cursor is closed.
    fn depth(&self) -> usize {
        self.depth
    }

    fn field_count(&self) -> Result<usize> {
        Ok(self.current()?.field_count())
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        Ok(self.current()?.column(ordinal)?.name.as_str())
    }

    fn field_type(&self, ordinal: usize) -> Result<FieldType> {
        Ok(self.current()?.column(ordinal)?.field_type)
    }

    fn data_type_name(&self, ordinal: usize) -> Result<&str> {
        Ok(self.current()?.column(ordinal)?.data_type_name.as_str())
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        self.current()?.ordinal(name)
    }

    fn value(&self, ordinal: usize) -> Result<SqlValue> {
        self.value_ref(ordinal).cloned()
    }

    fn values(&self) -> Result<Vec<SqlValue>> {
        let current = self.current()?;
        match self.position {
            RowPosition::On(row) => current
                .row(row)
                .map(<[SqlValue]>::to_vec)
                .ok_or(DataMapperError::InvalidCursorPosition),
            _ => Err(DataMapperError::InvalidCursorPosition),
        }
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.value_ref(ordinal)?.is_null())
    }

    fn close(&mut self) -> Result<()> {
        self.results = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.results.is_none()
    }

    fn records_affected(&self) -> Result<u64> {
        Err(DataMapperError::Unsupported(
            "records_affected on a buffered select cursor",
        ))
    }

    fn schema_table(&self) -> Result<Vec<ColumnMetadata>> {
        Err(DataMapperError::Unsupported(
            "schema_table on a buffered select cursor",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::InMemoryTestResponseBuilder;

    fn cursor_with_two_sets() -> BufferedCursor {
        let response = InMemoryTestResponseBuilder::new()
            .column("id", FieldType::Int32, "int4")
            .column("name", FieldType::Text, "varchar")
            .row(vec![SqlValue::Int32(1), SqlValue::from("Alice")])
            .row(vec![SqlValue::Int32(2), SqlValue::Null])
            .next_result()
            .column("total", FieldType::Int64, "int8")
            .row(vec![SqlValue::Int64(2)])
            .build();
        BufferedCursor::new(response.open_cursor()).unwrap()
    }

    #[test]
    fn test_read_and_next_result() {
        let mut cursor = cursor_with_two_sets();

        assert_eq!(cursor.result_set_count().unwrap(), 2);
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.get_i32(0).unwrap(), 1);
        assert_eq!(cursor.get_string(1).unwrap(), "Alice");
        assert!(cursor.read().unwrap());
        assert!(cursor.is_null(1).unwrap());
        assert!(!cursor.read().unwrap());
        assert!(!cursor.read().unwrap());

        assert!(cursor.next_result().unwrap());
        assert_eq!(cursor.depth(), 1);
        assert_eq!(cursor.name(0).unwrap(), "total");
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.get_i64(0).unwrap(), 2);
        assert!(!cursor.read().unwrap());

        assert!(!cursor.next_result().unwrap());
        assert!(!cursor.next_result().unwrap());
        assert_eq!(cursor.depth(), 1);
    }

    #[test]
    fn test_next_result_resets_row_position() {
        let mut cursor = cursor_with_two_sets();
        assert!(cursor.read().unwrap());
        assert!(cursor.next_result().unwrap());

        assert!(matches!(
            cursor.value(0),
            Err(DataMapperError::InvalidCursorPosition)
        ));
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.value(0).unwrap(), SqlValue::Int64(2));
    }

    #[test]
    fn test_access_outside_rows_is_invalid() {
        let mut cursor = cursor_with_two_sets();
        assert!(matches!(
            cursor.value(0),
            Err(DataMapperError::InvalidCursorPosition)
        ));

        while cursor.read().unwrap() {}
        assert!(matches!(
            cursor.get_i32(0),
            Err(DataMapperError::InvalidCursorPosition)
        ));
        assert!(matches!(
            cursor.values(),
            Err(DataMapperError::InvalidCursorPosition)
        ));
    }

    #[test]
    fn test_metadata_is_valid_at_any_position() {
        let cursor = cursor_with_two_sets();
        assert_eq!(cursor.field_count().unwrap(), 2);
        assert_eq!(cursor.ordinal("name").unwrap(), 1);
        assert_eq!(cursor.field_type(1).unwrap(), FieldType::Text);
        assert_eq!(cursor.data_type_name(0).unwrap(), "int4");
        assert!(matches!(
            cursor.ordinal("missing"),
            Err(DataMapperError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_unsupported_operations() {
        let cursor = cursor_with_two_sets();
        assert!(matches!(
            cursor.records_affected(),
            Err(DataMapperError::Unsupported(_))
        ));
        assert!(matches!(
            cursor.schema_table(),
            Err(DataMapperError::Unsupported(_))
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut cursor = cursor_with_two_sets();
        cursor.close().unwrap();
        cursor.close().unwrap();

        assert!(cursor.is_closed());
        assert!(matches!(cursor.read(), Err(DataMapperError::ClosedCursor)));
        assert!(matches!(
            cursor.next_result(),
            Err(DataMapperError::ClosedCursor)
        ));
        assert!(matches!(
            cursor.field_count(),
            Err(DataMapperError::ClosedCursor)
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let mut cursor = cursor_with_two_sets();
        cursor.read().unwrap();
        assert!(matches!(
            cursor.get_i64(0),
            Err(DataMapperError::TypeMismatch {
                expected: "int64",
                actual: "int32"
            })
        ));
    }
}
