use std::convert::TryFrom;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::{DataMapperError, Result};
use crate::types::{ColumnMetadata, FieldType, SqlValue};

/// Forward-only cursor over one or more result sets.
///
/// Providers implement this for their live cursors; [`BufferedCursor`](crate::cursor::BufferedCursor)
/// implements it over memory. A cursor starts before the first row of its first result set.
pub trait Cursor {
    /// Advances to the next row of the current result set.
    /// Returns false once the result set is exhausted.
    fn read(&mut self) -> Result<bool>;

    /// Advances to the next result set, positioned before its first row.
    /// Returns false if there is none.
    fn next_result(&mut self) -> Result<bool>;

    /// Index of the current result set.
    fn depth(&self) -> usize;

    /// Number of columns in the current result set.
    fn field_count(&self) -> Result<usize>;

    fn name(&self, ordinal: usize) -> Result<&str>;

    fn field_type(&self, ordinal: usize) -> Result<FieldType>;

    /// The provider's type name for the column.
    fn data_type_name(&self, ordinal: usize) -> Result<&str>;

    fn ordinal(&self, name: &str) -> Result<usize>;

    /// Value of a column in the current row.
    fn value(&self, ordinal: usize) -> Result<SqlValue>;

    /// Releases the cursor. Calling it more than once has no further effect.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;

    /// All values of the current row in column order.
    fn values(&self) -> Result<Vec<SqlValue>> {
        (0..self.field_count()?).map(|i| self.value(i)).collect()
    }

    fn value_by_name(&self, name: &str) -> Result<SqlValue> {
        self.value(self.ordinal(name)?)
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.value(ordinal)?.is_null())
    }

    fn records_affected(&self) -> Result<u64> {
        Err(DataMapperError::Unsupported("records_affected"))
    }

    fn schema_table(&self) -> Result<Vec<ColumnMetadata>> {
        Err(DataMapperError::Unsupported("schema_table"))
    }

    fn get_bool(&self, ordinal: usize) -> Result<bool> {
        bool::try_from(&self.value(ordinal)?)
    }

    fn get_u8(&self, ordinal: usize) -> Result<u8> {
        u8::try_from(&self.value(ordinal)?)
    }

    fn get_i16(&self, ordinal: usize) -> Result<i16> {
        i16::try_from(&self.value(ordinal)?)
    }

    fn get_i32(&self, ordinal: usize) -> Result<i32> {
        i32::try_from(&self.value(ordinal)?)
    }

    fn get_i64(&self, ordinal: usize) -> Result<i64> {
        i64::try_from(&self.value(ordinal)?)
    }

    fn get_f32(&self, ordinal: usize) -> Result<f32> {
        f32::try_from(&self.value(ordinal)?)
    }

    fn get_f64(&self, ordinal: usize) -> Result<f64> {
        f64::try_from(&self.value(ordinal)?)
    }

    fn get_string(&self, ordinal: usize) -> Result<String> {
        String::try_from(&self.value(ordinal)?)
    }

    fn get_char(&self, ordinal: usize) -> Result<char> {
        char::try_from(&self.value(ordinal)?)
    }

    fn get_timestamp(&self, ordinal: usize) -> Result<NaiveDateTime> {
        NaiveDateTime::try_from(&self.value(ordinal)?)
    }

    fn get_uuid(&self, ordinal: usize) -> Result<Uuid> {
        Uuid::try_from(&self.value(ordinal)?)
    }

    /// Reads a binary column in chunks. Without a buffer the total length is returned,
    /// otherwise up to `buffer.len()` bytes starting at `offset` are copied and counted.
    fn get_bytes(&self, ordinal: usize, offset: usize, buffer: Option<&mut [u8]>) -> Result<usize> {
        match self.value(ordinal)? {
            SqlValue::Bytes(bytes) => Ok(copy_chunk(&bytes, offset, buffer)),
            other => Err(DataMapperError::TypeMismatch {
                expected: FieldType::Bytes.name(),
                actual: other.kind_name(),
            }),
        }
    }

    /// Character counterpart of [`Cursor::get_bytes`] for text columns.
    fn get_chars(&self, ordinal: usize, offset: usize, buffer: Option<&mut [char]>) -> Result<usize> {
        let chars: Vec<char> = match self.value(ordinal)? {
            SqlValue::Text(text) => text.chars().collect(),
            SqlValue::Char(c) => vec![c],
            other => {
                return Err(DataMapperError::TypeMismatch {
                    expected: FieldType::Text.name(),
                    actual: other.kind_name(),
                })
            }
        };
        Ok(copy_chunk(&chars, offset, buffer))
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn read(&mut self) -> Result<bool> {
        (**self).read()
    }

    fn next_result(&mut self) -> Result<bool> {
        (**self).next_result()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn field_count(&self) -> Result<usize> {
        (**self).field_count()
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        (**self).name(ordinal)
    }

    fn field_type(&self, ordinal: usize) -> Result<FieldType> {
        (**self).field_type(ordinal)
    }

    fn data_type_name(&self, ordinal: usize) -> Result<&str> {
        (**self).data_type_name(ordinal)
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        (**self).ordinal(name)
    }

    fn value(&self, ordinal: usize) -> Result<SqlValue> {
        (**self).value(ordinal)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn values(&self) -> Result<Vec<SqlValue>> {
        (**self).values()
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        (**self).is_null(ordinal)
    }

    fn records_affected(&self) -> Result<u64> {
        (**self).records_affected()
    }

    fn schema_table(&self) -> Result<Vec<ColumnMetadata>> {
        (**self).schema_table()
    }
}

fn copy_chunk<T: Copy>(data: &[T], offset: usize, buffer: Option<&mut [T]>) -> usize {
    let Some(buffer) = buffer else {
        return data.len();
    };
    let len = data.len().saturating_sub(offset).min(buffer.len());
    if len > 0 {
        buffer[..len].copy_from_slice(&data[offset..offset + len]);
    }
    len
}
