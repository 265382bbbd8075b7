use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row, Statement};
use uuid::Uuid;

use crate::error::{DataMapperError, Result};
use crate::traits::{Cursor, DatabaseDriver};
use crate::types::{FieldType, ParameterSlot, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| DataMapperError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn execute(
        &self,
        sql: &str,
        parameters: &mut [ParameterSlot],
    ) -> Result<Box<dyn Cursor + Send>> {
        // Prepare first so column metadata is known even for empty results
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| DataMapperError::QueryFailed(e.to_string()))?;

        // Convert bound slots to tokio-postgres compatible types
        let converted_params: Vec<Box<dyn ToSql + Sync + Send>> =
            parameters.iter().map(slot_to_tosql).collect();

        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| DataMapperError::QueryFailed(e.to_string()))?;

        Ok(Box::new(PgCursor::new(statement, rows)))
    }
}

/// Cursor over the rows of one executed statement. Values are decoded lazily on access.
pub struct PgCursor {
    statement: Statement,
    rows: Vec<Row>,
    row: Option<usize>,
    closed: bool,
}

impl PgCursor {
    fn new(statement: Statement, rows: Vec<Row>) -> Self {
        Self {
            statement,
            rows,
            row: None,
            closed: false,
        }
    }

    fn column_type(&self, ordinal: usize) -> Result<&Type> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        let columns = self.statement.columns();
        columns
            .get(ordinal)
            .map(|c| c.type_())
            .ok_or(DataMapperError::ColumnOutOfRange {
                ordinal,
                field_count: columns.len(),
            })
    }

    fn current_row(&self) -> Result<&Row> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        self.row
            .and_then(|i| self.rows.get(i))
            .ok_or(DataMapperError::InvalidCursorPosition)
    }
}

impl Cursor for PgCursor {
    fn read(&mut self) -> Result<bool> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        let next = self.row.map_or(0, |i| i + 1);
        self.row = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn next_result(&mut self) -> Result<bool> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        // A prepared statement yields exactly one result set
        Ok(false)
    }

    fn depth(&self) -> usize {
        0
    }

    fn field_count(&self) -> Result<usize> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        Ok(self.statement.columns().len())
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        self.column_type(ordinal)?;
        Ok(self.statement.columns()[ordinal].name())
    }

    fn field_type(&self, ordinal: usize) -> Result<FieldType> {
        Ok(field_type_of(self.column_type(ordinal)?))
    }

    fn data_type_name(&self, ordinal: usize) -> Result<&str> {
        Ok(self.column_type(ordinal)?.name())
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        if self.closed {
            return Err(DataMapperError::ClosedCursor);
        }
        self.statement
            .columns()
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| DataMapperError::UnknownColumn(name.to_string()))
    }

    fn value(&self, ordinal: usize) -> Result<SqlValue> {
        let ty = self.column_type(ordinal)?;
        decode(self.current_row()?, ordinal, ty)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Map a PostgreSQL type to its semantic field type.
fn field_type_of(ty: &Type) -> FieldType {
    if *ty == Type::BOOL {
        FieldType::Bool
    } else if *ty == Type::CHAR {
        FieldType::Byte
    } else if *ty == Type::INT2 {
        FieldType::Int16
    } else if *ty == Type::INT4 {
        FieldType::Int32
    } else if *ty == Type::INT8 || *ty == Type::OID {
        FieldType::Int64
    } else if *ty == Type::FLOAT4 {
        FieldType::Float32
    } else if *ty == Type::FLOAT8 {
        FieldType::Float64
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
    {
        FieldType::Text
    } else if *ty == Type::BYTEA {
        FieldType::Bytes
    } else if *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ || *ty == Type::DATE {
        FieldType::Timestamp
    } else if *ty == Type::UUID {
        FieldType::Uuid
    } else {
        FieldType::Unknown
    }
}

/// Decode a column of a row into a SqlValue.
/// Columns of a type without a mapping are read as text where the server allows it and as
/// NULL otherwise.
fn decode(row: &Row, index: usize, ty: &Type) -> Result<SqlValue> {
    fn get<'a, T>(row: &'a Row, index: usize) -> Result<SqlValue>
    where
        T: tokio_postgres::types::FromSql<'a> + Into<SqlValue>,
    {
        get_with::<T, T>(row, index, |v| v)
    }

    fn get_with<'a, T, U>(row: &'a Row, index: usize, convert: fn(T) -> U) -> Result<SqlValue>
    where
        T: tokio_postgres::types::FromSql<'a>,
        U: Into<SqlValue>,
    {
        row.try_get::<_, Option<T>>(index)
            .map(|v| SqlValue::from(v.map(convert)))
            .map_err(|e| DataMapperError::Provider(e.to_string()))
    }

    match field_type_of(ty) {
        FieldType::Bool => get::<bool>(row, index),
        // "char" is a single signed byte
        FieldType::Byte => get_with::<i8, u8>(row, index, |v| v as u8),
        FieldType::Int16 => get::<i16>(row, index),
        FieldType::Int32 => get::<i32>(row, index),
        FieldType::Int64 if *ty == Type::OID => get_with::<u32, i64>(row, index, i64::from),
        FieldType::Int64 => get::<i64>(row, index),
        FieldType::Float32 => get::<f32>(row, index),
        FieldType::Float64 => get::<f64>(row, index),
        FieldType::Bytes => get::<Vec<u8>>(row, index),
        FieldType::Timestamp if *ty == Type::TIMESTAMPTZ => {
            get_with::<DateTime<Utc>, NaiveDateTime>(row, index, |t| t.naive_utc())
        }
        FieldType::Timestamp if *ty == Type::DATE => {
            get_with::<NaiveDate, NaiveDateTime>(row, index, |d| d.and_time(Default::default()))
        }
        FieldType::Timestamp => get::<NaiveDateTime>(row, index),
        FieldType::Uuid => get::<Uuid>(row, index),
        FieldType::Text | FieldType::Char => get::<String>(row, index),
        FieldType::Unknown => match row.try_get::<_, Option<String>>(index) {
            Ok(value) => Ok(SqlValue::from(value)),
            Err(e) => {
                warn!(
                    "Column {} of PostgreSQL type '{}' has no mapping, reading it as NULL: {}",
                    index,
                    ty.name(),
                    e
                );
                Ok(SqlValue::Null)
            }
        },
    }
}

/// Convert a bound slot to a boxed ToSql trait object.
/// NULL is typed after the handler's field type so the server accepts it.
fn slot_to_tosql(slot: &ParameterSlot) -> Box<dyn ToSql + Sync + Send> {
    match &slot.value {
        SqlValue::Null => match slot.field_type {
            Some(FieldType::Bool) => Box::new(None::<bool>),
            Some(FieldType::Int16) => Box::new(None::<i16>),
            Some(FieldType::Int32) => Box::new(None::<i32>),
            Some(FieldType::Int64) => Box::new(None::<i64>),
            Some(FieldType::Float32) => Box::new(None::<f32>),
            Some(FieldType::Float64) => Box::new(None::<f64>),
            Some(FieldType::Bytes) => Box::new(None::<Vec<u8>>),
            Some(FieldType::Timestamp) => Box::new(None::<NaiveDateTime>),
            Some(FieldType::Uuid) => Box::new(None::<Uuid>),
            _ => Box::new(None::<String>),
        },
        SqlValue::Bool(b) => Box::new(*b),
        // PostgreSQL has no single-byte integer
        SqlValue::Byte(b) => Box::new(i16::from(*b)),
        SqlValue::Int16(i) => Box::new(*i),
        SqlValue::Int32(i) => Box::new(*i),
        SqlValue::Int64(i) => Box::new(*i),
        SqlValue::Float32(f) => Box::new(*f),
        SqlValue::Float64(f) => Box::new(*f),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Char(c) => Box::new(c.to_string()),
        SqlValue::Bytes(b) => Box::new(b.clone()),
        SqlValue::Timestamp(t) => Box::new(*t),
        SqlValue::Uuid(u) => Box::new(*u),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_of() {
        assert_eq!(field_type_of(&Type::INT4), FieldType::Int32);
        assert_eq!(field_type_of(&Type::VARCHAR), FieldType::Text);
        assert_eq!(field_type_of(&Type::UUID), FieldType::Uuid);
        assert_eq!(field_type_of(&Type::JSON), FieldType::Unknown);
    }

    #[test]
    fn test_field_type_of_dates_and_system_types() {
        assert_eq!(field_type_of(&Type::TIMESTAMPTZ), FieldType::Timestamp);
        assert_eq!(field_type_of(&Type::DATE), FieldType::Timestamp);
        assert_eq!(field_type_of(&Type::OID), FieldType::Int64);
        assert_eq!(field_type_of(&Type::CHAR), FieldType::Byte);
        assert_eq!(field_type_of(&Type::NUMERIC), FieldType::Unknown);
    }
}
