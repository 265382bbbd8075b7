use std::collections::HashMap;

use crate::error::{DataMapperError, Result};
use crate::types::{FieldType, SqlValue};

/// Description of a single column as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Column name in order of appearance
    pub name: String,
    /// Semantic type of the values in this column
    pub field_type: FieldType,
    /// The provider's own name for the column type, e.g. `int4`
    pub data_type_name: String,
}

impl ColumnMetadata {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        data_type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            data_type_name: data_type_name.into(),
        }
    }
}

/// One result set copied out of a provider cursor.
///
/// Every row holds exactly one value per column. The set never changes after construction.
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Vec<ColumnMetadata>,
    ordinals: HashMap<String, usize>,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    /// Creates a result set, rejecting rows whose width differs from the column count.
    pub fn new(columns: Vec<ColumnMetadata>, rows: Vec<Vec<SqlValue>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(DataMapperError::Provider(format!(
                "row has {} value(s) but the result set has {} column(s)",
                row.len(),
                columns.len()
            )));
        }

        // On duplicate names the first ordinal wins.
        let mut ordinals = HashMap::with_capacity(columns.len());
        for (ordinal, column) in columns.iter().enumerate() {
            ordinals.entry(column.name.clone()).or_insert(ordinal);
        }

        Ok(Self {
            columns,
            ordinals,
            rows,
        })
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn column(&self, ordinal: usize) -> Result<&ColumnMetadata> {
        self.columns
            .get(ordinal)
            .ok_or(DataMapperError::ColumnOutOfRange {
                ordinal,
                field_count: self.columns.len(),
            })
    }

    pub fn ordinal(&self, name: &str) -> Result<usize> {
        self.ordinals
            .get(name)
            .copied()
            .ok_or_else(|| DataMapperError::UnknownColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<&[SqlValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, ordinal: usize) -> Result<&SqlValue> {
        let values = self.row(row).ok_or(DataMapperError::InvalidCursorPosition)?;
        values.get(ordinal).ok_or(DataMapperError::ColumnOutOfRange {
            ordinal,
            field_count: self.columns.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<ColumnMetadata> {
        names
            .iter()
            .map(|name| ColumnMetadata::new(*name, FieldType::Int32, "int4"))
            .collect()
    }

    #[test]
    fn test_first_duplicate_name_wins() {
        let set = ResultSet::new(columns(&["id", "name", "id"]), vec![]).unwrap();
        assert_eq!(set.ordinal("id").unwrap(), 0);
        assert_eq!(set.ordinal("name").unwrap(), 1);
        assert!(matches!(
            set.ordinal("missing"),
            Err(DataMapperError::UnknownColumn(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let rows = vec![vec![SqlValue::Int32(1)], vec![]];
        assert!(ResultSet::new(columns(&["id"]), rows).is_err());
    }

    #[test]
    fn test_value_lookup() {
        let rows = vec![vec![SqlValue::Int32(1), SqlValue::Null]];
        let set = ResultSet::new(columns(&["id", "parent"]), rows).unwrap();
        assert_eq!(set.value(0, 0).unwrap(), &SqlValue::Int32(1));
        assert!(set.value(0, 1).unwrap().is_null());
        assert!(matches!(
            set.value(0, 2),
            Err(DataMapperError::ColumnOutOfRange {
                ordinal: 2,
                field_count: 2
            })
        ));
        assert!(matches!(
            set.value(1, 0),
            Err(DataMapperError::InvalidCursorPosition)
        ));
    }
}
