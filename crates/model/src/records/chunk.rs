use crate::{
    core::{data_type::DataType, value::Value},
    error::ChunkError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A bounded slice of a source: an ordered set of rows sharing one declared
/// column schema. Every row has exactly one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Chunk {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self, ChunkError> {
        let width = columns.len();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ChunkError::RowWidth {
                row: index,
                expected: width,
                found: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// A chunk that carries only a schema.
    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn values(&self, column: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[column])
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Retype a column and rewrite each of its values in place. Returns the
    /// number of values `f` turned into null that were not null before.
    pub fn map_column<F>(&mut self, column: usize, data_type: DataType, mut f: F) -> usize
    where
        F: FnMut(&Value) -> Value,
    {
        self.columns[column].data_type = data_type;
        let mut nulled = 0;
        for row in &mut self.rows {
            let slot = &mut row[column];
            let next = f(&*slot);
            if next.is_null() && !slot.is_null() {
                nulled += 1;
            }
            *slot = next;
        }
        nulled
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Chunk {
        Chunk::new(
            vec![
                Column::new("LocationID", DataType::String),
                Column::new("Zone", DataType::String),
            ],
            vec![
                vec![Value::String("1".into()), Value::String("EWR".into())],
                vec![Value::String("NA".into()), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Chunk::new(
            vec![Column::new("a", DataType::Long)],
            vec![vec![Value::Int(1)], vec![Value::Int(2), Value::Int(3)]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ChunkError::RowWidth {
                row: 1,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let chunk = sample();
        assert_eq!(chunk.column_index("locationid"), Some(0));
        assert_eq!(chunk.value(0, "zone"), Some(&Value::String("EWR".into())));
        assert_eq!(chunk.column_index("missing"), None);
    }

    #[test]
    fn map_column_counts_new_nulls_only() {
        let mut chunk = sample();
        let nulled = chunk.map_column(0, DataType::Long, |v| {
            v.as_i64().map(Value::Int).unwrap_or(Value::Null)
        });
        assert_eq!(nulled, 1);
        assert_eq!(chunk.columns()[0].data_type, DataType::Long);
        assert_eq!(chunk.value(0, "LocationID"), Some(&Value::Int(1)));
        assert_eq!(chunk.value(1, "LocationID"), Some(&Value::Null));

        let nulled = chunk.map_column(1, DataType::String, |v| v.clone());
        assert_eq!(nulled, 0);
    }

    #[test]
    fn empty_chunk_keeps_schema() {
        let chunk = Chunk::empty(vec![Column::new("a", DataType::String)]);
        assert!(chunk.is_empty());
        assert_eq!(chunk.column_names().collect::<Vec<_>>(), vec!["a"]);
    }
}
