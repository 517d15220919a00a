use crate::{error::SinkError, sink::Sink};
use async_trait::async_trait;
use model::{core::value::Value, records::chunk::Column, sink::TableRef};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

/// Every call the sink received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Replace { table: TableRef, columns: usize },
    Append { table: TableRef, rows: usize },
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<TableRef, MemoryTable>,
    calls: Vec<SinkCall>,
    failing_appends: usize,
}

/// Sink that keeps tables in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create `table` ahead of an append-only load.
    pub fn create_table(&self, table: TableRef, columns: Vec<Column>) {
        self.lock().tables.insert(
            table,
            MemoryTable {
                columns,
                rows: Vec::new(),
            },
        );
    }

    /// Make the next `count` appends fail as if the transport dropped.
    pub fn fail_next_appends(&self, count: usize) {
        self.lock().failing_appends = count;
    }

    pub fn table(&self, table: &TableRef) -> Option<MemoryTable> {
        self.lock().tables.get(table).cloned()
    }

    pub fn row_count(&self, table: &TableRef) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().calls.clone()
    }

    pub fn append_calls(&self, table: &TableRef) -> Vec<usize> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Append { table: t, rows } if t == table => Some(*rows),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn replace_table(&self, table: &TableRef, columns: &[Column]) -> Result<(), SinkError> {
        let mut state = self.lock();
        state.tables.insert(
            table.clone(),
            MemoryTable {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        state.calls.push(SinkCall::Replace {
            table: table.clone(),
            columns: columns.len(),
        });
        Ok(())
    }

    async fn table_schema(&self, table: &TableRef) -> Result<Option<Vec<Column>>, SinkError> {
        Ok(self.lock().tables.get(table).map(|t| t.columns.clone()))
    }

    async fn append(
        &self,
        table: &TableRef,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64, SinkError> {
        let mut state = self.lock();
        if state.failing_appends > 0 {
            state.failing_appends -= 1;
            return Err(SinkError::Unavailable("injected append failure".into()));
        }

        let target = state
            .tables
            .get_mut(table)
            .ok_or_else(|| SinkError::TableNotFound(table.to_string()))?;

        let positions = columns
            .iter()
            .map(|col| {
                target
                    .columns
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(&col.name))
                    .ok_or_else(|| SinkError::UnknownColumn {
                        table: table.to_string(),
                        column: col.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let width = target.columns.len();
        for row in rows {
            let mut stored = vec![Value::Null; width];
            for (value, &pos) in row.iter().zip(&positions) {
                stored[pos] = value.clone();
            }
            target.rows.push(stored);
        }

        state.calls.push(SinkCall::Append {
            table: table.clone(),
            rows: rows.len(),
        });
        Ok(rows.len() as u64)
    }

    async fn ping(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
