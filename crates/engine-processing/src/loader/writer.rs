use connectors::{error::SinkError, sink::Sink};
use model::{
    core::value::Value,
    records::chunk::{Chunk, Column},
    sink::{TableRef, WriteMode},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct WriteResult {
    pub rows_written: u64,
    pub duration: Duration,
    /// The call (re)created the destination table.
    pub created: bool,
}

/// Applies chunks of one load to a single destination table.
///
/// In create-or-replace mode the first chunk drops and recreates the table
/// and fixes its schema for the rest of the load. In append mode the
/// destination schema is read once on the first write.
pub struct SinkWriter {
    sink: Arc<dyn Sink>,
    table: TableRef,
    mode: WriteMode,
    schema: Option<Vec<Column>>,
}

impl SinkWriter {
    pub fn new(sink: Arc<dyn Sink>, table: TableRef, mode: WriteMode) -> Self {
        Self {
            sink,
            table,
            mode,
            schema: None,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Destination schema once known.
    pub fn schema(&self) -> Option<&[Column]> {
        self.schema.as_deref()
    }

    pub async fn write(&mut self, chunk: &Chunk, is_first: bool) -> Result<WriteResult, SinkError> {
        let start = Instant::now();
        let created = self.establish_schema(chunk, is_first).await?;
        let schema = self.schema.as_deref().unwrap_or(chunk.columns());

        if chunk.is_empty() {
            debug!(table = %self.table, "Empty chunk, nothing to append");
            return Ok(WriteResult {
                rows_written: 0,
                duration: start.elapsed(),
                created,
            });
        }

        let rows = conform(chunk, schema, &self.table)?;
        let rows_written = self.sink.append(&self.table, schema, &rows).await?;
        let duration = start.elapsed();

        info!(
            table = %self.table,
            rows = rows_written,
            mode = %self.mode,
            duration_ms = duration.as_millis(),
            "Chunk written"
        );

        Ok(WriteResult {
            rows_written,
            duration,
            created,
        })
    }

    async fn establish_schema(&mut self, chunk: &Chunk, is_first: bool) -> Result<bool, SinkError> {
        match self.mode {
            WriteMode::CreateOrReplace if is_first => {
                self.sink.replace_table(&self.table, chunk.columns()).await?;
                info!(
                    table = %self.table,
                    columns = chunk.columns().len(),
                    "Destination table recreated"
                );
                self.schema = Some(chunk.columns().to_vec());
                Ok(true)
            }
            WriteMode::CreateOrReplace => match self.schema {
                Some(_) => Ok(false),
                None => Err(SinkError::TableNotFound(self.table.to_string())),
            },
            WriteMode::Append => {
                if self.schema.is_none() {
                    let found = self
                        .sink
                        .table_schema(&self.table)
                        .await?
                        .ok_or_else(|| SinkError::TableNotFound(self.table.to_string()))?;
                    debug!(table = %self.table, columns = found.len(), "Destination schema loaded");
                    self.schema = Some(found);
                }
                Ok(false)
            }
        }
    }
}

/// Lay `chunk` out in `schema` column order. Chunk columns are matched by
/// name, ignoring case; destination columns absent from the chunk are null.
fn conform(chunk: &Chunk, schema: &[Column], table: &TableRef) -> Result<Vec<Vec<Value>>, SinkError> {
    let positions = chunk
        .columns()
        .iter()
        .map(|column| {
            schema
                .iter()
                .position(|d| d.name.eq_ignore_ascii_case(&column.name))
                .ok_or_else(|| SinkError::UnknownColumn {
                    table: table.to_string(),
                    column: column.name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(chunk.len());
    for row in chunk.rows() {
        let mut out = vec![Value::Null; schema.len()];
        for (value, &target) in row.iter().zip(&positions) {
            let destination = &schema[target];
            out[target] = value.cast_to(&destination.data_type).ok_or_else(|| {
                SinkError::IncompatibleColumn {
                    table: table.to_string(),
                    column: destination.name.clone(),
                    expected: destination.data_type.to_string(),
                    found: value
                        .data_type()
                        .map(|t| t.to_string())
                        .unwrap_or_default(),
                }
            })?;
        }
        rows.push(out);
    }
    Ok(rows)
}
