pub mod memory;
pub mod postgres;

use crate::error::SinkError;
use async_trait::async_trait;
use model::{core::value::Value, records::chunk::Column, sink::TableRef};

pub use memory::MemorySink;
pub use postgres::PgSink;

/// Destination for decoded chunks. Implementations own the transport; the
/// writer above decides when a table is (re)created and validates schema.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Drop `table` if it exists and create it empty with `columns`.
    async fn replace_table(&self, table: &TableRef, columns: &[Column]) -> Result<(), SinkError>;

    /// Current column schema of `table`, `None` when it does not exist.
    async fn table_schema(&self, table: &TableRef) -> Result<Option<Vec<Column>>, SinkError>;

    /// Append `rows`, laid out as `columns`. Returns rows written.
    async fn append(
        &self,
        table: &TableRef,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64, SinkError>;

    async fn ping(&self) -> Result<(), SinkError>;
}
