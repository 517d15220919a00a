mod encoder;
pub mod utils;

pub use encoder::PgCopyEncoder;

use crate::{error::SinkError, sink::Sink};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, pin_mut};
use model::{
    core::{data_type::DataType, utils::quote_ident, value::Value},
    records::chunk::Column,
    sink::TableRef,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::debug;
use utils::connect_client;

const QUERY_TABLE_COLUMNS_SQL: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Flush COPY data to the server in pieces of about this size.
const COPY_FLUSH_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct PgSink {
    client: Arc<RwLock<Client>>,
}

impl PgSink {
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        let client = connect_client(url).await?;
        Ok(Self {
            client: Arc::new(RwLock::new(client)),
        })
    }

    fn create_table_sql(table: &TableRef, columns: &[Column]) -> String {
        let defs = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.data_type.postgres_name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({defs})", table.qualified())
    }

    fn copy_sql(table: &TableRef, columns: &[Column]) -> String {
        let names = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "COPY {} ({names}) FROM STDIN WITH (FORMAT csv, NULL '{}')",
            table.qualified(),
            PgCopyEncoder::NULL
        )
    }
}

#[async_trait]
impl Sink for PgSink {
    async fn replace_table(&self, table: &TableRef, columns: &[Column]) -> Result<(), SinkError> {
        let mut client = self.client.write().await;
        let tx = client.transaction().await?;
        tx.batch_execute(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(&table.schema)
        ))
        .await?;
        tx.batch_execute(&format!("DROP TABLE IF EXISTS {}", table.qualified()))
            .await?;
        let create = Self::create_table_sql(table, columns);
        debug!(%table, sql = %create, "Recreating table");
        tx.batch_execute(&create).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn table_schema(&self, table: &TableRef) -> Result<Option<Vec<Column>>, SinkError> {
        let client = self.client.read().await;
        let rows = client
            .query(QUERY_TABLE_COLUMNS_SQL, &[&table.schema, &table.name])
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.try_get(0)?;
                let type_name: String = row.try_get(1)?;
                let data_type = DataType::from_postgres_type(&type_name).map_err(|_| {
                    SinkError::UnsupportedType {
                        column: name.clone(),
                        type_name,
                    }
                })?;
                Ok(Column::new(name, data_type))
            })
            .collect::<Result<Vec<_>, SinkError>>()?;
        Ok(Some(columns))
    }

    async fn append(
        &self,
        table: &TableRef,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let statement = Self::copy_sql(table, columns);
        debug!("COPY statement: {}", statement);

        let client = self.client.read().await;
        let sink = client.copy_in::<_, Bytes>(statement.as_str()).await?;
        pin_mut!(sink);

        let mut buffer = String::with_capacity(COPY_FLUSH_BYTES + 4096);
        for row in rows {
            PgCopyEncoder::encode_row(row, &mut buffer);
            if buffer.len() >= COPY_FLUSH_BYTES {
                let data = std::mem::replace(&mut buffer, String::with_capacity(COPY_FLUSH_BYTES + 4096));
                sink.as_mut().send(Bytes::from(data)).await?;
            }
        }
        if !buffer.is_empty() {
            sink.as_mut().send(Bytes::from(buffer)).await?;
        }

        let written = sink.as_mut().finish().await?;
        Ok(written)
    }

    async fn ping(&self) -> Result<(), SinkError> {
        let client = self.client.read().await;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}
