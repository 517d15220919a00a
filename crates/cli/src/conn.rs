use crate::error::CliError;
use async_trait::async_trait;
use connectors::sink::{PgSink, Sink};
use tracing::{error, info};

/// Trait for "pinging" a destination
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct PostgresConnectionPinger {
    pub conn_str: String,
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let host = redact(&self.conn_str);
        info!("Pinging Postgres at '{host}'");

        let sink = PgSink::connect(&self.conn_str).await.map_err(|e| {
            error!("Postgres connection to '{host}' failed: {e}");
            CliError::Sink(e)
        })?;
        sink.ping().await.map_err(|e| {
            error!("Postgres ping query on '{host}' failed: {e}");
            CliError::Sink(e)
        })?;

        info!("Postgres ping to '{host}' succeeded");
        Ok(())
    }
}

/// Connection string with any password removed.
fn redact(conn_str: &str) -> String {
    let Some((scheme, rest)) = conn_str.split_once("://") else {
        return conn_str.to_string();
    };
    match rest.split_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => conn_str.to_string(),
    }
}
