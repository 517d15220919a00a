use crate::error::SinkError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::future::Future;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

/// Open a client for `url`, honouring its `sslmode`. `prefer` falls back to
/// a plaintext connection when the TLS handshake fails.
pub async fn connect_client(url: &str) -> Result<Client, SinkError> {
    let config: Config = url
        .parse()
        .map_err(|e: tokio_postgres::Error| SinkError::InvalidUrl(e.to_string()))?;

    match config.get_ssl_mode() {
        SslMode::Disable => plain(&config).await,
        SslMode::Prefer => match tls(&config).await {
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                plain(&config).await
            }
            ok => ok,
        },
        _ => tls(&config).await,
    }
}

async fn tls(config: &Config) -> Result<Client, SinkError> {
    let connector = MakeTlsConnector::new(TlsConnector::builder().build()?);
    let (client, connection) = config.connect(connector).await?;
    drive(connection);
    Ok(client)
}

async fn plain(config: &Config) -> Result<Client, SinkError> {
    let (client, connection) = config.connect(NoTls).await?;
    drive(connection);
    Ok(client)
}

/// The connection half does the socket I/O and must be polled for the
/// client to make progress.
fn drive<C>(connection: C)
where
    C: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection closed with error");
        }
    });
}
