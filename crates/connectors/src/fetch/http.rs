use super::{FETCH_BUFFER_BYTES, Fetcher};
use crate::{
    error::TransferError,
    scratch::{ScratchArtifact, ScratchDir},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use model::source::SourceDescriptor;
use std::{path::Path, time::Duration};
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufReader, BufWriter},
};
use tracing::{debug, info};

/// Fetches `http(s)://` and `file://` locations into a scratch directory.
pub struct HttpFetcher {
    client: reqwest::Client,
    scratch: ScratchDir,
}

impl HttpFetcher {
    /// `timeout` bounds connecting and each read of the body, not the whole
    /// transfer; a large file on a slow but live link still completes.
    pub fn new(scratch: ScratchDir, timeout: Duration) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(concat!("tripload/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, scratch })
    }

    async fn download(&self, url: &str, out: &mut BufWriter<File>) -> Result<u64, TransferError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    async fn copy_local(path: &Path, out: &mut BufWriter<File>) -> Result<u64, TransferError> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(FETCH_BUFFER_BYTES, file);
        let written = tokio::io::copy_buf(&mut reader, out).await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<ScratchArtifact, TransferError> {
        let url = descriptor.url.as_str();
        let (file, path) = self.scratch.reserve(&descriptor.filename)?.into_parts();
        let mut out = BufWriter::with_capacity(FETCH_BUFFER_BYTES, File::from_std(file));

        debug!(url, scratch = %path.display(), "Fetching source");

        // `path` drops on every early return below, taking the partial file with it.
        let size = if let Some(local) = url.strip_prefix("file://") {
            Self::copy_local(Path::new(local), &mut out).await?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.download(url, &mut out).await?
        } else {
            return Err(TransferError::UnsupportedScheme(url.to_string()));
        };
        out.flush().await?;
        out.into_inner().sync_all().await?;

        info!(dataset = %descriptor.dataset, url, bytes = size, "Fetched source");
        Ok(ScratchArtifact::new(path, size))
    }
}
