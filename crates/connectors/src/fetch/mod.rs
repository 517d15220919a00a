pub mod http;

use crate::{error::TransferError, scratch::ScratchArtifact};
use async_trait::async_trait;
use model::source::SourceDescriptor;

pub use http::HttpFetcher;

/// Writer buffer size for scratch files.
pub const FETCH_BUFFER_BYTES: usize = 1024 * 1024;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Stream the descriptor's payload into exactly one scratch file.
    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<ScratchArtifact, TransferError>;
}
