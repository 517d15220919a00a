pub mod local;
pub mod s3;

use crate::{error::StageError, scratch::ScratchArtifact};
use async_trait::async_trait;
use model::source::SourceDescriptor;

pub use local::LocalStager;
pub use s3::{S3Stager, S3StagerConfig};

/// Copies a fetched artifact to an intermediate store under the
/// descriptor's staged path. Returns the staged location.
#[async_trait]
pub trait Stager: Send + Sync {
    async fn stage(
        &self,
        artifact: &ScratchArtifact,
        descriptor: &SourceDescriptor,
    ) -> Result<String, StageError>;
}
