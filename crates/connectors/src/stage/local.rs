use super::Stager;
use crate::{error::StageError, scratch::ScratchArtifact};
use async_trait::async_trait;
use model::source::SourceDescriptor;
use std::path::PathBuf;
use tracing::info;

/// Stages into a directory tree on the local filesystem.
pub struct LocalStager {
    root: PathBuf,
}

impl LocalStager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Stager for LocalStager {
    async fn stage(
        &self,
        artifact: &ScratchArtifact,
        descriptor: &SourceDescriptor,
    ) -> Result<String, StageError> {
        let target = self.root.join(descriptor.staged_path());
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(artifact.path(), &target).await?;
        let location = target.display().to_string();
        info!(dataset = %descriptor.dataset, location, bytes, "Staged source");
        Ok(location)
    }
}
