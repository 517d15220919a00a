use super::Stager;
use crate::{error::StageError, scratch::ScratchArtifact};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    primitives::ByteStream,
};
use model::source::SourceDescriptor;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct S3StagerConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub path_style: bool,
    pub access_key: String,
    pub secret_key: String,
}

/// Stages into an S3-compatible bucket.
#[derive(Clone)]
pub struct S3Stager {
    client: Client,
    bucket: String,
}

impl S3Stager {
    pub fn new(config: S3StagerConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "tripload-staging",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl Stager for S3Stager {
    async fn stage(
        &self,
        artifact: &ScratchArtifact,
        descriptor: &SourceDescriptor,
    ) -> Result<String, StageError> {
        let key = descriptor.staged_path();
        debug!(bucket = %self.bucket, key, bytes = artifact.size(), "Uploading to object store");

        let body = ByteStream::from_path(artifact.path())
            .await
            .map_err(|e| StageError::Upload {
                key: key.clone(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_length(artifact.size() as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| StageError::Upload {
                key: key.clone(),
                message: e.to_string(),
            })?;

        let location = format!("s3://{}/{}", self.bucket, key);
        info!(dataset = %descriptor.dataset, location, "Staged source");
        Ok(location)
    }
}
