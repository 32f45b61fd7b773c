//! Storage backend implementation.

use bytes::Bytes;
use opendal::{Operator, services};

use crate::config::S3Config;
use crate::error::{StorageError, StorageResult};
use crate::key::ArtifactKey;
use crate::TRACING_TARGET;

/// Artifact store backed by an OpenDAL S3 operator.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: S3Config,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub fn new(config: S3Config) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = %config.s3_bucket,
            endpoint = %config.s3_endpoint_url,
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Uploads artifact bytes under the given key.
    pub async fn write(&self, key: &ArtifactKey, data: Bytes) -> StorageResult<()> {
        let path = key.to_string();

        tracing::debug!(
            target: TRACING_TARGET,
            key = %path,
            size = data.len(),
            "Writing artifact"
        );

        self.operator.write(&path, data).await?;

        Ok(())
    }

    /// Mints a presigned GET URL for an artifact.
    ///
    /// The URL lives for the configured presigned timeout; downstream
    /// workers fetch artifact bytes through it without store credentials.
    pub async fn presign_read(&self, key: &ArtifactKey) -> StorageResult<String> {
        let path = key.to_string();

        let request = self
            .operator
            .presign_read(&path, self.config.presigned_timeout())
            .await?;

        Ok(request.uri().to_string())
    }

    /// Deletes an artifact from the store.
    pub async fn delete(&self, key: &ArtifactKey) -> StorageResult<()> {
        let path = key.to_string();

        tracing::debug!(
            target: TRACING_TARGET,
            key = %path,
            "Deleting artifact"
        );

        self.operator.delete(&path).await?;

        Ok(())
    }

    /// Creates the OpenDAL operator from the S3 configuration.
    fn create_operator(config: &S3Config) -> StorageResult<Operator> {
        if config.s3_bucket.is_empty() {
            return Err(StorageError::Config("bucket must not be empty".into()));
        }

        let mut builder = services::S3::default()
            .bucket(&config.s3_bucket)
            .region(&config.s3_region_name)
            .endpoint(&config.s3_endpoint_url);

        if let Some(ref access_key_id) = config.s3_access_key_id {
            builder = builder.access_key_id(access_key_id);
        }

        if let Some(ref secret_access_key) = config.s3_secret_access_key {
            builder = builder.secret_access_key(secret_access_key);
        }

        let operator = Operator::new(builder)?.finish();

        Ok(operator)
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("bucket", &self.config.s3_bucket)
            .field("endpoint", &self.config.s3_endpoint_url)
            .finish()
    }
}
