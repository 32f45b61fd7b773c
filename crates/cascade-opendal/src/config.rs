//! Object store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the S3-compatible artifact store.
///
/// Credentials are optional: when absent, the operator falls back to the
/// ambient AWS credential chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
#[must_use = "config does nothing unless you use it"]
pub struct S3Config {
    /// S3 endpoint URL (MinIO, AWS, or any compatible store).
    #[cfg_attr(feature = "config", arg(long, env = "S3_ENDPOINT_URL"))]
    #[cfg_attr(feature = "config", arg(default_value = "http://localhost:9000"))]
    pub s3_endpoint_url: String,

    /// S3 region name.
    #[cfg_attr(feature = "config", arg(long, env = "S3_REGION_NAME"))]
    #[cfg_attr(feature = "config", arg(default_value = "us-east-1"))]
    pub s3_region_name: String,

    /// S3 access key id.
    #[cfg_attr(feature = "config", arg(long, env = "S3_ACCESS_KEY_ID"))]
    pub s3_access_key_id: Option<String>,

    /// S3 secret access key.
    #[cfg_attr(feature = "config", arg(long, env = "S3_SECRET_ACCESS_KEY"))]
    pub s3_secret_access_key: Option<String>,

    /// Bucket holding pipeline run artifacts.
    #[cfg_attr(feature = "config", arg(long, env = "S3_BUCKET"))]
    #[cfg_attr(feature = "config", arg(default_value = "cascade-artifacts"))]
    pub s3_bucket: String,

    /// Presigned URL lifetime in seconds.
    ///
    /// Must exceed the longest plausible delay between scheduling a
    /// downstream run and its worker fetching the inputs.
    #[cfg_attr(feature = "config", arg(long, env = "S3_PRESIGNED_TIMEOUT"))]
    #[cfg_attr(feature = "config", arg(default_value_t = 3600))]
    pub s3_presigned_timeout_secs: u64,
}

impl S3Config {
    /// Returns the presigned URL lifetime.
    #[inline]
    pub fn presigned_timeout(&self) -> Duration {
        Duration::from_secs(self.s3_presigned_timeout_secs)
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            s3_endpoint_url: "http://localhost:9000".to_owned(),
            s3_region_name: "us-east-1".to_owned(),
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_bucket: "cascade-artifacts".to_owned(),
            s3_presigned_timeout_secs: 3600,
        }
    }
}
