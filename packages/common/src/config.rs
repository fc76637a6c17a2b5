use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Which blob store implementation backs the asset pipeline.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Filesystem,
    S3,
}

/// Blob storage configuration shared by the server and the storage backends.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend selection. Default: "filesystem".
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Root directory for the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Largest object either backend will accept. Default: 64 MiB.
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,
    /// Upper bound on any single blob store call. Default: 30s.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Lifetime of signed read URLs. Default: 3600s.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    /// Externally reachable base URL used for filesystem signed URLs.
    /// Default: "http://127.0.0.1:3000".
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// HMAC secret for filesystem signed URLs. A random per-process
    /// secret is generated when unset.
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// Required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

/// S3-compatible object storage settings.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Use path-style addressing. Default: false.
    #[serde(default)]
    pub path_style: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_object_size() -> u64 {
    64 * 1024 * 1024
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_signed_url_ttl_secs() -> u64 {
    3600
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:3000".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

impl StorageConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            root: default_root(),
            max_object_size: default_max_object_size(),
            request_timeout_secs: default_request_timeout_secs(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            public_base_url: default_public_base_url(),
            signing_secret: None,
            s3: None,
        }
    }
}
