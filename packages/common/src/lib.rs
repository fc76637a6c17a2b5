pub mod asset_status;
pub mod config;
pub mod storage;

pub use asset_status::AssetStatus;
pub use config::{S3Config, StorageBackendKind, StorageConfig};
