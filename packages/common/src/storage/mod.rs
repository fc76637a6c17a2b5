mod error;
mod hash;
mod key;
mod signer;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use hash::ContentHash;
pub use key::StorageKey;
pub use signer::{SignatureError, UrlSigner};
pub use traits::BlobStore;
