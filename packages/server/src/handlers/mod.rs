pub mod files;
pub mod image;
pub mod storage;
