pub mod image_asset;
pub mod owner_quota;
