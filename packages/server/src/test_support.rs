use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use crate::database::init_db;

/// A fresh SQLite database file with the schema synced.
pub async fn sqlite_db() -> (DatabaseConnection, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("assets.db").display());
    let db = init_db(&url, 4).await.unwrap();
    (db, dir)
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Jpeg)
}
