use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;

use asset_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, LogConfig, ServerConfig, StorageConfig,
    UploadConfig,
};
use asset_server::state::AppState;
use asset_server::utils::jwt;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const UPLOAD: &str = "/api/v1/images/upload";
    pub const IMAGES: &str = "/api/v1/images";
    pub const STORAGE: &str = "/api/v1/storage";

    pub fn image(id: &str) -> String {
        format!("/api/v1/images/{id}")
    }

    pub fn transform(id: &str) -> String {
        format!("/api/v1/images/{id}/transform")
    }

    pub fn download(id: &str) -> String {
        format!("/api/v1/images/{id}/download")
    }

    pub fn view(id: &str) -> String {
        format!("/api/v1/images/{id}/view")
    }
}

/// A running test server backed by a SQLite file and a filesystem blob store,
/// both inside a temporary directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub blob_root: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_upload_limit(10 * 1024 * 1024).await
    }

    pub async fn spawn_with_upload_limit(max_bytes: usize) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("assets.db").display());
        let blob_root = dir.path().join("blobs");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
                max_connections: 4,
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            storage: StorageConfig {
                root: blob_root.clone(),
                public_base_url: format!("http://{addr}"),
                signing_secret: Some("test-signing-secret".into()),
                ..Default::default()
            },
            upload: UploadConfig { max_bytes },
            log: LogConfig {
                level: "info".into(),
            },
        };

        let db = asset_server::database::init_db(&db_url, 4)
            .await
            .expect("Failed to initialize database");
        let state = AppState::from_config(config, db)
            .await
            .expect("Failed to build app state");
        let app = asset_server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blob_root,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token(owner: &str) -> String {
        jwt::sign(JWT_SECRET, owner, chrono::Duration::hours(1)).expect("Failed to sign token")
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_absolute(&self, url: &str) -> TestResponse {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload_with_token(
        &self,
        file_name: &str,
        mime: &str,
        file_bytes: Vec<u8>,
        token: &str,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(routes::UPLOAD))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload a generated JPEG and return its `id`.
    pub async fn upload_jpeg(&self, token: &str, width: u32, height: u32) -> String {
        let res = self
            .upload_with_token("photo.jpg", "image/jpeg", jpeg(width, height), token)
            .await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text());
        res.id()
    }

    pub async fn storage_used(&self, token: &str) -> i64 {
        let res = self.get_with_token(routes::STORAGE, token).await;
        assert_eq!(res.status, 200, "storage usage failed: {}", res.text());
        res.body["totalStorageUsed"].as_i64().unwrap()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
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
