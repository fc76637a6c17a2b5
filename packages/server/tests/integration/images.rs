use image::ImageFormat;
use serde_json::json;

use crate::common::{TestApp, encoded_image, jpeg, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn stores_jpeg_and_charges_quota() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let bytes = jpeg(400, 300);
        let len = bytes.len() as i64;

        let res = app
            .upload_with_token("holiday.jpg", "image/jpeg", bytes, &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text());
        assert_eq!(res.body["width"], 400);
        assert_eq!(res.body["height"], 300);
        assert_eq!(res.body["mimeType"], "image/jpeg");
        assert_eq!(res.body["originalName"], "holiday.jpg");
        assert_eq!(res.body["ownerId"], "alice");
        assert_eq!(res.body["size"].as_i64().unwrap(), len);
        assert!(res.body["sizeLabel"].as_str().unwrap().ends_with(" KB"));
        assert_eq!(app.storage_used(&token).await, len);
    }

    #[tokio::test]
    async fn email_and_provider_subjects_can_upload() {
        let app = TestApp::spawn().await;
        for owner in ["user@example.com", "auth0|abc123"] {
            let token = TestApp::token(owner);
            let res = app
                .upload_with_token("photo.jpg", "image/jpeg", jpeg(40, 30), &token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text());
            assert_eq!(res.body["ownerId"], owner);

            let details = app.get_with_token(&routes::image(&res.id()), &token).await;
            assert_eq!(details.status, 200, "{}", details.text());
            let signed = app
                .get_absolute(details.body["url"].as_str().unwrap())
                .await;
            assert_eq!(signed.status, 200);
            assert_eq!(signed.bytes.len() as i64, res.body["size"].as_i64().unwrap());
        }
    }

    #[tokio::test]
    async fn accepts_png_and_webp() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");

        let png = app
            .upload_with_token(
                "a.png",
                "image/png",
                encoded_image(20, 10, ImageFormat::Png),
                &token,
            )
            .await;
        assert_eq!(png.status, 201, "{}", png.text());
        assert_eq!(png.body["mimeType"], "image/png");

        let webp = app
            .upload_with_token(
                "a.webp",
                "image/webp",
                encoded_image(20, 10, ImageFormat::WebP),
                &token,
            )
            .await;
        assert_eq!(webp.status, 201, "{}", webp.text());
        assert_eq!(webp.body["mimeType"], "image/webp");
    }

    #[tokio::test]
    async fn rejects_corrupt_bytes() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");

        let res = app
            .upload_with_token("fake.png", "image/png", b"definitely not a png".to_vec(), &token)
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.code(), "DECODE_ERROR");
        assert_eq!(app.storage_used(&token).await, 0);
    }

    #[tokio::test]
    async fn rejects_unsupported_type() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");

        let res = app
            .upload_with_token("anim.gif", "image/gif", jpeg(4, 4), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let app = TestApp::spawn_with_upload_limit(1024).await;
        let token = TestApp::token("alice");

        let res = app
            .upload_with_token("big.jpg", "image/jpeg", vec![0u8; 4096], &token)
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(app.storage_used(&token).await, 0);
    }

    #[tokio::test]
    async fn requires_token() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::IMAGES).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");

        let res = app.get_with_token(routes::IMAGES, "garbage").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn details_include_working_signed_url() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let bytes = jpeg(30, 20);
        let res = app
            .upload_with_token("photo.jpg", "image/jpeg", bytes.clone(), &token)
            .await;
        let id = res.id();

        let details = app.get_with_token(&routes::image(&id), &token).await;
        assert_eq!(details.status, 200, "{}", details.text());
        assert_eq!(details.body["id"], id.as_str());
        let url = details.body["url"].as_str().unwrap().to_string();

        let file = app.get_absolute(&url).await;
        assert_eq!(file.status, 200);
        assert_eq!(file.bytes, bytes);
        assert_eq!(file.header("content-type"), "image/jpeg");

        let tampered = app.get_absolute(&format!("{url}00")).await;
        assert_eq!(tampered.status, 401);
    }

    #[tokio::test]
    async fn download_and_view_headers() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let bytes = jpeg(16, 16);
        let id = app
            .upload_with_token("photo.jpg", "image/jpeg", bytes.clone(), &token)
            .await
            .id();

        let download = app.get_with_token(&routes::download(&id), &token).await;
        assert_eq!(download.status, 200);
        assert_eq!(download.bytes, bytes);
        assert!(
            download
                .header("content-disposition")
                .starts_with("attachment; filename=\"photo.jpg\"")
        );

        let view = app.get_with_token(&routes::view(&id), &token).await;
        assert_eq!(view.status, 200);
        assert_eq!(view.header("cache-control"), "public, max-age=31536000");
        assert_eq!(view.header("content-type"), "image/jpeg");

        let etag = view.header("etag").to_string();
        let cached = app
            .client
            .get(app.url(&routes::view(&id)))
            .header("Authorization", format!("Bearer {token}"))
            .header("If-None-Match", etag)
            .send()
            .await
            .unwrap();
        assert_eq!(cached.status().as_u16(), 304);
    }

    #[tokio::test]
    async fn other_owner_gets_not_found() {
        let app = TestApp::spawn().await;
        let alice = TestApp::token("alice");
        let bob = TestApp::token("bob");
        let id = app.upload_jpeg(&alice, 10, 10).await;

        for path in [routes::image(&id), routes::download(&id), routes::view(&id)] {
            let res = app.get_with_token(&path, &bob).await;
            assert_eq!(res.status, 404, "{path}");
            assert_eq!(res.code(), "NOT_FOUND");
        }
        let res = app.delete_with_token(&routes::image(&id), &bob).await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(&routes::image(&id), &alice).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn invalid_id_is_validation_error() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let res = app.get_with_token(&routes::image("not-a-uuid"), &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_blob_is_storage_inconsistency() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let res = app
            .upload_with_token("photo.jpg", "image/jpeg", jpeg(8, 8), &token)
            .await;
        let id = res.id();
        let file_name = res.body["fileName"].as_str().unwrap().to_string();
        assert_eq!(file_name, format!("{id}.jpeg"));

        std::fs::remove_file(app.blob_root.join("images/alice").join(file_name)).unwrap();

        let res = app.get_with_token(&routes::image(&id), &token).await;
        assert_eq!(res.status, 500);
        assert_eq!(res.code(), "STORAGE_INCONSISTENCY");
        let res = app.get_with_token(&routes::download(&id), &token).await;
        assert_eq!(res.code(), "STORAGE_INCONSISTENCY");
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn paginates_own_images() {
        let app = TestApp::spawn().await;
        let alice = TestApp::token("alice");
        let bob = TestApp::token("bob");
        let mut ids = Vec::new();
        for _ in 0..25 {
            ids.push(app.upload_jpeg(&alice, 4, 4).await);
        }
        app.upload_jpeg(&bob, 4, 4).await;

        let res = app
            .get_with_token(
                &format!("{}?page=2&limit=10&sortBy=createdAt&sortOrder=asc", routes::IMAGES),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text());
        let got: Vec<_> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(got, ids[10..20]);
        assert_eq!(res.body["pagination"]["total"], 25);
        assert_eq!(res.body["pagination"]["totalPages"], 3);
        assert_eq!(res.body["pagination"]["hasNextPage"], true);
        assert_eq!(res.body["pagination"]["hasPrevPage"], true);
    }

    #[tokio::test]
    async fn rejects_bad_query() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        for query in ["limit=0", "limit=101", "page=0", "sortBy=owner", "sortOrder=up"] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::IMAGES), &token)
                .await;
            assert_eq!(res.status, 400, "{query}");
            assert_eq!(res.code(), "VALIDATION_ERROR", "{query}");
        }
    }
}

mod transform {
    use super::*;

    #[tokio::test]
    async fn creates_new_image() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let id = app.upload_jpeg(&token, 400, 300).await;
        let before = app.storage_used(&token).await;

        let res = app
            .post_json_with_token(
                &routes::transform(&id),
                &json!({"width": 100, "height": 100, "fit": "fill", "format": "png", "watermarkText": "hi"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text());
        assert_ne!(res.id(), id);
        assert_eq!(res.body["width"], 100);
        assert_eq!(res.body["height"], 100);
        assert_eq!(res.body["mimeType"], "image/png");
        assert_eq!(res.body["originalName"], "transformed_photo.jpg");
        assert_eq!(res.body["fileName"], format!("{}.png", res.id()));
        assert!(
            app.blob_root
                .join("images/alice/transformed")
                .join(res.body["fileName"].as_str().unwrap())
                .exists()
        );
        let size = res.body["size"].as_i64().unwrap();
        assert_eq!(app.storage_used(&token).await, before + size);
    }

    #[tokio::test]
    async fn empty_body_reencodes_as_jpeg() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let res = app
            .upload_with_token(
                "a.png",
                "image/png",
                encoded_image(12, 7, ImageFormat::Png),
                &token,
            )
            .await;
        let id = res.id();

        let res = app
            .client
            .post(app.url(&routes::transform(&id)))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 201);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["mimeType"], "image/jpeg");
        assert_eq!(body["width"], 12);
        assert_eq!(body["height"], 7);
    }

    #[tokio::test]
    async fn crop_outside_image_fails_cleanly() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let id = app.upload_jpeg(&token, 400, 300).await;
        let before = app.storage_used(&token).await;

        let res = app
            .post_json_with_token(
                &routes::transform(&id),
                &json!({"cropX": 350, "cropY": 0, "cropWidth": 100, "cropHeight": 100}),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.code(), "TRANSFORM_ERROR");
        assert_eq!(app.storage_used(&token).await, before);
        let list = app.get_with_token(routes::IMAGES, &token).await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn validates_parameters() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let id = app.upload_jpeg(&token, 10, 10).await;

        for body in [
            json!({"width": 0}),
            json!({"height": 5001}),
            json!({"rotate": 400}),
            json!({"quality": 0}),
            json!({"cropX": 0, "cropY": 0}),
            json!({"format": "gif"}),
            json!({"unknown": true}),
        ] {
            let res = app
                .post_json_with_token(&routes::transform(&id), &body, &token)
                .await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.code(), "VALIDATION_ERROR", "{body}");
        }
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn refunds_quota_and_removes_image() {
        let app = TestApp::spawn().await;
        let token = TestApp::token("alice");
        let keep = app.upload_jpeg(&token, 10, 10).await;
        let gone = app.upload_jpeg(&token, 300, 200).await;
        let keep_size = app.get_with_token(&routes::image(&keep), &token).await.body["size"]
            .as_i64()
            .unwrap();

        let res = app.delete_with_token(&routes::image(&gone), &token).await;
        assert_eq!(res.status, 200, "{}", res.text());
        assert_eq!(res.body["message"], "Image deleted successfully");

        assert_eq!(app.storage_used(&token).await, keep_size);
        let res = app.get_with_token(&routes::image(&gone), &token).await;
        assert_eq!(res.status, 404);
        let res = app.delete_with_token(&routes::image(&gone), &token).await;
        assert_eq!(res.status, 404);
    }
}
