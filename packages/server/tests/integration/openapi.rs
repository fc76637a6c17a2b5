use crate::common::TestApp;

#[tokio::test]
async fn serves_openapi_document() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);

    let paths = res.body["paths"].as_object().unwrap();
    for path in [
        "/api/v1/images",
        "/api/v1/images/upload",
        "/api/v1/images/{id}",
        "/api/v1/images/{id}/transform",
        "/api/v1/images/{id}/download",
        "/api/v1/images/{id}/view",
        "/api/v1/storage",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(res.body["components"]["securitySchemes"]["jwt"].is_object());
}
