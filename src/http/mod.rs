mod error;
mod form;
mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogService;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

/// Routes for the catalog plus static serving of stored images under `/uploads`.
pub fn build_router(catalog: CatalogService, max_upload_bytes: usize) -> Router {
    let uploads = ServeDir::new(catalog.upload_dir());

    Router::new()
        .route("/upload", post(handlers::upload_handler))
        .route("/items", get(handlers::list_items_handler))
        .route("/items/:id", get(handlers::get_item_handler))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { catalog })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repo::SqliteItemStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    const BOUNDARY: &str = "catalog-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    struct TestApp {
        _dir: TempDir,
        uploads: PathBuf,
        router: Router,
    }

    fn test_app() -> TestApp {
        test_app_with_limit(1024 * 1024)
    }

    fn test_app_with_limit(max_upload_bytes: usize) -> TestApp {
        let dir = tempdir().expect("tempdir");
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).expect("upload dir");
        let store = SqliteItemStore::open(dir.path().join("items.db")).expect("store");
        let catalog = CatalogService::new(Arc::new(store), &uploads);
        TestApp {
            _dir: dir,
            uploads,
            router: build_router(catalog, max_upload_bytes),
        }
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("request")
    }

    fn full_upload<'a>(filename: &'a str, title: &'a str, tags: &'a str) -> Vec<Part<'a>> {
        vec![
            Part::File("image", filename, b"\xff\xd8\xff fake jpeg"),
            Part::Text("title", title),
            Part::Text("description", "a description"),
            Part::Text("tags", tags),
        ]
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        send(router, Request::get(uri).body(Body::empty()).expect("request")).await
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read upload dir").count()
    }

    #[tokio::test]
    async fn test_upload_then_fetch_round_trips_fields() {
        let app = test_app();

        let request = upload_request(&full_upload("Beach Day.JPG", "Beach", "a, b ,c"));
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "File uploaded successfully");
        let filename = body["filename"].as_str().expect("filename");
        assert!(filename.ends_with("_Beach_Day.JPG"));
        assert!(app.uploads.join(filename).exists());

        let (status, items) = get(&app.router, "/items").await;
        assert_eq!(status, StatusCode::OK);
        let items = items.as_array().expect("array");
        assert_eq!(items.len(), 1);
        let id = items[0]["id"].as_i64().expect("id");

        let (status, item) = get(&app.router, &format!("/items/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item, items[0]);
        assert_eq!(item["title"], "Beach");
        assert_eq!(item["description"], "a description");
        assert_eq!(item["tags"], serde_json::json!(["a", "b", "c"]));
        assert!(item["image_path"].as_str().expect("path").ends_with(filename));
        assert!(item["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_rejected_uploads_leave_no_trace() {
        let app = test_app();

        let gif = full_upload("anim.gif", "Anim", "x");
        let no_title = vec![
            Part::File("image", "photo.png", b"png"),
            Part::Text("description", "d"),
            Part::Text("tags", "t"),
        ];
        let no_image = vec![
            Part::Text("title", "t"),
            Part::Text("description", "d"),
            Part::Text("tags", "t"),
        ];
        let image_as_text = vec![
            Part::Text("image", "not a file"),
            Part::Text("title", "t"),
            Part::Text("description", "d"),
            Part::Text("tags", "t"),
        ];

        let cases = [
            (gif, "Invalid image file type"),
            (no_title, "Missing title, description, or tags"),
            (no_image, "No image file provided"),
            (image_as_text, "No image file provided"),
        ];
        for (parts, message) in cases {
            let (status, body) = send(&app.router, upload_request(&parts)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], message);
        }

        assert_eq!(file_count(&app.uploads), 0);
        let (_, items) = get(&app.router, "/items").await;
        assert_eq!(items, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_non_multipart_upload_reports_missing_image() {
        let app = test_app();
        let request = Request::post("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"t"}"#))
            .expect("request");

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let app = test_app();
        let (status, body) = get(&app.router, "/items").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let app = test_app();
        for uri in ["/items/999", "/items/abc", "/items/-1"] {
            let (status, body) = get(&app.router, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, serde_json::json!({ "error": "Item not found" }));
        }
    }

    #[tokio::test]
    async fn test_duplicate_names_and_listing_order() {
        let app = test_app();
        let mut filenames = Vec::new();
        for title in ["first", "second", "third"] {
            let (status, body) =
                send(&app.router, upload_request(&full_upload("same.png", title, "t"))).await;
            assert_eq!(status, StatusCode::CREATED);
            filenames.push(body["filename"].as_str().expect("filename").to_string());
        }
        filenames.sort();
        filenames.dedup();
        assert_eq!(filenames.len(), 3);
        assert_eq!(file_count(&app.uploads), 3);

        let (_, items) = get(&app.router, "/items").await;
        let titles: Vec<&str> = items
            .as_array()
            .expect("array")
            .iter()
            .map(|item| item["title"].as_str().expect("title"))
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_stored_images_are_served_with_cors() {
        let app = test_app();
        let (_, body) = send(&app.router, upload_request(&full_upload("pic.png", "Pic", "t"))).await;
        let filename = body["filename"].as_str().expect("filename");

        let request = Request::get(format!("/uploads/{filename}"))
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .expect("request");
        let response = app.router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"\xff\xd8\xff fake jpeg");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_storing() {
        let app = test_app_with_limit(64);
        let image = vec![0xabu8; 1000];
        let parts = vec![
            Part::File("image", "big.png", &image),
            Part::Text("title", "Big"),
            Part::Text("description", "d"),
            Part::Text("tags", "t"),
        ];

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Upload exceeds the maximum allowed size");

        assert_eq!(file_count(&app.uploads), 0);
        let (_, items) = get(&app.router, "/items").await;
        assert_eq!(items, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_truncated_multipart_body_is_a_client_error() {
        let app = test_app();
        let full = multipart_body(&full_upload("cut.png", "Sunset", "t"));
        let title_at = full
            .windows(b"Sunset".len())
            .position(|w| w == b"Sunset")
            .expect("title value in body");
        let truncated = full[..title_at + 3].to_vec();

        let request = Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(truncated))
            .expect("request");
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["error"].as_str().expect("error message").is_empty());

        assert_eq!(file_count(&app.uploads), 0);
        let (_, items) = get(&app.router, "/items").await;
        assert_eq!(items, serde_json::json!([]));
    }
}
