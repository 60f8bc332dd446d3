use super::*;
use std::io::Cursor;

use axum::{
    body::{self, Body},
    http::Request,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

use crate::config::Settings;

const BOUNDARY: &str = "XUPLOADBOUNDARYX";

const WEB_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../web/www");

fn test_app(settings: Settings) -> Router {
    let settings = Settings {
        static_dir: WEB_DIR.to_string(),
        ..settings
    };
    build_router(Arc::new(AppState::new(&settings, Arc::new(PngNormalizer))))
}

fn default_app() -> Router {
    test_app(Settings::default())
}

fn sample_jpeg() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 120, 255])))
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}

fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn remove_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/remove")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .expect("request")
}

async fn error_message(response: Response) -> Option<String> {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice::<ErrorBody>(&bytes)
        .expect("json error body")
        .error
}

#[tokio::test]
async fn health_route_reports_ok_with_security_headers() {
    let response = default_app()
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_FRAME_OPTIONS),
        Some(&HeaderValue::from_static("DENY"))
    );
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS),
        Some(&HeaderValue::from_static("nosniff"))
    );
    assert!(response.headers().contains_key("permissions-policy"));

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let health: HealthResponse = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(health, HealthResponse::ok());
}

#[tokio::test]
async fn root_serves_the_upload_page() {
    let response = default_app()
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");

    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(csp.contains("img-src 'self' data: https: blob:"), "{csp}");
    assert!(csp.contains("'wasm-unsafe-eval'"), "{csp}");

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let html = String::from_utf8_lossy(&bytes);
    for id in ["id=\"drop\"", "id=\"file\"", "id=\"downloadBtn\"", "bootstrap.js"] {
        assert!(html.contains(id), "page is missing {id}");
    }
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let response = default_app()
        .oneshot(
            Request::get("/pkg/missing.wasm")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response
        .headers()
        .contains_key(header::X_CONTENT_TYPE_OPTIONS));
}

#[tokio::test]
async fn remove_without_file_is_bad_request() {
    let request = Request::post("/remove").body(Body::empty()).expect("request");
    let response = default_app().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await.as_deref(), Some("No file uploaded"));
}

#[tokio::test]
async fn remove_with_wrong_field_name_is_bad_request() {
    let body = multipart_body("file", "cat.jpg", "image/jpeg", &sample_jpeg());
    let response = default_app()
        .oneshot(remove_request(body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await.as_deref(), Some("No file uploaded"));
}

#[tokio::test]
async fn remove_rejects_disallowed_extension() {
    let body = multipart_body("image", "test.txt", "text/plain", b"notanimage");
    let response = default_app()
        .oneshot(remove_request(body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await.as_deref(), Some("Invalid file type"));
}

#[tokio::test]
async fn remove_returns_png_for_valid_image() {
    let body = multipart_body("image", "photo.jpg", "image/jpeg", &sample_jpeg());
    let response = default_app()
        .oneshot(remove_request(body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(
        headers.get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("image/png"))
    );
    assert_eq!(
        headers.get(header::CACHE_CONTROL),
        Some(&HeaderValue::from_static("no-store"))
    );
    assert_eq!(
        headers.get(header::CONTENT_DISPOSITION),
        Some(&HeaderValue::from_static("inline; filename=\"no_bg.png\""))
    );

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(image::guess_format(&bytes).expect("format"), ImageFormat::Png);
}

#[tokio::test]
async fn undecodable_image_is_generic_server_error() {
    let body = multipart_body("image", "broken.png", "image/png", b"not really a png");
    let response = default_app()
        .oneshot(remove_request(body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_message(response).await.as_deref(),
        Some("Failed to process image")
    );
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = test_app(Settings {
        max_upload_bytes: 64,
        ..Settings::default()
    });
    let body = multipart_body("image", "big.jpg", "image/jpeg", &[0u8; 256]);
    let response = app.oneshot(remove_request(body)).await.expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn requests_beyond_rate_limit_get_429() {
    let app = test_app(Settings {
        rate_limit_per_minute: 1,
        ..Settings::default()
    });
    let body = multipart_body("image", "photo.jpg", "image/jpeg", &sample_jpeg());

    let first = app
        .clone()
        .oneshot(remove_request(body.clone()))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(remove_request(body)).await.expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_message(second).await.as_deref(), Some("Too many requests"));
}
