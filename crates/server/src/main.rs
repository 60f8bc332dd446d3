use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        ConnectInfo, DefaultBodyLimit, Multipart, Request, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::ErrorBody,
    protocol::{health_route, remove_route, HealthResponse, IMAGE_FIELD, PROCESSED_FILENAME},
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod api;
mod app_state;
mod config;
mod processor;
mod rate_limit;

use api::{admit, remove_background, RemoveError, UploadedImage};
use app_state::AppState;
use config::load_settings;
use processor::PngNormalizer;

/// Allows blob-URL previews, loading the wasm bundle and same-host API calls during local development.
const CONTENT_SECURITY_POLICY: &str = concat!(
    "default-src 'self'; ",
    "connect-src 'self' http://localhost:* http://127.0.0.1:*; ",
    "img-src 'self' data: https: blob:; ",
    "style-src 'self' 'unsafe-inline'; ",
    "script-src 'self' 'wasm-unsafe-eval';"
);
const PERMISSIONS_POLICY: &str = "geolocation=(), microphone=()";

type HttpFailure = (StatusCode, Json<ErrorBody>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    info!(
        bind = %settings.server_bind,
        max_upload_bytes = settings.max_upload_bytes,
        rate_limit_per_minute = settings.rate_limit_per_minute,
        rate_limit_per_hour = settings.rate_limit_per_hour,
        allowed_extensions = ?settings.allowed_extensions,
        static_dir = %settings.static_dir,
        "application startup"
    );

    let state = AppState::new(&settings, Arc::new(PngNormalizer));
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    // Everything that is not an API route is the browser front-end.
    let front_end = ServeDir::new(&state.static_dir);
    Router::new()
        .route(health_route(), get(healthz))
        .route(remove_route(), post(http_remove))
        .fallback_service(front_end)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn http_remove(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpFailure> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    admit(&state.api, peer).await.map_err(remove_failure)?;

    let upload = match multipart {
        Ok(multipart) => read_image_field(multipart).await?,
        Err(rejection) => {
            warn!(?peer, %rejection, "remove: request is not multipart");
            None
        }
    };

    let request_id = Uuid::new_v4();
    let png = remove_background(&state.api, request_id, upload)
        .await
        .map_err(remove_failure)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(value) = HeaderValue::from_str(&format!("inline; filename=\"{PROCESSED_FILENAME}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((StatusCode::OK, headers, png).into_response())
}

/// Returns the first `image` part; other parts are skipped.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<UploadedImage>, HttpFailure> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_failure)?;
        return Ok(Some(UploadedImage { filename, bytes }));
    }
    Ok(None)
}

fn remove_failure(error: RemoveError) -> HttpFailure {
    (error.status(), Json(error.body()))
}

fn multipart_failure(error: MultipartError) -> HttpFailure {
    warn!(%error, "remove: malformed multipart body");
    (error.status(), Json(ErrorBody::new(error.body_text())))
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer-when-downgrade"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    response
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
