use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use dl_builtin_routes::register_builtin_routes;
use dl_link_core::{DeepLinkConfig, DeepLinkCore, Verifier};
use dl_routes::RouteRegistry;
use dl_storage::{CookieStore, DEFAULT_COOKIE_TIMEOUT, InMemoryCookieStore, RocksDbCookieStore};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use url::Url;

mod deeplink;
mod deferred;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) core: Arc<DeepLinkCore>,
    pub(crate) cookies: Arc<dyn CookieStore>,
    pub(crate) cookie_timeout: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DeepLinkConfig::from_env()?;
    if let Err(err) = config.resolve_public_key() {
        warn!("{err}; signed links will be rejected with a server error");
    }

    let mut routes = RouteRegistry::default();
    register_builtin_routes(&mut routes, None)?;
    info!("registered {} deep link routes", routes.len());

    let cookies: Arc<dyn CookieStore> = match std::env::var("DEEP_LINK_COOKIE_DB") {
        Ok(path) if !path.trim().is_empty() => {
            info!("using RocksDB cookie jar at {}", path.trim());
            Arc::new(RocksDbCookieStore::open_default(path.trim())?)
        }
        _ => Arc::new(InMemoryCookieStore::default()),
    };

    let state = AppState {
        core: Arc::new(DeepLinkCore::new(routes, Arc::new(Verifier::new(config)))),
        cookies,
        cookie_timeout: DEFAULT_COOKIE_TIMEOUT,
    };

    let addr = std::env::var("LINK_SERVICE_ADDR")
        .ok()
        .and_then(|value| value.parse::<SocketAddr>().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));
    info!("link-service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/deeplink/canonicalize", post(deeplink::canonicalize))
        .route("/deeplink/verify", post(deeplink::verify))
        .route("/deeplink/parse", post(deeplink::parse))
        .route(
            "/deeplink/deferred",
            post(deferred::resolve_deferred).get(deferred::resolve_deferred_from_cookies),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "link-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "link-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, ApiError> {
    if raw.trim().is_empty() {
        return Err(bad_request("url is required"));
    }
    Url::parse(raw.trim()).map_err(|err| bad_request(&format!("invalid url: {err}")))
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

pub(crate) fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
