pub mod config;
pub mod middleware;
mod score_routes;
mod sector_routes;

use axum::{
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use health_core::AnalysisError;
use health_score::HealthScorer;
use line_item_mapper::LineItemMapper;
use sector_benchmark::SectorCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<HealthScorer>,
    pub mapper: Arc<LineItemMapper>,
    pub sector_cache: Arc<SectorCache>,
}

impl AppState {
    pub fn new(scorer: HealthScorer, sector_cache_ttl_secs: i64) -> Self {
        Self {
            scorer: Arc::new(scorer),
            mapper: Arc::new(LineItemMapper::new()),
            sector_cache: Arc::new(SectorCache::new(sector_cache_ttl_secs)),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{message}"))
    }

    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!("{message}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!(status = %self.status, "Request rejected: {:#}", self.error);
        }
        let body = ApiResponse::<()>::error(format!("{:#}", self.error));
        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

/// Map AnalysisError to AppError with appropriate status codes.
pub(crate) fn analysis_err(context: &str, e: AnalysisError) -> AppError {
    let status = match e {
        AnalysisError::InvalidData(_) | AnalysisError::InvalidPolicy(_) => StatusCode::BAD_REQUEST,
        AnalysisError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::with_status(status, anyhow::anyhow!("{context}: {e}"))
}

pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // try_init so a second call (tests) is a no-op
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(score_routes::score_routes())
        .merge(sector_routes::sector_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
}

/// Periodically drop expired sector aggregates, including sectors nobody reads again.
pub fn spawn_cache_purge(cache: Arc<SectorCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired sector aggregates", purged);
            }
        }
    })
}

/// Purge at least every five minutes, sooner for short TTLs.
fn purge_period(ttl_secs: i64) -> Duration {
    Duration::from_secs(ttl_secs.clamp(1, 300) as u64)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_tracing(config.json_logging);

    let scorer = config.build_scorer()?;
    let state = AppState::new(scorer, config.sector_cache_ttl_secs);

    tracing::info!(
        "Sector aggregates cached for {}s",
        config.sector_cache_ttl_secs
    );
    let purge = spawn_cache_purge(
        Arc::clone(&state.sector_cache),
        purge_period(config.sector_cache_ttl_secs),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("binding {}: {}", config.bind_addr, e))?;
    tracing::info!("🚀 Health score API listening on {}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
