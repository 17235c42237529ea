use std::sync::Arc;

use analysis_core::{AnalysisError, SeriesArchiver};
use analysis_orchestrator::AnalysisOrchestrator;
use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use drive_archiver::DriveArchiver;
use llm_client::{NarrativeGenerator, OpenAiClient};
use market_data_client::{CachedFetcher, FredClient, YahooClient};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

mod analyze_routes;
pub mod config;
mod request_id;

pub use config::ServiceConfig;
pub use request_id::{RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

impl AppState {
    /// Wire real providers from configuration. Each fetcher gets its own cache.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let equity = CachedFetcher::new(Arc::new(YahooClient::new()), config.cache_capacity);
        let macro_series = CachedFetcher::new(
            Arc::new(FredClient::new(config.fred_api_key.clone())),
            config.cache_capacity,
        );
        let narrative = NarrativeGenerator::new(Arc::new(OpenAiClient::new(&config.llm)))
            .with_max_tokens(config.llm.max_tokens);
        let archiver: Arc<dyn SeriesArchiver> = Arc::new(DriveArchiver::new(config.drive.clone()));

        Self {
            orchestrator: Arc::new(AnalysisOrchestrator::new(
                equity,
                macro_series,
                narrative,
                archiver,
            )),
        }
    }
}

/// Client-facing error body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub detail: String,
    pub kind: String,
}

/// Error returned from handlers. Analysis failures all map to 400.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: String,
    kind: &'static str,
}

impl AppError {
    pub fn with_status(status: StatusCode, kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            kind,
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, err.kind().as_str(), err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
            kind: self.kind.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(analyze_routes::analyze_financial_data),
    components(schemas(
        analysis_core::AnalysisRequest,
        analysis_core::AnalysisResponse,
        analysis_core::ChartPoint,
        analysis_core::StatisticsSummary,
        ErrorBody
    )),
    tags((name = "Analysis", description = "Natural-language financial series analysis"))
)]
pub struct ApiDoc;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Single allowed origin; any method or header from it, with credentials.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(analyze_routes::analyze_routes())
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServiceConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  CORS origin: {}", config.cors_origin);
    tracing::info!("  Completion model: {} (max {} tokens)", config.llm.model, config.llm.max_tokens);
    if let Some(timeout) = config.llm.timeout {
        tracing::info!("  Completion timeout: {}s", timeout.as_secs());
    }
    tracing::info!("  Series cache capacity: {} per provider", config.cache_capacity);
    tracing::info!("  Drive credentials: {}", config.drive.token_path.display());

    let cors = cors_layer(&config.cors_origin)?;
    let app = build_router(AppState::from_config(&config), cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
