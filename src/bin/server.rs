use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_finder::{
    Bookstore, BookstoreFinder, Coordinate, FinderConfig, RegionGroup, SearchError,
};

/// Server configuration
struct ServerConfig {
    port: u16,
    finder: FinderConfig,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            finder: FinderConfig::from_env(),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    finder: BookstoreFinder,
    default_radius_km: f64,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    searches_in_flight: AtomicU64,
    resolution_failures: AtomicU64,
    start_time: Instant,
}

/// Decrements the in-flight search counter when dropped
struct SearchGuard<'a>(&'a AtomicU64);

impl<'a> SearchGuard<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for SearchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,bookstore_finder=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    let finder = config
        .finder
        .build_finder()
        .context("Failed to initialize bookstore finder")?;
    tracing::info!("Catalog ready with {} bookstore(s)", finder.catalog().len());

    let app = build_app(finder, config.finder.default_radius_km);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(finder: BookstoreFinder, default_radius_km: f64) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        searches_in_flight: AtomicU64::new(0),
        resolution_failures: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState {
        finder,
        default_radius_km,
        metrics,
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/bookstores", get(list_bookstores))
        .route("/api/bookstores/:id", get(get_bookstore))
        .route("/api/prefectures", get(list_prefectures))
        .route("/api/regions", get(list_regions))
        .route("/api/search", post(search_near))
        .route("/api/metrics", get(get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize)]
struct BrowseQuery {
    #[serde(default)]
    prefecture: Option<String>,
}

#[derive(Serialize)]
struct BookstoresResponse {
    success: bool,
    count: usize,
    data: Vec<Bookstore>,
}

/// All bookstores, optionally restricted to one prefecture
async fn list_bookstores(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Json<BookstoresResponse> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    let data: Vec<Bookstore> = state
        .finder
        .browse(query.prefecture.as_deref())
        .into_iter()
        .cloned()
        .collect();

    Json(BookstoresResponse {
        success: true,
        count: data.len(),
        data,
    })
}

#[derive(Serialize)]
struct BookstoreResponse {
    success: bool,
    data: Bookstore,
}

async fn get_bookstore(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<BookstoreResponse>, ApiError> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    let store = state
        .finder
        .catalog()
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No bookstore with id {}", id)))?;

    Ok(Json(BookstoreResponse {
        success: true,
        data: store,
    }))
}

#[derive(Serialize)]
struct PrefecturesResponse {
    success: bool,
    data: Vec<String>,
}

/// Distinct prefectures, for populating a filter selector
async fn list_prefectures(State(state): State<AppState>) -> Json<PrefecturesResponse> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    Json(PrefecturesResponse {
        success: true,
        data: state
            .finder
            .catalog()
            .prefectures()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

#[derive(Serialize)]
struct RegionsResponse {
    success: bool,
    data: Vec<RegionData>,
}

#[derive(Serialize)]
struct RegionData {
    id: String,
    name: String,
    name_en: String,
    prefectures: Vec<PrefectureData>,
}

#[derive(Serialize)]
struct PrefectureData {
    code: String,
    name: String,
    bookstores: Vec<Bookstore>,
}

impl RegionData {
    fn from_group(group: &RegionGroup<'_>) -> Self {
        Self {
            id: group.region.id().to_string(),
            name: group.region.name().to_string(),
            name_en: group.region.name_en().to_string(),
            prefectures: group
                .prefectures
                .iter()
                .map(|p| PrefectureData {
                    code: p.prefecture.code.to_string(),
                    name: p.prefecture.name.to_string(),
                    bookstores: p.bookstores.iter().map(|s| (*s).clone()).collect(),
                })
                .collect(),
        }
    }
}

async fn list_regions(State(state): State<AppState>) -> Json<RegionsResponse> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    Json(RegionsResponse {
        success: true,
        data: state
            .finder
            .catalog()
            .regions()
            .iter()
            .map(RegionData::from_group)
            .collect(),
    })
}

#[derive(Deserialize)]
struct SearchRequest {
    postal_code: String,
    #[serde(default)]
    radius_km: Option<f64>,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    postal_code: String,
    origin: Coordinate,
    radius_km: f64,
    count: usize,
    data: Vec<RankedData>,
}

#[derive(Serialize)]
struct RankedData {
    distance_km: f64,
    distance: String,
    bookstore: Bookstore,
}

/// Bookstores near a postal code, nearest first
async fn search_near(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    let _guard = SearchGuard::enter(&state.metrics.searches_in_flight);

    let radius_km = request.radius_km.unwrap_or(state.default_radius_km);
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ApiError::BadRequest(
            "radius_km must be a non-negative number".to_string(),
        ));
    }

    tracing::info!(
        "Searching near {} within {} km",
        request.postal_code,
        radius_km
    );

    let search = state
        .finder
        .search_near(&request.postal_code, radius_km)
        .await
        .map_err(|e| match e {
            SearchError::InvalidPostalCode(e) => ApiError::BadRequest(e.to_string()),
            SearchError::Resolution(e) => {
                state
                    .metrics
                    .resolution_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::error!("Resolution error: {}", e);
                ApiError::ResolutionFailed {
                    message: e.user_message().to_string(),
                    detail: e.to_string(),
                    retryable: e.is_retryable(),
                }
            }
        })?;

    let data: Vec<RankedData> = search
        .results
        .iter()
        .map(|r| RankedData {
            distance_km: r.distance_km,
            distance: r.display_distance(),
            bookstore: r.bookstore.clone(),
        })
        .collect();

    Ok(Json(SearchResponse {
        success: true,
        postal_code: search.postal_code,
        origin: search.origin,
        radius_km: search.radius_km,
        count: data.len(),
        data,
    }))
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        searches_in_flight: state.metrics.searches_in_flight.load(Ordering::Relaxed),
        resolution_failures: state.metrics.resolution_failures.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    searches_in_flight: u64,
    resolution_failures: u64,
    uptime_seconds: u64,
}

/// API error types
enum ApiError {
    BadRequest(String),
    NotFound(String),
    ResolutionFailed {
        message: String,
        detail: String,
        retryable: bool,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "error": msg }),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "success": false, "error": msg }),
            ),
            ApiError::ResolutionFailed {
                message,
                detail,
                retryable,
            } => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "success": false,
                    "error": message,
                    "detail": detail,
                    "retryable": retryable
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
