//! HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/upload` | Multipart roster CSV upload (field `file`) |
//! | `POST` | `/api/reports` | Create a scouting report |
//! | `GET`  | `/api/reports` | All reports, newest first |
//! | `GET`  | `/api/reports/event/{eventName}` | Reports for one event |
//! | `GET`  | `/api/events` | Distinct event name/date pairs |
//! | `GET`  | `/api/players` | All players, by last then first name |
//! | `GET`  | `/api/players/search?q=` | Name search (min 2 chars, max 20 rows) |
//! | `POST` | `/api/players` | Manual player add |
//! | `POST` | `/api/export-text` | Plain-text export for one event |
//! | `GET`  | `/health` | Liveness check |
//!
//! # Error Contract
//!
//! Every error response has the same shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "firstName, lastName, and school are required" } }
//! ```
//!
//! Client mistakes are `400 bad_request`. Store and decode failures are
//! `500 internal` with a fixed per-route message; the underlying error is
//! only written to the log. Clients over the rate limit get
//! `429 too_many_requests`.
//!
//! # Hardening
//!
//! Each client IP may send `[server].rate_limit_max` requests per
//! `rate_limit_window_secs`. Responses carry a Content-Security-Policy and
//! the usual browser hardening headers unless `security_headers = false`.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, ConnectInfo, DefaultBodyLimit,
        Multipart, Path, Query, Request, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use uuid::Uuid;

use crate::config::{Config, ServerConfig};
use crate::db;
use crate::error::ScoutError;
use crate::export;
use crate::migrate;
use crate::models::{EventSummary, NewPlayer, NewReport, Player, PlayerMatch, Report};
use crate::players;
use crate::reports;
use crate::roster::{self, ImportSummary};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide storage handle.
    pub pool: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

/// Connects to the database, applies migrations, and serves the API on
/// `[server].bind` until Ctrl-C or SIGTERM.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    let bind_addr = config.server.bind.clone();
    let state = AppState::new(pool.clone(), config.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("scout server listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    log::info!("shutdown complete");
    Ok(())
}

/// Build the full route table with CORS, body limits, rate limiting,
/// security headers, and request logging.
///
/// Rate limiting keys on the peer address, which is only known when the
/// router is served with `into_make_service_with_connect_info::<SocketAddr>`.
/// Without it every request shares one bucket.
pub fn router(state: AppState) -> Router {
    let server = &state.config.server;

    let upload = Router::new()
        .route("/api/upload", post(handle_upload))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes));

    let api = Router::new()
        .route("/api/reports", post(handle_create_report).get(handle_list_reports))
        .route("/api/reports/event/{event_name}", get(handle_reports_by_event))
        .route("/api/events", get(handle_list_events))
        .route("/api/players", get(handle_list_players).post(handle_add_player))
        .route("/api/players/search", get(handle_search_players))
        .route("/api/export-text", post(handle_export_text))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(server.max_json_bytes));

    let mut app = api.merge(upload);
    if let Some(limiter) = client_limiter(server) {
        app = app.layer(middleware::from_fn_with_state(limiter, enforce_rate_limit));
    }
    if server.security_headers {
        for (name, value) in security_headers(&server.content_security_policy) {
            app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }
    }

    let cors = cors_layer(&server.cors_origin);

    app.layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        // Config validation rejects unparseable origins; an empty list denies all.
        AllowOrigin::list(origin.parse::<HeaderValue>().ok())
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Forget idle clients once this many are tracked.
const MAX_TRACKED_CLIENTS: usize = 10_000;

fn client_limiter(server: &ServerConfig) -> Option<Arc<ClientLimiter>> {
    let max = NonZeroU32::new(server.rate_limit_max)?;
    let window = Duration::from_secs(server.rate_limit_window_secs);
    let quota = Quota::with_period(window / max.get())?.allow_burst(max);
    Some(Arc::new(RateLimiter::keyed(quota)))
}

async fn enforce_rate_limit(
    State(limiter): State<Arc<ClientLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&client).is_err() {
        log::warn!("rate limit exceeded for {}", client);
        return too_many_requests().into_response();
    }
    if limiter.len() > MAX_TRACKED_CLIENTS {
        limiter.retain_recent();
    }
    next.run(req).await
}

/// Browser hardening headers, applied only where a handler did not set them.
fn security_headers(content_security_policy: &str) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("origin-agent-cluster"),
            HeaderValue::from_static("?1"),
        ),
        (
            HeaderName::from_static("x-download-options"),
            HeaderValue::from_static("noopen"),
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
    ];
    // Config validation rejects a policy that is not a valid header value.
    if let Ok(value) = HeaderValue::from_str(content_security_policy) {
        headers.push((header::CONTENT_SECURITY_POLICY, value));
    }
    headers
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    log::info!(
        "{} {} {} {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("received Ctrl-C, shutting down"),
        _ = terminate => log::info!("received SIGTERM, shutting down"),
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (`"bad_request"`, `"internal"`, ...).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Validation errors keep their message; everything else is logged and
/// replaced by `public_message`.
fn classify(public_message: &'static str) -> impl FnOnce(ScoutError) -> AppError {
    move |err| {
        if err.is_validation() {
            bad_request(err.to_string())
        } else {
            log::error!("{}: {}", public_message, err);
            internal(public_message)
        }
    }
}

fn too_many_requests() -> AppError {
    AppError {
        status: StatusCode::TOO_MANY_REQUESTS,
        code: "too_many_requests".to_string(),
        message: "Too many requests, please try again later".to_string(),
    }
}

fn from_status(status: StatusCode, message: String) -> AppError {
    let code = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        s if s.is_server_error() => "internal",
        _ => "bad_request",
    };
    AppError {
        status,
        code: code.to_string(),
        message,
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    from_status(rejection.status(), rejection.body_text())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/upload ============

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    message: String,
    #[serde(flatten)]
    summary: ImportSummary,
}

/// Handler for `POST /api/upload`.
///
/// The `file` field is written to the upload directory under a random name
/// and imported from there; the file is removed once the import finishes.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|r| from_status(r.status(), r.body_text()))?;

    let mut saved: Option<PathBuf> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| from_status(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| from_status(e.status(), e.body_text()))?;

        let dir = &state.config.upload.dir;
        let path = dir.join(format!("{}.csv", Uuid::new_v4()));
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            log::error!("could not store upload at {}: {}", path.display(), e);
            return Err(internal("Failed to store uploaded file"));
        }
        saved = Some(path);
        break;
    }

    let path = saved.ok_or_else(|| bad_request("No file uploaded"))?;
    let summary = roster::import_file(&state.pool, &path, true)
        .await
        .map_err(classify("CSV parsing failed"))?;

    Ok(Json(UploadResponse {
        success: true,
        message: summary.message(),
        summary,
    }))
}

// ============ Reports ============

#[derive(Serialize)]
struct CreatedResponse {
    id: i64,
    message: String,
}

async fn handle_create_report(
    State(state): State<AppState>,
    body: Result<Json<NewReport>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let Json(report) = body.map_err(json_rejection)?;
    let id = reports::create_report(&state.pool, report)
        .await
        .map_err(classify("Failed to create report"))?;
    Ok(Json(CreatedResponse {
        id,
        message: "Report created".to_string(),
    }))
}

async fn handle_list_reports(State(state): State<AppState>) -> Result<Json<Vec<Report>>, AppError> {
    let rows = reports::list_reports(&state.pool)
        .await
        .map_err(classify("Failed to fetch reports"))?;
    Ok(Json(rows))
}

async fn handle_reports_by_event(
    State(state): State<AppState>,
    Path(event_name): Path<String>,
) -> Result<Json<Vec<Report>>, AppError> {
    let rows = reports::list_reports_by_event(&state.pool, &event_name)
        .await
        .map_err(classify("Failed to fetch reports"))?;
    Ok(Json(rows))
}

async fn handle_list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let rows = reports::list_events(&state.pool)
        .await
        .map_err(classify("Failed to fetch events"))?;
    Ok(Json(rows))
}

// ============ Players ============

async fn handle_list_players(State(state): State<AppState>) -> Result<Json<Vec<Player>>, AppError> {
    let rows = players::list_players(&state.pool)
        .await
        .map_err(classify("Failed to fetch players"))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn handle_search_players(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PlayerMatch>>, AppError> {
    let rows = players::search_players(&state.pool, &params.q)
        .await
        .map_err(classify("Search failed"))?;
    Ok(Json(rows))
}

async fn handle_add_player(
    State(state): State<AppState>,
    body: Result<Json<NewPlayer>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let Json(player) = body.map_err(json_rejection)?;
    let id = players::add_player(&state.pool, &player)
        .await
        .map_err(classify("Failed to add player"))?;
    Ok(Json(CreatedResponse {
        id,
        message: "Player added".to_string(),
    }))
}

// ============ POST /api/export-text ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest {
    event_name: Option<String>,
    event_date: Option<String>,
}

#[derive(Serialize)]
struct ExportResponse {
    text: String,
}

async fn handle_export_text(
    State(state): State<AppState>,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<ExportResponse>, AppError> {
    let Json(req) = body.map_err(json_rejection)?;
    let (Some(event_name), Some(event_date)) = (req.event_name, req.event_date) else {
        return Err(bad_request("eventName and eventDate are required"));
    };

    let text = export::export_event_text(&state.pool, &event_name, &event_date)
        .await
        .map_err(classify("Export failed"))?;
    Ok(Json(ExportResponse { text }))
}
