// Agency Directory - HTTP surface (Axum)
//
// Thin layer over DirectoryService: extract, call the core on the blocking
// pool, render. All status-code decisions live in `ApiError::into_response`.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::clearance::caller_level_from_header;
use crate::config::{Agency, Config};
use crate::directory::{DirectoryService, LinkGenerator, PathLinks};
use crate::entities::PersonDraft;
use crate::error::{DirectoryError, DirectoryResult};
use crate::schema::group_by_field;

pub const ACCESS_LEVEL_HEADER: &str = "x-access-level";
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    directory: DirectoryService,
    links: Arc<PathLinks>,
    agency_name: Arc<str>,
    agencies: Arc<Vec<Agency>>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(directory: DirectoryService, config: &Config) -> Self {
        AppState {
            directory,
            links: Arc::new(PathLinks::new("/people")),
            agency_name: Arc::from(config.agency_name.as_str()),
            agencies: Arc::new(config.agencies.clone()),
            static_dir: config.static_dir.clone(),
        }
    }
}

// ============================================================================
// Problem responses
// ============================================================================

/// `{title, detail, statusCode, instance}` error body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provided_level: Option<i64>,
}

impl ProblemDetails {
    fn unexpected(detail: Option<String>, instance: Option<String>) -> Self {
        ProblemDetails {
            title: "Unexpected error".to_string(),
            detail,
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            instance,
            required_level: None,
            provided_level: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationProblem {
    title: &'static str,
    status: u16,
    instance: String,
    errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug)]
enum ApiErrorKind {
    Directory(DirectoryError),
    InvalidBody(String),
    Unexpected(anyhow::Error),
}

#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    instance: String,
}

impl ApiError {
    fn directory(error: DirectoryError, uri: &Uri) -> Self {
        ApiError {
            kind: ApiErrorKind::Directory(error),
            instance: uri.path().to_string(),
        }
    }

    fn unexpected(error: anyhow::Error, uri: &Uri) -> Self {
        ApiError {
            kind: ApiErrorKind::Unexpected(error),
            instance: uri.path().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.kind {
            ApiErrorKind::Directory(DirectoryError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationProblem {
                    title: "One or more validation errors occurred.",
                    status: StatusCode::BAD_REQUEST.as_u16(),
                    instance: self.instance,
                    errors: group_by_field(&errors),
                }),
            )
                .into_response(),
            ApiErrorKind::Directory(DirectoryError::NotFound(message)) => {
                (StatusCode::NOT_FOUND, Json(MessageBody { message })).into_response()
            }
            ApiErrorKind::Directory(DirectoryError::AccessDenied { required, provided }) => (
                StatusCode::FORBIDDEN,
                Json(ProblemDetails {
                    title: "Access denied".to_string(),
                    detail: Some(format!(
                        "Clearance level {} is below the required level {}.",
                        provided, required
                    )),
                    status_code: StatusCode::FORBIDDEN.as_u16(),
                    instance: Some(self.instance),
                    required_level: Some(required),
                    provided_level: Some(provided),
                }),
            )
                .into_response(),
            ApiErrorKind::Directory(err @ DirectoryError::StoreUnavailable(_)) => {
                error!(instance = %self.instance, error = %err, "store unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ProblemDetails::unexpected(
                        Some(err.to_string()),
                        Some(self.instance),
                    )),
                )
                    .into_response()
            }
            ApiErrorKind::InvalidBody(detail) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid JSON body", "detail": detail })),
            )
                .into_response(),
            ApiErrorKind::Unexpected(err) => {
                error!(instance = %self.instance, error = %err, "unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ProblemDetails::unexpected(
                        Some(err.to_string()),
                        Some(self.instance),
                    )),
                )
                    .into_response()
            }
        }
    }
}

/// Panics inside handlers end up here instead of dropping the connection.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    error!(detail = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ProblemDetails::unexpected(Some(detail), None)),
    )
        .into_response()
}

/// Run a directory call on the blocking pool; store access may block.
async fn run<T, F>(state: &AppState, uri: &Uri, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DirectoryService) -> DirectoryResult<T> + Send + 'static,
{
    let directory = state.directory.clone();
    match tokio::task::spawn_blocking(move || f(&directory)).await {
        Ok(result) => result.map_err(|e| ApiError::directory(e, uri)),
        Err(join_error) => Err(ApiError::unexpected(join_error.into(), uri)),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ============================================================================
// People handlers
// ============================================================================

/// POST /people - create a person
async fn create_person(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<PersonDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(draft) = body.map_err(|rejection| ApiError {
        kind: ApiErrorKind::InvalidBody(rejection.body_text()),
        instance: uri.path().to_string(),
    })?;

    let person = run(&state, &uri, move |d| d.create(&draft)).await?;
    let location = person.canonical_path();

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(person),
    )
        .into_response())
}

/// GET /people - every person, no clearance filter
async fn list_people(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let people = run(&state, &uri, |d| d.list_people()).await?;
    Ok(Json(people).into_response())
}

/// GET /people/:id - gated by X-Access-Level
async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let caller_level = caller_level_from_header(header_str(&headers, ACCESS_LEVEL_HEADER));
    let person = run(&state, &uri, move |d| d.get_by_id(id, caller_level)).await?;
    Ok(Json(person).into_response())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// GET /people/search?q=... - results carry self-links
async fn search_people(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let links = state.links.clone();
    let hits = run(&state, &uri, move |d| {
        let links: &dyn LinkGenerator = &*links;
        d.search(&params.q, Some(links))
    })
    .await?;
    Ok(Json(hits).into_response())
}

/// GET /people/by-alias/:alias - NOT gated
async fn get_person_by_alias(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let person = run(&state, &uri, move |d| d.get_by_alias(&alias)).await?;
    Ok(Json(person).into_response())
}

// ============================================================================
// Locations & protocols
// ============================================================================

/// GET /loc/:id and GET /places/:id
async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let location = run(&state, &uri, move |d| d.get_location(id)).await?;
    Ok(Json(location).into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolsResponse {
    location_id: i64,
    viewed_by: String,
    protocols: Vec<crate::entities::Protocol>,
}

/// GET /protocols/by-location/:id - NOT gated, X-Agent-Id is logged
async fn protocols_by_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let agent = header_str(&headers, AGENT_ID_HEADER)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(crate::directory::ANONYMOUS_AGENT)
        .to_string();

    let viewer = agent.clone();
    let protocols = run(&state, &uri, move |d| {
        d.list_protocols_by_location(id, Some(viewer.as_str()))
    })
    .await?;

    Ok(Json(ProtocolsResponse {
        location_id: id,
        viewed_by: agent,
        protocols,
    })
    .into_response())
}

/// Request log for everything under /protocols
async fn log_protocol_request(request: Request, next: Next) -> Response {
    info!(
        at = %chrono::Utc::now().to_rfc3339(),
        method = %request.method(),
        path = %full_path(&request),
        "[protocols] request"
    );
    next.run(request).await
}

/// Path as the client sent it; nested routers only see the stripped suffix.
fn full_path(request: &Request) -> &str {
    match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => uri.path(),
        None => request.uri().path(),
    }
}

// ============================================================================
// Misc
// ============================================================================

/// GET / - plain text banner
async fn root() -> &'static str {
    "OK. Try /agency/info, /people, /people/search?q=test"
}

/// GET /health
async fn health_check(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let people = run(&state, &uri, |d| Ok(d.store().person_count()?)).await?;
    Ok(Json(serde_json::json!({ "status": "OK", "people": people })).into_response())
}

/// GET /agency/info
async fn agency_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "agency": &*state.agency_name }))
}

/// GET /agencies
async fn list_agencies(State(state): State<AppState>) -> impl IntoResponse {
    Json((*state.agencies).clone())
}

/// GET /force-error - always fails through the generic error path
async fn force_error(OriginalUri(uri): OriginalUri) -> Result<Response, ApiError> {
    Err(ApiError::unexpected(
        anyhow::anyhow!("This is a forced test error"),
        &uri,
    ))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let people_routes = Router::new()
        .route("/", get(list_people).post(create_person))
        .route("/search", get(search_people))
        .route("/by-alias/:alias", get(get_person_by_alias))
        .route("/:id", get(get_person));

    let protocol_routes = Router::new()
        .route("/by-location/:id", get(protocols_by_location))
        .layer(middleware::from_fn(log_protocol_request));

    let static_files = ServeDir::new(state.static_dir.clone());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/agency/info", get(agency_info))
        .route("/agencies", get(list_agencies))
        .route("/force-error", get(force_error))
        .route("/loc/:id", get(get_location))
        .route("/places/:id", get(get_location))
        .nest("/people", people_routes)
        .nest("/protocols", protocol_routes)
        .fallback_service(static_files)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
}
