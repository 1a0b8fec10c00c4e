//! HTTP surface for the gateway.
//!
//! - `POST /redact/` – Redact a character's name from a document. Body: `query`, `character`
//!   (`harry` | `ron` | `hermione`), `file` (`a` | `b` | `c`).
//! - `POST /analysis/` – Summarize a document. Body: `query`, `file`.
//! - `POST /extract/` – List key plot points of a document. Body: `query`, `file`.
//! - `GET /health` – Liveness plus the registered documents.
//! - `GET /metrics` – Per-mode query counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Query endpoints answer `{"response": "..."}`. Every failure answers `{"detail": "..."}` with
//! 400 for caller mistakes and blocked prompts, 500 for provider failures. Enumerated values
//! are case-insensitive and empty strings count as missing.

use crate::documents::{DocumentId, UnknownDocument};
use crate::metrics::MetricsSnapshot;
use crate::query::{
    Character, DispatchError, DocumentSummary, Mode, QueryApi, QueryRequest, UnknownCharacter,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the HTTP router exposing the query surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: QueryApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/redact/", post(redact::<S>))
        .route("/redact", post(redact::<S>))
        .route("/analysis/", post(analysis::<S>))
        .route("/analysis", post(analysis::<S>))
        .route("/extract/", post(extract::<S>))
        .route("/extract", post(extract::<S>))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Request body for `POST /redact/`.
#[derive(Debug, Default, Deserialize)]
pub struct RedactRequest {
    /// Free text appended to the redaction instruction.
    #[serde(default)]
    pub query: Option<String>,
    /// Character whose name is redacted.
    #[serde(default)]
    pub character: Option<String>,
    /// Document identifier.
    #[serde(default)]
    pub file: Option<String>,
}

/// Request body for `POST /analysis/` and `POST /extract/`.
#[derive(Debug, Default, Deserialize)]
pub struct FileQueryRequest {
    /// Free text appended to the mode instruction.
    #[serde(default)]
    pub query: Option<String>,
    /// Document identifier.
    #[serde(default)]
    pub file: Option<String>,
}

impl RedactRequest {
    fn to_query(&self) -> Result<QueryRequest, ApiError> {
        let mut missing = Vec::new();
        let query = required("query", self.query.as_deref(), &mut missing);
        let character = required("character", self.character.as_deref(), &mut missing);
        let file = required("file", self.file.as_deref(), &mut missing);
        let (Some(query), Some(character), Some(file)) = (query, character, file) else {
            return Err(ApiError::MissingFields(missing));
        };

        let character: Character = character.parse()?;
        let document: DocumentId = file.parse()?;
        Ok(QueryRequest {
            mode: Mode::Redact { character },
            query: query.to_string(),
            document,
        })
    }
}

impl FileQueryRequest {
    fn to_query(&self, mode: Mode) -> Result<QueryRequest, ApiError> {
        let mut missing = Vec::new();
        let query = required("query", self.query.as_deref(), &mut missing);
        let file = required("file", self.file.as_deref(), &mut missing);
        let (Some(query), Some(file)) = (query, file) else {
            return Err(ApiError::MissingFields(missing));
        };

        Ok(QueryRequest {
            mode,
            query: query.to_string(),
            document: file.parse()?,
        })
    }
}

fn required<'a>(
    name: &'static str,
    value: Option<&'a str>,
    missing: &mut Vec<&'static str>,
) -> Option<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// Success response for the query endpoints.
#[derive(Debug, Serialize)]
struct QueryResponse {
    response: String,
}

/// Redact a character's name from the selected document.
async fn redact<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError>
where
    S: QueryApi,
{
    let body: RedactRequest = parse_body("redact", &body)?;
    let request = body.to_query().inspect_err(|error| {
        log_invalid(
            "redact",
            body.query.as_deref(),
            body.character.as_deref(),
            body.file.as_deref(),
            error,
        )
    })?;
    run(service.as_ref(), request).await
}

/// Summarize the selected document.
async fn analysis<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError>
where
    S: QueryApi,
{
    let body: FileQueryRequest = parse_body("analysis", &body)?;
    let request = body.to_query(Mode::Analyze).inspect_err(|error| {
        log_invalid("analysis", body.query.as_deref(), None, body.file.as_deref(), error)
    })?;
    run(service.as_ref(), request).await
}

/// Extract key plot points from the selected document.
async fn extract<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError>
where
    S: QueryApi,
{
    let body: FileQueryRequest = parse_body("extract", &body)?;
    let request = body.to_query(Mode::Extract).inspect_err(|error| {
        log_invalid("extract", body.query.as_deref(), None, body.file.as_deref(), error)
    })?;
    run(service.as_ref(), request).await
}

async fn run<S>(service: &S, request: QueryRequest) -> Result<Json<QueryResponse>, ApiError>
where
    S: QueryApi + ?Sized,
{
    let response = service.run(request).await?;
    Ok(Json(QueryResponse { response }))
}

/// Decode a JSON body whatever the declared `Content-Type`.
///
/// Browsers send `text/plain` for simple cross-origin posts, so the header is not checked.
fn parse_body<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|error| {
        tracing::error!(endpoint, error = %error, "Unreadable request body");
        ApiError::InvalidBody(error.to_string())
    })
}

fn log_invalid(
    endpoint: &'static str,
    query: Option<&str>,
    character: Option<&str>,
    file: Option<&str>,
    error: &ApiError,
) {
    tracing::error!(endpoint, ?query, ?character, ?file, error = %error, "Invalid request");
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    documents: Vec<DocumentSummary>,
}

/// Report liveness and the documents registered at startup.
async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: QueryApi,
{
    Json(HealthResponse {
        status: "ok",
        documents: service.documents(),
    })
}

/// Return per-mode query counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: QueryApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by clients.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "redact",
                method: "POST",
                path: "/redact/",
                description: "Redact every mention of a character (Harry, Ron, or Hermione) from document a, b, or c. Response returns { \"response\": string }.",
                request_example: Some(json!({
                    "query": "hide names",
                    "character": "Harry",
                    "file": "a"
                })),
            },
            CommandDescriptor {
                name: "analysis",
                method: "POST",
                path: "/analysis/",
                description: "Summarize document a, b, or c. Response returns { \"response\": string }.",
                request_example: Some(json!({ "query": "summarize", "file": "b" })),
            },
            CommandDescriptor {
                name: "extract",
                method: "POST",
                path: "/extract/",
                description: "List the key plot points of document a, b, or c. Response returns { \"response\": string }.",
                request_example: Some(json!({ "query": "plot points", "file": "c" })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Report liveness and the documents registered at startup.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return completed and failed query counters per mode.",
                request_example: None,
            },
        ],
    })
}

/// Failures surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more required fields were absent or empty.
    #[error("Missing required parameter(s): {}.", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// `file` is not a registered document.
    #[error(transparent)]
    InvalidFile(#[from] UnknownDocument),
    /// `character` is not a redactable character.
    #[error(transparent)]
    InvalidCharacter(#[from] UnknownCharacter),
    /// Body was not valid JSON for the endpoint's schema.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    /// Query failed at the provider.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    /// HTTP status associated with the failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_)
            | Self::InvalidFile(_)
            | Self::InvalidCharacter(_)
            | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Dispatch(error) if error.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
