//! Development backend for lead-intake
//!
//! Speaks the same contract as the production intake API so the forms can be
//! exercised locally and in tests. Submissions are kept in memory only.
//!
//! | Method | Path | Behaviour |
//! |--------|------|-----------|
//! | GET    | `/health` | liveness |
//! | POST   | intake endpoints (see [`INTAKE_ENDPOINTS`]) | records multipart fields and files, replies 201 |
//! | GET    | `/api/reviews/approved` | seed reviews in a `{success, data}` envelope |
//! | GET    | `/api/gallery` | seed gallery in a `{success, data}` envelope |
//! | GET    | `/submissions` | everything received so far |

// Compile-time embed of the read endpoint fixtures
const REVIEWS_JSON: &str = include_str!("../seed/reviews.json");
const GALLERY_JSON: &str = include_str!("../seed/gallery.json");

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

pub use axum::http::StatusCode as Status;

pub const INTAKE_ENDPOINTS: &[&str] = &[
    "/api/consultations",
    "/api/collaborate",
    "/api/service-inquiries",
    "/api/reviews",
    "/api/cultural-support",
];

/// Five 10 MB files plus the text parts
pub const BODY_LIMIT: usize = 64 * 1024 * 1024;

// ==================== Types ====================

#[derive(Debug, Clone, Serialize)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceivedSubmission {
    pub id: Uuid,
    pub endpoint: String,
    pub fields: BTreeMap<String, String>,
    pub files: Vec<ReceivedFile>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: message.into(),
        }),
    )
}

// ==================== App State ====================

#[derive(Clone)]
pub struct AppState {
    submissions: Arc<Mutex<Vec<ReceivedSubmission>>>,
    reviews: Arc<serde_json::Value>,
    gallery: Arc<serde_json::Value>,
    reject_with: Option<(StatusCode, String)>,
}

impl AppState {
    /// Parses the embedded review and gallery fixtures
    pub fn new() -> Result<Self, serde_json::Error> {
        Ok(Self {
            submissions: Arc::new(Mutex::new(Vec::new())),
            reviews: Arc::new(serde_json::from_str(REVIEWS_JSON)?),
            gallery: Arc::new(serde_json::from_str(GALLERY_JSON)?),
            reject_with: None,
        })
    }

    /// Answer every intake POST with `status` and `{ message }`
    pub fn rejecting(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.reject_with = Some((status, message.into()));
        self
    }

    pub fn submissions(&self) -> Vec<ReceivedSubmission> {
        self.submissions.lock().clone()
    }
}

// ==================== Handlers ====================

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST on any intake endpoint
async fn receive(
    State(state): State<AppState>,
    path: MatchedPath,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let endpoint = path.as_str().to_string();

    if let Some((status, message)) = &state.reject_with {
        warn!("Rejecting {} with {}", endpoint, status);
        return Err(api_error(*status, message.clone()));
    }

    let mut fields = BTreeMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    api_error(StatusCode::PAYLOAD_TOO_LARGE, format!("Could not read {}: {}", file_name, e))
                })?;
                files.push(ReceivedFile {
                    field: name,
                    file_name: Some(file_name),
                    content_type,
                    size: data.len(),
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid field {}: {}", name, e)))?;
                fields.insert(name, value);
            }
        }
    }

    // Every lead form collects an email; that is all the stub insists on
    if fields.get("email").map_or(true, |email| email.trim().is_empty()) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Email is required"));
    }

    let submission = ReceivedSubmission {
        id: Uuid::new_v4(),
        endpoint,
        fields,
        files,
        received_at: Utc::now(),
    };
    info!(
        "Received {} on {} ({} fields, {} files)",
        submission.id,
        submission.endpoint,
        submission.fields.len(),
        submission.files.len()
    );
    let id = submission.id;
    state.submissions.lock().push(submission);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Submission received",
            "data": { "id": id.to_string() },
        })),
    ))
}

/// GET /api/reviews/approved
async fn approved_reviews(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": &*state.reviews }))
}

/// GET /api/gallery
async fn gallery(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": &*state.gallery }))
}

/// GET /submissions
async fn list_submissions(State(state): State<AppState>) -> Json<Vec<ReceivedSubmission>> {
    Json(state.submissions())
}

// ==================== Router ====================

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/reviews/approved", get(approved_reviews))
        .route("/api/gallery", get(gallery))
        .route("/submissions", get(list_submissions));

    for endpoint in INTAKE_ENDPOINTS {
        app = app.route(endpoint, post(receive));
    }

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Running stub bound to an ephemeral localhost port
pub struct StubHandle {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl StubHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn submissions(&self) -> Vec<ReceivedSubmission> {
        self.state.submissions()
    }
}

/// Serve `state` on `127.0.0.1:0` in a background task
pub async fn spawn(state: AppState) -> std::io::Result<StubHandle> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state.clone());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Stub server error: {}", e);
        }
    });

    Ok(StubHandle { addr, state })
}
