use std::sync::Arc;

use anyhow::Context;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::config::ServerConfig;
use crate::melody::{BellEvent, MelodyExtractor};
use crate::midi::{self, MidiError};

/// Multipart field carrying the uploaded file
pub const MIDI_FIELD: &str = "midi_file";

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<MelodyExtractor>,
}

impl AppState {
    pub fn new(extractor: MelodyExtractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }
}

/// Error type for the upload endpoint, rendered as `{"error": message}`
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("No MIDI file provided")]
    MissingFile,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<MidiError> for HttpError {
    fn from(e: MidiError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingFile | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// One track of the uploaded file
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackSummary {
    pub track_id: usize,
    pub name: String,
    pub notes_count: usize,
}

/// Upload endpoint response payload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub tracks: Vec<TrackSummary>,
    pub sequence: Vec<BellEvent>,
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload_midi", post(upload_midi))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn run_http_server(config: &ServerConfig, extractor: MelodyExtractor) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", config.bind_addr))?;
    log::info!("Listening on {}", config.bind_addr);

    let router = build_router(AppState::new(extractor), config.max_upload_bytes);
    axum::serve(listener, router)
        .await
        .context("serving HTTP router")?;
    Ok(())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn upload_midi(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpError> {
    let mut multipart = multipart.map_err(|e| HttpError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(MIDI_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::BadRequest(e.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = match upload {
        Some((filename, bytes)) if !filename.is_empty() => (filename, bytes),
        _ => return Err(HttpError::MissingFile),
    };
    log::info!("Received file: {} ({} bytes)", filename, bytes.len());

    let extractor = Arc::clone(&state.extractor);
    let processed = tokio::task::spawn_blocking(move || -> Result<_, MidiError> {
        let file = midi::parse_bytes(&bytes)?;
        let tracks = file
            .tracks
            .iter()
            .enumerate()
            .map(|(i, track)| TrackSummary {
                track_id: i,
                name: track.display_name(i),
                notes_count: track.note_on_count(),
            })
            .collect::<Vec<_>>();
        Ok((tracks, extractor.extract(&file)))
    })
    .await
    .map_err(|e| HttpError::Internal(e.to_string()))?;

    let (tracks, sequence) = processed.map_err(|e| {
        log::error!("Failed to process {}: {}", filename, e);
        HttpError::from(e)
    })?;

    let message = if sequence.is_empty() {
        "no melody found"
    } else {
        "MIDI file processed"
    };

    Ok(Json(UploadResponse {
        message: message.to_string(),
        filename,
        tracks,
        sequence,
    }))
}
