use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json as JsonResponse,
    routing::{get, post},
    serve, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::pyannote::{DiarizationPipeline, PipelineError};
use crate::segments::{build_response, DiarizeResponse};

pub const SERVICE_NAME: &str = "pyannote-diarization-sidecar";

/// 100 MB of WAV; roughly an hour and a half of 16 kHz mono PCM.
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

// App state
pub struct AppState {
    pub pipeline: OnceCell<Arc<DiarizationPipeline>>,
    pub scratch_dir: PathBuf,
}

impl AppState {
    pub fn new(scratch_dir: PathBuf) -> Self {
        AppState {
            pipeline: OnceCell::new(),
            scratch_dir,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
}

type ApiError = (StatusCode, JsonResponse<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, JsonResponse(json!({ "error": message.into() })))
}

async fn health() -> JsonResponse<HealthResponse> {
    JsonResponse(HealthResponse {
        ok: true,
        service: SERVICE_NAME,
    })
}

/// Returns the shared pipeline, constructing it on the first call. The
/// `OnceCell` guard means concurrent first requests build it exactly once;
/// a failed construction is not cached, so the next request retries.
async fn get_or_initialize_pipeline(
    state: &AppState,
) -> Result<Arc<DiarizationPipeline>, PipelineError> {
    state
        .pipeline
        .get_or_try_init(|| async {
            info!("initializing diarization pipeline");
            DiarizationPipeline::from_env().await.map(Arc::new)
        })
        .await
        .cloned()
}

fn stage_payload(dir: &Path, body: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("diarize-")
        .suffix(".wav")
        .tempfile_in(dir)?;
    std::io::Write::write_all(file.as_file_mut(), body)?;
    Ok(file)
}

async fn diarize(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<JsonResponse<DiarizeResponse>, ApiError> {
    if body.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Empty request body. Send WAV audio.",
        ));
    }

    let pipeline = get_or_initialize_pipeline(&state)
        .await
        .map_err(|e| match e {
            PipelineError::MissingToken => {
                error!("diarization pipeline unavailable: {}", e);
                api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            PipelineError::Init(e) => {
                error!("failed to initialize diarization pipeline: {:#}", e);
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to initialize diarization pipeline: {e}"),
                )
            }
        })?;

    // The model entry point takes a file path, so the payload is parked in a
    // scratch file. `NamedTempFile` removes it on drop, on every exit path.
    let scratch = stage_payload(&state.scratch_dir, &body).map_err(|e| {
        error!("failed to stage audio payload: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stage audio payload: {e}"),
        )
    })?;

    let scratch_path = scratch.path().to_path_buf();
    let result = tokio::task::spawn_blocking(move || pipeline.diarize(&scratch_path))
        .await
        .map_err(|e| {
            error!("diarization task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Diarization task failed")
        })?;
    drop(scratch);

    let turns = result.map_err(|e| {
        error!("diarization failed: {:#}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Diarization failed: {e}"),
        )
    })?;

    info!("diarized {} segments", turns.len());
    Ok(JsonResponse(build_response(turns)))
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/diarize", post(diarize))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub struct Server {
    addr: SocketAddr,
}

impl Server {
    pub fn new(addr: SocketAddr) -> Self {
        Server { addr }
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let state = Arc::new(AppState::new(std::env::temp_dir()));
        let app = create_router().with_state(state);

        info!("starting {} on {}", SERVICE_NAME, self.addr);
        let listener = TcpListener::bind(self.addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
