use anyhow::{Context, Result};
use hf_hub::api::tokio::ApiBuilder;
use ort::{GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The two pretrained models behind the pipeline. Both are gated on the
/// Hugging Face Hub, hence the token requirement.
#[derive(Debug, Clone, Copy)]
pub enum PyannoteModel {
    Segmentation,
    Embedding,
}

impl PyannoteModel {
    fn repo(self) -> &'static str {
        match self {
            PyannoteModel::Segmentation => "pyannote/segmentation-3.0",
            PyannoteModel::Embedding => "pyannote/wespeaker-voxceleb-resnet34-LM",
        }
    }

    fn filename(self) -> &'static str {
        match self {
            PyannoteModel::Segmentation => "segmentation-3.0.onnx",
            PyannoteModel::Embedding => "wespeaker_en_voxceleb_CAM++.onnx",
        }
    }
}

/// Fetches a model through the hub, reusing the hub cache across restarts.
pub async fn fetch_model(model: PyannoteModel, hf_token: &str) -> Result<PathBuf> {
    let api = ApiBuilder::new()
        .with_token(Some(hf_token.to_string()))
        .build()
        .context("failed to build hub client")?;

    debug!("fetching {} from {}", model.filename(), model.repo());
    let path = api
        .model(model.repo().to_string())
        .get(model.filename())
        .await
        .with_context(|| {
            format!("failed to fetch {} from {}", model.filename(), model.repo())
        })?;

    info!("{} ready at {:?}", model.filename(), path);
    Ok(path)
}

/// Builds a single-threaded onnx session for a model on disk. Session-level
/// parallelism is left off; concurrency happens at the request level.
pub fn create_session<P: AsRef<Path>>(path: P) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(1)?
        .with_inter_threads(1)?
        .commit_from_file(path.as_ref())?;
    Ok(session)
}
