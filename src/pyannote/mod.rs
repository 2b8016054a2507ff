pub mod embedding;
pub mod identify;
pub mod models;
pub mod segment;

use anyhow::{Context, Result};
use ort::Session;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::audio;
use embedding::EmbeddingExtractor;
use identify::SpeakerLog;
use segment::Segment;

/// Sample rate the pyannote models operate at.
pub const SAMPLE_RATE: u32 = 16_000;

/// Most distinct speakers a single recording will be attributed.
const MAX_SPEAKERS: usize = 6;

pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "HF_TOKEN environment variable is required. Get a token at \
         https://huggingface.co/settings/tokens and accept the pyannote model \
         license at https://huggingface.co/pyannote/speaker-diarization-3.1"
    )]
    MissingToken,
    #[error(transparent)]
    Init(#[from] anyhow::Error),
}

/// Handle to the loaded diarization models. Constructed once per process;
/// inference goes through `&self` so the handle can be shared freely.
pub struct DiarizationPipeline {
    segmentation: Session,
    embedding: EmbeddingExtractor,
}

impl DiarizationPipeline {
    /// Loads the pipeline, reading the hub token from the environment and
    /// fetching the pretrained models through the hub cache.
    pub async fn from_env() -> Result<Self, PipelineError> {
        let hf_token = std::env::var(HF_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or(PipelineError::MissingToken)?;

        let segmentation_path =
            models::fetch_model(models::PyannoteModel::Segmentation, &hf_token).await?;
        let embedding_path =
            models::fetch_model(models::PyannoteModel::Embedding, &hf_token).await?;

        let segmentation = models::create_session(&segmentation_path)?;
        let embedding = EmbeddingExtractor::new(&embedding_path)?;
        info!("diarization pipeline initialized");

        Ok(Self {
            segmentation,
            embedding,
        })
    }

    /// Diarizes the recording at `path`, returning ordered speech turns with
    /// opaque speaker labels.
    pub fn diarize<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Segment>> {
        let (samples, sample_rate) =
            audio::pcm_decode(&path).context("failed to decode audio")?;

        let samples = if sample_rate != SAMPLE_RATE {
            audio::resample(&samples, sample_rate, SAMPLE_RATE)
                .context("failed to resample audio")?
        } else {
            samples
        };

        let mut speakers = SpeakerLog::new(MAX_SPEAKERS);
        segment::get_segments(
            &samples,
            SAMPLE_RATE,
            &self.segmentation,
            &self.embedding,
            &mut speakers,
        )
    }
}
