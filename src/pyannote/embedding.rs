use anyhow::{Context, Result};
use ndarray::Axis;
use ort::Session;
use std::path::Path;

use super::models;

/// Speaker-embedding extractor: fbank features in, a fixed-size voice
/// fingerprint out.
pub struct EmbeddingExtractor {
    session: Session,
}

impl EmbeddingExtractor {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Ok(Self {
            session: models::create_session(model_path)?,
        })
    }

    pub fn compute(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let features = knf_rs::compute_fbank(samples).map_err(anyhow::Error::msg)?;
        let features = features.insert_axis(Axis(0));
        let inputs = ort::inputs!["feats" => features.view()]?;

        let outputs = self
            .session
            .run(inputs)
            .context("embedding inference failed")?;
        let embedding = outputs
            .get("embs")
            .context("embedding output tensor not found")?
            .try_extract_tensor::<f32>()
            .context("failed to extract embedding tensor")?;

        Ok(embedding.iter().copied().collect())
    }
}
