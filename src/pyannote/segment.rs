use anyhow::{Context, Result};
use ndarray::{ArrayBase, Axis, IxDyn, ViewRepr};
use ort::Session;
use std::cmp::Ordering;

use super::embedding::EmbeddingExtractor;
use super::identify::SpeakerLog;

/// One diarized speech turn. `start` and `end` are seconds from the
/// beginning of the recording; `speaker` is an opaque label stable within a
/// single response.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

// Frame geometry of the pyannote segmentation-3.0 model: each output frame
// covers 270 samples at 16 kHz, offset 721 samples into the window.
const FRAME_SIZE: usize = 270;
const FRAME_START: usize = 721;
const WINDOW_SECS: usize = 10;

const SPEAKER_SIMILARITY_THRESHOLD: f32 = 0.5;

fn argmax(row: ArrayBase<ViewRepr<&f32>, IxDyn>) -> Result<usize> {
    row.iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
        .map(|(index, _)| index)
        .context("empty segmentation frame")
}

/// Runs the segmentation model over the recording in 10-second windows,
/// labels each speech region by its speaker embedding, and merges adjacent
/// regions attributed to the same speaker.
pub fn get_segments(
    samples: &[f32],
    sample_rate: u32,
    segmentation: &Session,
    extractor: &EmbeddingExtractor,
    speakers: &mut SpeakerLog,
) -> Result<Vec<Segment>> {
    let window_size = sample_rate as usize * WINDOW_SECS;

    // Pad with trailing silence so the last window is full.
    let mut padded = samples.to_vec();
    let remainder = samples.len() % window_size;
    if remainder != 0 {
        padded.resize(samples.len() + window_size - remainder, 0.0);
    }

    // Speech regions as sample offsets, accumulated across windows.
    let mut regions: Vec<(usize, usize)> = Vec::new();
    let mut speech_start: Option<usize> = None;
    let mut offset = FRAME_START;

    for window in padded.chunks(window_size) {
        let array = ndarray::Array1::from_vec(window.to_vec())
            .insert_axis(Axis(0))
            .insert_axis(Axis(1));
        let inputs = ort::inputs![array]?;

        let outputs = segmentation
            .run(inputs)
            .context("segmentation inference failed")?;
        let frames = outputs
            .get("output")
            .context("segmentation output tensor not found")?
            .try_extract_tensor::<f32>()
            .context("failed to extract segmentation tensor")?;

        for batch in frames.outer_iter() {
            for frame in batch.axis_iter(Axis(0)) {
                // class 0 is non-speech
                if argmax(frame)? != 0 {
                    speech_start.get_or_insert(offset);
                } else if let Some(start) = speech_start.take() {
                    regions.push((start, offset));
                }
                offset += FRAME_SIZE;
            }
        }
    }
    if let Some(start) = speech_start.take() {
        regions.push((start, samples.len()));
    }

    let mut segments: Vec<Segment> = Vec::new();
    for (start, end) in regions {
        let start_idx = start.min(samples.len().saturating_sub(1));
        let end_idx = end.min(samples.len());
        if start_idx >= end_idx {
            continue;
        }

        let embedding = extractor.compute(&samples[start_idx..end_idx])?;
        let id = speakers.assign(embedding, SPEAKER_SIMILARITY_THRESHOLD);
        let speaker = format!("SPEAKER_{id:02}");

        let start_secs = start_idx as f64 / sample_rate as f64;
        let end_secs = end_idx as f64 / sample_rate as f64;
        match segments.last_mut() {
            Some(prev) if prev.speaker == speaker => prev.end = end_secs,
            _ => segments.push(Segment {
                start: start_secs,
                end: end_secs,
                speaker,
            }),
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn argmax_picks_the_largest_class() {
        let frame = ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.1_f32, 0.7, 0.2]).unwrap();
        assert_eq!(argmax(frame.view()).unwrap(), 1);
    }

    #[test]
    fn argmax_rejects_empty_frames() {
        let frame = ArrayD::from_shape_vec(IxDyn(&[0]), Vec::<f32>::new()).unwrap();
        assert!(argmax(frame.view()).is_err());
    }
}
