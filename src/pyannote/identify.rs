use ndarray::Array1;

/// Per-request registry of the speakers seen so far. Ids are handed out
/// sequentially from 0, in the order speakers first appear.
#[derive(Debug)]
pub struct SpeakerLog {
    max_speakers: usize,
    speakers: Vec<Array1<f32>>,
}

impl SpeakerLog {
    pub fn new(max_speakers: usize) -> Self {
        Self {
            max_speakers,
            speakers: Vec::new(),
        }
    }

    fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
        a.dot(b) / (a.dot(a).sqrt() * b.dot(b).sqrt())
    }

    /// Returns the id of the closest known speaker above `threshold`,
    /// registering a new speaker when none matches and capacity remains.
    /// Once at capacity, falls back to the closest speaker regardless of
    /// threshold so every turn gets a label.
    pub fn assign(&mut self, embedding: Vec<f32>, threshold: f32) -> usize {
        let embedding = Array1::from_vec(embedding);

        let mut best: Option<(usize, f32)> = None;
        for (id, known) in self.speakers.iter().enumerate() {
            let similarity = Self::cosine_similarity(&embedding, known);
            if similarity > best.map_or(threshold, |(_, score)| score) {
                best = Some((id, similarity));
            }
        }

        match best {
            Some((id, _)) => id,
            None if self.speakers.is_empty() || self.speakers.len() < self.max_speakers => {
                self.speakers.push(embedding);
                self.speakers.len() - 1
            }
            None => self.closest(&embedding),
        }
    }

    fn closest(&self, embedding: &Array1<f32>) -> usize {
        let mut best_id = 0;
        let mut best_similarity = f32::MIN;
        for (id, known) in self.speakers.iter().enumerate() {
            let similarity = Self::cosine_similarity(embedding, known);
            if similarity > best_similarity {
                best_id = id;
                best_similarity = similarity;
            }
        }
        best_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_embeddings_share_an_id() {
        let mut log = SpeakerLog::new(4);
        let a = log.assign(vec![1.0, 0.0, 0.0], 0.5);
        let b = log.assign(vec![1.0, 0.0, 0.0], 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn dissimilar_embeddings_get_sequential_ids() {
        let mut log = SpeakerLog::new(4);
        let a = log.assign(vec![1.0, 0.0, 0.0], 0.5);
        let b = log.assign(vec![0.0, 1.0, 0.0], 0.5);
        let c = log.assign(vec![0.0, 0.0, 1.0], 0.5);
        assert_eq!((a, b, c), (0, 1, 2));
    }

    #[test]
    fn capacity_caps_distinct_speakers() {
        let mut log = SpeakerLog::new(1);
        let a = log.assign(vec![1.0, 0.0], 0.5);
        // orthogonal voice, but the log is full: closest match wins
        let b = log.assign(vec![0.0, 1.0], 0.5);
        assert_eq!(a, 0);
        assert_eq!(b, 0);
    }
}
