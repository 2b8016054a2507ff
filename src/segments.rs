use serde::Serialize;

use crate::pyannote::segment::Segment;

/// Times are reported in seconds at millisecond precision.
fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    #[serde(rename = "speakerIndex")]
    pub speaker_index: usize,
}

#[derive(Debug, Serialize)]
pub struct SpeakerEntry {
    pub label: String,
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct DiarizeResponse {
    pub segments: Vec<SegmentResponse>,
    #[serde(rename = "speakerCount")]
    pub speaker_count: usize,
    pub speakers: Vec<SpeakerEntry>,
}

/// Maps raw pipeline turns into the response shape: millisecond rounding,
/// plus sequential speaker indices assigned by order of first appearance.
pub fn build_response(turns: Vec<Segment>) -> DiarizeResponse {
    let mut speakers: Vec<SpeakerEntry> = Vec::new();
    let mut segments = Vec::with_capacity(turns.len());

    for turn in turns {
        let index = match speakers.iter().position(|s| s.label == turn.speaker) {
            Some(index) => index,
            None => {
                speakers.push(SpeakerEntry {
                    label: turn.speaker.clone(),
                    index: speakers.len(),
                });
                speakers.len() - 1
            }
        };

        let start = round_ms(turn.start);
        let end = round_ms(turn.end);
        segments.push(SegmentResponse {
            speaker: turn.speaker,
            start,
            end,
            // difference of the rounded endpoints, so the reported duration
            // always matches end - start at this precision
            duration: round_ms(end - start),
            speaker_index: index,
        });
    }

    DiarizeResponse {
        speaker_count: speakers.len(),
        speakers,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(start: f64, end: f64, speaker: &str) -> Segment {
        Segment {
            start,
            end,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn indices_follow_first_appearance() {
        let response = build_response(vec![
            turn(0.0, 1.0, "SPEAKER_03"),
            turn(1.0, 2.0, "SPEAKER_00"),
            turn(2.0, 3.0, "SPEAKER_03"),
        ]);

        let indices: Vec<usize> = response.segments.iter().map(|s| s.speaker_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
        assert_eq!(response.speaker_count, 2);

        assert_eq!(response.speakers.len(), 2);
        assert_eq!(response.speakers[0].label, "SPEAKER_03");
        assert_eq!(response.speakers[0].index, 0);
        assert_eq!(response.speakers[1].label, "SPEAKER_00");
        assert_eq!(response.speakers[1].index, 1);
    }

    #[test]
    fn speaker_table_matches_segment_indices() {
        let response = build_response(vec![
            turn(0.0, 0.5, "a"),
            turn(0.5, 1.0, "b"),
            turn(1.0, 1.5, "c"),
            turn(1.5, 2.0, "b"),
        ]);

        for segment in &response.segments {
            let entry = response
                .speakers
                .iter()
                .find(|s| s.label == segment.speaker)
                .unwrap();
            assert_eq!(entry.index, segment.speaker_index);
        }
    }

    #[test]
    fn times_are_rounded_to_milliseconds() {
        let response = build_response(vec![turn(0.0314159, 1.0004999, "SPEAKER_00")]);
        let segment = &response.segments[0];

        assert_eq!(segment.start, 0.031);
        assert_eq!(segment.end, 1.0);
        assert_eq!(segment.duration, 0.969);
    }

    #[test]
    fn duration_equals_end_minus_start() {
        let response = build_response(vec![
            turn(0.1234, 4.5678, "SPEAKER_00"),
            turn(4.5678, 9.8765, "SPEAKER_01"),
            turn(10.00049, 10.00151, "SPEAKER_00"),
        ]);

        for segment in &response.segments {
            assert!((segment.duration - (segment.end - segment.start)).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_turns_yield_empty_response() {
        let response = build_response(Vec::new());
        assert!(response.segments.is_empty());
        assert!(response.speakers.is_empty());
        assert_eq!(response.speaker_count, 0);
    }
}
