//! Transcription results and the views derived from them.
//!
//! Times are seconds from the start of the recording as reported by the
//! transcription provider.

use serde::{Deserialize, Serialize};

/// A single recognised word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Recognised text.
    pub word: String,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
    /// Recognition confidence in `0..=1`.
    pub confidence: f64,
    /// Zero-based speaker index when diarization is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

/// A sentence inside a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text.
    pub text: String,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
}

/// A paragraph, attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Sentences in order.
    pub sentences: Vec<Sentence>,
    /// Zero-based speaker index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
}

impl Paragraph {
    /// Sentences joined with single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Recording metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Length of the recording.
    pub duration: f64,
    /// Audio channels.
    pub channels: u32,
    /// Model that produced the transcript.
    pub model: String,
}

/// Full transcription of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Plain transcript.
    pub transcript: String,
    /// Overall confidence.
    pub confidence: f64,
    /// Word timings, when returned.
    #[serde(default)]
    pub words: Vec<Word>,
    /// Paragraphs, when returned.
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    /// Recording metadata.
    pub metadata: TranscriptMetadata,
}

/// A clip-sized stretch of transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text.
    pub text: String,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
    /// Speaker of the originating paragraph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

/// Default segment length for clip extraction.
pub const DEFAULT_SEGMENT_SECONDS: f64 = 60.0;

/// Renders paragraphs with a `[Speaker N]:` label whenever the speaker
/// changes. Speakers are shown one-based.
///
/// Falls back to the plain transcript when there are no paragraphs.
#[must_use]
pub fn format_with_speakers(result: &TranscriptionResult) -> String {
    if result.paragraphs.is_empty() {
        return result.transcript.clone();
    }

    let mut formatted = String::new();
    let mut current = None;

    for para in &result.paragraphs {
        if let Some(speaker) = para.speaker
            && current != Some(speaker)
        {
            current = Some(speaker);
            formatted.push_str(&format!("\n\n[Speaker {}]:\n", speaker + 1));
        }
        formatted.push_str(&para.text());
        formatted.push('\n');
    }

    formatted.trim().to_string()
}

/// Splits paragraphs into segments no longer than `segment_len` seconds.
///
/// Paragraphs that fit are kept whole. Longer ones are cut at sentence
/// boundaries; a single sentence longer than the limit becomes its own
/// segment.
#[must_use]
#[allow(clippy::float_arithmetic)]
pub fn extract_timestamped_segments(
    result: &TranscriptionResult,
    segment_len: f64,
) -> Vec<Segment> {
    let mut segments = Vec::new();

    for para in &result.paragraphs {
        if para.end - para.start <= segment_len {
            segments.push(Segment {
                text: para.text(),
                start: para.start,
                end: para.end,
                speaker: para.speaker,
            });
            continue;
        }

        let mut text = String::new();
        let mut start = para.start;
        let mut end = para.start;

        for sentence in &para.sentences {
            let sentence_len = sentence.end - sentence.start;

            if end - start + sentence_len > segment_len {
                if !text.is_empty() {
                    segments.push(Segment {
                        text: text.trim().to_string(),
                        start,
                        end,
                        speaker: para.speaker,
                    });
                }
                text.clone_from(&sentence.text);
                start = sentence.start;
                end = sentence.end;
            } else {
                text.push(' ');
                text.push_str(&sentence.text);
                end = sentence.end;
            }
        }

        if !text.is_empty() {
            segments.push(Segment {
                text: text.trim().to_string(),
                start,
                end,
                speaker: para.speaker,
            });
        }
    }

    segments
}
