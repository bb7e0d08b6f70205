//! Content repurposing: prompts, response parsing, insights, transcripts.

pub mod insights;
pub mod parse;
pub mod prompts;
pub mod transcript;

pub use insights::{Insights, Sentiment, insights_prompt, parse_insights};
pub use parse::parse_content_response;
pub use prompts::{ContentKind, PromptRequest, Tone, build_prompt};
pub use transcript::{
    DEFAULT_SEGMENT_SECONDS, Paragraph, Segment, Sentence, TranscriptMetadata,
    TranscriptionResult, Word, extract_timestamped_segments, format_with_speakers,
};
