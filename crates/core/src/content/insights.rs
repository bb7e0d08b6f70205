//! Transcript insights: topics, quotes, summary, sentiment.

use serde::{Deserialize, Serialize};

/// Overall sentiment of a transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Upbeat.
    Positive,
    /// Neither, or unknown.
    #[default]
    Neutral,
    /// Critical or downbeat.
    Negative,
}

/// Insights extracted from a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Five to seven main themes.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Three to five quotes.
    #[serde(default)]
    pub key_quotes: Vec<String>,
    /// Two or three sentences.
    #[serde(default)]
    pub summary: String,
    /// Overall sentiment.
    #[serde(default)]
    pub sentiment: Sentiment,
}

/// Prompt asking for insights as JSON.
#[must_use]
pub fn insights_prompt(transcript: &str) -> String {
    format!(
        r#"Analyze this transcript and extract:
1. Top 5-7 main topics/themes
2. 3-5 most impactful quotes
3. A 2-3 sentence summary
4. Overall sentiment (positive, neutral, or negative)

Transcript:
{transcript}

Please respond in this exact JSON format:
{{
  "topics": ["topic1", "topic2", ...],
  "keyQuotes": ["quote1", "quote2", ...],
  "summary": "summary text",
  "sentiment": "positive|neutral|negative"
}}"#
    )
}

/// Parses the outermost `{...}` block of a model response.
///
/// Returns empty insights with neutral sentiment when no usable JSON is found.
#[must_use]
pub fn parse_insights(response: &str) -> Insights {
    let block = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return Insights::default(),
    };

    serde_json::from_str(block).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_embedded_json() {
        let response = r#"Here you go:
{
  "topics": ["pricing", "growth"],
  "keyQuotes": ["Charge more."],
  "summary": "A talk about pricing.",
  "sentiment": "positive"
}
Hope this helps!"#;
        let insights = parse_insights(response);
        assert_eq!(insights.topics, vec!["pricing", "growth"]);
        assert_eq!(insights.key_quotes, vec!["Charge more."]);
        assert_eq!(insights.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_falls_back_to_neutral() {
        assert_eq!(parse_insights("no json here"), Insights::default());
        assert_eq!(parse_insights("{ not json }"), Insights::default());
        assert_eq!(parse_insights("} backwards {"), Insights::default());
        assert_eq!(parse_insights("").sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_unknown_sentiment_falls_back() {
        let parsed = parse_insights(r#"{"topics":["a"],"sentiment":"ecstatic"}"#);
        assert_eq!(parsed, Insights::default());
    }

    #[test]
    fn test_prompt_mentions_transcript() {
        let prompt = insights_prompt("hello world");
        assert!(prompt.contains("Transcript:\nhello world"));
        assert!(prompt.contains(r#""keyQuotes": ["quote1", "quote2", ...]"#));
    }
}
