//! Generation prompts per content type.

use serde::{Deserialize, Serialize};

/// Kinds of content the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// LinkedIn post.
    LinkedinPost,
    /// Twitter/X thread.
    TwitterThread,
    /// Instagram caption.
    InstagramCaption,
    /// Email newsletter.
    EmailNewsletter,
    /// SEO blog article.
    BlogArticle,
    /// Short-form video script.
    TiktokScript,
    /// Shareable quote.
    QuoteCard,
    /// Transcript summary.
    Summary,
}

impl ContentKind {
    /// Snake-case name, matching the `output_type` column where one exists.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedinPost => "linkedin_post",
            Self::TwitterThread => "twitter_thread",
            Self::InstagramCaption => "instagram_caption",
            Self::EmailNewsletter => "email_newsletter",
            Self::BlogArticle => "blog_article",
            Self::TiktokScript => "tiktok_script",
            Self::QuoteCard => "quote_card",
            Self::Summary => "summary",
        }
    }

    /// Marker word used in `---MARKER N---` separators.
    #[must_use]
    pub const fn separator(&self) -> &'static str {
        match self {
            Self::LinkedinPost => "POST",
            Self::TwitterThread => "THREAD",
            Self::InstagramCaption => "CAPTION",
            Self::EmailNewsletter => "EMAIL",
            Self::BlogArticle => "ARTICLE",
            Self::TiktokScript => "SCRIPT",
            Self::QuoteCard => "QUOTE",
            Self::Summary => "SUMMARY",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("Unknown content type: {s}"))
    }
}

/// Voice of generated content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Default.
    #[default]
    Professional,
    /// Relaxed.
    Casual,
    /// Motivational.
    Inspirational,
    /// Teaching.
    Educational,
}

impl Tone {
    /// Prompt word.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Inspirational => "inspirational",
            Self::Educational => "educational",
        }
    }
}

/// Inputs to a generation prompt.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    /// Source transcript.
    pub transcript: &'a str,
    /// What to produce.
    pub kind: ContentKind,
    /// How many pieces.
    pub count: u32,
    /// Voice.
    pub tone: Tone,
    /// Brand voice description.
    pub brand_voice: Option<&'a str>,
    /// Free-form extra instructions.
    pub additional_context: Option<&'a str>,
}

impl<'a> PromptRequest<'a> {
    /// One professional piece of `kind`.
    #[must_use]
    pub const fn new(transcript: &'a str, kind: ContentKind) -> Self {
        Self {
            transcript,
            kind,
            count: 1,
            tone: Tone::Professional,
            brand_voice: None,
            additional_context: None,
        }
    }
}

fn base_context(req: &PromptRequest<'_>) -> String {
    let brand = req
        .brand_voice
        .map(|v| format!("Brand Voice: {v}"))
        .unwrap_or_default();
    let extra = req
        .additional_context
        .map(|c| format!("Additional Context: {c}"))
        .unwrap_or_default();

    format!(
        "\nYou are an expert content marketer helping to repurpose long-form content into engaging social media posts and marketing materials.\n\n{brand}\n{extra}\nTone: {tone}\n\nHere is the transcript to work with:\n\n{transcript}\n",
        tone = req.tone.as_str(),
        transcript = req.transcript,
    )
}

/// Builds the user prompt for a generation request.
#[must_use]
pub fn build_prompt(req: &PromptRequest<'_>) -> String {
    let count = req.count.max(1);
    let plural = if count > 1 { "s" } else { "" };
    let marker = format!(
        "---{} {}---",
        req.kind.separator(),
        if count > 1 { "N" } else { "1" }
    );
    let context = base_context(req);

    let instructions = match req.kind {
        ContentKind::LinkedinPost => format!(
            "Create {count} engaging LinkedIn post{plural} based on the transcript. Each post should:\n\
             - Be 1-3 paragraphs (150-300 words)\n\
             - Start with a hook that grabs attention\n\
             - Include a clear value proposition or key insight\n\
             - Use line breaks for readability\n\
             - End with a question or call-to-action to drive engagement\n\
             - Be professional yet conversational\n\
             - Include 3-5 relevant hashtags\n\n\
             Format each post clearly separated with \"{marker}\" headers."
        ),
        ContentKind::TwitterThread => format!(
            "Create {count} Twitter thread{plural} based on the transcript. Each thread should:\n\
             - Have 5-8 tweets\n\
             - Start with an attention-grabbing first tweet with a hook\n\
             - Break down one key concept or insight per tweet\n\
             - Use numbered format (1/, 2/, etc.)\n\
             - Keep each tweet under 280 characters\n\
             - End with a CTA (like, retweet, comment)\n\
             - Include relevant emojis sparingly\n\
             - Add 2-3 hashtags in the final tweet only\n\n\
             Format each thread clearly with \"{marker}\" headers."
        ),
        ContentKind::InstagramCaption => format!(
            "Create {count} Instagram caption{plural} based on the transcript. Each caption should:\n\
             - Be 150-200 words\n\
             - Start with an attention-grabbing first line (no emojis)\n\
             - Use emojis strategically throughout for visual interest\n\
             - Include line breaks for easy reading\n\
             - Tell a story or share a key insight\n\
             - End with a clear call-to-action\n\
             - Include 15-20 relevant hashtags at the end\n\n\
             Format each caption clearly with \"{marker}\" headers."
        ),
        ContentKind::EmailNewsletter => format!(
            "Create {count} email newsletter{plural} based on the transcript. Each newsletter should:\n\
             - Have a compelling subject line\n\
             - Start with a personal greeting and hook\n\
             - Include 2-3 main sections with subheadings\n\
             - Be 400-600 words total\n\
             - Use bullet points for key takeaways\n\
             - Include a clear call-to-action\n\
             - End with a personal sign-off\n\n\
             Format each newsletter with \"{marker}\" headers. Include [SUBJECT: ...] at the top of each."
        ),
        ContentKind::BlogArticle => format!(
            "Create {count} blog article{plural} based on the transcript. Each article should:\n\
             - Have an SEO-friendly title (H1)\n\
             - Include an engaging introduction (2-3 paragraphs)\n\
             - Have 3-5 main sections with H2 subheadings\n\
             - Be 800-1200 words total\n\
             - Include bullet points and examples\n\
             - Have a clear conclusion with key takeaways\n\
             - End with a call-to-action\n\n\
             Format each article with \"{marker}\" headers."
        ),
        ContentKind::TiktokScript => format!(
            "Create {count} TikTok/Short-form video script{plural} based on the transcript. Each script should:\n\
             - Be 60-90 seconds when read aloud\n\
             - Start with a hook in the first 3 seconds\n\
             - Use simple, conversational language\n\
             - Include [VISUAL CUE] markers for what to show on screen\n\
             - Break into short, punchy segments\n\
             - End with a clear call-to-action\n\
             - Include suggested text overlays in [TEXT: ...]\n\n\
             Format each script with \"{marker}\" headers."
        ),
        ContentKind::QuoteCard => format!(
            "Extract {count} powerful, shareable quote{plural} from the transcript. Each quote should:\n\
             - Be 10-25 words (short and impactful)\n\
             - Stand alone without context\n\
             - Be inspirational, insightful, or thought-provoking\n\
             - Work well as a visual quote card\n\
             - Include suggested attribution if applicable\n\n\
             Format each quote with \"{marker}\" headers."
        ),
        ContentKind::Summary => {
            let (noun, each, header) = if count > 1 {
                ("summaries", "Each", " each summary")
            } else {
                ("summary", "The", "")
            };
            let marker = if count > 1 {
                "---SUMMARY N---"
            } else {
                "---SUMMARY---"
            };
            let headers = if count > 1 { "headers" } else { "header" };
            format!(
                "Create {count} {noun} of the transcript. {each} summary should include:\n\
                 - A 2-3 sentence overview\n\
                 - 5-7 key takeaways (bullet points)\n\
                 - Main topics covered\n\
                 - Important quotes or insights\n\
                 - Recommended audience for this content\n\n\
                 Format{header} with \"{marker}\" {headers}."
            )
        }
    };

    format!("{context}\n\n{instructions}")
}
