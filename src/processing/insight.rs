use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::assessment::Recommendation;
use crate::errors::AnnotationError;

/// Returned in place of an insight whenever generation fails.
pub const INSIGHTS_UNAVAILABLE: &str = "AI insights unavailable";
/// Characters of the assessment description included in the prompt.
pub const DESCRIPTION_PROMPT_CHARS: usize = 300;
pub const MAX_OUTPUT_TOKENS: u32 = 100;
pub const TEMPERATURE: f32 = 0.3;

/// External text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AnnotationError>;
}

/// Prompt asking for three short HR-oriented bullet points.
pub fn insight_prompt(description: &str) -> String {
    let description: String = description.chars().take(DESCRIPTION_PROMPT_CHARS).collect();
    format!(
        "As an HR expert, analyze this assessment and provide 3 concise bullet points (max 15 words each):\n\nDescription: {description}\n\nFormat as:\n• Key skill measured\n• Ideal candidate level\n• Best use case"
    )
}

/// Attaches generated rationales to recommendations.
///
/// Items are annotated one after another; latency grows linearly with the
/// number of recommendations.
pub struct InsightAnnotator<'a> {
    generator: Option<&'a dyn TextGenerator>,
}

impl<'a> InsightAnnotator<'a> {
    pub fn new(generator: Option<&'a dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Insight for a single description, never failing.
    ///
    /// Without a configured generator the insight is empty; a failed call
    /// yields [`INSIGHTS_UNAVAILABLE`].
    pub async fn insight(&self, description: &str) -> String {
        let Some(generator) = self.generator else {
            return String::new();
        };

        match generator.generate(&insight_prompt(description)).await {
            Ok(text) => text.trim().to_string(),
            Err(error) => {
                log::warn!("Insight generation failed: {error}");
                INSIGHTS_UNAVAILABLE.to_string()
            }
        }
    }

    pub async fn annotate(&self, recommendations: &mut [Recommendation]) {
        for recommendation in recommendations.iter_mut() {
            let insight = self.insight(&recommendation.record.description).await;
            recommendation.insight = Some(insight);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<String>();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AnnotationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            endpoint: format!(
                "{}/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AnnotationError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.trim())
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AnnotationError::Status { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.into_text().ok_or(AnnotationError::EmptyResponse)
    }
}
