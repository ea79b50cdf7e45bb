//! Hosted assessment engine backed by the Gemini `generateContent` API.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Assessment, AssessmentEngine, AssessmentError, parse_assessment};
use crate::utils::{ASSESSMENT_TIMEOUT_SECS, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};

const AUDIT_PROMPT: &str = r#"
You are an expert UX/UI auditor. Analyze this webpage screenshot for a professional design audit.

Evaluate the design based on these specific dimensions:
1. Usability (Ease of use, interaction patterns)
2. Navigation (Menu structure, wayfinding)
3. Clarity (Readability, content hierarchy, value proposition)
4. Accessibility (Contrast, text size, spacing - WCAG compliance)
5. Aesthetics (Visual polish, modern feel, consistency)

For every issue you identify, return a JSON object with:
- title: Short punchy title
- description: Clear explanation of the issue
- severity: Critical | High | Medium | Low
- category: Usability | Navigation | Clarity | Accessibility | Aesthetics
- ai_suggestion: One concrete remediation step

Score each dimension from 0 to 100.

Return the result as valid JSON:
{
  "issues": [
    {
      "title": "...",
      "description": "...",
      "severity": "High",
      "category": "Usability",
      "ai_suggestion": "..."
    }
  ],
  "summary": "A 2-3 sentence executive summary of the page's UX.",
  "positive_highlights": ["List of 2-3 things done well"],
  "scores": {"usability": 0, "navigation": 0, "clarity": 0, "accessibility": 0, "aesthetics": 0}
}

Return ONLY valid JSON. Do not include markdown or explanations.
"#;

/// Connection settings for [`GeminiEngine`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    /// Model resource name, e.g. `models/gemini-2.5-flash`
    pub model: String,
    /// Base endpoint without trailing slash
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(ASSESSMENT_TIMEOUT_SECS),
        }
    }
}

impl GeminiConfig {
    /// Read `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_ENDPOINT`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            endpoint: std::env::var("GEMINI_ENDPOINT").unwrap_or(defaults.endpoint),
            request_timeout: defaults.request_timeout,
        }
    }

    fn generate_url(&self) -> String {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!(
            "{}/v1beta/{model}:generateContent",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Assessment engine that asks a Gemini model to audit the snapshot
#[derive(Debug, Clone)]
pub struct GeminiEngine {
    client: Client,
    config: GeminiConfig,
}

impl GeminiEngine {
    pub fn new(config: GeminiConfig) -> Result<Self, AssessmentError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl AssessmentEngine for GeminiEngine {
    async fn analyze(&self, snapshot_png: &[u8]) -> Result<Assessment, AssessmentError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AssessmentError::MissingCredentials("GEMINI_API_KEY is not set".into()))?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [
                    Part::Text(AUDIT_PROMPT),
                    Part::InlineData(InlineData {
                        mime_type: "image/png",
                        data: BASE64.encode(snapshot_png),
                    }),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        info!(target: "ux_audit::assessment", "Submitting {} byte snapshot to {}", snapshot_png.len(), self.config.model);

        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssessmentError::Engine {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssessmentError::Malformed(format!("unexpected envelope: {e}")))?;

        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AssessmentError::Malformed("response has no text part".into()));
        }

        debug!(target: "ux_audit::assessment", "Engine returned {} chars", text.len());
        parse_assessment(&text)
    }
}
