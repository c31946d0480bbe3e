use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::narrative::NarrativeRequest;
use crate::models::settings::NarrativeSettings;
use super::traits::NarrativeProvider;

const PROVIDER_NAME: &str = "Gemini";

/// Google generative-language API provider.
///
/// - **Endpoint**: `POST {base_url}/models/{model}:generateContent`
/// - **Auth**: API key in the `x-goog-api-key` header (never in the URL)
/// - **Grounding**: optional `google_search` tool for web-grounded answers
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = match timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            None => builder,
        };
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from settings; `None` when no API key is configured.
    pub fn from_settings(settings: &NarrativeSettings) -> Option<Self> {
        let key = settings.api_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(
            key,
            settings.model.clone(),
            settings.base_url.clone(),
            settings.timeout_secs,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

// ── Gemini API request/response types ───────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

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
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    text: Option<String>,
}

/// Build the JSON body for a request. Exposed for tests.
pub fn request_body(request: &NarrativeRequest) -> Result<serde_json::Value, CoreError> {
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![PartIn {
                text: &request.prompt,
            }],
        }],
        tools: if request.grounded {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        },
    };
    serde_json::to_value(&body)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize Gemini request: {e}")))
}

/// Concatenate the text parts of the first candidate. Exposed for tests.
pub fn parse_response(json: &str) -> Result<String, CoreError> {
    let resp: GenerateResponse = serde_json::from_str(json).map_err(|e| CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message: format!("Failed to parse response: {e}"),
    })?;

    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: "Response contained no text".into(),
        });
    }
    Ok(text)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl NarrativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<String, CoreError> {
        let body = request_body(request)?;

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("HTTP {status}: {}", text.chars().take(200).collect::<String>()),
            });
        }

        parse_response(&text)
    }
}
