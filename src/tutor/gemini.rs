use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{CompletionBackend, CompletionError};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Google's `generateContent` REST API.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiBackend {
    pub fn new(
        api_key: Option<String>,
        endpoint: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingCredential)?;

        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;
        debug!("Gemini answered with status {}", status);
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Backend(e.to_string()))?;
        extract_text(parsed)
    }
}

fn classify_status(status: StatusCode, body: &str) -> CompletionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CompletionError::QuotaExceeded(body.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::MissingCredential,
        // An unknown key comes back as a plain bad request.
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => {
            CompletionError::MissingCredential
        }
        _ => CompletionError::Backend(format!("{}: {}", status, body)),
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, CompletionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CompletionError::Blocked(reason));
    }
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(CompletionError::EmptyResponse)?;

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .filter(|t| !t.trim().is_empty());
    match (text, candidate.finish_reason.as_deref()) {
        (Some(text), _) => Ok(text),
        (None, Some("SAFETY")) => Err(CompletionError::Blocked("SAFETY".to_string())),
        (None, _) => Err(CompletionError::EmptyResponse),
    }
}
