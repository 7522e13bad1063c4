use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assistant::{
    Assistant, ChatTurn, Speaker, CHAT_FALLBACK, CHAT_SYSTEM_INSTRUCTION, DESCRIBE_FALLBACK,
    DISABLED_NOTICE,
};
use crate::error::AppError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(Blob<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: &'a str,
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn speaker_role(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "user",
        Speaker::Model => "model",
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GeminiAssistant {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        if api_key.is_none() {
            warn!("no Gemini API key configured; assistant features are disabled");
        }

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
        })
    }

    async fn generate(
        &self,
        request: &GenerateRequest<'_>,
        fallback: &str,
    ) -> Result<String, AppError> {
        let Some(api_key) = &self.api_key else {
            return Err(AppError::ExternalServiceUnavailable(DISABLED_NOTICE.to_string()));
        };
        let unavailable = || AppError::ExternalServiceUnavailable(fallback.to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                warn!(error = %err, "assistant request failed");
                unavailable()
            })?;

        let body: GenerateResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "assistant returned an unreadable body");
            unavailable()
        })?;

        body.text().ok_or_else(|| {
            debug!("assistant returned no text");
            unavailable()
        })
    }
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn describe_item(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, AppError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData(Blob {
                        mime_type,
                        data: image_base64,
                    }),
                    Part::Text(prompt),
                ],
            }],
            system_instruction: None,
        };

        self.generate(&request, DESCRIBE_FALLBACK).await
    }

    async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<String, AppError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content {
                role: Some(speaker_role(turn.role)),
                parts: vec![Part::Text(&turn.text)],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part::Text(message)],
        });

        let request = GenerateRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text(CHAT_SYSTEM_INSTRUCTION)],
            }),
        };

        self.generate(&request, CHAT_FALLBACK).await
    }
}
