use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::info;
use serde::{Deserialize, Serialize};

use super::{ContentPart, GenerativeModel};
use crate::cli::Args;
use crate::error::GatewayError;
use crate::models::chat::ChatTurn;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn wire_part(part: &ContentPart) -> GeminiPart {
    match part {
        ContentPart::Text(text) => GeminiPart::Text { text: text.clone() },
        ContentPart::Image { mime_type, data } => GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.clone(),
                data: BASE64.encode(data),
            },
        },
    }
}

fn extract_text(response: &GenerateResponse) -> String {
    response
        .candidates
        .first()
        .map(|candidate| {
            candidate
                .content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_reply_tokens: u32,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        max_reply_tokens: u32,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url,
            max_reply_tokens,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new(
            args.gemini_api_key.clone(),
            args.gemini_model.clone(),
            args.gemini_base_url.clone(),
            args.max_reply_tokens,
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    async fn generate_content(&self, request: &GenerateRequest) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GatewayError::Upstream(format!("status {}: {}", status, body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("parse response: {}", e)))?;

        Ok(extract_text(&parsed))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, parts: &[ContentPart]) -> Result<String, GatewayError> {
        info!(
            "GeminiClient::generate() → model={} parts={}",
            self.model,
            parts.len()
        );
        let request = GenerateRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: parts.iter().map(wire_part).collect(),
            }],
            generation_config: None,
        };
        self.generate_content(&request).await
    }

    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, GatewayError> {
        info!(
            "GeminiClient::chat() → model={} history_len={}",
            self.model,
            history.len()
        );
        // The service is stateless across calls; the whole history rides
        // along on every turn.
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.as_str(),
                parts: vec![GeminiPart::Text {
                    text: turn.text.clone(),
                }],
            })
            .collect();
        contents.push(GeminiContent {
            role: "user",
            parts: vec![GeminiPart::Text {
                text: message.to_string(),
            }],
        });

        let request = GenerateRequest {
            contents,
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.max_reply_tokens,
            }),
        };
        self.generate_content(&request).await
    }
}
