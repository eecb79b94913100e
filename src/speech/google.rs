use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::info;
use serde::{Deserialize, Serialize};

use super::SpeechRecognizer;
use crate::cli::Args;
use crate::error::GatewayError;

// The browser recorder produces Opus in a WebM container at 48 kHz; the
// recognizer config must match that triple exactly.
const AUDIO_ENCODING: &str = "WEBM_OPUS";
const SAMPLE_RATE_HERTZ: u32 = 48_000;
const LANGUAGE_CODE: &str = "en-US";

#[derive(Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'static str,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

/// Takes the top-ranked alternative of each segment and joins them with
/// newlines, preserving the order the service returned.
fn collapse_results(results: &[SpeechResult]) -> String {
    results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct GoogleSpeechClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleSpeechClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        let api_key = if args.speech_api_key.is_empty() {
            args.gemini_api_key.clone()
        } else {
            args.speech_api_key.clone()
        };
        Self::new(api_key, args.speech_base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/speech:recognize?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        )
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, GatewayError> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: AUDIO_ENCODING,
                sample_rate_hertz: SAMPLE_RATE_HERTZ,
                language_code: LANGUAGE_CODE,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio),
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transcription(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GatewayError::Transcription(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transcription(format!("parse response: {}", e)))?;

        info!(
            "Speech recognition returned {} segment(s)",
            parsed.results.len()
        );
        Ok(collapse_results(&parsed.results))
    }
}
