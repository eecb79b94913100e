use std::sync::Arc;

use log::{error, info};

use crate::cli::Args;
use crate::config::prompt;
use crate::error::GatewayError;
use crate::llm::{self, GenerativeModel, ImageInput};
use crate::models::chat::ChatTurn;
use crate::speech::google::GoogleSpeechClient;
use crate::speech::SpeechRecognizer;

/// Reply used when the model call fails mid-interview. The failure is folded
/// into the dialogue as a normal model turn instead of breaking the chat UI
/// with a 5xx.
pub const INTERVIEW_FALLBACK_REPLY: &str =
    "Sorry, I ran into a problem answering that. Could you repeat your last answer?";

/// Fixed correction returned when the recognizer produced no segments.
pub const UNINTELLIGIBLE_MESSAGE: &str =
    "I couldn't understand what you said. Please try again.";

/// Outcome of the speech-correction flow. `transcription` is absent when the
/// audio was unintelligible.
pub struct SpeechFeedback {
    pub transcription: Option<String>,
    pub correction: String,
}

/// Per-request orchestrator. Holds the outbound service handles; everything
/// else lives only for the duration of one HTTP call.
pub struct TutorAgent {
    model: Arc<dyn GenerativeModel>,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl TutorAgent {
    pub fn new(model: Arc<dyn GenerativeModel>, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { model, recognizer }
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new(
            llm::new_client(args),
            Arc::new(GoogleSpeechClient::from_args(args)),
        )
    }

    /// One-shot question answering, optionally with an attached image.
    pub async fn ask(
        &self,
        question: Option<&str>,
        image: Option<ImageInput>,
    ) -> Result<String, GatewayError> {
        let parts = llm::build_parts(question, image)?;
        self.model.generate(&parts).await
    }

    /// Continues a client-replayed interview conversation. An upstream
    /// failure becomes the fixed fallback reply; only the empty-message check
    /// can reject the turn.
    pub async fn interview(
        &self,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, GatewayError> {
        if message.is_empty() {
            return Err(GatewayError::MessageRequired);
        }
        match self.model.chat(history, message).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                error!("Interview completion failed, folding into dialogue: {}", e);
                Ok(INTERVIEW_FALLBACK_REPLY.to_string())
            }
        }
    }

    /// Grammar correction for a typed sentence.
    pub async fn correct_text(&self, message: &str) -> Result<String, GatewayError> {
        if message.is_empty() {
            return Err(GatewayError::MessageRequired);
        }
        let full_message = prompt::correction_prompt(message);
        self.model.chat(&[], &full_message).await
    }

    /// Transcribes recorded audio, then asks the model for feedback. An empty
    /// transcription short-circuits with the fixed "couldn't understand"
    /// correction and no model call.
    pub async fn correct_speech(&self, audio: &[u8]) -> Result<SpeechFeedback, GatewayError> {
        let transcription = self.recognizer.transcribe(audio).await?;
        if transcription.is_empty() {
            info!("Recognizer returned no segments, skipping model call");
            return Ok(SpeechFeedback {
                transcription: None,
                correction: UNINTELLIGIBLE_MESSAGE.to_string(),
            });
        }

        let full_message = prompt::speech_feedback_prompt(&transcription);
        let correction = self.model.chat(&[], &full_message).await?;
        Ok(SpeechFeedback {
            transcription: Some(transcription),
            correction,
        })
    }
}
