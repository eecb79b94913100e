pub mod google;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Converts recorded audio into text. An empty string is the distinguished
/// "could not understand" outcome, not an error; callers must not forward it
/// to the language model.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, GatewayError>;
}
