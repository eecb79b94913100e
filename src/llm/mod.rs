pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::GatewayError;
use crate::models::chat::ChatTurn;

/// One unit of multi-modal input for the generative model.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

/// Raw image upload as received from the client. The mime type is passed
/// through verbatim; bytes are base64-encoded only at the wire layer.
#[derive(Clone, Debug)]
pub struct ImageInput {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Builds the ordered content-part sequence for one request. The model
/// consumes parts positionally, so the text part always precedes the image.
/// Fails with `MissingInput` before any external call when both inputs are
/// absent; an empty question string counts as absent.
pub fn build_parts(
    question: Option<&str>,
    image: Option<ImageInput>,
) -> Result<Vec<ContentPart>, GatewayError> {
    let question = question.filter(|q| !q.is_empty());
    if question.is_none() && image.is_none() {
        return Err(GatewayError::MissingInput);
    }

    let mut parts = Vec::new();
    if let Some(text) = question {
        parts.push(ContentPart::Text(text.to_string()));
    }
    if let Some(image) = image {
        parts.push(ContentPart::Image {
            mime_type: image.mime_type,
            data: image.bytes,
        });
    }
    Ok(parts)
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Single completion for a one-shot, possibly multi-modal request.
    async fn generate(&self, parts: &[ContentPart]) -> Result<String, GatewayError>;

    /// Replays `history` in order, appends `message` as the newest user turn
    /// and returns one completion capped at the configured output length.
    /// The history is forwarded verbatim: turns are not reordered,
    /// deduplicated, or repaired.
    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, GatewayError>;
}

pub fn new_client(args: &Args) -> Arc<dyn GenerativeModel> {
    Arc::new(gemini::GeminiClient::from_args(args))
}
