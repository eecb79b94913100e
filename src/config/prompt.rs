//! Fixed prompt frames. The destination is a natural-language prompt, so the
//! user text is interpolated literally with no escaping.

const CORRECTION_FRAME: &str = "You are a friendly English teacher AI. When the user provides a sentence, correct their English grammar, spelling, punctuation, and sentence structure. If the sentence is already perfect, tell them it's correct. Always explain what was wrong in simple words if you corrected anything. Greet the user warmly and ask how they are doing when the conversation starts.\n\nUser's sentence: {sentence}";

const SPEECH_FEEDBACK_FRAME: &str = "You are a friendly English teacher AI. The user has spoken the following sentence: \"{sentence}\".\nPlease provide grammar correction, spelling correction, and feedback on pronunciation (if you can infer potential pronunciation issues from the transcription, e.g., common misspellings that indicate mispronunciation).\nIf the sentence is grammatically correct and well-pronounced, tell them it's perfect.\nAlways explain any corrections or suggestions clearly and concisely.";

/// Wraps a typed sentence in the correction-teacher frame.
pub fn correction_prompt(sentence: &str) -> String {
    CORRECTION_FRAME.replace("{sentence}", sentence)
}

/// Wraps a transcribed sentence in the pronunciation-feedback frame. Used
/// identically for transcriber output as `correction_prompt` is for typed
/// input.
pub fn speech_feedback_prompt(sentence: &str) -> String {
    SPEECH_FEEDBACK_FRAME.replace("{sentence}", sentence)
}
