use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    // --- Generative Model Args ---
    /// API key for the generative language API.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    /// Model name for completions (e.g., gemini-1.5-flash).
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    /// Base URL for the generative language API.
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_base_url: String,

    /// Maximum number of output tokens for a chat completion.
    #[arg(long, env = "MAX_REPLY_TOKENS", default_value = "500")]
    pub max_reply_tokens: u32,

    // --- Speech Recognition Args ---
    /// API key for the speech recognition API. Falls back to the Gemini key when empty.
    #[arg(long, env = "SPEECH_API_KEY", default_value = "")]
    pub speech_api_key: String,

    /// Base URL for the speech recognition API.
    #[arg(long, env = "SPEECH_BASE_URL", default_value = "https://speech.googleapis.com")]
    pub speech_base_url: String,

    // --- Account Store Args ---
    /// Account store type (mongo, memory).
    #[arg(long, env = "ACCOUNT_STORE", default_value = "mongo")]
    pub account_store: String,

    /// MongoDB connection string for the account store.
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://127.0.0.1:27017")]
    pub mongo_uri: String,

    /// MongoDB database holding the user collection.
    #[arg(long, env = "MONGO_DATABASE", default_value = "tutor")]
    pub mongo_database: String,

    // --- Auth Args ---
    /// Secret used to sign auth tokens.
    #[arg(long, env = "JWT_SECRET", default_value = "")]
    pub jwt_secret: String,
}
