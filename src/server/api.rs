use std::error::Error;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::accounts::AccountStore;
use crate::agent::TutorAgent;
use crate::auth::{self, TokenSigner};
use crate::error::GatewayError;
use crate::llm::ImageInput;
use crate::models::api::{
    AskRequest, ChatReply, CredentialsRequest, InterviewRequest, ReplyField, TeacherRequest,
    TokenResponse,
};
use crate::models::user::UserAccount;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<TutorAgent>,
    pub accounts: Arc<dyn AccountStore>,
    pub tokens: TokenSigner,
}

pub fn create_router(state: AppState) -> Router {
    // The browser client posts cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .route("/ask-with-image", post(ask_with_image_handler))
        .route("/api/interview", post(interview_handler))
        .route("/api/english-teacher", post(teacher_handler))
        .route("/api/english-teacher-speech", post(teacher_speech_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on: http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ChatReply>, GatewayError> {
    let answer = state.agent.ask(request.question.as_deref(), None).await?;
    Ok(Json(ChatReply::new(ReplyField::Answer, answer)))
}

async fn ask_with_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatReply>, GatewayError> {
    let mut question: Option<String> = None;
    let mut image: Option<ImageInput> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| GatewayError::MissingInput)?
    {
        match field.name() {
            Some("question") => {
                let text = field.text().await.map_err(|_| GatewayError::MissingInput)?;
                if !text.is_empty() {
                    question = Some(text);
                }
            }
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(|_| GatewayError::MissingInput)?;
                if !bytes.is_empty() {
                    image = Some(ImageInput {
                        mime_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let answer = state.agent.ask(question.as_deref(), image).await?;
    Ok(Json(ChatReply::new(ReplyField::Answer, answer)))
}

async fn interview_handler(
    State(state): State<AppState>,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<ChatReply>, GatewayError> {
    info!(
        "Interview turn: history_len={} message_len={}",
        request.history.len(),
        request.message.len()
    );
    let reply = state
        .agent
        .interview(&request.history, &request.message)
        .await?;
    Ok(Json(ChatReply::new(ReplyField::Reply, reply)))
}

async fn teacher_handler(
    State(state): State<AppState>,
    Json(request): Json<TeacherRequest>,
) -> Result<Json<ChatReply>, GatewayError> {
    let correction = state.agent.correct_text(&request.message).await?;
    Ok(Json(ChatReply::new(ReplyField::Correction, correction)))
}

async fn teacher_speech_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatReply>, GatewayError> {
    let mut audio: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| GatewayError::MissingInput)?
    {
        if field.name() == Some("audio") {
            let bytes = field.bytes().await.map_err(|_| GatewayError::MissingInput)?;
            audio = Some(bytes.to_vec());
        }
    }
    let audio = audio.ok_or(GatewayError::MissingInput)?;

    let feedback = state.agent.correct_speech(&audio).await?;
    let mut reply = ChatReply::new(ReplyField::Correction, feedback.correction);
    if let Some(transcription) = feedback.transcription {
        reply = reply.with_transcription(transcription);
    }
    Ok(Json(reply))
}

async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, GatewayError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(GatewayError::MissingInput);
    }
    if state
        .accounts
        .find_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(GatewayError::UserExists);
    }

    let password_hash = auth::hash_password(&request.password)?;
    let account = UserAccount::new(request.email, password_hash);
    state.accounts.insert(&account).await?;
    info!("Registered account {}", account.id);

    let token = state.tokens.issue(&account.id)?;
    Ok(Json(TokenResponse { token }))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, GatewayError> {
    let account = state
        .accounts
        .find_by_email(&request.email)
        .await?
        .ok_or(GatewayError::InvalidCredentials)?;
    if !auth::verify_password(&request.password, &account.password_hash) {
        return Err(GatewayError::InvalidCredentials);
    }

    let token = state.tokens.issue(&account.id)?;
    Ok(Json(TokenResponse { token }))
}
