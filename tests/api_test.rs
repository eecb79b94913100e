use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use tutor_gateway::accounts::MemoryAccountStore;
use tutor_gateway::agent::{TutorAgent, INTERVIEW_FALLBACK_REPLY, UNINTELLIGIBLE_MESSAGE};
use tutor_gateway::auth::{TokenSigner, TOKEN_TTL_SECS};
use tutor_gateway::error::GatewayError;
use tutor_gateway::llm::{ContentPart, GenerativeModel};
use tutor_gateway::models::chat::{ChatRole, ChatTurn};
use tutor_gateway::server::api::{create_router, AppState};
use tutor_gateway::speech::SpeechRecognizer;

const TEST_SECRET: &str = "test-signing-secret";
const BOUNDARY: &str = "test-boundary";

#[derive(Clone, Debug)]
enum ModelCall {
    Generate(Vec<ContentPart>),
    Chat {
        history: Vec<ChatTurn>,
        message: String,
    },
}

struct MockModel {
    reply: String,
    fail: bool,
    calls: Mutex<Vec<ModelCall>>,
}

impl MockModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: String::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate(&self, parts: &[ContentPart]) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(ModelCall::Generate(parts.to_vec()));
        if self.fail {
            return Err(GatewayError::Upstream("mock outage".to_string()));
        }
        Ok(self.reply.clone())
    }

    async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(ModelCall::Chat {
            history: history.to_vec(),
            message: message.to_string(),
        });
        if self.fail {
            return Err(GatewayError::Upstream("mock outage".to_string()));
        }
        Ok(self.reply.clone())
    }
}

struct MockRecognizer {
    transcription: String,
}

impl MockRecognizer {
    fn hearing(transcription: &str) -> Arc<Self> {
        Arc::new(Self {
            transcription: transcription.to_string(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, GatewayError> {
        Ok(self.transcription.clone())
    }
}

fn test_app(model: Arc<MockModel>, recognizer: Arc<MockRecognizer>) -> Router {
    test_app_with_store(model, recognizer, Arc::new(MemoryAccountStore::new()))
}

fn test_app_with_store(
    model: Arc<MockModel>,
    recognizer: Arc<MockRecognizer>,
    store: Arc<MemoryAccountStore>,
) -> Router {
    let state = AppState {
        agent: Arc::new(TutorAgent::new(model, recognizer)),
        accounts: store,
        tokens: TokenSigner::new(TEST_SECRET),
    };
    create_router(state)
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
    .into_bytes()
}

fn file_part(name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        BOUNDARY, name, filename, content_type
    )
    .into_bytes();
    part.extend_from_slice(bytes);
    part.extend_from_slice(b"\r\n");
    part
}

fn close_form(mut body: Vec<u8>) -> Vec<u8> {
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let app = test_app(MockModel::replying("hi"), MockRecognizer::hearing(""));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_question_when_ask_then_forwards_exact_text_under_answer_key() {
    let model = MockModel::replying("Rust is a systems language.");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request("/ask", r#"{"question":"What is Rust?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["answer"], "Rust is a systems language.");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ModelCall::Generate(parts) => {
            assert_eq!(parts, &[ContentPart::Text("What is Rust?".to_string())]);
        }
        other => panic!("expected a generate call, got {:?}", other),
    }
}

#[tokio::test]
async fn given_no_question_when_ask_then_bad_request_without_model_call() {
    let model = MockModel::replying("unused");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let response = app.oneshot(json_request("/ask", r#"{}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn given_neither_question_nor_image_when_ask_with_image_then_bad_request() {
    let model = MockModel::replying("unused");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(multipart_request("/ask-with-image", close_form(Vec::new())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn given_question_and_image_when_ask_with_image_then_text_part_precedes_image() {
    let model = MockModel::replying("A cat.");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let image_bytes = vec![0x89u8, 0x50, 0x4e, 0x47];
    let mut body = text_part("question", "What is in the picture?");
    body.extend(file_part("image", "photo.png", "image/png", &image_bytes));

    let response = app
        .oneshot(multipart_request("/ask-with-image", close_form(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["answer"], "A cat.");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ModelCall::Generate(parts) => {
            assert_eq!(
                parts,
                &[
                    ContentPart::Text("What is in the picture?".to_string()),
                    ContentPart::Image {
                        mime_type: "image/png".to_string(),
                        data: image_bytes,
                    },
                ]
            );
        }
        other => panic!("expected a generate call, got {:?}", other),
    }
}

#[tokio::test]
async fn given_history_when_interview_then_replays_full_history_in_order() {
    let model = MockModel::replying("Great, tell me more.");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let body = r#"{
        "history": [
            {"role": "user", "text": "Tell me about yourself"},
            {"role": "model", "text": "I have five years of experience."}
        ],
        "message": "What are your strengths?"
    }"#;

    let response = app
        .oneshot(json_request("/api/interview", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["reply"], "Great, tell me more.");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ModelCall::Chat { history, message } => {
            assert_eq!(
                history,
                &[
                    ChatTurn {
                        role: ChatRole::User,
                        text: "Tell me about yourself".to_string(),
                    },
                    ChatTurn {
                        role: ChatRole::Model,
                        text: "I have five years of experience.".to_string(),
                    },
                ]
            );
            assert_eq!(message, "What are your strengths?");
        }
        other => panic!("expected a chat call, got {:?}", other),
    }
}

#[tokio::test]
async fn given_empty_message_when_interview_then_bad_request_without_model_call() {
    let model = MockModel::failing();
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request("/api/interview", r#"{"history": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn given_failing_model_when_interview_then_fallback_reply_with_ok_status() {
    let app = test_app(MockModel::failing(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request("/api/interview", r#"{"message": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["reply"], INTERVIEW_FALLBACK_REPLY);
}

#[tokio::test]
async fn given_failing_model_when_ask_then_internal_error_with_generic_body() {
    let app = test_app(MockModel::failing(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request("/ask", r#"{"question":"anything"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = response_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(!message.contains("mock outage"));
}

#[tokio::test]
async fn given_sentence_when_english_teacher_then_frame_wraps_the_sentence() {
    let model = MockModel::replying("Your sentence is correct!");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request(
            "/api/english-teacher",
            r#"{"message": "me goed to school"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["correction"], "Your sentence is correct!");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ModelCall::Chat { history, message } => {
            assert!(history.is_empty());
            assert!(message.contains("me goed to school"));
            assert!(message.contains("friendly English teacher"));
        }
        other => panic!("expected a chat call, got {:?}", other),
    }
}

#[tokio::test]
async fn given_empty_message_when_english_teacher_then_bad_request() {
    let app = test_app(MockModel::replying("unused"), MockRecognizer::hearing(""));

    let response = app
        .oneshot(json_request("/api/english-teacher", r#"{"message": ""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_unintelligible_audio_when_speech_then_fixed_message_and_no_model_call() {
    let model = MockModel::replying("unused");
    let app = test_app(model.clone(), MockRecognizer::hearing(""));

    let body = close_form(file_part("audio", "audio.webm", "audio/webm", b"opus"));
    let response = app
        .oneshot(multipart_request("/api/english-teacher-speech", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["correction"], UNINTELLIGIBLE_MESSAGE);
    assert!(json.get("transcription").is_none());
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn given_recognized_audio_when_speech_then_transcription_and_correction_returned() {
    let model = MockModel::replying("Nicely pronounced.");
    let app = test_app(model.clone(), MockRecognizer::hearing("Hello\nworld"));

    let body = close_form(file_part("audio", "audio.webm", "audio/webm", b"opus"));
    let response = app
        .oneshot(multipart_request("/api/english-teacher-speech", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["transcription"], "Hello\nworld");
    assert_eq!(json["correction"], "Nicely pronounced.");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ModelCall::Chat { message, .. } => assert!(message.contains("Hello\nworld")),
        other => panic!("expected a chat call, got {:?}", other),
    }
}

#[tokio::test]
async fn given_no_audio_field_when_speech_then_bad_request() {
    let app = test_app(MockModel::replying("unused"), MockRecognizer::hearing("hi"));

    let response = app
        .oneshot(multipart_request(
            "/api/english-teacher-speech",
            close_form(Vec::new()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_duplicate_email_when_register_then_user_exists_and_hash_is_not_plaintext() {
    use tutor_gateway::accounts::AccountStore;

    let store = Arc::new(MemoryAccountStore::new());
    let app = test_app_with_store(
        MockModel::replying("unused"),
        MockRecognizer::hearing(""),
        store.clone(),
    );

    let body = r#"{"email": "a@example.com", "password": "hunter2"}"#;
    let response = app
        .clone()
        .oneshot(json_request("/api/auth/register", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = store
        .find_by_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "hunter2");

    let response = app
        .oneshot(json_request("/api/auth/register", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "User already exists");
}

#[tokio::test]
async fn given_wrong_password_when_login_then_invalid_credentials() {
    let app = test_app(MockModel::replying("unused"), MockRecognizer::hearing(""));

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            r#"{"email": "b@example.com", "password": "correct-horse"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "/api/auth/login",
            r#"{"email": "b@example.com", "password": "battery-staple"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Invalid Credentials");
}

#[tokio::test]
async fn given_fresh_registration_when_login_then_token_verifies_for_an_hour() {
    use tutor_gateway::accounts::AccountStore;

    let store = Arc::new(MemoryAccountStore::new());
    let app = test_app_with_store(
        MockModel::replying("unused"),
        MockRecognizer::hearing(""),
        store.clone(),
    );

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            r#"{"email": "c@example.com", "password": "secret-pw"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "/api/auth/login",
            r#"{"email": "c@example.com", "password": "secret-pw"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    let token = json["token"].as_str().unwrap();

    let claims = TokenSigner::new(TEST_SECRET).verify(token).unwrap();
    let account = store.find_by_email("c@example.com").await.unwrap().unwrap();
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
}
