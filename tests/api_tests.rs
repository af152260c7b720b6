mod common;

use common::{Behavior, FakeUpstream, filtered_chatbot};
use ergomatrix_backend::config::ServerConfig;
use ergomatrix_backend::error::ErrorKind;
use ergomatrix_backend::message::{ChatResponse, ErrorBody, StatusResponse};
use ergomatrix_backend::routes::create_router;
use ergomatrix_backend::services::chatbot::Chatbot;
use ergomatrix_backend::services::prompt::AssistantProfile;
use ergomatrix_backend::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(chatbot: Chatbot) -> Router {
    let state = Arc::new(AppState::new(chatbot));
    create_router(&ServerConfig::default()).with_state(state)
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = app(filtered_chatbot(FakeUpstream::replying("unused")));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let status: StatusResponse = json(response).await;
    assert!(status.ok);
    assert_eq!(status.message, "ErgoMatrix backend is running.");
}

#[tokio::test]
async fn test_invalid_input_never_reaches_upstream() {
    let upstream = FakeUpstream::replying("unused");
    let app = app(filtered_chatbot(upstream.clone()));

    for body in [
        r#"{}"#,
        r#"{"message": null}"#,
        r#"{"message": ""}"#,
        r#"{"message": 7}"#,
        r#"{"message": ["posture"]}"#,
        r#"{"msg": "posture"}"#,
        r#"not json at all"#,
        r#"[1, 2, 3]"#,
    ] {
        let response = app.clone().oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

        let error: ErrorBody = json(response).await;
        assert!(!error.ok);
        assert_eq!(error.error_type, ErrorKind::Input);
        assert_eq!(
            error.error_message,
            "Request JSON must include a 'message' string"
        );
    }

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_missing_content_type_is_input_error() {
    let upstream = FakeUpstream::replying("unused");
    let app = app(filtered_chatbot(upstream.clone()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(Body::from(r#"{"message": "posture"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorBody = json(response).await;
    assert_eq!(error.error_type, ErrorKind::Input);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_off_topic_gets_canned_refusal() {
    let upstream = FakeUpstream::replying("unused");
    let app = app(filtered_chatbot(upstream.clone()));

    let response = app
        .oneshot(chat_request(r#"{"message": "What is the capital of France?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat: ChatResponse = json(response).await;
    assert!(chat.ok);
    assert_eq!(chat.reply, AssistantProfile::ergomatrix().refusal);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_creator_question_gets_attribution() {
    let upstream = FakeUpstream::replying("unused");
    let app = app(filtered_chatbot(upstream.clone()));
    let attribution = AssistantProfile::ergomatrix().attribution;

    for message in ["who made you", "WHO MADE YOU?", "So... Who Made You, really?"] {
        let body = serde_json::json!({ "message": message }).to_string();
        let response = app.clone().oneshot(chat_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let chat: ChatResponse = json(response).await;
        assert_eq!(chat.reply, attribution);
    }

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_upstream_reply_is_returned() {
    let upstream = FakeUpstream::replying("Sit up straight.");
    let app = app(filtered_chatbot(upstream.clone()));

    let response = app
        .oneshot(chat_request(r#"{"message": "  How do I fix my posture?  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat: ChatResponse = json(response).await;
    assert!(chat.ok);
    assert_eq!(chat.reply, "Sit up straight.");
    assert_eq!(upstream.calls(), 1);
    assert_eq!(
        upstream.last_user_message().as_deref(),
        Some("  How do I fix my posture?  ")
    );
}

#[tokio::test]
async fn test_whitespace_message_is_forwarded() {
    let upstream = FakeUpstream::replying("How can I help with your posture?");
    let app = app(Chatbot::new(upstream.clone(), AssistantProfile::ergomatrix()));

    let response = app
        .oneshot(chat_request(r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat: ChatResponse = json(response).await;
    assert_eq!(chat.reply, "How can I help with your posture?");
    assert_eq!(upstream.calls(), 1);
    assert_eq!(upstream.last_user_message().as_deref(), Some("   "));
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let upstream = FakeUpstream::replying("Take a micro-break every 30 minutes.");
    let app = app(filtered_chatbot(upstream.clone()));
    let body = r#"{"message": "How often should I take a break from my desk?"}"#;

    let first: ChatResponse = json(app.clone().oneshot(chat_request(body)).await.unwrap()).await;
    let second: ChatResponse = json(app.oneshot(chat_request(body)).await.unwrap()).await;

    assert_eq!(first.reply, second.reply);
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_upstream_status_is_mirrored() {
    let upstream = FakeUpstream::new(Behavior::HttpError {
        status: 429,
        message: "Rate limit exceeded".to_string(),
    });
    let app = app(filtered_chatbot(upstream));

    let response = app
        .oneshot(chat_request(r#"{"message": "best chair height?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let error: ErrorBody = json(response).await;
    assert!(!error.ok);
    assert_eq!(error.error_type, ErrorKind::UpstreamHttp);
    assert_eq!(error.error_message, "Rate limit exceeded");
    assert_eq!(error.status, Some(429));
    assert_eq!(error.status_text.as_deref(), Some("Too Many Requests"));
}

#[tokio::test]
async fn test_parse_failure_is_500() {
    let upstream = FakeUpstream::new(Behavior::Parse("<html>oops</html>".to_string()));
    let app = app(filtered_chatbot(upstream));

    let response = app
        .oneshot(chat_request(r#"{"message": "monitor distance?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = json(response).await;
    assert_eq!(error.error_type, ErrorKind::Parse);
    assert!(!error.error_message.contains("<html>"));
}

#[tokio::test]
async fn test_configurable_chat_path() {
    let upstream = FakeUpstream::replying("Lower your monitor.");
    let state = Arc::new(AppState::new(filtered_chatbot(upstream)));
    let config = ServerConfig {
        chat_path: "/api/ergo-chat".to_string(),
        ..Default::default()
    };
    let app = create_router(&config).with_state(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/ergo-chat")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"message": "monitor height"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(chat_request(r#"{"message": "monitor height"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(filtered_chatbot(FakeUpstream::replying("unused")));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
