//! Session, history and progress endpoint tests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use quizdesk_conversations::ConversationStore;
use quizdesk_llm::MockLlmService;

use crate::common::{
    body_text, get, parse_body, stream_uri, TestApp, LEVEL_QUESTION, OPENING_QUESTION,
};

fn post_json(uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder().method(Method::POST).uri(uri);
    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(MockLlmService::new());
    let resp = app.router().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "OK");
}

mod test_create_conversation {
    use super::*;

    #[tokio::test]
    async fn test_create_anonymous_conversation_returns_201() {
        let app = TestApp::new(MockLlmService::new());

        let resp = app
            .router()
            .oneshot(post_json("/v1/quiz/conversations", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert!(body["user_id"].is_null());
        assert!(body["last_message_at"].is_null());

        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        assert!(app.store.find_conversation(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_conversation_for_user() {
        let app = TestApp::new(MockLlmService::new());
        let user_id = Uuid::new_v4();

        let resp = app
            .router()
            .oneshot(post_json(
                "/v1/quiz/conversations",
                Some(json!({ "user_id": user_id })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(parse_body(resp).await["user_id"], json!(user_id));
    }

    #[tokio::test]
    async fn test_created_conversation_accepts_turns() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Hello!"]));

        let resp = app
            .router()
            .oneshot(post_json("/v1/quiz/conversations", None))
            .await
            .unwrap();
        let id: Uuid = parse_body(resp).await["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_text(resp).await;

        let conv = app.store.find_conversation(id).await.unwrap().unwrap();
        assert!(conv.last_message_at.is_some());
    }
}

mod test_list_messages {
    use super::*;

    #[tokio::test]
    async fn test_messages_in_order() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Hello!"]));
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        body_text(resp).await;

        let resp = app
            .router()
            .oneshot(get(&format!("/v1/quiz/conversations/{}/messages", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        let messages = body.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["sequence"], 1);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Hello!");
        assert_eq!(messages[1]["sequence"], 2);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_404() {
        let app = TestApp::new(MockLlmService::new());
        let resp = app
            .router()
            .oneshot(get(&format!(
                "/v1/quiz/conversations/{}/messages",
                Uuid::new_v4()
            )))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_progress {
    use super::*;

    #[tokio::test]
    async fn test_fresh_conversation_points_at_opening_question() {
        let app = TestApp::new(MockLlmService::new());
        let id = app.conversation().await;

        let resp = app
            .router()
            .oneshot(get(&format!("/v1/quiz/conversations/{}/progress", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        assert_eq!(body["asked"], json!([]));
        assert_eq!(body["remaining"].as_array().unwrap().len(), 3);
        assert_eq!(body["next_question"]["text"], OPENING_QUESTION);
        assert_eq!(body["message_count"], 0);
    }

    #[tokio::test]
    async fn test_asked_question_moves_out_of_remaining() {
        let app = TestApp::new(MockLlmService::with_fragments(&[
            "Welcome aboard. ",
            OPENING_QUESTION,
        ]));
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        body_text(resp).await;

        let resp = app
            .router()
            .oneshot(get(&format!("/v1/quiz/conversations/{}/progress", id)))
            .await
            .unwrap();
        let body = parse_body(resp).await;

        assert_eq!(body["asked"][0]["text"], OPENING_QUESTION);
        assert_eq!(body["remaining"].as_array().unwrap().len(), 2);
        assert_eq!(body["next_question"]["text"], LEVEL_QUESTION);
        assert_eq!(body["first_user_message"], "hi");
    }
}
