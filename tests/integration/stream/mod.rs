//! Streamed turn tests over `GET /v1/quiz/stream`

use axum::http::{header::CONTENT_TYPE, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use quizdesk_conversations::{ConversationStore, MessageRole, MAX_MESSAGE_LENGTH};
use quizdesk_llm::{MockLlmService, MockStep};

use crate::common::{
    body_text, get, parse_body, sse_envelopes, stream_uri, TestApp, OPENING_QUESTION,
};

mod test_successful_turn {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_first_message_streams_and_persists() {
        let app = TestApp::new(MockLlmService::with_fragments(&[
            "Welcome! ",
            OPENING_QUESTION,
        ]));
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let envelopes = sse_envelopes(&body_text(resp).await);
        assert_eq!(
            envelopes,
            vec![
                json!({"content": "", "connecting": true}),
                json!({"content": "Welcome! "}),
                json!({"content": OPENING_QUESTION}),
                json!({"done": true}),
            ]
        );

        let history = app.store.list_messages(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, format!("Welcome! {}", OPENING_QUESTION));
    }

    #[tokio::test]
    async fn test_new_conversation_prompt_flags_opening_question() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Hello!"]));
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        body_text(resp).await;

        let requests = app.llm.requests();
        assert_eq!(requests.len(), 1);
        let progress = &requests[0].system_prompts[1];
        assert!(progress.contains("The conversation is new"));
        assert!(progress.contains(OPENING_QUESTION));
    }

    #[tokio::test]
    async fn test_trigger_match_reaches_provider() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Noted."]));
        let id = app.conversation().await;

        let resp = app
            .router()
            .oneshot(get(&stream_uri(id, "I'm a total beginner")))
            .await
            .unwrap();
        body_text(resp).await;

        let requests = app.llm.requests();
        assert!(requests[0].system_prompts[1].contains("Great, let's start simple!"));
        assert_eq!(
            requests[0].messages.last().map(|m| m.content.as_str()),
            Some("I'm a total beginner")
        );
    }

    #[tokio::test]
    async fn test_trigger_match_is_case_insensitive() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Noted."]));
        let id = app.conversation().await;

        let resp = app
            .router()
            .oneshot(get(&stream_uri(id, "I really hate cold water")))
            .await
            .unwrap();
        body_text(resp).await;

        assert!(app.llm.requests()[0].system_prompts[1].contains("Wetsuits help a lot."));
    }

    #[tokio::test]
    async fn test_second_turn_sees_full_history() {
        let app = TestApp::new(MockLlmService::new());
        let id = app.conversation().await;

        for message in ["hi", "I swim twice a week"] {
            let resp = app
                .router()
                .oneshot(get(&stream_uri(id, message)))
                .await
                .unwrap();
            body_text(resp).await;
        }

        let requests = app.llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(app.store.list_messages(id).await.unwrap().len(), 4);
    }
}

mod test_failed_turn {
    use super::*;

    #[tokio::test]
    async fn test_provider_failure_mid_stream() {
        let app = TestApp::new(MockLlmService::scripted(vec![
            MockStep::text("Half a rep"),
            MockStep::Fail("connection reset by peer".to_string()),
        ]));
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_text(resp).await;
        assert!(!body.contains("connection reset"));
        let envelopes = sse_envelopes(&body);
        assert_eq!(
            envelopes.last(),
            Some(&json!({"error": "Failed to generate a response"}))
        );

        let history = app.store.list_messages(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_retry_after_failure_keeps_one_user_message_per_attempt() {
        let app = TestApp::new(MockLlmService::failing("provider down"));
        let id = app.conversation().await;

        for _ in 0..2 {
            let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
            let envelopes = sse_envelopes(&body_text(resp).await);
            assert_eq!(
                envelopes,
                vec![
                    json!({"content": "", "connecting": true}),
                    json!({"error": "Failed to generate a response"}),
                ]
            );
        }

        let history = app.store.list_messages(id).await.unwrap();
        assert!(history.iter().all(|m| m.role == MessageRole::User));
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_final_write_failure_reports_error() {
        let app = TestApp::new(MockLlmService::with_fragments(&["Hello!"]));
        app.store.fail_assistant_writes();
        let id = app.conversation().await;

        let resp = app.router().oneshot(get(&stream_uri(id, "hi"))).await.unwrap();
        let envelopes = sse_envelopes(&body_text(resp).await);

        assert_eq!(
            envelopes.last(),
            Some(&json!({"error": "Failed to generate a response"}))
        );
        assert_eq!(app.store.list_messages(id).await.unwrap().len(), 1);
    }
}

mod test_rejected_turn {
    use super::*;

    #[tokio::test]
    async fn test_missing_message_is_400() {
        let app = TestApp::new(MockLlmService::new());
        let id = app.conversation().await;

        let resp = app
            .router()
            .oneshot(get(&format!("/v1/quiz/stream?conversation_id={}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = parse_body(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(app.store.list_messages(id).await.unwrap().is_empty());
        assert!(app.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_conversation_id_is_400() {
        let app = TestApp::new(MockLlmService::new());

        let resp = app
            .router()
            .oneshot(get("/v1/quiz/stream?message=hi"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(app.llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_400() {
        let app = TestApp::new(MockLlmService::new());
        let id = app.conversation().await;

        let resp = app
            .router()
            .oneshot(get(&stream_uri(id, "   ")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(app.store.list_messages(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_message_is_400() {
        let app = TestApp::new(MockLlmService::new());
        let id = app.conversation().await;
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);

        let resp = app
            .router()
            .oneshot(get(&stream_uri(id, &long)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(app.store.list_messages(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_404() {
        let app = TestApp::new(MockLlmService::new());

        let resp = app
            .router()
            .oneshot(get(&stream_uri(Uuid::new_v4(), "hi")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(app.llm.requests().is_empty());
    }
}
