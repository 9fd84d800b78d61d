use std::time::Duration;

use intellibot::services::agent_service::{
    AgentEndpoint, AgentService, ConversationAgent, FALLBACK_REPLY,
};
use intellibot::services::auth_service::{AuthService, ClientCredentials};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_agent(server: &MockServer) -> AgentService {
    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "agents-token",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(server)
        .await;

    let client = Client::new();
    let auth = AuthService::new(
        client.clone(),
        server.uri(),
        ClientCredentials {
            tenant_id: "tenant".into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
        },
    );
    AgentService::new(
        client,
        AgentEndpoint::with_base_url(server.uri()),
        auth,
        "asst_1".into(),
        "thread_1".into(),
    )
    .with_poll_interval(Duration::from_millis(5))
}

async fn mount_message_post(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .and(query_param("api-version", "2024-12-01-preview"))
        .and(header("authorization", "Bearer agents-token"))
        .and(body_partial_json(json!({"role": "user", "content": "Schedule Asha"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1"})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn reply_posts_message_polls_run_and_returns_assistant_text() {
    let server = MockServer::start().await;
    let agent = setup_agent(&server).await;
    mount_message_post(&server).await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .and(body_partial_json(json!({"assistant_id": "asst_1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "run_1", "status": "queued"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "run_1", "status": "in_progress"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "run_1", "status": "completed"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"role": "assistant", "run_id": "run_1", "content": [{"type": "text", "text": {"value": "Which date works?"}}]},
                {"role": "user", "content": [{"type": "text", "text": {"value": "Schedule Asha"}}]},
                {"role": "assistant", "run_id": "run_0", "content": [{"type": "text", "text": {"value": "Hello!"}}]}
            ]
        })))
        .mount(&server)
        .await;

    let reply = agent.reply("Schedule Asha").await.unwrap();
    assert_eq!(reply, "Which date works?");
}

#[tokio::test]
async fn reply_without_assistant_text_uses_fallback() {
    let server = MockServer::start().await;
    let agent = setup_agent(&server).await;
    mount_message_post(&server).await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_2",
                "status": "failed",
                "last_error": {"code": "rate_limit_exceeded"}
            })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"role": "user", "content": [{"type": "text", "text": {"value": "Schedule Asha"}}]}]
        })))
        .mount(&server)
        .await;

    let reply = agent.reply("Schedule Asha").await.unwrap();
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn connect_fails_when_thread_is_missing() {
    let server = MockServer::start().await;
    let agent = setup_agent(&server).await;

    Mock::given(method("GET"))
        .and(path("/assistants/asst_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "asst_1", "name": "Intellibot"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("thread not found"))
        .mount(&server)
        .await;

    let err = agent.connect().await.unwrap_err();
    assert_eq!(err.to_string(), "Agent service error 404: thread not found");
}

#[tokio::test]
async fn failed_run_never_replays_the_previous_confirmation() {
    let server = MockServer::start().await;
    let agent = setup_agent(&server).await;
    mount_message_post(&server).await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_2",
            "status": "failed",
            "last_error": {"code": "server_error"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"role": "user", "content": [{"type": "text", "text": {"value": "Schedule Asha"}}]},
                {"role": "assistant", "run_id": "run_1", "content": [{"type": "text", "text": {
                    "value": "✅ Interview scheduled for Asha (asha@mail.com & ravi@corp.com) on 2025-07-05 at 10:30 AM"
                }}]}
            ]
        })))
        .mount(&server)
        .await;

    let reply = agent.reply("Schedule Asha").await.unwrap();
    assert_eq!(reply, FALLBACK_REPLY);
}
