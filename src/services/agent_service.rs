use crate::error::{Error, Result};
use crate::services::auth_service::AuthService;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

pub const API_VERSION: &str = "2024-12-01-preview";
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can turn a user message into the agent's next reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationAgent: Send + Sync {
    async fn reply(&self, user_text: &str) -> Result<String>;
}

/// Base URL of a hosted agents project, derived from its connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    base_url: String,
}

impl AgentEndpoint {
    /// Parses `host;subscription_id;resource_group;project_name`.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let parts: Vec<&str> = conn_str.split(';').map(str::trim).collect();
        let [host, subscription, resource_group, project] = parts.as_slice() else {
            return Err(Error::Config(
                "AZURE_CONN_STR must look like host;subscription_id;resource_group;project_name"
                    .to_string(),
            ));
        };
        if [host, subscription, resource_group, project]
            .iter()
            .any(|p| p.is_empty())
        {
            return Err(Error::Config(
                "AZURE_CONN_STR has an empty segment".to_string(),
            ));
        }

        let host = host
            .trim_start_matches("https://")
            .trim_end_matches('/');
        let base_url = format!(
            "https://{}/agents/v1.0/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            host, subscription, resource_group, project
        );
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid agent endpoint {}: {}", base_url, e)))?;

        Ok(Self { base_url })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| Error::Config(format!("Invalid agent URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", API_VERSION);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct Identified {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunStatus {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    run_id: Option<String>,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

fn is_pending(status: &str) -> bool {
    matches!(status, "queued" | "in_progress" | "cancelling")
}

/// Relays user text to a hosted agent thread and returns the agent's reply.
#[derive(Clone)]
pub struct AgentService {
    client: Client,
    endpoint: AgentEndpoint,
    auth: AuthService,
    agent_id: String,
    thread_id: String,
    poll_interval: Duration,
}

impl AgentService {
    pub fn new(
        client: Client,
        endpoint: AgentEndpoint,
        auth: AuthService,
        agent_id: String,
        thread_id: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            auth,
            agent_id,
            thread_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        url: Url,
    ) -> Result<T> {
        let res = self.client.get(url).bearer_auth(token).send().await?;
        if !res.status().is_success() {
            return Err(Error::from_response("Agent service", res).await);
        }
        Ok(res.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        url: Url,
        body: serde_json::Value,
    ) -> Result<T> {
        let res = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Error::from_response("Agent service", res).await);
        }
        Ok(res.json().await?)
    }

    /// Confirms the configured agent and thread exist before a session starts.
    pub async fn connect(&self) -> Result<()> {
        let token = self.auth.agents_token().await?;
        let agent: Identified = self
            .get_json(&token, self.endpoint.url(&format!("/assistants/{}", self.agent_id), &[])?)
            .await?;
        let thread: Identified = self
            .get_json(&token, self.endpoint.url(&format!("/threads/{}", self.thread_id), &[])?)
            .await?;
        tracing::info!(
            agent_id = %agent.id,
            agent_name = agent.name.as_deref().unwrap_or(""),
            thread_id = %thread.id,
            "Connected to agent thread"
        );
        Ok(())
    }

    async fn wait_for_run(&self, token: &str, mut run: RunStatus) -> Result<RunStatus> {
        while is_pending(&run.status) {
            tokio::time::sleep(self.poll_interval).await;
            run = self
                .get_json(
                    token,
                    self.endpoint
                        .url(&format!("/threads/{}/runs/{}", self.thread_id, run.id), &[])?,
                )
                .await?;
        }
        Ok(run)
    }

    /// Text produced by `run_id`. Older assistant messages in the thread are
    /// never returned, so a failed run cannot replay the previous turn.
    fn latest_reply(messages: MessageList, run_id: &str) -> Option<String> {
        messages
            .data
            .into_iter()
            .filter(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run_id))
            .flat_map(|m| m.content)
            .find(|c| c.kind == "text")
            .and_then(|c| c.text)
            .map(|t| t.value)
    }
}

#[async_trait]
impl ConversationAgent for AgentService {
    async fn reply(&self, user_text: &str) -> Result<String> {
        let token = self.auth.agents_token().await?;
        let thread = format!("/threads/{}", self.thread_id);

        let _: serde_json::Value = self
            .post_json(
                &token,
                self.endpoint.url(&format!("{}/messages", thread), &[])?,
                json!({"role": "user", "content": user_text}),
            )
            .await?;

        let run: RunStatus = self
            .post_json(
                &token,
                self.endpoint.url(&format!("{}/runs", thread), &[])?,
                json!({"assistant_id": self.agent_id}),
            )
            .await?;
        let run = self.wait_for_run(&token, run).await?;
        if run.status != "completed" {
            tracing::warn!(
                run_id = %run.id,
                status = %run.status,
                last_error = ?run.last_error,
                "Agent run did not complete"
            );
        }

        let messages: MessageList = self
            .get_json(
                &token,
                self.endpoint
                    .url(&format!("{}/messages", thread), &[("order", "desc")])?,
            )
            .await?;

        Ok(Self::latest_reply(messages, &run.id).unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_builds_project_url() {
        let endpoint = AgentEndpoint::from_connection_string(
            "eastus.api.azureml.ms;sub-1;rg-hr;intellibot",
        )
        .unwrap();
        assert_eq!(
            endpoint.base_url(),
            "https://eastus.api.azureml.ms/agents/v1.0/subscriptions/sub-1/resourceGroups/rg-hr/providers/Microsoft.MachineLearningServices/workspaces/intellibot"
        );
        let url = endpoint.url("/threads/t1/messages", &[("order", "desc")]).unwrap();
        assert_eq!(
            url.query(),
            Some("api-version=2024-12-01-preview&order=desc")
        );
    }

    #[test]
    fn malformed_connection_string_is_config_error() {
        assert!(matches!(
            AgentEndpoint::from_connection_string("only;three;parts"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AgentEndpoint::from_connection_string("host;;rg;proj"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn latest_reply_skips_user_and_non_text_content() {
        let messages: MessageList = serde_json::from_value(json!({
            "data": [
                {"role": "user", "content": [{"type": "text", "text": {"value": "mine"}}]},
                {"role": "assistant", "run_id": "run_1", "content": [{"type": "image_file"}]},
                {"role": "assistant", "run_id": "run_1", "content": [{"type": "text", "text": {"value": "theirs", "annotations": []}}]}
            ]
        }))
        .unwrap();
        assert_eq!(AgentService::latest_reply(messages, "run_1").as_deref(), Some("theirs"));
    }

    #[test]
    fn latest_reply_ignores_messages_from_earlier_runs() {
        let messages: MessageList = serde_json::from_value(json!({
            "data": [
                {"role": "user", "content": [{"type": "text", "text": {"value": "thanks"}}]},
                {"role": "assistant", "run_id": "run_1", "content": [{"type": "text", "text": {
                    "value": "✅ Interview scheduled for Asha (asha@mail.com & ravi@corp.com) on 2025-07-05 at 10:30 AM"
                }}]}
            ]
        }))
        .unwrap();
        assert_eq!(AgentService::latest_reply(messages, "run_2"), None);
    }
}
