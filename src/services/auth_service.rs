use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const AGENTS_SCOPE: &str = "https://ml.azure.com/.default";

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 client-credentials exchange against the Microsoft identity platform.
#[derive(Clone)]
pub struct AuthService {
    client: Client,
    login_base_url: String,
    credentials: ClientCredentials,
}

impl AuthService {
    pub fn new(client: Client, login_base_url: String, credentials: ClientCredentials) -> Self {
        Self {
            client,
            login_base_url: login_base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub async fn fetch_token(&self, scope: &str) -> Result<String> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url, self.credentials.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope),
        ];

        let res = self.client.post(&url).form(&form).send().await?;
        if !res.status().is_success() {
            let err = Error::from_response("Token endpoint", res).await;
            tracing::error!(scope, error = %err, "Access token request failed");
            return Err(err);
        }

        let token: TokenResponse = res.json().await?;
        tracing::debug!(scope, "Access token acquired");
        Ok(token.access_token)
    }

    pub async fn graph_token(&self) -> Result<String> {
        self.fetch_token(GRAPH_SCOPE).await
    }

    pub async fn agents_token(&self) -> Result<String> {
        self.fetch_token(AGENTS_SCOPE).await
    }
}
