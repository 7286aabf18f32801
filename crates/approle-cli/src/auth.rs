use approle_core::DirectoryError;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Acquires a Graph access token with the OAuth 2.0 client credentials grant
/// and reuses it for the rest of the run.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    token: OnceCell<String>,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        login_endpoint: &str,
        graph_endpoint: &str,
        tenant: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        let login = login_endpoint.trim_end_matches('/');
        let graph = graph_endpoint.trim_end_matches('/');
        Self {
            http,
            token_url: format!("{login}/{tenant}/oauth2/v2.0/token"),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: format!("{graph}/.default"),
            token: OnceCell::new(),
        }
    }

    pub async fn token(&self) -> Result<&str, DirectoryError> {
        self.token
            .get_or_try_init(|| self.acquire())
            .await
            .map(String::as_str)
    }

    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn acquire(&self) -> Result<String, DirectoryError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", &self.scope)
            .finish();

        let resp = self
            .http
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| DirectoryError::auth(format!("Token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::auth(format!(
                "Token request failed (HTTP {status}): {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| DirectoryError::auth(format!("Failed to parse token response: {e}")))?;
        debug!("Acquired access token");
        Ok(token.access_token)
    }
}
