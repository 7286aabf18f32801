use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use approle_core::ApplicationConfig;
use serde::Deserialize;
use url::Url;

/// Contents of the configuration file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Tenant id or primary domain.
    pub tenant: String,
    pub credentials: Credentials,
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,
    #[serde(default)]
    pub graph: GraphSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(default, alias = "client_secret")]
    pub client_secret: Option<String>,
}

/// Microsoft Graph endpoints, overridable for national clouds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSettings {
    pub endpoint: String,
    #[serde(alias = "login_endpoint")]
    pub login_endpoint: String,
    #[serde(alias = "api_version")]
    pub api_version: String,
    #[serde(alias = "timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://graph.microsoft.com".to_string(),
            login_endpoint: "https://login.microsoftonline.com".to_string(),
            api_version: "v1.0".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Reads a JSON or TOML configuration file, chosen by extension.
pub fn load(path: &Path) -> Result<SyncConfig> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| PathBuf::from(path));
    if !absolute.exists() {
        anyhow::bail!("Cannot find '{}'", absolute.display());
    }
    let content = fs::read_to_string(&absolute)
        .with_context(|| format!("Failed to read file: {}", absolute.display()))?;

    let is_toml = absolute
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let config: SyncConfig = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", absolute.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", absolute.display()))?
    };
    Ok(config)
}

impl SyncConfig {
    /// Replaces the client secret when one is given on the command line or
    /// in the environment.
    #[must_use]
    pub fn with_client_secret(mut self, secret: Option<String>) -> Self {
        if let Some(secret) = secret {
            self.credentials.client_secret = Some(secret);
        }
        self
    }

    pub fn client_secret(&self) -> Result<&str> {
        self.credentials
            .client_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("No client secret configured. Set credentials.clientSecret, APPROLE_CLIENT_SECRET, or --client-secret")
    }

    pub fn validate(&self) -> Result<()> {
        if self.tenant.trim().is_empty() {
            anyhow::bail!("tenant must not be empty");
        }
        if self.credentials.client_id.trim().is_empty() {
            anyhow::bail!("credentials.clientId must not be empty");
        }
        self.client_secret()?;
        for (i, app) in self.applications.iter().enumerate() {
            if app.client_id.trim().is_empty() {
                anyhow::bail!("applications[{i}].clientId must not be empty");
            }
            if let Some(j) = app.assignments.iter().position(|a| a.group_id.trim().is_empty()) {
                anyhow::bail!("applications[{i}].assignments[{j}].groupId must not be empty");
            }
        }
        Url::parse(&self.graph.endpoint)
            .with_context(|| format!("graph.endpoint is not a valid URL: {}", self.graph.endpoint))?;
        Url::parse(&self.graph.login_endpoint).with_context(|| {
            format!(
                "graph.loginEndpoint is not a valid URL: {}",
                self.graph.login_endpoint
            )
        })?;
        if self.graph.timeout_secs == 0 {
            anyhow::bail!("graph.timeoutSecs must be greater than zero");
        }
        Ok(())
    }
}
