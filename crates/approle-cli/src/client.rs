use std::time::Duration;

use approle_core::{AppRole, AssignmentRecord, Directory, DirectoryError, Group, ServicePrincipal};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::auth::ClientCredentials;
use crate::config::SyncConfig;

/// Microsoft Graph implementation of [`Directory`].
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    credentials: ClientCredentials,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphServicePrincipal {
    id: String,
    app_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    app_roles: Vec<GraphAppRole>,
}

#[derive(Debug, Deserialize)]
struct GraphAppRole {
    id: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphGroup {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAssignment {
    id: String,
    app_role_id: String,
    principal_id: String,
    principal_type: String,
    #[serde(default)]
    principal_display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewAssignment<'a> {
    principal_id: &'a str,
    resource_id: &'a str,
    app_role_id: &'a str,
}

impl From<GraphServicePrincipal> for ServicePrincipal {
    fn from(sp: GraphServicePrincipal) -> Self {
        Self {
            display_name: sp.display_name.unwrap_or_else(|| sp.app_id.clone()),
            app_id: sp.app_id,
            object_id: sp.id,
            // Roles without a value cannot be named in configuration.
            app_roles: sp
                .app_roles
                .into_iter()
                .filter_map(|r| r.value.map(|value| AppRole { id: r.id, value }))
                .collect(),
        }
    }
}

impl From<GraphAssignment> for AssignmentRecord {
    fn from(a: GraphAssignment) -> Self {
        Self {
            object_type: None,
            principal_type: a.principal_type,
            principal_id: a.principal_id,
            principal_display_name: a.principal_display_name.unwrap_or_default(),
            role_id: a.app_role_id,
            assignment_id: a.id,
        }
    }
}

impl GraphClient {
    pub fn new(config: &SyncConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.graph.timeout_secs))
            .build()?;
        let credentials = ClientCredentials::new(
            http.clone(),
            &config.graph.login_endpoint,
            &config.graph.endpoint,
            &config.tenant,
            &config.credentials.client_id,
            config.client_secret()?,
        );
        let base_url = format!(
            "{}/{}",
            config.graph.endpoint.trim_end_matches('/'),
            config.graph.api_version
        );
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, DirectoryError> {
        let token = self.credentials.token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DirectoryError> {
        let resp = self
            .request(reqwest::Method::GET, url)
            .await?
            .send()
            .await
            .map_err(transport)?;
        let body = handle_response(resp).await?;
        serde_json::from_str(&body).map_err(|e| DirectoryError::decode(e.to_string()))
    }

    /// Follows `@odata.nextLink` until the last page.
    async fn get_all<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, DirectoryError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(url) = next {
            debug!(%url, "Fetching page");
            let page: Page<T> = self.get_json(&url).await?;
            items.extend(page.value);
            next = page.next_link;
        }
        Ok(items)
    }
}

#[async_trait]
impl Directory for GraphClient {
    #[instrument(skip(self))]
    async fn list_service_principals(&self) -> Result<Vec<ServicePrincipal>, DirectoryError> {
        let url = self.url("servicePrincipals?$select=id,appId,displayName,appRoles");
        let principals: Vec<GraphServicePrincipal> = self.get_all(&url).await?;
        Ok(principals.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_group(&self, group_id: &str) -> Result<Group, DirectoryError> {
        let url = self.url(&format!("groups/{group_id}?$select=id,displayName"));
        let group: GraphGroup = self.get_json(&url).await?;
        let name = group.display_name.unwrap_or_else(|| group.id.clone());
        Ok(Group::new(group.id, name))
    }

    #[instrument(skip(self))]
    async fn list_assigned_roles(
        &self,
        resource_id: &str,
    ) -> Result<Vec<AssignmentRecord>, DirectoryError> {
        let url = self.url(&format!("servicePrincipals/{resource_id}/appRoleAssignedTo"));
        let assignments: Vec<GraphAssignment> = self.get_all(&url).await?;
        Ok(assignments.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn create_assignment(
        &self,
        resource_id: &str,
        group_id: &str,
        role_id: &str,
    ) -> Result<(), DirectoryError> {
        let url = self.url(&format!("groups/{group_id}/appRoleAssignments"));
        let body = NewAssignment {
            principal_id: group_id,
            resource_id,
            app_role_id: role_id,
        };
        let resp = self
            .request(reqwest::Method::POST, &url)
            .await?
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        handle_response(resp).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn delete_assignment(
        &self,
        group_id: &str,
        assignment_id: &str,
    ) -> Result<(), DirectoryError> {
        let url = self.url(&format!(
            "groups/{group_id}/appRoleAssignments/{assignment_id}"
        ));
        let resp = self
            .request(reqwest::Method::DELETE, &url)
            .await?
            .send()
            .await
            .map_err(transport)?;
        handle_response(resp).await.map(|_| ())
    }
}

fn transport(e: reqwest::Error) -> DirectoryError {
    DirectoryError::transport(e.to_string())
}

/// Returns the body of a successful response, or the OData error it carries.
async fn handle_response(resp: reqwest::Response) -> Result<String, DirectoryError> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if status.is_success() {
        return Ok(body);
    }

    let json = serde_json::from_str::<Value>(&body).ok();
    if let Some(error) = json.as_ref().and_then(|j| j.get("error")) {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        return Err(DirectoryError::Api {
            status: status.as_u16(),
            code: field("code"),
            message: field("message"),
        });
    }

    Err(DirectoryError::Api {
        status: status.as_u16(),
        code: status.canonical_reason().unwrap_or("Unknown").to_string(),
        message: body,
    })
}
