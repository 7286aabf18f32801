//! The directory service seam.
//!
//! Everything the builder reads and the applier writes goes through
//! [`Directory`]. The CLI provides a Microsoft Graph implementation; tests use
//! an in-memory one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::model::{Group, RoleCatalog};

/// `objectType` of role assignment records.
pub const APP_ROLE_ASSIGNMENT: &str = "AppRoleAssignment";

/// `principalType` of assignments held by groups.
pub const GROUP_PRINCIPAL: &str = "Group";

/// A role declared by an application's service principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRole {
    pub id: String,
    pub value: String,
}

/// The tenant-local instance of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    /// Client id of the application this principal instantiates.
    pub app_id: String,
    pub object_id: String,
    pub display_name: String,
    #[serde(default)]
    pub app_roles: Vec<AppRole>,
}

impl ServicePrincipal {
    pub fn role_catalog(&self) -> RoleCatalog {
        self.app_roles
            .iter()
            .map(|role| (role.id.as_str(), role.value.as_str()))
            .collect()
    }
}

/// One entry of a service principal's "assigned to" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    /// Absent when the directory does not report object types.
    #[serde(default)]
    pub object_type: Option<String>,
    pub principal_type: String,
    pub principal_id: String,
    #[serde(default)]
    pub principal_display_name: String,
    /// The assigned app role.
    pub role_id: String,
    /// Id of the assignment object itself.
    pub assignment_id: String,
}

impl AssignmentRecord {
    /// Whether this record is a role assignment held by a group.
    pub fn is_group_assignment(&self) -> bool {
        self.object_type
            .as_deref()
            .is_none_or(|t| t.eq_ignore_ascii_case(APP_ROLE_ASSIGNMENT))
            && self.principal_type == GROUP_PRINCIPAL
    }
}

/// Read and write access to application role assignments.
///
/// Implementations own transport concerns (authentication, pagination,
/// timeouts, retries). Calls on distinct keys may run concurrently.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_service_principals(&self) -> Result<Vec<ServicePrincipal>, DirectoryError>;

    async fn get_group(&self, group_id: &str) -> Result<Group, DirectoryError>;

    /// Lists every principal assigned a role on the given service principal.
    async fn list_assigned_roles(
        &self,
        resource_id: &str,
    ) -> Result<Vec<AssignmentRecord>, DirectoryError>;

    async fn create_assignment(
        &self,
        resource_id: &str,
        group_id: &str,
        role_id: &str,
    ) -> Result<(), DirectoryError>;

    async fn delete_assignment(
        &self,
        group_id: &str,
        assignment_id: &str,
    ) -> Result<(), DirectoryError>;
}
