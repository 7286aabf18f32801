//! Desired-state input: which groups hold which roles of which application.

use serde::{Deserialize, Serialize};

/// One application and the group assignments it should have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    /// Application (client) id, matched against service principal app ids.
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(default)]
    pub assignments: Vec<GroupAssignmentConfig>,
}

/// Role values one group should hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAssignmentConfig {
    #[serde(alias = "group_id")]
    pub group_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl ApplicationConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            assignments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_assignment<I, S>(mut self, group_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignments.push(GroupAssignmentConfig {
            group_id: group_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        });
        self
    }
}
