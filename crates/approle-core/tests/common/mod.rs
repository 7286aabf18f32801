//! In-memory directory used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use approle_core::{AppRole, AssignmentRecord, Directory, DirectoryError, Group, ServicePrincipal};
use async_trait::async_trait;

/// A directory write observed by [`MemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Create {
        resource_id: String,
        group_id: String,
        role_id: String,
    },
    Delete {
        group_id: String,
        assignment_id: String,
    },
}

#[derive(Default)]
struct State {
    /// (resource id, record)
    assignments: Vec<(String, AssignmentRecord)>,
    writes: Vec<Write>,
    next_id: usize,
}

#[derive(Default)]
pub struct MemoryDirectory {
    principals: Vec<ServicePrincipal>,
    groups: HashMap<String, Group>,
    failing_groups: HashSet<String>,
    failing_roles: HashSet<String>,
    state: Mutex<State>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(
        mut self,
        app_id: &str,
        object_id: &str,
        name: &str,
        roles: &[(&str, &str)],
    ) -> Self {
        self.principals.push(ServicePrincipal {
            app_id: app_id.to_string(),
            object_id: object_id.to_string(),
            display_name: name.to_string(),
            app_roles: roles
                .iter()
                .map(|(id, value)| AppRole {
                    id: id.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn with_group(mut self, id: &str, name: &str) -> Self {
        self.groups.insert(id.to_string(), Group::new(id, name));
        self
    }

    /// Seeds an existing group role assignment.
    pub fn with_assignment(
        self,
        resource_id: &str,
        group_id: &str,
        role_id: &str,
        assignment_id: &str,
    ) -> Self {
        let name = self
            .groups
            .get(group_id)
            .map(|g| g.group_display_name.clone())
            .unwrap_or_default();
        self.state.lock().unwrap().assignments.push((
            resource_id.to_string(),
            record("Group", group_id, &name, role_id, assignment_id),
        ));
        self
    }

    /// Seeds an assignment held by a user.
    pub fn with_user_assignment(
        self,
        resource_id: &str,
        user_id: &str,
        role_id: &str,
        assignment_id: &str,
    ) -> Self {
        self.state.lock().unwrap().assignments.push((
            resource_id.to_string(),
            record("User", user_id, "Some User", role_id, assignment_id),
        ));
        self
    }

    /// Makes every write touching this group fail.
    pub fn failing_group(mut self, group_id: &str) -> Self {
        self.failing_groups.insert(group_id.to_string());
        self
    }

    /// Makes every create for this role fail.
    pub fn failing_role(mut self, role_id: &str) -> Self {
        self.failing_roles.insert(role_id.to_string());
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Current (group id, role id) pairs held on a resource, sorted.
    pub fn held(&self, resource_id: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|(rid, r)| rid == resource_id && r.principal_type == "Group")
            .map(|(_, r)| (r.principal_id.clone(), r.role_id.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

fn record(
    principal_type: &str,
    principal_id: &str,
    name: &str,
    role_id: &str,
    assignment_id: &str,
) -> AssignmentRecord {
    AssignmentRecord {
        object_type: Some("AppRoleAssignment".to_string()),
        principal_type: principal_type.to_string(),
        principal_id: principal_id.to_string(),
        principal_display_name: name.to_string(),
        role_id: role_id.to_string(),
        assignment_id: assignment_id.to_string(),
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn list_service_principals(&self) -> Result<Vec<ServicePrincipal>, DirectoryError> {
        Ok(self.principals.clone())
    }

    async fn get_group(&self, group_id: &str) -> Result<Group, DirectoryError> {
        self.groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(format!("group {group_id}")))
    }

    async fn list_assigned_roles(
        &self,
        resource_id: &str,
    ) -> Result<Vec<AssignmentRecord>, DirectoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|(rid, _)| rid == resource_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_assignment(
        &self,
        resource_id: &str,
        group_id: &str,
        role_id: &str,
    ) -> Result<(), DirectoryError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Create {
            resource_id: resource_id.to_string(),
            group_id: group_id.to_string(),
            role_id: role_id.to_string(),
        });
        if self.failing_groups.contains(group_id) || self.failing_roles.contains(role_id) {
            return Err(DirectoryError::Api {
                status: 400,
                code: "Request_BadRequest".to_string(),
                message: format!("cannot assign {role_id} to {group_id}"),
            });
        }
        state.next_id += 1;
        let assignment_id = format!("new-{}", state.next_id);
        let name = self
            .groups
            .get(group_id)
            .map(|g| g.group_display_name.clone())
            .unwrap_or_default();
        state.assignments.push((
            resource_id.to_string(),
            record("Group", group_id, &name, role_id, &assignment_id),
        ));
        Ok(())
    }

    async fn delete_assignment(
        &self,
        group_id: &str,
        assignment_id: &str,
    ) -> Result<(), DirectoryError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::Delete {
            group_id: group_id.to_string(),
            assignment_id: assignment_id.to_string(),
        });
        if self.failing_groups.contains(group_id) {
            return Err(DirectoryError::transport("connection reset"));
        }
        let before = state.assignments.len();
        state
            .assignments
            .retain(|(_, r)| !(r.assignment_id == assignment_id && r.principal_id == group_id));
        if state.assignments.len() == before {
            return Err(DirectoryError::not_found(format!("assignment {assignment_id}")));
        }
        Ok(())
    }
}
