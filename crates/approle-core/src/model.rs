//! Data model for required and assigned application role state.
//!
//! The same [`Group`] and [`Role`] types describe both sides of a
//! reconciliation. Only roles read back from the directory carry an
//! assignment id, which is why the assigned side is held as
//! [`AssignedRole`] rather than a bare [`Role`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A directory group that can hold application roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
    pub group_display_name: String,
}

impl Group {
    pub fn new(group_id: impl Into<String>, group_display_name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            group_display_name: group_display_name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.group_id
    }
}

/// An application role from a service principal's role catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: String,
    pub role_value: String,
}

impl Role {
    pub fn new(role_id: impl Into<String>, role_value: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            role_value: role_value.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.role_id
    }
}

/// A role as it currently exists in the directory, identified by the
/// assignment object that grants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRole {
    #[serde(flatten)]
    pub role: Role,
    pub assignment_id: String,
    /// Further assignment objects granting the same role to the same group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_assignment_ids: Vec<String>,
}

impl AssignedRole {
    pub fn new(role: Role, assignment_id: impl Into<String>) -> Self {
        Self {
            role,
            assignment_id: assignment_id.into(),
            duplicate_assignment_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.role.id()
    }

    /// One single-assignment role per assignment object, the primary first.
    pub fn assignments(&self) -> impl Iterator<Item = AssignedRole> + '_ {
        std::iter::once(self.assignment_id.as_str())
            .chain(self.duplicate_assignment_ids.iter().map(String::as_str))
            .map(|id| AssignedRole::new(self.role.clone(), id))
    }

    /// The assignment objects beyond the primary one.
    pub fn duplicates(&self) -> impl Iterator<Item = AssignedRole> + '_ {
        self.assignments().skip(1)
    }
}

/// The roles one group holds, or should hold, for one application.
///
/// Role ids are unique within a set. Pushing a role already present is a
/// no-op on the required side; on the assigned side the extra assignment id
/// is kept on the existing role so it can still be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignmentSet<R> {
    #[serde(flatten)]
    pub group: Group,
    pub roles: Vec<R>,
}

pub type RequiredAssignments = GroupAssignmentSet<Role>;
pub type AssignedAssignments = GroupAssignmentSet<AssignedRole>;

impl<R> GroupAssignmentSet<R> {
    pub fn new(group: Group) -> Self {
        Self {
            group,
            roles: Vec::new(),
        }
    }

    pub fn group_id(&self) -> &str {
        self.group.id()
    }
}

impl GroupAssignmentSet<Role> {
    /// Adds a role unless one with the same id is already present.
    /// Returns whether the role was added.
    pub fn push(&mut self, role: Role) -> bool {
        if self.roles.iter().any(|r| r.role_id == role.role_id) {
            return false;
        }
        self.roles.push(role);
        true
    }
}

impl GroupAssignmentSet<AssignedRole> {
    /// Adds an assigned role. When the role id is already present, its
    /// assignment ids are recorded as duplicates of the existing entry.
    /// Returns whether a new role entry was added.
    pub fn push(&mut self, role: AssignedRole) -> bool {
        match self.roles.iter_mut().find(|r| r.id() == role.id()) {
            Some(existing) => {
                existing.duplicate_assignment_ids.push(role.assignment_id);
                existing
                    .duplicate_assignment_ids
                    .extend(role.duplicate_assignment_ids);
                false
            }
            None => {
                self.roles.push(role);
                true
            }
        }
    }
}

/// Bidirectional lookup between role ids and role values for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct RoleCatalog {
    values_by_id: BTreeMap<String, String>,
    ids_by_value: BTreeMap<String, String>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role_id: impl Into<String>, role_value: impl Into<String>) {
        let role_id = role_id.into();
        let role_value = role_value.into();
        self.ids_by_value.insert(role_value.clone(), role_id.clone());
        self.values_by_id.insert(role_id, role_value);
    }

    pub fn role_id(&self, role_value: &str) -> Option<&str> {
        self.ids_by_value.get(role_value).map(String::as_str)
    }

    pub fn role_value(&self, role_id: &str) -> Option<&str> {
        self.values_by_id.get(role_id).map(String::as_str)
    }

    /// Resolves a configured role value to a catalog [`Role`].
    pub fn resolve(&self, role_value: &str) -> Option<Role> {
        self.role_id(role_value).map(|id| Role::new(id, role_value))
    }

    pub fn len(&self) -> usize {
        self.values_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_by_id.is_empty()
    }
}

impl<I, V> FromIterator<(I, V)> for RoleCatalog
where
    I: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (I, V)>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for (id, value) in iter {
            catalog.insert(id, value);
        }
        catalog
    }
}

impl From<BTreeMap<String, String>> for RoleCatalog {
    fn from(values_by_id: BTreeMap<String, String>) -> Self {
        values_by_id.into_iter().collect()
    }
}

impl From<RoleCatalog> for BTreeMap<String, String> {
    fn from(catalog: RoleCatalog) -> Self {
        catalog.values_by_id
    }
}

/// Everything needed to reconcile one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescriptor {
    pub client_id: String,
    pub display_name: String,
    /// Object id of the application's service principal.
    pub resource_id: String,
    pub roles: RoleCatalog,
    /// Desired state, built from configuration.
    pub required: Vec<RequiredAssignments>,
    /// Actual state, read from the directory.
    pub assigned: Vec<AssignedAssignments>,
}

/// A role to grant to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addition {
    pub group: Group,
    pub role: Role,
}

/// A role assignment to remove, identified by its directory assignment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub group: Group,
    pub role: AssignedRole,
}

impl Deletion {
    pub fn assignment_id(&self) -> &str {
        &self.role.assignment_id
    }
}

/// Changes needed to converge one application's assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    pub display_name: String,
    pub resource_id: String,
    pub additions: Vec<Addition>,
    pub deletions: Vec<Deletion>,
}

impl Modification {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.additions.len() + self.deletions.len()
    }
}
