//! Assembly of [`ApplicationDescriptor`]s from configuration and directory state.
//!
//! Building is read-only: every lookup and validation happens here, before the
//! applier issues its first write. A missing service principal or an unknown
//! role value aborts the whole build.

use futures_util::future::try_join_all;
use indexmap::IndexMap;
use tracing::{debug, info, instrument};

use crate::config::{ApplicationConfig, GroupAssignmentConfig};
use crate::directory::{AssignmentRecord, Directory, ServicePrincipal};
use crate::error::{DirectoryError, Result, SyncError};
use crate::model::{
    ApplicationDescriptor, AssignedAssignments, AssignedRole, Group, RequiredAssignments, Role,
    RoleCatalog,
};

/// Lists service principals, then builds one descriptor per application.
#[instrument(skip_all, fields(applications = applications.len()))]
pub async fn load_descriptors(
    directory: &dyn Directory,
    applications: &[ApplicationConfig],
) -> Result<Vec<ApplicationDescriptor>> {
    let principals = directory.list_service_principals().await?;
    debug!(principals = principals.len(), "Listed service principals");
    build_descriptors(directory, applications, &principals).await
}

/// Builds one descriptor per application, in configuration order.
///
/// Every application is matched to its service principal before any other
/// directory read, so a bad client id fails fast.
pub async fn build_descriptors(
    directory: &dyn Directory,
    applications: &[ApplicationConfig],
    principals: &[ServicePrincipal],
) -> Result<Vec<ApplicationDescriptor>> {
    let matched = applications
        .iter()
        .map(|app| find_principal(principals, &app.client_id).map(|sp| (app, sp)))
        .collect::<Result<Vec<_>>>()?;

    try_join_all(
        matched
            .into_iter()
            .map(|(app, sp)| build_descriptor(directory, app, sp)),
    )
    .await
}

/// Builds the descriptor for one application and its service principal.
#[instrument(skip_all, fields(application = %principal.display_name))]
pub async fn build_descriptor(
    directory: &dyn Directory,
    app: &ApplicationConfig,
    principal: &ServicePrincipal,
) -> Result<ApplicationDescriptor> {
    let catalog = principal.role_catalog();

    let resolved = app
        .assignments
        .iter()
        .map(|entry| {
            resolve_roles(&catalog, &principal.display_name, &entry.roles)
                .map(|roles| (entry, roles))
        })
        .collect::<Result<Vec<_>>>()?;

    let (required, records) = tokio::try_join!(
        resolve_groups(directory, resolved),
        directory.list_assigned_roles(&principal.object_id),
    )?;
    let assigned = group_assignment_records(&records, &catalog);

    info!(
        required_groups = required.len(),
        assigned_groups = assigned.len(),
        "Built application descriptor"
    );

    Ok(ApplicationDescriptor {
        client_id: principal.app_id.clone(),
        display_name: principal.display_name.clone(),
        resource_id: principal.object_id.clone(),
        roles: catalog,
        required,
        assigned,
    })
}

/// Finds the service principal whose app id is `client_id`.
pub fn find_principal<'a>(
    principals: &'a [ServicePrincipal],
    client_id: &str,
) -> Result<&'a ServicePrincipal> {
    principals
        .iter()
        .find(|sp| sp.app_id == client_id)
        .ok_or_else(|| SyncError::lookup(client_id))
}

/// Translates configured role values to catalog roles, dropping repeats.
pub fn resolve_roles(
    catalog: &RoleCatalog,
    application: &str,
    values: &[String],
) -> Result<Vec<Role>> {
    let mut roles: Vec<Role> = Vec::with_capacity(values.len());
    for value in values {
        let role = catalog
            .resolve(value)
            .ok_or_else(|| SyncError::unknown_role(value, application))?;
        if !roles.iter().any(|r| r.role_id == role.role_id) {
            roles.push(role);
        }
    }
    Ok(roles)
}

/// Groups flat assignment records into one set per group, in first-seen order.
///
/// Records that are not group role assignments are skipped. A role id missing
/// from the catalog keeps the id as its display value. A second record for the
/// same group and role is kept as a duplicate assignment id of the first.
pub fn group_assignment_records(
    records: &[AssignmentRecord],
    catalog: &RoleCatalog,
) -> Vec<AssignedAssignments> {
    let mut by_group: IndexMap<&str, AssignedAssignments> = IndexMap::new();

    for record in records.iter().filter(|r| r.is_group_assignment()) {
        let set = by_group
            .entry(record.principal_id.as_str())
            .or_insert_with(|| {
                AssignedAssignments::new(Group::new(
                    &record.principal_id,
                    &record.principal_display_name,
                ))
            });
        let value = catalog.role_value(&record.role_id).unwrap_or(record.role_id.as_str());
        set.push(AssignedRole::new(
            Role::new(&record.role_id, value),
            &record.assignment_id,
        ));
    }

    by_group.into_values().collect()
}

/// Fetches each configured group and merges entries naming the same group.
async fn resolve_groups(
    directory: &dyn Directory,
    resolved: Vec<(&GroupAssignmentConfig, Vec<Role>)>,
) -> std::result::Result<Vec<RequiredAssignments>, DirectoryError> {
    let groups = try_join_all(
        resolved
            .iter()
            .map(|(entry, _)| directory.get_group(&entry.group_id)),
    )
    .await?;

    let mut by_group: IndexMap<String, RequiredAssignments> = IndexMap::new();
    for (group, (_, roles)) in groups.into_iter().zip(resolved) {
        let set = by_group
            .entry(group.group_id.clone())
            .or_insert_with(|| RequiredAssignments::new(group));
        for role in roles {
            set.push(role);
        }
    }

    Ok(by_group.into_values().collect())
}
