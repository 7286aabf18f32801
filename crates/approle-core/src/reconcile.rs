//! Reconciliation of required against assigned role state.

use tracing::debug;

use crate::model::{
    Addition, ApplicationDescriptor, AssignedAssignments, AssignedRole, Deletion,
    GroupAssignmentSet, Modification, RequiredAssignments, Role,
};
use crate::setops::{difference_by_key, intersection_by_key};

/// Computes the additions and deletions that bring `assigned` in line with
/// `required` for one application.
///
/// Groups are compared by id, then roles within a group by id. A role present
/// on both sides produces nothing beyond deleting its duplicate assignments,
/// so reconciling an already converged descriptor yields an empty
/// [`Modification`].
///
/// Output order: groups only in `required`, then groups only in `assigned`,
/// then groups on both sides; roles keep their source order within a group.
pub fn reconcile(descriptor: &ApplicationDescriptor) -> Modification {
    let required = descriptor.required.as_slice();
    let assigned = descriptor.assigned.as_slice();

    let mut additions = Vec::new();
    let mut deletions = Vec::new();

    for group in difference_by_key(required, assigned, group_key, group_key) {
        additions.extend(group.roles.iter().map(|role| addition(group, role)));
    }

    for group in difference_by_key(assigned, required, group_key, group_key) {
        for role in &group.roles {
            deletions.extend(role.assignments().map(|r| deletion(group, r)));
        }
    }

    for (wanted, held) in intersection_by_key(required, assigned, group_key, group_key) {
        let missing = difference_by_key(&wanted.roles, &held.roles, Role::id, AssignedRole::id);
        let extra = difference_by_key(&held.roles, &wanted.roles, AssignedRole::id, Role::id);
        let kept = intersection_by_key(&held.roles, &wanted.roles, AssignedRole::id, Role::id);

        additions.extend(missing.into_iter().map(|role| addition(wanted, role)));
        for role in extra {
            deletions.extend(role.assignments().map(|r| deletion(held, r)));
        }
        // A still-required role keeps one assignment; the rest go.
        for (role, _) in kept {
            deletions.extend(role.duplicates().map(|r| deletion(held, r)));
        }
    }

    debug!(
        application = %descriptor.display_name,
        additions = additions.len(),
        deletions = deletions.len(),
        "Reconciled application"
    );

    Modification {
        display_name: descriptor.display_name.clone(),
        resource_id: descriptor.resource_id.clone(),
        additions,
        deletions,
    }
}

fn group_key<R>(set: &GroupAssignmentSet<R>) -> &str {
    set.group_id()
}

fn addition(group: &RequiredAssignments, role: &Role) -> Addition {
    Addition {
        group: group.group.clone(),
        role: role.clone(),
    }
}

fn deletion(group: &AssignedAssignments, role: AssignedRole) -> Deletion {
    Deletion {
        group: group.group.clone(),
        role,
    }
}
