//! Application of [`Modification`]s to the directory.
//!
//! Each addition becomes a create keyed by (resource, group, role) and each
//! deletion a delete keyed by the assignment id. Keys never collide, so all
//! operations of a modification run concurrently up to
//! [`ApplyOptions::concurrency`]. A failed operation never cancels its
//! siblings, and nothing is rolled back.

use std::fmt;

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::directory::Directory;
use crate::error::{ApplyError, DirectoryError, Result, SyncError};
use crate::model::Modification;

/// Default number of in-flight operations per modification.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Options for applying modifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Maximum in-flight operations per modification (at least 1).
    pub concurrency: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ApplyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// A single directory write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Create {
        resource_id: String,
        group_id: String,
        role_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Delete {
        group_id: String,
        assignment_id: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create {
                resource_id,
                group_id,
                role_id,
            } => write!(
                f,
                "create assignment of role {role_id} to group {group_id} on {resource_id}"
            ),
            Self::Delete {
                group_id,
                assignment_id,
            } => write!(f, "delete assignment {assignment_id} from group {group_id}"),
        }
    }
}

/// Lists the writes for a modification: creates first, then deletes, each in
/// modification order.
pub fn operations(modification: &Modification) -> Vec<Operation> {
    let creates = modification.additions.iter().map(|a| Operation::Create {
        resource_id: modification.resource_id.clone(),
        group_id: a.group.group_id.clone(),
        role_id: a.role.role_id.clone(),
    });
    let deletes = modification.deletions.iter().map(|d| Operation::Delete {
        group_id: d.group.group_id.clone(),
        assignment_id: d.assignment_id().to_string(),
    });
    creates.chain(deletes).collect()
}

/// Outcome of one directory write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub operation: Operation,
    pub outcome: std::result::Result<(), DirectoryError>,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Converts a failed result into an [`ApplyError`].
    pub fn error(&self) -> Option<ApplyError> {
        self.outcome.as_ref().err().map(|source| ApplyError {
            operation: self.operation.clone(),
            source: source.clone(),
        })
    }
}

/// Results of applying one modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub display_name: String,
    /// One entry per operation, in [`operations`] order.
    pub results: Vec<OperationResult>,
}

impl ApplyOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Applies one modification, waiting for every operation to finish.
#[instrument(skip_all, fields(application = %modification.display_name))]
pub async fn apply(
    directory: &dyn Directory,
    modification: &Modification,
    options: ApplyOptions,
) -> ApplyOutcome {
    let ops = operations(modification);
    debug!(operations = ops.len(), "Applying modification");

    let results = stream::iter(ops)
        .map(|operation| execute(directory, operation))
        .buffered(options.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    ApplyOutcome {
        display_name: modification.display_name.clone(),
        results,
    }
}

/// Applies every modification concurrently. Outcomes keep input order.
pub async fn apply_all(
    directory: &dyn Directory,
    modifications: &[Modification],
    options: ApplyOptions,
) -> Vec<ApplyOutcome> {
    let outcomes = join_all(
        modifications
            .iter()
            .map(|m| apply(directory, m, options)),
    )
    .await;

    let attempted: usize = outcomes.iter().map(|o| o.results.len()).sum();
    let failed: usize = outcomes.iter().map(|o| o.failures().count()).sum();
    info!(
        applications = outcomes.len(),
        attempted, failed, "Applied modifications"
    );

    outcomes
}

/// Fails with the first error, in outcome order, if any operation failed.
pub fn ensure_applied(outcomes: &[ApplyOutcome]) -> Result<()> {
    let attempted = outcomes.iter().map(|o| o.results.len()).sum();
    let mut failures = outcomes.iter().flat_map(ApplyOutcome::failures);

    let Some(first) = failures.next().and_then(OperationResult::error) else {
        return Ok(());
    };

    Err(SyncError::Apply {
        failed: 1 + failures.count(),
        attempted,
        first,
    })
}

async fn execute(directory: &dyn Directory, operation: Operation) -> OperationResult {
    let outcome = match &operation {
        Operation::Create {
            resource_id,
            group_id,
            role_id,
        } => {
            directory
                .create_assignment(resource_id, group_id, role_id)
                .await
        }
        Operation::Delete {
            group_id,
            assignment_id,
        } => directory.delete_assignment(group_id, assignment_id).await,
    };

    match &outcome {
        Ok(()) => debug!(%operation, "Operation succeeded"),
        Err(error) => warn!(%operation, %error, "Operation failed"),
    }

    OperationResult { operation, outcome }
}
