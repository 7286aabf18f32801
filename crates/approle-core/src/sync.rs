use tracing::{info, instrument};

use crate::apply::{ApplyOptions, ApplyOutcome, apply_all, ensure_applied};
use crate::config::ApplicationConfig;
use crate::descriptor::load_descriptors;
use crate::directory::Directory;
use crate::error::Result;
use crate::model::Modification;
use crate::reconcile::reconcile;

/// Reads directory state and computes the modification for every application
/// without writing anything.
#[instrument(skip_all)]
pub async fn plan(
    directory: &dyn Directory,
    applications: &[ApplicationConfig],
) -> Result<Vec<Modification>> {
    let descriptors = load_descriptors(directory, applications).await?;
    let modifications: Vec<Modification> = descriptors.iter().map(reconcile).collect();

    info!(
        applications = modifications.len(),
        additions = modifications.iter().map(|m| m.additions.len()).sum::<usize>(),
        deletions = modifications.iter().map(|m| m.deletions.len()).sum::<usize>(),
        "Planned role assignment changes"
    );

    Ok(modifications)
}

/// Plans and applies all changes.
///
/// Returns the applied modifications and their per-operation outcomes. Fails
/// before any write if planning fails; otherwise every operation is attempted
/// and the first failure is reported afterwards via
/// [`ensure_applied`](crate::ensure_applied).
pub async fn run(
    directory: &dyn Directory,
    applications: &[ApplicationConfig],
    options: ApplyOptions,
) -> Result<(Vec<Modification>, Vec<ApplyOutcome>)> {
    let modifications = plan(directory, applications).await?;
    let outcomes = apply_all(directory, &modifications, options).await;
    Ok((modifications, outcomes))
}

/// Plans, applies, and fails if any operation failed.
pub async fn sync(
    directory: &dyn Directory,
    applications: &[ApplicationConfig],
    options: ApplyOptions,
) -> Result<Vec<Modification>> {
    let (modifications, outcomes) = run(directory, applications, options).await?;
    ensure_applied(&outcomes)?;
    Ok(modifications)
}
