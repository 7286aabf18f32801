//! # approle-core
//!
//! Reconciles which directory groups hold which application roles.
//!
//! ## Overview
//!
//! A run has three stages, and data only flows forward:
//!
//! 1. **Build**: [`load_descriptors`] matches each configured application to
//!    its service principal, resolves configured role values through the
//!    principal's role catalog, and reads the current assignments. The result
//!    is one [`ApplicationDescriptor`] per application.
//! 2. **Reconcile**: [`reconcile`] diffs the required and assigned sides of a
//!    descriptor into a [`Modification`]. It is pure and cannot fail.
//! 3. **Apply**: [`apply_all`] turns additions into creates and deletions into
//!    deletes against the [`Directory`], concurrently, and collects one result
//!    per operation.
//!
//! All validation happens during the build, so bad input never causes a
//! partial write.
//!
//! ## Example
//!
//! ```ignore
//! use approle_core::{ApplicationConfig, ApplyOptions, Directory, sync};
//!
//! async fn converge(directory: &dyn Directory) -> approle_core::Result<()> {
//!     let apps = vec![ApplicationConfig::new("client-id").with_assignment("group-id", ["admin"])];
//!     let modifications = sync(directory, &apps, ApplyOptions::default()).await?;
//!     for m in &modifications {
//!         println!("{}: {} changes", m.display_name, m.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod apply;
pub mod config;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod setops;
mod sync;

// Re-export main types
pub use apply::{
    ApplyOptions, ApplyOutcome, DEFAULT_CONCURRENCY, Operation, OperationResult, apply, apply_all,
    ensure_applied,
};
pub use config::{ApplicationConfig, GroupAssignmentConfig};
pub use descriptor::{build_descriptors, load_descriptors};
pub use directory::{AppRole, AssignmentRecord, Directory, ServicePrincipal};
pub use error::{ApplyError, DirectoryError, Result, SyncError};
pub use model::{
    Addition, ApplicationDescriptor, AssignedAssignments, AssignedRole, Deletion, Group,
    GroupAssignmentSet, Modification, RequiredAssignments, Role, RoleCatalog,
};
pub use reconcile::reconcile;
pub use sync::{plan, run, sync};
