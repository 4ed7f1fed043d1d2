//! One-way synchronisation of local countries from the external dataset.

mod job;
mod reconciler;
mod transform;

pub use job::SyncJob;
pub use reconciler::{apply_snapshot, reconcile, SyncReport};
pub use transform::{transform, SnapshotEntry};
