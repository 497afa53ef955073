//! Cluster-side collaborator interfaces for Convoy.
//!
//! The engine reaches the cluster through two object-safe traits:
//! [`KubernetesClient`] (create-or-update apply plus lookups) and
//! [`WorkTransport`] (ManifestWork delivery to remote clusters). The
//! ManifestWork wrapper model and its composition policy live here so both
//! transports and tests share one implementation.

mod error;
mod kube;
pub mod memory;
mod work;

pub use error::{ClusterError, Result};
pub use kube::{KubernetesClient, LookupQuery, SharedKubernetes};
pub use work::{
    build_manifest_work, ManifestWork, ManifestsTemplate, ResourceToApply, SharedWorkTransport,
    WorkMetadata, WorkSpec, WorkTransport, ANNOTATION_GENERATION, WORK_API_VERSION,
};
