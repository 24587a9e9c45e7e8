//! Scoped acquisition and release of cluster resources
//!
//! Each resource type exposes a `provision(...) -> handle` constructor that
//! blocks until the resource's readiness condition holds (or fails with
//! [`crate::Error::ResourceTimeout`]) and a `release(self)` that deletes the
//! resource best-effort: release failures are logged, never propagated, so a
//! teardown problem cannot mask the original test outcome.
//!
//! Ordering constraints are expressed as constructor parameters: an inference
//! service takes the runtime and storage-secret handles it depends on, so a
//! resource cannot be acquired before its dependencies. [`TestEnv`] composes
//! the full dependency chain bottom-up and tears it down in reverse, and
//! [`run_scoped`] guarantees the teardown runs on every exit path.

mod account;
mod db;
mod env;
mod minio;
mod monitoring;
mod namespace;
mod scope;
mod serving;
mod trustyai;

pub use account::ServiceAccountHandle;
pub use db::MariaDbHandle;
pub use env::{EnvSpec, ModelDeployment, TestEnv};
pub use minio::{MinioConnection, MinioHandle};
pub use monitoring::MonitoringHandle;
pub use namespace::NamespaceHandle;
pub use scope::{run_scoped, Teardown};
pub use serving::{InferenceServiceHandle, ServingRuntimeHandle, OVMS_RUNTIME_NAME};
pub use trustyai::{TrustyAIHandle, TrustyAIStorage};

/// Whether a pod has reached the Ready condition
pub(crate) fn pod_is_ready(pod: &k8s_openapi::api::core::v1::Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}
