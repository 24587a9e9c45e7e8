//! TrustyAI e2e - verification harness for a deployed model-monitoring service
//!
//! This crate drives end-to-end tests against a TrustyAI service running on a
//! Kubernetes/OpenShift cluster, together with ModelMesh/KServe model serving
//! and a Prometheus metrics backend. It has two halves:
//!
//! - A **resource lifecycle manager** ([`resources`]) that provisions the
//!   cluster dependencies of a test bottom-up (namespace, service account,
//!   monitoring config, object storage, serving runtime, inference services,
//!   TrustyAI service) and guarantees teardown in reverse order on every exit
//!   path, including assertion failures.
//!
//! - A **verification harness** ([`harness`]) that issues HTTP requests to the
//!   TrustyAI metric endpoints and to Prometheus, polling until an expected
//!   condition holds or a deadline elapses.
//!
//! The actual test suite lives under `tests/` and composes these two halves.
//! Tests that require a live cluster are ignored by default:
//!
//! ```bash
//! cargo test --test e2e -- --ignored
//! ```
//!
//! # Modules
//!
//! - [`config`] - Suite-wide configuration resolved once from the environment
//! - [`crd`] - Custom resource types (TrustyAIService, ServingRuntime, InferenceService)
//! - [`error`] - Error types for provisioning and verification failures
//! - [`harness`] - HTTP verification, inference traffic replay, Prometheus polling
//! - [`metrics`] - The supported fairness and drift metrics and their payloads
//! - [`poll`] - Bounded polling against eventually-consistent external systems
//! - [`resources`] - Scoped acquisition and release of cluster resources

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod poll;
pub mod resources;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Name of the TrustyAI service instance created in each test namespace
pub const TRUSTYAI_SERVICE: &str = "trustyai-service";

/// Namespace label that enables the ModelMesh admission controller
pub const MODELMESH_ENABLED_LABEL: &str = "modelmesh-enabled";

/// API group of KServe serving resources, used for deployment-mode annotations
pub const KSERVE_API_GROUP: &str = "serving.kserve.io";

/// ONNX model format name, as declared by serving runtimes and predictors
pub const ONNX: &str = "onnx";
