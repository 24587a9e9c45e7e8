//! TrustyAIService custom resource
//!
//! A TrustyAIService instance is the monitored service under test. Its spec
//! selects where observed inference data is persisted (a PVC or a database)
//! and how often scheduled metrics are recomputed.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a TrustyAIService instance
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "trustyai.opendatahub.io",
    version = "v1alpha1",
    kind = "TrustyAIService",
    plural = "trustyaiservices",
    status = "TrustyAIServiceStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TrustyAIServiceSpec {
    /// Where observed inference data is persisted
    pub storage: StorageSpec,

    /// Layout of the persisted data; only meaningful for PVC storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSpec>,

    /// Metric computation scheduling
    pub metrics: MetricsSpec,
}

/// Storage backend selection for a TrustyAIService
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Storage backend kind
    pub format: StorageFormat,

    /// Mount folder for observed data (PVC storage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    /// Requested PVC size (PVC storage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Name of the secret holding database credentials (DATABASE storage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_configurations: Option<String>,
}

/// Supported storage backend kinds
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum StorageFormat {
    /// Persistent volume claim, data stored as flat files
    #[serde(rename = "PVC")]
    Pvc,
    /// Relational database, credentials supplied via a secret
    #[serde(rename = "DATABASE")]
    Database,
}

/// Layout of observed data on PVC storage
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSpec {
    /// Filename the observations are appended to
    pub filename: String,
    /// On-disk format, e.g. `CSV`
    pub format: String,
}

/// Metric computation scheduling
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSpec {
    /// Interval between recomputations of scheduled metrics, e.g. `5s`
    pub schedule: String,
}

/// Status reported by the TrustyAI operator
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrustyAIServiceStatus {
    /// Current lifecycle phase, e.g. `Ready`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Number of ready replicas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Operator-reported conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<super::StatusCondition>,
}
