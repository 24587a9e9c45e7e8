//! Custom resource types consumed by the suite
//!
//! These model the subset of each CRD's schema that the harness reads and
//! writes: the TrustyAI service instance under test and the KServe serving
//! resources its models are deployed through. The CRDs themselves are owned
//! by their respective operators; the suite only creates and deletes
//! instances.

mod serving;
mod trustyai_service;

pub use serving::{
    BuiltInAdapter, DeploymentMode, InferenceService, InferenceServiceSpec,
    InferenceServiceStatus, ModelFormat, ModelSpec, PredictorSpec, ServingRuntime,
    ServingRuntimeSpec, StatusCondition, StorageRef, SupportedModelFormat,
};
pub use trustyai_service::{
    DataSpec, MetricsSpec, StorageFormat, StorageSpec, TrustyAIService, TrustyAIServiceSpec,
    TrustyAIServiceStatus,
};
