//! KServe serving resources
//!
//! ServingRuntime declares how a model format is executed; InferenceService
//! deploys a model through a runtime. Only the fields the suite populates or
//! inspects are modelled; both schemas are open on the server side.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::KSERVE_API_GROUP;

/// How a model is deployed by KServe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Multiple models multiplexed behind a shared runtime
    ModelMesh,
    /// Dedicated serverless deployment per model
    Serverless,
}

impl DeploymentMode {
    /// Annotation key carrying the deployment mode
    pub fn annotation_key() -> String {
        format!("{KSERVE_API_GROUP}/deploymentMode")
    }

    /// Annotation value for this mode
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::ModelMesh => "ModelMesh",
            DeploymentMode::Serverless => "Serverless",
        }
    }
}

/// Specification for a ServingRuntime
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "serving.kserve.io",
    version = "v1alpha1",
    kind = "ServingRuntime",
    plural = "servingruntimes",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServingRuntimeSpec {
    /// Model formats this runtime can execute
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_model_formats: Vec<SupportedModelFormat>,

    /// Whether multiple models share one runtime deployment (ModelMesh)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_model: Option<bool>,

    /// Protocol versions exposed to clients, e.g. `grpc-v1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_versions: Option<Vec<String>>,

    /// Management gRPC endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_endpoint: Option<String>,

    /// Inference gRPC endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_data_endpoint: Option<String>,

    /// Runtime server containers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<k8s_openapi::api::core::v1::Container>,

    /// ModelMesh adapter configuration for the runtime server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_in_adapter: Option<BuiltInAdapter>,
}

/// A model format a ServingRuntime supports
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupportedModelFormat {
    /// Format name, e.g. `onnx`
    pub name: String,

    /// Format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Whether this runtime is auto-selected for the format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_select: Option<bool>,
}

/// ModelMesh built-in adapter configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuiltInAdapter {
    /// Runtime server type, e.g. `ovms`
    pub server_type: String,
    /// Port of the runtime's management interface
    pub runtime_management_port: i32,
    /// Memory buffer reserved for model loading
    pub mem_buffer_bytes: i64,
    /// Model loading timeout in milliseconds
    pub model_loading_timeout_millis: i64,
}

/// Specification for an InferenceService (a deployed model)
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "serving.kserve.io",
    version = "v1beta1",
    kind = "InferenceService",
    plural = "inferenceservices",
    status = "InferenceServiceStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceSpec {
    /// Predictor configuration
    pub predictor: PredictorSpec,
}

/// Predictor half of an InferenceService
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictorSpec {
    /// Model to serve
    pub model: ModelSpec,
}

/// Model declaration inside a predictor
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// Format of the model artifact
    pub model_format: ModelFormat,

    /// Name of the ServingRuntime executing this model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Pointer to the model artifact in object storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageRef>,
}

/// Model artifact format
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelFormat {
    /// Format name, e.g. `onnx`
    pub name: String,
}

/// Reference into object storage via a connection secret
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageRef {
    /// Name of the secret holding the connection coordinates
    pub key: String,
    /// Path of the model artifact inside the bucket
    pub path: String,
}

/// Status reported by the serving controller
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceStatus {
    /// Controller-reported conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StatusCondition>,

    /// External URL of the deployed model, when exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InferenceServiceStatus {
    /// Whether the service has reached the Ready condition
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.type_ == "Ready" && c.status == "True")
    }
}

/// A single status condition, shared across the CRDs the suite inspects
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    /// Condition type, e.g. `Ready`
    #[serde(rename = "type")]
    pub type_: String,

    /// Condition status: `True`, `False` or `Unknown`
    pub status: String,

    /// Machine-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_versions() {
        use kube::Resource;
        assert_eq!(ServingRuntime::api_version(&()), "serving.kserve.io/v1alpha1");
        assert_eq!(InferenceService::api_version(&()), "serving.kserve.io/v1beta1");
    }

    #[test]
    fn test_deployment_mode_annotation() {
        assert_eq!(DeploymentMode::annotation_key(), "serving.kserve.io/deploymentMode");
        assert_eq!(DeploymentMode::ModelMesh.as_str(), "ModelMesh");
        assert_eq!(DeploymentMode::Serverless.as_str(), "Serverless");
    }

    #[test]
    fn test_predictor_serializes_to_kserve_schema() {
        let spec = InferenceServiceSpec {
            predictor: PredictorSpec {
                model: ModelSpec {
                    model_format: ModelFormat {
                        name: "onnx".to_string(),
                    },
                    runtime: Some("ovms-1.x".to_string()),
                    storage: Some(StorageRef {
                        key: "aws-connection-minio-data-connection".to_string(),
                        path: "onnx/loan_model_alpha_august.onnx".to_string(),
                    }),
                },
            },
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "predictor": {
                    "model": {
                        "modelFormat": {"name": "onnx"},
                        "runtime": "ovms-1.x",
                        "storage": {
                            "key": "aws-connection-minio-data-connection",
                            "path": "onnx/loan_model_alpha_august.onnx",
                        },
                    }
                }
            })
        );
    }

    #[test]
    fn test_ready_condition_detection() {
        let mut status = InferenceServiceStatus::default();
        assert!(!status.is_ready());

        status.conditions.push(StatusCondition {
            type_: "PredictorReady".to_string(),
            status: "True".to_string(),
            ..Default::default()
        });
        assert!(!status.is_ready());

        status.conditions.push(StatusCondition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            ..Default::default()
        });
        assert!(status.is_ready());
    }

    #[test]
    fn test_status_parses_controller_output() {
        let body = r#"{
            "conditions": [
                {"type": "Ready", "status": "False", "reason": "Waiting", "message": "loading"}
            ],
            "url": "https://demo-loan-nn-onnx-alpha.test-namespace.example.com"
        }"#;
        let status: InferenceServiceStatus = serde_json::from_str(body).unwrap();
        assert!(!status.is_ready());
        assert!(status.url.unwrap().contains("demo-loan-nn-onnx-alpha"));
    }
}
