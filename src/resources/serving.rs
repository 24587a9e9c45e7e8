//! Serving runtime and inference service acquisition.
//!
//! The runtime declares how ONNX models are executed; each inference service
//! references it by name and points at a model artifact behind the MinIO
//! connection secret. An inference service is not usable until its Ready
//! condition holds, which can take several minutes while the runtime pods
//! pull and load the model.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::crd::{
    BuiltInAdapter, DeploymentMode, InferenceService, InferenceServiceSpec, ModelFormat,
    ModelSpec, PredictorSpec, ServingRuntime, ServingRuntimeSpec, StorageRef,
    SupportedModelFormat,
};
use crate::poll::{wait_for_resource, PollConfig};
use crate::{Result, ONNX};

/// Name of the OpenVINO Model Server runtime
pub const OVMS_RUNTIME_NAME: &str = "ovms-1.x";

const OVMS_IMAGE: &str = "quay.io/opendatahub/openvino_model_server:stable";

/// Bound for an inference service to reach the Ready condition
const READY_TIMEOUT: Duration = Duration::from_secs(600);

/// Handle to the provisioned serving runtime
pub struct ServingRuntimeHandle {
    /// Runtime name, referenced by predictor specs
    pub name: String,
    /// Data-connection secret the runtime's models load artifacts through
    pub storage_secret: String,
    namespace: String,
    client: Client,
}

impl ServingRuntimeHandle {
    /// Create the OVMS serving runtime in the given namespace.
    ///
    /// Takes the storage secret name as a dependency: the runtime is useless
    /// (and its models unloadable) without the data connection, so callers
    /// cannot sequence this before the secret exists. Inference services
    /// deployed through the handle reference the same secret.
    pub async fn provision(client: &Client, namespace: &str, storage_secret: &str) -> Result<Self> {
        let api: Api<ServingRuntime> = Api::namespaced(client.clone(), namespace);
        api.create(&PostParams::default(), &ovms_runtime(namespace))
            .await?;
        info!(
            namespace = %namespace,
            runtime = OVMS_RUNTIME_NAME,
            storage_secret = %storage_secret,
            "serving runtime created"
        );

        Ok(Self {
            name: OVMS_RUNTIME_NAME.to_string(),
            storage_secret: storage_secret.to_string(),
            namespace: namespace.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the runtime, best-effort
    pub async fn release(self) {
        let api: Api<ServingRuntime> = Api::namespaced(self.client.clone(), &self.namespace);
        if let Err(e) = api.delete(&self.name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, runtime = %self.name, error = %e, "failed to delete serving runtime");
        }
    }
}

fn ovms_runtime(namespace: &str) -> ServingRuntime {
    let mut runtime = ServingRuntime::new(
        OVMS_RUNTIME_NAME,
        ServingRuntimeSpec {
            supported_model_formats: vec![SupportedModelFormat {
                name: ONNX.to_string(),
                version: Some("1".to_string()),
                auto_select: Some(true),
            }],
            multi_model: Some(true),
            protocol_versions: Some(vec!["grpc-v1".to_string()]),
            grpc_endpoint: Some("port:8085".to_string()),
            grpc_data_endpoint: Some("port:8001".to_string()),
            containers: vec![Container {
                name: "ovms".to_string(),
                image: Some(OVMS_IMAGE.to_string()),
                args: Some(
                    [
                        "--port=8001",
                        "--rest_port=8888",
                        "--config_path=/models/model_config_list.json",
                        "--file_system_poll_wait_seconds=0",
                        "--grpc_bind_address=127.0.0.1",
                        "--rest_bind_address=127.0.0.1",
                    ]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                ),
                resources: Some(k8s_openapi::api::core::v1::ResourceRequirements {
                    requests: Some(BTreeMap::from([
                        ("cpu".to_string(), Quantity("500m".to_string())),
                        ("memory".to_string(), Quantity("1Gi".to_string())),
                    ])),
                    limits: Some(BTreeMap::from([
                        ("cpu".to_string(), Quantity("5".to_string())),
                        ("memory".to_string(), Quantity("1Gi".to_string())),
                    ])),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            built_in_adapter: Some(BuiltInAdapter {
                server_type: "ovms".to_string(),
                runtime_management_port: 8888,
                mem_buffer_bytes: 134_217_728,
                model_loading_timeout_millis: 90_000,
            }),
        },
    );
    runtime.metadata.namespace = Some(namespace.to_string());
    runtime.metadata.annotations = Some(BTreeMap::from([(
        "enable-route".to_string(),
        "true".to_string(),
    )]));
    runtime
}

/// Handle to a deployed model
pub struct InferenceServiceHandle {
    /// Model name, used as the model id in metric requests
    pub name: String,
    /// Namespace the model is deployed in
    pub namespace: String,
    /// How the model is deployed
    pub mode: DeploymentMode,
    /// External URL reported by the serving controller, when exposed
    pub url: Option<String>,
    client: Client,
}

impl InferenceServiceHandle {
    /// Deploy a model through the given runtime, pointing at an artifact
    /// behind the runtime's storage secret, and wait for the Ready condition
    /// (bounded at ten minutes).
    pub async fn provision(
        client: &Client,
        runtime: &ServingRuntimeHandle,
        name: &str,
        storage_path: &str,
        mode: DeploymentMode,
    ) -> Result<Self> {
        let namespace = runtime.namespace.clone();
        let api: Api<InferenceService> = Api::namespaced(client.clone(), &namespace);

        let mut service = InferenceService::new(
            name,
            InferenceServiceSpec {
                predictor: PredictorSpec {
                    model: ModelSpec {
                        model_format: ModelFormat {
                            name: ONNX.to_string(),
                        },
                        runtime: Some(runtime.name.clone()),
                        storage: Some(StorageRef {
                            key: runtime.storage_secret.clone(),
                            path: storage_path.to_string(),
                        }),
                    },
                },
            },
        );
        service.metadata.namespace = Some(namespace.clone());
        service.metadata.annotations = Some(BTreeMap::from([(
            DeploymentMode::annotation_key(),
            mode.as_str().to_string(),
        )]));

        api.create(&PostParams::default(), &service).await?;
        info!(namespace = %namespace, model = %name, mode = mode.as_str(), "inference service created");

        let poll = PollConfig::new(Duration::from_secs(10), READY_TIMEOUT);
        wait_for_resource(
            &poll,
            &format!("inference service {namespace}/{name}"),
            || {
                let api = api.clone();
                let name = name.to_string();
                async move {
                    let got = api.get(&name).await?;
                    Ok(got.status.is_some_and(|s| s.is_ready()))
                }
            },
        )
        .await?;

        let url = api.get(name).await?.status.and_then(|s| s.url);
        info!(namespace = %namespace, model = %name, "inference service ready");

        Ok(Self {
            name: name.to_string(),
            namespace,
            mode,
            url,
            client: client.clone(),
        })
    }

    /// URL the harness sends inference batches to.
    ///
    /// ModelMesh models are reached through the shared REST proxy; KServe
    /// models expose their own URL in status.
    pub fn infer_url(&self) -> String {
        let base = match (self.mode, &self.url) {
            (DeploymentMode::Serverless, Some(url)) => url.trim_end_matches('/').to_string(),
            _ => SuiteConfig::get().modelmesh_base_url(&self.namespace),
        };
        format!("{base}/v2/models/{}/infer", self.name)
    }

    /// Delete the inference service, best-effort
    pub async fn release(self) {
        let api: Api<InferenceService> = Api::namespaced(self.client.clone(), &self.namespace);
        if let Err(e) = api.delete(&self.name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, model = %self.name, error = %e, "failed to delete inference service");
        }
    }
}
