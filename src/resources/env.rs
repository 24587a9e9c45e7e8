//! Full test environment composition.
//!
//! Provisions the dependency chain bottom-up: namespace, service account,
//! monitoring config, storage backends, serving runtime, inference services,
//! and finally the TrustyAI instance. Teardown runs strictly in reverse.

use async_trait::async_trait;
use kube::Client;
use tracing::info;

use crate::crd::DeploymentMode;
use crate::resources::{
    InferenceServiceHandle, MariaDbHandle, MinioConnection, MinioHandle, MonitoringHandle,
    NamespaceHandle, ServiceAccountHandle, ServingRuntimeHandle, Teardown, TrustyAIHandle,
    TrustyAIStorage,
};
use crate::Result;

/// A model to deploy as part of the environment
#[derive(Clone, Debug)]
pub struct ModelDeployment {
    /// Inference service name, also the model id in metric requests
    pub name: String,
    /// Artifact path inside the MinIO bucket
    pub storage_path: String,
    /// Deployment mode
    pub mode: DeploymentMode,
}

impl ModelDeployment {
    /// A ModelMesh-deployed ONNX model
    pub fn modelmesh(name: impl Into<String>, storage_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_path: storage_path.into(),
            mode: DeploymentMode::ModelMesh,
        }
    }

    /// A KServe (serverless) deployed ONNX model
    pub fn serverless(name: impl Into<String>, storage_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_path: storage_path.into(),
            mode: DeploymentMode::Serverless,
        }
    }
}

/// What a test class needs provisioned
#[derive(Clone, Debug)]
pub struct EnvSpec {
    /// Namespace to isolate the class in
    pub namespace: String,
    /// Storage configuration for the TrustyAI instance
    pub storage: TrustyAIStorage,
    /// Models to deploy
    pub models: Vec<ModelDeployment>,
}

/// A fully provisioned test environment
pub struct TestEnv {
    /// Cluster client, shared by the harness
    pub client: Client,
    /// The isolation namespace
    pub namespace: NamespaceHandle,
    service_account: ServiceAccountHandle,
    monitoring: MonitoringHandle,
    minio: MinioHandle,
    mariadb: Option<MariaDbHandle>,
    runtime: ServingRuntimeHandle,
    /// Deployed models, in spec order
    pub models: Vec<InferenceServiceHandle>,
    trustyai: TrustyAIHandle,
}

impl TestEnv {
    /// Provision the full dependency chain for a test class.
    ///
    /// Fails fast on the first resource that cannot be acquired; resources
    /// provisioned so far are released by the caller's scope (a namespace
    /// deletion sweeps up everything namespace-scoped regardless).
    pub async fn provision(client: Client, spec: EnvSpec) -> Result<Self> {
        info!(namespace = %spec.namespace, models = spec.models.len(), "provisioning test environment");

        let namespace = NamespaceHandle::provision(&client, &spec.namespace).await?;
        let service_account = ServiceAccountHandle::provision(&client, &namespace.name).await?;
        let monitoring = MonitoringHandle::provision(&client).await?;
        let minio =
            MinioHandle::provision(&client, &namespace.name, MinioConnection::default()).await?;

        let mariadb = match &spec.storage {
            TrustyAIStorage::Database { .. } => {
                Some(MariaDbHandle::provision(&client, &namespace.name).await?)
            }
            TrustyAIStorage::Pvc { .. } => None,
        };

        let runtime =
            ServingRuntimeHandle::provision(&client, &namespace.name, &minio.secret_name).await?;

        // The TrustyAI instance must exist before the models: ModelMesh only
        // wires the payload processor into serving pods created after it.
        let trustyai = TrustyAIHandle::provision(&client, &namespace.name, spec.storage).await?;

        let mut models = Vec::with_capacity(spec.models.len());
        for model in &spec.models {
            models.push(
                InferenceServiceHandle::provision(
                    &client,
                    &runtime,
                    &model.name,
                    &model.storage_path,
                    model.mode,
                )
                .await?,
            );
        }

        info!(namespace = %namespace.name, "test environment ready");
        Ok(Self {
            client,
            namespace,
            service_account,
            monitoring,
            minio,
            mariadb,
            runtime,
            models,
            trustyai,
        })
    }

    /// The deployed model with the given name
    pub fn model(&self, name: &str) -> Option<&InferenceServiceHandle> {
        self.models.iter().find(|m| m.name == name)
    }
}

#[async_trait]
impl Teardown for TestEnv {
    async fn teardown(self) {
        info!(namespace = %self.namespace.name, "tearing down test environment");

        for model in self.models {
            model.release().await;
        }
        self.trustyai.release().await;
        self.runtime.release().await;
        if let Some(mariadb) = self.mariadb {
            mariadb.release().await;
        }
        self.minio.release().await;
        self.service_account.release().await;
        self.namespace.release().await;
        self.monitoring.release().await;
    }
}
