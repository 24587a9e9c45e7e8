//! TrustyAI service instance - the monitored service under test.

use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::crd::{
    DataSpec, MetricsSpec, StorageFormat, StorageSpec, TrustyAIService, TrustyAIServiceSpec,
};
use crate::poll::{wait_for_resource, PollConfig};
use crate::{Result, TRUSTYAI_SERVICE};

/// Interval at which the service recomputes scheduled metrics
const METRICS_SCHEDULE_INTERVAL: &str = "5s";

/// Bound for the service deployment to come up
const READY_TIMEOUT: Duration = Duration::from_secs(300);

/// Storage configuration for the monitored service
#[derive(Clone, Debug)]
pub enum TrustyAIStorage {
    /// Observed data appended to a flat file on a PVC
    Pvc {
        /// Mount folder
        folder: String,
        /// Requested volume size
        size: String,
        /// Data filename
        filename: String,
        /// On-disk format
        format: String,
    },
    /// Observed data written to a relational database
    Database {
        /// Name of the credentials secret
        credentials_secret: String,
    },
}

impl TrustyAIStorage {
    /// The standard PVC layout used across the suite
    pub fn pvc() -> Self {
        TrustyAIStorage::Pvc {
            folder: "/inputs".to_string(),
            size: "1Gi".to_string(),
            filename: "data.csv".to_string(),
            format: "CSV".to_string(),
        }
    }

    /// Database storage wired to the suite's MariaDB credentials secret
    pub fn database() -> Self {
        TrustyAIStorage::Database {
            credentials_secret: super::db::DB_CREDENTIALS_SECRET.to_string(),
        }
    }

    fn into_spec(self) -> TrustyAIServiceSpec {
        let (storage, data) = match self {
            TrustyAIStorage::Pvc {
                folder,
                size,
                filename,
                format,
            } => (
                StorageSpec {
                    format: StorageFormat::Pvc,
                    folder: Some(folder),
                    size: Some(size),
                    database_configurations: None,
                },
                Some(DataSpec { filename, format }),
            ),
            TrustyAIStorage::Database { credentials_secret } => (
                StorageSpec {
                    format: StorageFormat::Database,
                    folder: None,
                    size: None,
                    database_configurations: Some(credentials_secret),
                },
                None,
            ),
        };

        TrustyAIServiceSpec {
            storage,
            data,
            metrics: MetricsSpec {
                schedule: METRICS_SCHEDULE_INTERVAL.to_string(),
            },
        }
    }
}

/// Handle to the provisioned TrustyAI service instance
pub struct TrustyAIHandle {
    /// Instance name
    pub name: String,
    namespace: String,
    client: Client,
}

impl TrustyAIHandle {
    /// Create the TrustyAIService custom resource and wait for the operator
    /// to bring its deployment up.
    pub async fn provision(
        client: &Client,
        namespace: &str,
        storage: TrustyAIStorage,
    ) -> Result<Self> {
        let api: Api<TrustyAIService> = Api::namespaced(client.clone(), namespace);

        let mut service = TrustyAIService::new(TRUSTYAI_SERVICE, storage.into_spec());
        service.metadata.namespace = Some(namespace.to_string());
        api.create(&PostParams::default(), &service).await?;
        info!(namespace = %namespace, "trustyai service created");

        let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
        let poll = PollConfig::new(Duration::from_secs(5), READY_TIMEOUT);
        wait_for_resource(
            &poll,
            &format!("trustyai service {namespace}/{TRUSTYAI_SERVICE}"),
            || {
                let deployments = deployments.clone();
                async move {
                    match deployments.get(TRUSTYAI_SERVICE).await {
                        Ok(deployment) => Ok(deployment
                            .status
                            .and_then(|s| s.ready_replicas)
                            .unwrap_or(0)
                            > 0),
                        // The operator has not created the deployment yet.
                        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
                        Err(e) => Err(e.into()),
                    }
                }
            },
        )
        .await?;

        info!(namespace = %namespace, "trustyai service ready");
        Ok(Self {
            name: TRUSTYAI_SERVICE.to_string(),
            namespace: namespace.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the instance, best-effort
    pub async fn release(self) {
        let api: Api<TrustyAIService> = Api::namespaced(self.client.clone(), &self.namespace);
        if let Err(e) = api.delete(&self.name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete trustyai service");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pvc_storage_builds_full_data_spec() {
        let spec = TrustyAIStorage::pvc().into_spec();
        assert_eq!(spec.storage.format, StorageFormat::Pvc);
        assert_eq!(spec.storage.folder.as_deref(), Some("/inputs"));
        assert_eq!(spec.data.as_ref().unwrap().filename, "data.csv");
        assert_eq!(spec.metrics.schedule, "5s");
    }

    #[test]
    fn test_database_storage_omits_pvc_fields() {
        let spec = TrustyAIStorage::Database {
            credentials_secret: "db-credentials".to_string(),
        }
        .into_spec();
        assert_eq!(spec.storage.format, StorageFormat::Database);
        assert_eq!(
            spec.storage.database_configurations.as_deref(),
            Some("db-credentials")
        );
        assert!(spec.storage.folder.is_none());
        assert!(spec.data.is_none());
    }
}
