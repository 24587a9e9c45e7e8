//! User-workload monitoring configuration.
//!
//! Scheduled TrustyAI metrics only reach Prometheus if user-workload
//! monitoring is enabled on the cluster. These two config maps live in fixed
//! OpenShift namespaces and are shared cluster state: when one already
//! exists it is left alone on both provision and release.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::Result;

const CLUSTER_MONITORING_NAMESPACE: &str = "openshift-monitoring";
const CLUSTER_MONITORING_CONFIG: &str = "cluster-monitoring-config";
const USER_WORKLOAD_NAMESPACE: &str = "openshift-user-workload-monitoring";
const USER_WORKLOAD_CONFIG: &str = "user-workload-monitoring-config";

/// Handle to the pair of monitoring config maps
pub struct MonitoringHandle {
    client: Client,
    /// Which of the two maps this suite created (and therefore owns)
    owned: Vec<(&'static str, &'static str)>,
}

impl MonitoringHandle {
    /// Enable user-workload monitoring and Prometheus debug logging
    pub async fn provision(client: &Client) -> Result<Self> {
        let mut handle = Self {
            client: client.clone(),
            owned: Vec::new(),
        };

        let cluster_config =
            serde_yaml::to_string(&serde_json::json!({"enableUserWorkload": "true"}))?;
        handle
            .create_config_map(CLUSTER_MONITORING_NAMESPACE, CLUSTER_MONITORING_CONFIG, cluster_config)
            .await?;

        let user_workload_config = serde_yaml::to_string(&serde_json::json!({
            "prometheus": {"logLevel": "debug", "retention": "15d"}
        }))?;
        handle
            .create_config_map(USER_WORKLOAD_NAMESPACE, USER_WORKLOAD_CONFIG, user_workload_config)
            .await?;

        Ok(handle)
    }

    async fn create_config_map(
        &mut self,
        namespace: &'static str,
        name: &'static str,
        config_yaml: String,
    ) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([("config.yaml".to_string(), config_yaml)])),
            ..Default::default()
        };

        match api.create(&PostParams::default(), &config_map).await {
            Ok(_) => {
                info!(namespace, name, "monitoring config map created");
                self.owned.push((namespace, name));
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 409 => {
                info!(namespace, name, "monitoring config map already present, leaving it");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the config maps this suite created, best-effort
    pub async fn release(self) {
        for (namespace, name) in self.owned {
            let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
            if let Err(e) = api.delete(name, &DeleteParams::default()).await {
                warn!(namespace, name, error = %e, "failed to delete monitoring config map");
            }
        }
    }
}
