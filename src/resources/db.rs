//! MariaDB backend for database-storage TrustyAI instances.
//!
//! Mirrors the MinIO triad: a pod, a service and a credentials secret. The
//! secret's keys follow the TrustyAI operator's `databaseConfigurations`
//! contract; the same values configure the MariaDB container so the two
//! sides agree by construction.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, Pod, PodSpec, Secret, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::poll::{wait_for_resource, PollConfig};
use crate::resources::pod_is_ready;
use crate::Result;

const MARIADB: &str = "mariadb";
const MARIADB_IMAGE: &str = "quay.io/sclorg/mariadb-105-c9s:latest";
const MARIADB_PORT: i32 = 3306;

/// Name of the credentials secret referenced by `databaseConfigurations`
pub const DB_CREDENTIALS_SECRET: &str = "db-credentials";

const DB_NAME: &str = "trustyai_database";
const DB_USERNAME: &str = "trustyai";
const DB_PASSWORD: &str = "trustyai-password";

/// Bound for the MariaDB pod to become Ready
const READY_TIMEOUT: Duration = Duration::from_secs(180);

/// Handle to the provisioned database triad
pub struct MariaDbHandle {
    /// Name of the credentials secret, referenced by the TrustyAI spec
    pub secret_name: String,
    namespace: String,
    client: Client,
}

impl MariaDbHandle {
    /// Create the credentials secret, pod and service, waiting for the pod
    /// to become Ready before returning.
    pub async fn provision(client: &Client, namespace: &str) -> Result<Self> {
        let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let services: Api<Service> = Api::namespaced(client.clone(), namespace);
        let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(DB_CREDENTIALS_SECRET.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            type_: Some("Opaque".to_string()),
            string_data: Some(BTreeMap::from([
                ("databaseKind".to_string(), MARIADB.to_string()),
                ("databaseUsername".to_string(), DB_USERNAME.to_string()),
                ("databasePassword".to_string(), DB_PASSWORD.to_string()),
                ("databaseService".to_string(), MARIADB.to_string()),
                ("databasePort".to_string(), MARIADB_PORT.to_string()),
                ("databaseName".to_string(), DB_NAME.to_string()),
            ])),
            ..Default::default()
        };
        secrets.create(&PostParams::default(), &secret).await?;

        let labels = BTreeMap::from([("app".to_string(), MARIADB.to_string())]);

        let env = [
            ("MYSQL_USER", DB_USERNAME),
            ("MYSQL_PASSWORD", DB_PASSWORD),
            ("MYSQL_DATABASE", DB_NAME),
        ]
        .into_iter()
        .map(|(name, value)| EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        })
        .collect();

        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(MARIADB.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: MARIADB.to_string(),
                    image: Some(MARIADB_IMAGE.to_string()),
                    env: Some(env),
                    ports: Some(vec![ContainerPort {
                        container_port: MARIADB_PORT,
                        ..Default::default()
                    }]),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        pods.create(&PostParams::default(), &pod).await?;

        let service = Service {
            metadata: ObjectMeta {
                name: Some(MARIADB.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(labels),
                ports: Some(vec![ServicePort {
                    port: MARIADB_PORT,
                    target_port: Some(IntOrString::Int(MARIADB_PORT)),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        services.create(&PostParams::default(), &service).await?;

        let poll = PollConfig::new(Duration::from_secs(5), READY_TIMEOUT);
        wait_for_resource(&poll, &format!("mariadb pod {namespace}/{MARIADB}"), || {
            let pods = pods.clone();
            async move { Ok(pod_is_ready(&pods.get(MARIADB).await?)) }
        })
        .await?;

        info!(namespace = %namespace, "mariadb backend ready");
        Ok(Self {
            secret_name: DB_CREDENTIALS_SECRET.to_string(),
            namespace: namespace.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the triad, best-effort
    pub async fn release(self) {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);

        if let Err(e) = services.delete(MARIADB, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete mariadb service");
        }
        if let Err(e) = pods.delete(MARIADB, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete mariadb pod");
        }
        if let Err(e) = secrets.delete(&self.secret_name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete mariadb secret");
        }
    }
}
