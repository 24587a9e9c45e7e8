//! MinIO storage backend - the pod + service + secret triad that serves
//! model artifacts.
//!
//! The connection secret must exist before any inference service that
//! references it, because the ModelMesh controller resolves the storage key
//! at admission time. Connection coordinates arrive base64-encoded, exactly
//! as they appear in a data-connection manifest, and are decoded into the
//! secret's byte values here.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, Secret, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::poll::{wait_for_resource, PollConfig};
use crate::resources::pod_is_ready;
use crate::Result;

/// Name shared by the MinIO pod and service
const MINIO: &str = "minio";

/// MinIO image with the example model artifacts baked in
const MINIO_IMAGE: &str = "quay.io/trustyai/modelmesh-minio-examples:gauss";

/// Name of the data-connection secret referenced by inference services
const MINIO_SECRET: &str = "aws-connection-minio-data-connection";

/// Object storage port
const MINIO_PORT: i32 = 9000;

/// Bound for the MinIO pod to become Ready
const READY_TIMEOUT: Duration = Duration::from_secs(120);

/// Base64-encoded object-storage connection coordinates, as found in a
/// data-connection manifest.
#[derive(Clone, Debug)]
pub struct MinioConnection {
    /// Access key id
    pub access_key_id: String,
    /// Default region
    pub default_region: String,
    /// Bucket holding the model artifacts
    pub bucket: String,
    /// Endpoint URL inside the namespace
    pub endpoint: String,
    /// Secret access key
    pub secret_access_key: String,
}

impl Default for MinioConnection {
    /// Dummy coordinates matching the baked-in example credentials
    fn default() -> Self {
        Self {
            access_key_id: "VEhFQUNDRVNTS0VZ".to_string(),
            default_region: "dXMtc291dGg=".to_string(),
            bucket: "bW9kZWxtZXNoLWV4YW1wbGUtbW9kZWxz".to_string(),
            endpoint: "aHR0cDovL21pbmlvOjkwMDA=".to_string(),
            secret_access_key: "VEhFU0VDUkVUS0VZ".to_string(),
        }
    }
}

impl MinioConnection {
    fn secret_data(&self) -> Result<BTreeMap<String, ByteString>> {
        let mut data = BTreeMap::new();
        for (key, value) in [
            ("AWS_ACCESS_KEY_ID", &self.access_key_id),
            ("AWS_DEFAULT_REGION", &self.default_region),
            ("AWS_S3_BUCKET", &self.bucket),
            ("AWS_S3_ENDPOINT", &self.endpoint),
            ("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
        ] {
            data.insert(key.to_string(), ByteString(STANDARD.decode(value)?));
        }
        Ok(data)
    }
}

/// Handle to the provisioned storage backend triad
pub struct MinioHandle {
    /// Name of the data-connection secret, referenced by predictor storage keys
    pub secret_name: String,
    namespace: String,
    client: Client,
}

impl MinioHandle {
    /// Create the MinIO pod, service and connection secret, waiting for the
    /// pod to become Ready before returning.
    pub async fn provision(
        client: &Client,
        namespace: &str,
        connection: MinioConnection,
    ) -> Result<Self> {
        let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
        let services: Api<Service> = Api::namespaced(client.clone(), namespace);
        let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

        // The secret first: everything else references it by name.
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(MINIO_SECRET.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    "opendatahub.io/dashboard".to_string(),
                    "true".to_string(),
                )])),
                annotations: Some(BTreeMap::from([
                    (
                        "opendatahub.io/connection-type".to_string(),
                        "s3".to_string(),
                    ),
                    (
                        "openshift.io/display-name".to_string(),
                        "Minio Data Connection".to_string(),
                    ),
                ])),
                ..Default::default()
            },
            type_: Some("Opaque".to_string()),
            data: Some(connection.secret_data()?),
            ..Default::default()
        };
        secrets.create(&PostParams::default(), &secret).await?;

        let labels = BTreeMap::from([("app".to_string(), MINIO.to_string())]);

        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(MINIO.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: MINIO.to_string(),
                    image: Some(MINIO_IMAGE.to_string()),
                    ports: Some(vec![ContainerPort {
                        container_port: MINIO_PORT,
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
                name: Some(MINIO.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(labels),
                ports: Some(vec![ServicePort {
                    port: MINIO_PORT,
                    target_port: Some(IntOrString::Int(MINIO_PORT)),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        services.create(&PostParams::default(), &service).await?;

        let poll = PollConfig::new(Duration::from_secs(5), READY_TIMEOUT);
        wait_for_resource(&poll, &format!("minio pod {namespace}/{MINIO}"), || {
            let pods = pods.clone();
            async move { Ok(pod_is_ready(&pods.get(MINIO).await?)) }
        })
        .await?;

        info!(namespace = %namespace, "minio storage backend ready");
        Ok(Self {
            secret_name: MINIO_SECRET.to_string(),
            namespace: namespace.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the triad, best-effort
    pub async fn release(self) {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let services: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);

        if let Err(e) = services.delete(MINIO, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete minio service");
        }
        if let Err(e) = pods.delete(MINIO, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete minio pod");
        }
        if let Err(e) = secrets.delete(&self.secret_name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, error = %e, "failed to delete minio secret");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The dummy coordinates must decode to the plaintext values the MinIO
    /// example image is provisioned with.
    #[test]
    fn test_default_connection_decodes_to_example_credentials() {
        let data = MinioConnection::default().secret_data().unwrap();

        let get = |key: &str| String::from_utf8(data[key].0.clone()).unwrap();
        assert_eq!(get("AWS_ACCESS_KEY_ID"), "THEACCESSKEY");
        assert_eq!(get("AWS_DEFAULT_REGION"), "us-south");
        assert_eq!(get("AWS_S3_BUCKET"), "modelmesh-example-models");
        assert_eq!(get("AWS_S3_ENDPOINT"), "http://minio:9000");
        assert_eq!(get("AWS_SECRET_ACCESS_KEY"), "THESECRETKEY");
    }

    #[test]
    fn test_malformed_coordinates_are_rejected() {
        let connection = MinioConnection {
            endpoint: "not base64 at all!".to_string(),
            ..Default::default()
        };
        assert!(connection.secret_data().is_err());
    }
}
