//! Namespace acquisition - the isolation boundary for a test class.
//!
//! Each test class provisions its own namespace, so no two classes mutate the
//! same namespace-scoped objects. Deletion gets an extended bound because the
//! underlying resources (model pods, PVCs) must unwind first.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::poll::{wait_for, wait_for_resource, PollConfig};
use crate::{Result, MODELMESH_ENABLED_LABEL};

/// Bound for the namespace to reach the Active phase
const ACTIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Bound for namespace deletion to complete
const DELETE_TIMEOUT: Duration = Duration::from_secs(600);

/// Handle to a provisioned test namespace
pub struct NamespaceHandle {
    /// Namespace name
    pub name: String,
    client: Client,
}

impl NamespaceHandle {
    /// Create the namespace with the ModelMesh admission label and wait for
    /// it to reach the Active phase.
    ///
    /// A namespace left over from an interrupted run is reused rather than
    /// treated as a failure.
    pub async fn provision(client: &Client, name: &str) -> Result<Self> {
        let api: Api<Namespace> = Api::all(client.clone());

        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(BTreeMap::from([(
                    MODELMESH_ENABLED_LABEL.to_string(),
                    "true".to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };

        match api.create(&PostParams::default(), &namespace).await {
            Ok(_) => info!(namespace = %name, "namespace created"),
            Err(kube::Error::Api(e)) if e.code == 409 => {
                info!(namespace = %name, "namespace already exists, reusing")
            }
            Err(e) => return Err(e.into()),
        }

        let poll = PollConfig::new(Duration::from_secs(2), ACTIVE_TIMEOUT);
        wait_for_resource(&poll, &format!("namespace {name}"), || {
            let api = api.clone();
            let name = name.to_string();
            async move {
                let got = api.get(&name).await?;
                Ok(got.status.and_then(|s| s.phase).as_deref() == Some("Active"))
            }
        })
        .await?;

        Ok(Self {
            name: name.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the namespace and wait for the deletion to complete.
    ///
    /// Failures are logged, not propagated.
    pub async fn release(self) {
        let api: Api<Namespace> = Api::all(self.client.clone());
        info!(namespace = %self.name, "deleting namespace");

        if let Err(e) = api.delete(&self.name, &DeleteParams::default()).await {
            warn!(namespace = %self.name, error = %e, "failed to delete namespace");
            return;
        }

        let poll = PollConfig::new(Duration::from_secs(5), DELETE_TIMEOUT);
        let gone = wait_for(&poll, &format!("namespace {} deleted", self.name), || {
            let api = api.clone();
            let name = self.name.clone();
            async move {
                match api.get(&name).await {
                    Ok(_) => Ok(false),
                    Err(kube::Error::Api(e)) if e.code == 404 => Ok(true),
                    Err(e) => Err(e.into()),
                }
            }
        })
        .await;

        match gone {
            Ok(true) => info!(namespace = %self.name, "namespace deleted"),
            Ok(false) => {
                warn!(namespace = %self.name, timeout = ?DELETE_TIMEOUT, "namespace deletion did not complete")
            }
            Err(e) => warn!(namespace = %self.name, error = %e, "error waiting for namespace deletion"),
        }
    }
}
