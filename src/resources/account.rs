//! Service account used by the ModelMesh serving pods

use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use tracing::{info, warn};

use crate::Result;

/// Name of the service account the ModelMesh deployment runs under
pub const MODELMESH_SERVICE_ACCOUNT: &str = "modelmesh-serving-sa";

/// Handle to the serving service account
pub struct ServiceAccountHandle {
    /// Service account name
    pub name: String,
    namespace: String,
    client: Client,
}

impl ServiceAccountHandle {
    /// Create the serving service account in the given namespace
    pub async fn provision(client: &Client, namespace: &str) -> Result<Self> {
        let api: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
        let account = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(MODELMESH_SERVICE_ACCOUNT.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        match api.create(&PostParams::default(), &account).await {
            Ok(_) => info!(namespace = %namespace, account = MODELMESH_SERVICE_ACCOUNT, "service account created"),
            Err(kube::Error::Api(e)) if e.code == 409 => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            name: MODELMESH_SERVICE_ACCOUNT.to_string(),
            namespace: namespace.to_string(),
            client: client.clone(),
        })
    }

    /// Delete the service account, best-effort
    pub async fn release(self) {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), &self.namespace);
        if let Err(e) = api.delete(&self.name, &DeleteParams::default()).await {
            warn!(namespace = %self.namespace, account = %self.name, error = %e, "failed to delete service account");
        }
    }
}
