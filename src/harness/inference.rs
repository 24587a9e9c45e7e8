//! Inference traffic replay and ModelMesh registration wait.

use std::path::Path;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{debug, info};

use crate::config::HTTP_REQUEST_TIMEOUT;
use crate::poll::{wait_for_resource, PollConfig};
use crate::resources::{pod_is_ready, InferenceServiceHandle};
use crate::{Error, Result};

/// Label selecting the shared ModelMesh serving pods in a namespace
const MODELMESH_POD_SELECTOR: &str = "modelmesh-service=modelmesh-serving";

/// Bound for the ModelMesh serving pods to come up and pass readiness
const REGISTERED_TIMEOUT: Duration = Duration::from_secs(180);

/// Number of observation rows a request or upload body carries.
///
/// Both the KServe-v2 inference shape (`inputs` at the top level) and the
/// upload shape (`inputs` nested under `request`) put the row count in the
/// leading dimension of the first input tensor.
pub(crate) fn input_rows(body: &serde_json::Value) -> u64 {
    body.pointer("/inputs/0/shape/0")
        .or_else(|| body.pointer("/request/inputs/0/shape/0"))
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

/// Replay a corpus of request batches against a model endpoint, sequentially,
/// to populate the monitored service's observation history.
///
/// `data_path` may be a directory of `*.json` batch files (replayed in name
/// order) or a single batch file. Returns the total number of observation
/// rows sent, for comparison against the service's metadata.
pub async fn send_data_to_inference_service(
    model: &InferenceServiceHandle,
    data_path: &Path,
) -> Result<u64> {
    let http = reqwest::Client::builder()
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()?;
    let url = model.infer_url();

    let mut batches = Vec::new();
    if data_path.is_dir() {
        let mut entries = tokio::fs::read_dir(data_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                batches.push(path);
            }
        }
        batches.sort();
    } else {
        batches.push(data_path.to_path_buf());
    }

    let mut rows = 0;
    for batch in &batches {
        let body = tokio::fs::read_to_string(batch).await?;
        rows += input_rows(&serde_json::from_str(&body)?);
        debug!(model = %model.name, batch = %batch.display(), "sending inference batch");

        let response = http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::request(
                format!("infer {} with {}", model.name, batch.display()),
                status.as_u16(),
                text,
            ));
        }
    }

    info!(model = %model.name, batches = batches.len(), rows, "inference traffic sent");
    Ok(rows)
}

/// Wait until the shared ModelMesh serving pods in the namespace exist and
/// are Ready.
///
/// The pods are only created once an inference service targets the runtime,
/// and they restart when the TrustyAI payload processor is wired in, so this
/// must be polled rather than checked once.
pub async fn wait_for_modelmesh_pods_registered(client: &Client, namespace: &str) -> Result<()> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = ListParams::default().labels(MODELMESH_POD_SELECTOR);

    let poll = PollConfig::new(Duration::from_secs(10), REGISTERED_TIMEOUT);
    wait_for_resource(
        &poll,
        &format!("modelmesh serving pods in {namespace}"),
        move || {
            let api = api.clone();
            let params = params.clone();
            async move {
                let pods = api.list(&params).await?;
                Ok(!pods.items.is_empty() && pods.items.iter().all(pod_is_ready))
            }
        },
    )
    .await
}
