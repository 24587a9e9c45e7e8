//! HTTP client for the TrustyAI service endpoints.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{SuiteConfig, HTTP_REQUEST_TIMEOUT};
use crate::metrics::{Metric, MetricPayload, MetricResponse, ScheduleResponse};
use crate::poll::{wait_for_resource, PollConfig};
use crate::{Error, Result};

/// Bound for a model to appear in the service's metadata after traffic
const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for one TrustyAI service instance.
///
/// All metric requests of a test class target the instance in that class's
/// namespace; the base URL is resolved once at construction.
pub struct TrustyClient {
    base_url: String,
    http: reqwest::Client,
}

impl TrustyClient {
    /// Client for the TrustyAI instance in the given namespace
    pub fn for_namespace(namespace: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: SuiteConfig::get().trustyai_base_url(namespace),
            http,
        })
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        context: &str,
        body: &B,
    ) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, context, "posting to trustyai service");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::request(context, status.as_u16(), text));
        }
        Ok(text)
    }

    fn check_payload(metric: Metric, payload: &MetricPayload) -> Result<()> {
        if metric.kind() != payload.kind() {
            return Err(Error::PayloadMismatch {
                metric: metric.name().to_string(),
                expected: format!("{:?}", metric.kind()),
                actual: format!("{:?}", payload.kind()),
            });
        }
        Ok(())
    }

    /// Request a synchronous metric computation
    pub async fn request_metric(
        &self,
        metric: Metric,
        payload: &MetricPayload,
    ) -> Result<MetricResponse> {
        Self::check_payload(metric, payload)?;
        let context = format!("request {metric} for {}", payload.model_id());
        let body = self.post_json(&metric.endpoint(), &context, payload).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Request a metric and assert the response declares the requested
    /// metric, case-normalized.
    pub async fn verify_metric_request(
        &self,
        metric: Metric,
        payload: &MetricPayload,
    ) -> Result<MetricResponse> {
        let response = self.request_metric(metric, payload).await?;
        if response.name.to_uppercase() != metric.canonical_name() {
            return Err(Error::unexpected_response(
                format!("request {metric}"),
                format!(
                    "expected metric name {:?}, service declared {:?}",
                    metric.canonical_name(),
                    response.name
                ),
            ));
        }
        info!(metric = %metric, value = ?response.value, "metric request verified");
        Ok(response)
    }

    /// Register a recurring metric computation
    pub async fn schedule_metric(
        &self,
        metric: Metric,
        payload: &MetricPayload,
    ) -> Result<ScheduleResponse> {
        Self::check_payload(metric, payload)?;
        let context = format!("schedule {metric} for {}", payload.model_id());
        let body = self
            .post_json(&metric.schedule_endpoint(), &context, payload)
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Schedule a metric and assert the request was accepted.
    ///
    /// That the schedule is actually exercised is verified indirectly via
    /// the Prometheus check.
    pub async fn verify_metric_scheduling(
        &self,
        metric: Metric,
        payload: &MetricPayload,
    ) -> Result<ScheduleResponse> {
        let response = self.schedule_metric(metric, payload).await?;
        info!(metric = %metric, request_id = %response.request_id, "metric scheduled");
        Ok(response)
    }

    /// Upload baseline/training data, used by drift metrics as reference.
    ///
    /// Returns the number of rows uploaded, for comparison against the
    /// service's metadata.
    pub async fn upload_data(&self, data_path: &Path) -> Result<u64> {
        let body = tokio::fs::read_to_string(data_path).await?;
        let rows = super::inference::input_rows(&serde_json::from_str(&body)?);
        let response = self
            .http
            .post(format!("{}/data/upload", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::request(
                format!("upload {}", data_path.display()),
                status.as_u16(),
                text,
            ));
        }
        info!(path = %data_path.display(), rows, "training data uploaded");
        Ok(rows)
    }

    /// Map raw tensor field identifiers to human-readable names.
    ///
    /// Required before fairness requests referencing names like
    /// "Is Male-Identifying?" are meaningful.
    pub async fn apply_name_mappings(
        &self,
        model_id: &str,
        input_mappings: &BTreeMap<String, String>,
        output_mappings: &BTreeMap<String, String>,
    ) -> Result<()> {
        let payload = serde_json::json!({
            "modelId": model_id,
            "inputMapping": input_mappings,
            "outputMapping": output_mappings,
        });
        self.post_json("/info/names", &format!("name mappings for {model_id}"), &payload)
            .await?;
        info!(model = %model_id, "name mappings applied");
        Ok(())
    }

    /// Metadata of all models the service has observed, keyed by model id
    pub async fn model_metadata(&self) -> Result<BTreeMap<String, Value>> {
        let url = format!("{}/info", self.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::request("model metadata", status.as_u16(), text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Poll until the service has registered the model and recorded
    /// observations for it.
    pub async fn wait_for_model_registered(&self, model_id: &str) -> Result<()> {
        let poll = PollConfig::new(Duration::from_secs(5), REGISTRATION_TIMEOUT);
        let client = self;
        wait_for_resource(&poll, &format!("model {model_id} registered"), move || {
            let model_id = model_id.to_string();
            async move {
                let metadata = client.model_metadata().await?;
                Ok(metadata.get(&model_id).is_some_and(|m| observation_count(m) > 0))
            }
        })
        .await
    }

    /// Assert the service's view of a model: the observation count matches
    /// the rows the harness fed it, and every expected human-readable name
    /// appears in the model's schema mappings.
    pub async fn verify_model_metadata(
        &self,
        model_id: &str,
        expected_observations: u64,
        expected_names: &[&str],
    ) -> Result<()> {
        let context = format!("metadata for {model_id}");
        let metadata = self.model_metadata().await?;
        let entry = metadata.get(model_id).ok_or_else(|| {
            Error::unexpected_response(&*context, "model not present in /info")
        })?;

        let observations = observation_count(entry);
        if observations != expected_observations {
            return Err(Error::unexpected_response(
                context,
                format!(
                    "expected {expected_observations} observations, service reports {observations}"
                ),
            ));
        }

        let names = mapped_names(entry);
        for name in expected_names {
            if !names.contains(name) {
                return Err(Error::unexpected_response(
                    context,
                    format!("mapped name {name:?} missing from the model's schema"),
                ));
            }
        }

        info!(model = %model_id, observations, "model metadata verified");
        Ok(())
    }
}

fn observation_count(metadata: &Value) -> u64 {
    metadata
        .pointer("/data/observations")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// The human-readable names currently applied to a model's input and output
/// schema fields.
fn mapped_names(metadata: &Value) -> std::collections::BTreeSet<&str> {
    ["/data/inputSchema/nameMapping", "/data/outputSchema/nameMapping"]
        .iter()
        .filter_map(|pointer| metadata.pointer(pointer))
        .filter_map(Value::as_object)
        .flat_map(|mapping| mapping.values())
        .filter_map(Value::as_str)
        .collect()
}
