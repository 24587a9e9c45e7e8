//! The supported fairness and drift metrics and their request payloads.
//!
//! Each metric knows its own endpoint resolution, canonical name and
//! Prometheus query construction. Fairness and drift metrics take different
//! request bodies, so payloads are a tagged variant rather than a free-form
//! map: a mismatched pairing (e.g. a drift payload against a fairness
//! endpoint) is rejected before any request is sent.

use serde::{Deserialize, Serialize};

/// Which family a metric belongs to, determining its required payload fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    /// Compares model outcomes across protected-attribute groups
    Fairness,
    /// Compares live inference inputs against a baseline distribution
    Drift,
}

/// A metric computed by the TrustyAI service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Statistical Parity Difference
    Spd,
    /// Disparate Impact Ratio
    Dir,
    /// Mean-shift drift test
    Meanshift,
    /// Fourier Maximum Mean Discrepancy drift test
    FourierMmd,
    /// Kolmogorov-Smirnov drift test
    KsTest,
    /// Approximate Kolmogorov-Smirnov drift test
    ApproxKsTest,
}

impl Metric {
    /// The fairness metrics
    pub const FAIRNESS: [Metric; 2] = [Metric::Spd, Metric::Dir];

    /// The drift metrics
    pub const DRIFT: [Metric; 4] = [
        Metric::Meanshift,
        Metric::FourierMmd,
        Metric::KsTest,
        Metric::ApproxKsTest,
    ];

    /// Lowercase metric name, as used in endpoint paths and Prometheus
    /// series names
    pub fn name(self) -> &'static str {
        match self {
            Metric::Spd => "spd",
            Metric::Dir => "dir",
            Metric::Meanshift => "meanshift",
            Metric::FourierMmd => "fouriermmd",
            Metric::KsTest => "kstest",
            Metric::ApproxKsTest => "approxkstest",
        }
    }

    /// Canonical name the service reports back in metric responses
    pub fn canonical_name(self) -> String {
        self.name().to_uppercase()
    }

    /// The family this metric belongs to
    pub fn kind(self) -> MetricKind {
        match self {
            Metric::Spd | Metric::Dir => MetricKind::Fairness,
            _ => MetricKind::Drift,
        }
    }

    /// Endpoint for a basic (synchronous) metric request
    pub fn endpoint(self) -> String {
        format!("/metrics/{}", self.name())
    }

    /// Endpoint for registering a recurring (scheduled) computation
    pub fn schedule_endpoint(self) -> String {
        format!("/metrics/{}/request", self.name())
    }

    /// Prometheus instant query matching this metric's series in the given
    /// namespace
    pub fn prometheus_query(self, namespace: &str) -> String {
        format!(r#"trustyai_{}{{namespace="{namespace}"}}"#, self.name())
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Request body for a metric computation, basic or scheduled
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum MetricPayload {
    /// Fairness request: group comparison over a protected attribute
    Fairness(FairnessRequest),
    /// Drift request: comparison against tagged baseline data
    Drift(DriftRequest),
}

impl MetricPayload {
    /// The family this payload is valid for
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricPayload::Fairness(_) => MetricKind::Fairness,
            MetricPayload::Drift(_) => MetricKind::Drift,
        }
    }

    /// The model this payload targets
    pub fn model_id(&self) -> &str {
        match self {
            MetricPayload::Fairness(r) => &r.model_id,
            MetricPayload::Drift(r) => &r.model_id,
        }
    }
}

impl From<FairnessRequest> for MetricPayload {
    fn from(request: FairnessRequest) -> Self {
        MetricPayload::Fairness(request)
    }
}

impl From<DriftRequest> for MetricPayload {
    fn from(request: DriftRequest) -> Self {
        MetricPayload::Drift(request)
    }
}

/// Fairness metric request body.
///
/// Attribute and outcome names refer to the human-readable names applied via
/// name mappings, not the raw tensor field identifiers; requests sent before
/// the mappings are applied will not match any observations.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessRequest {
    /// Name of the model the metric is computed over
    pub model_id: String,
    /// Human-readable name of the protected attribute
    pub protected_attribute: String,
    /// Attribute value identifying the privileged group
    pub privileged_attribute: f64,
    /// Attribute value identifying the unprivileged group
    pub unprivileged_attribute: f64,
    /// Human-readable name of the model output to compare
    pub outcome_name: String,
    /// Output value considered favorable
    pub favorable_outcome: i64,
    /// Number of most recent observations to compute over
    pub batch_size: u32,
}

/// Drift metric request body
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRequest {
    /// Name of the model the metric is computed over
    pub model_id: String,
    /// Tag of the uploaded baseline data to compare against
    pub reference_tag: String,
}

impl DriftRequest {
    /// Data tag under which baseline/training data is uploaded
    pub const TRAINING_TAG: &'static str = "TRAINING";

    /// Drift request against the uploaded training data
    pub fn training(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            reference_tag: Self::TRAINING_TAG.to_string(),
        }
    }
}

/// Response body of a basic metric request
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponse {
    /// Canonical metric name as declared by the service
    pub name: String,
    /// Computed metric value
    #[serde(default)]
    pub value: Option<f64>,
    /// Response timestamp
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    /// Prose definition of the computed value, when the service provides one
    #[serde(default)]
    pub specific_definition: Option<String>,
}

/// Response body of a scheduling request
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    /// Identifier of the registered recurring computation
    pub request_id: String,
    /// Response timestamp
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}
