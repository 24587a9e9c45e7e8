//! Error types for the e2e harness

use std::time::Duration;

use thiserror::Error;

/// Main error type for provisioning and verification operations
///
/// The taxonomy follows the three failure modes of the suite:
///
/// - Provisioning failures: a dependency resource never reached its readiness
///   condition ([`Error::ResourceTimeout`]) or the Kubernetes API rejected an
///   operation ([`Error::Kube`]).
/// - Request failures: an HTTP call to the monitored service returned a
///   non-success status or a malformed body ([`Error::Request`],
///   [`Error::UnexpectedResponse`]).
/// - Observation timeouts: an expected eventual condition was never observed
///   within the poll deadline ([`Error::MetricNotObserved`]).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// HTTP transport error against the monitored service or a model endpoint
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Prometheus query API error
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus_http_query::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error (monitoring config maps)
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Base64 decoding error (storage connection secrets)
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Filesystem error while reading model data batches
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A resource never reached its readiness condition within its bound
    #[error("{resource} not ready within {timeout:?}")]
    ResourceTimeout {
        /// Human-readable description of the resource that timed out
        resource: String,
        /// The bound that elapsed
        timeout: Duration,
    },

    /// A scheduled metric never appeared in the metrics backend
    #[error("no numeric series observed for query {query:?} within {timeout:?}")]
    MetricNotObserved {
        /// The Prometheus query that was polled
        query: String,
        /// The poll deadline that elapsed
        timeout: Duration,
    },

    /// The monitored service returned a non-success status
    #[error("request failed ({context}): status {status}, body: {body}")]
    Request {
        /// What the request was trying to do
        context: String,
        /// HTTP status code returned
        status: u16,
        /// Response body, captured for diagnosis
        body: String,
    },

    /// A metric was paired with a payload of the wrong family, caught
    /// before any request is sent
    #[error("{metric} is a {expected} metric but the payload is {actual}")]
    PayloadMismatch {
        /// The metric that was requested
        metric: String,
        /// The family the metric belongs to
        expected: String,
        /// The family of the supplied payload
        actual: String,
    },

    /// The monitored service returned a success status but an unexpected body
    #[error("unexpected response ({context}): {detail}")]
    UnexpectedResponse {
        /// What the request was trying to do
        context: String,
        /// What was wrong with the body
        detail: String,
    },
}

impl Error {
    /// Create a resource timeout error for the given resource description
    pub fn resource_timeout(resource: impl Into<String>, timeout: Duration) -> Self {
        Self::ResourceTimeout {
            resource: resource.into(),
            timeout,
        }
    }

    /// Create a metric-not-observed error for the given query
    pub fn metric_not_observed(query: impl Into<String>, timeout: Duration) -> Self {
        Self::MetricNotObserved {
            query: query.into(),
            timeout,
        }
    }

    /// Create a request failure error with the captured response
    pub fn request(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Request {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    /// Create an unexpected-response error with the given detail
    pub fn unexpected_response(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A provisioning failure names the resource and the bound that elapsed,
    /// so a failed test class points directly at the dependency that hung.
    #[test]
    fn resource_timeout_names_the_resource_and_bound() {
        let err = Error::resource_timeout(
            "inference service test-namespace/demo-loan-nn-onnx-alpha",
            Duration::from_secs(600),
        );
        let msg = err.to_string();
        assert!(msg.contains("demo-loan-nn-onnx-alpha"));
        assert!(msg.contains("600s"));
    }

    /// An observation timeout is distinct from a request failure: the query
    /// was reachable, the data just never arrived.
    #[test]
    fn metric_not_observed_carries_the_query() {
        let err = Error::metric_not_observed(
            r#"trustyai_spd{namespace="test-namespace"}"#,
            Duration::from_secs(300),
        );
        let msg = err.to_string();
        assert!(msg.contains("trustyai_spd"));
        assert!(msg.contains("no numeric series observed"));

        match err {
            Error::MetricNotObserved { query, timeout } => {
                assert!(query.starts_with("trustyai_spd"));
                assert_eq!(timeout, Duration::from_secs(300));
            }
            _ => panic!("expected MetricNotObserved variant"),
        }
    }

    /// A request failure captures the response for diagnosis.
    #[test]
    fn request_failure_captures_status_and_body() {
        let err = Error::request("schedule spd", 400, r#"{"error":"unknown model"}"#);
        let msg = err.to_string();
        assert!(msg.contains("schedule spd"));
        assert!(msg.contains("400"));
        assert!(msg.contains("unknown model"));
    }

    /// A success status with the wrong body is its own failure category.
    #[test]
    fn unexpected_response_is_distinct_from_request_failure() {
        let err = Error::unexpected_response("request spd", "metric name was \"DIR\"");
        assert!(err.to_string().contains("unexpected response"));
        assert!(!err.to_string().contains("status"));
    }
}
