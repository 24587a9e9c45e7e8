//! Prometheus-side verification of scheduled metrics.
//!
//! The service computes scheduled metrics on its own timer and Prometheus
//! scrapes on its own cadence, so a freshly scheduled metric takes an
//! unpredictable (but bounded) time to surface as a series. Verification
//! polls the instant-query API until a numeric sample appears.

use std::sync::Mutex;
use std::time::Duration;

use prometheus_http_query::Client as PromClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{info, warn};

use crate::config::{SuiteConfig, HTTP_REQUEST_TIMEOUT};
use crate::metrics::Metric;
use crate::poll::{wait_for, PollConfig};
use crate::{Error, Result};

/// Default poll cadence for metric series to appear
const PROMETHEUS_POLL: PollConfig = PollConfig {
    interval: Duration::from_secs(10),
    deadline: Duration::from_secs(300),
};

/// Polls the metrics backend for scheduled metric series
pub struct PrometheusVerifier {
    client: PromClient,
    poll: PollConfig,
}

impl PrometheusVerifier {
    /// Build a verifier from the suite configuration.
    ///
    /// The query endpoint sits behind the cluster's service CA and bearer
    /// auth, so the underlying client accepts the cluster-internal
    /// certificate and attaches the configured token.
    pub fn from_suite_config() -> Result<Self> {
        let config = SuiteConfig::get();

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.prometheus_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::unexpected_response(
                    "prometheus configuration",
                    "PROMETHEUS_TOKEN contains characters invalid in a header",
                )
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client: PromClient::from(http, &config.prometheus_url)?,
            poll: PROMETHEUS_POLL,
        })
    }

    /// Override the poll cadence
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Poll until the metric's series in the given namespace yields a
    /// numeric sample, failing with [`Error::MetricNotObserved`] once the
    /// deadline elapses. Returns the first observed sample value.
    pub async fn verify_metric(&self, metric: Metric, namespace: &str) -> Result<f64> {
        let query = metric.prometheus_query(namespace);
        let observed = Mutex::new(None);

        let client = self;
        wait_for(&self.poll, &format!("prometheus series {query}"), || {
            let query = query.clone();
            let observed = &observed;
            async move {
                match client.instant_sample(&query).await {
                    Some(value) => {
                        *observed.lock().unwrap() = Some(value);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        })
        .await?;

        let observed = *observed.lock().unwrap();
        match observed {
            Some(value) => {
                info!(metric = %metric, query = %query, value, "metric observed in prometheus");
                Ok(value)
            }
            None => Err(Error::metric_not_observed(query, self.poll.deadline)),
        }
    }

    /// One instant query; `None` when no finite sample exists yet.
    ///
    /// Query errors are treated as transient absence: the backend restarts
    /// when user-workload monitoring is first enabled, and failing the poll
    /// on a mid-rollout 503 would misreport an ObservationTimeout scenario
    /// as a request failure.
    async fn instant_sample(&self, query: &str) -> Option<f64> {
        match self.client.query(query).get().await {
            Ok(result) => result
                .data()
                .as_vector()
                .and_then(|vectors| vectors.first())
                .map(|vector| vector.sample().value())
                .filter(|value| value.is_finite()),
            Err(e) => {
                warn!(query = %query, error = %e, "prometheus query failed, treating as not yet observed");
                None
            }
        }
    }
}
