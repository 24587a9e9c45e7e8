//! Suite-wide configuration resolved once from the environment.
//!
//! Endpoint discovery differs between running inside the cluster (service
//! DNS), against an OpenShift route, or through a port-forward, so every base
//! URL can be overridden with an environment variable. The configuration is
//! explicit process-wide state: resolved once at first use and passed by
//! reference, never re-read mid-suite.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::TRUSTYAI_SERVICE;

/// Fixed timeout applied to every plain HTTP request the harness makes.
///
/// Only the eventual-consistency polls have retry semantics; individual
/// requests either succeed within this bound or fail the test.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static CONFIG: OnceLock<SuiteConfig> = OnceLock::new();

/// Resolved suite configuration.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    /// Override for the TrustyAI service base URL (`TRUSTYAI_BASE_URL`).
    /// When unset, the in-cluster service DNS name is used.
    trustyai_base: Option<String>,
    /// Override for the ModelMesh REST proxy base URL (`MODELMESH_BASE_URL`)
    modelmesh_base: Option<String>,
    /// Prometheus query endpoint (`PROMETHEUS_URL`)
    pub prometheus_url: String,
    /// Bearer token for the Prometheus endpoint (`PROMETHEUS_TOKEN`)
    pub prometheus_token: Option<String>,
    /// Root directory of the model data corpus (`MODEL_DATA_PATH`)
    pub model_data_path: PathBuf,
}

impl SuiteConfig {
    /// The process-wide configuration, resolved from the environment on
    /// first use.
    pub fn get() -> &'static SuiteConfig {
        CONFIG.get_or_init(SuiteConfig::from_env)
    }

    fn from_env() -> Self {
        Self {
            trustyai_base: std::env::var("TRUSTYAI_BASE_URL").ok(),
            modelmesh_base: std::env::var("MODELMESH_BASE_URL").ok(),
            prometheus_url: std::env::var("PROMETHEUS_URL").unwrap_or_else(|_| {
                "https://thanos-querier.openshift-monitoring.svc.cluster.local:9091".to_string()
            }),
            prometheus_token: std::env::var("PROMETHEUS_TOKEN").ok(),
            model_data_path: std::env::var("MODEL_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("tests/data")),
        }
    }

    /// Base URL of the TrustyAI service instance in the given namespace
    pub fn trustyai_base_url(&self, namespace: &str) -> String {
        match &self.trustyai_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("http://{TRUSTYAI_SERVICE}.{namespace}"),
        }
    }

    /// Base URL of the ModelMesh REST proxy in the given namespace
    pub fn modelmesh_base_url(&self, namespace: &str) -> String {
        match &self.modelmesh_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("http://modelmesh-serving.{namespace}:8008"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls_use_service_dns() {
        let config = SuiteConfig {
            trustyai_base: None,
            modelmesh_base: None,
            prometheus_url: "http://prometheus:9090".to_string(),
            prometheus_token: None,
            model_data_path: PathBuf::from("tests/data"),
        };

        assert_eq!(
            config.trustyai_base_url("test-namespace"),
            "http://trustyai-service.test-namespace"
        );
        assert_eq!(
            config.modelmesh_base_url("test-namespace"),
            "http://modelmesh-serving.test-namespace:8008"
        );
    }

    #[test]
    fn test_overrides_win_and_trailing_slash_is_stripped() {
        let config = SuiteConfig {
            trustyai_base: Some("https://trustyai-route.apps.example.com/".to_string()),
            modelmesh_base: Some("http://localhost:8008".to_string()),
            prometheus_url: "http://prometheus:9090".to_string(),
            prometheus_token: None,
            model_data_path: PathBuf::from("tests/data"),
        };

        assert_eq!(
            config.trustyai_base_url("ignored"),
            "https://trustyai-route.apps.example.com"
        );
        assert_eq!(config.modelmesh_base_url("ignored"), "http://localhost:8008");
    }
}
