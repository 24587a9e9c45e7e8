//! Shared fixtures for the e2e suite

use std::path::PathBuf;
use std::sync::Once;

use kube::Client;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trustyai_e2e::config::SuiteConfig;

/// Namespace each test class provisions for itself
pub const TEST_NAMESPACE: &str = "test-namespace";

/// Model used by the drift tests
pub const GAUSSIAN_CREDIT_MODEL: &str = "gaussian-credit-model";

/// Models used by the fairness tests
pub const LOAN_MODEL_ALPHA: &str = "demo-loan-nn-onnx-alpha";
pub const LOAN_MODEL_BETA: &str = "demo-loan-nn-onnx-beta";

/// Data corpus shared by both loan models
pub const LOAN_MODEL_DATA: &str = "loan-nn-onnx";

/// Artifact paths inside the MinIO example bucket
pub const GAUSSIAN_CREDIT_MODEL_PATH: &str = "onnx/gaussian_credit_model.onnx";
pub const LOAN_MODEL_ALPHA_PATH: &str = "onnx/loan_model_alpha_august.onnx";
pub const LOAN_MODEL_BETA_PATH: &str = "onnx/loan_model_beta_august.onnx";

static INIT_TRACING: Once = Once::new();

fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    });
}

/// Connect to the cluster the suite runs against
pub async fn cluster_client() -> Client {
    init_tracing();
    Client::try_default()
        .await
        .expect("failed to create cluster client - is a kubeconfig available?")
}

/// Root of the data corpus for the given model
pub fn model_data_path(model: &str) -> PathBuf {
    SuiteConfig::get().model_data_path.join(model)
}
