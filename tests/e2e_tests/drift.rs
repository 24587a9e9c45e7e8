//! Drift metric stories: Meanshift, FourierMMD, KSTest and ApproxKSTest
//! against the gaussian credit model, over both storage backends.

use futures::FutureExt;
use trustyai_e2e::harness::{
    send_data_to_inference_service, wait_for_modelmesh_pods_registered, PrometheusVerifier,
    TrustyClient,
};
use trustyai_e2e::metrics::{DriftRequest, Metric, MetricPayload};
use trustyai_e2e::resources::{run_scoped, EnvSpec, ModelDeployment, TestEnv, TrustyAIStorage};

use crate::e2e_tests::helpers::{
    cluster_client, model_data_path, GAUSSIAN_CREDIT_MODEL, GAUSSIAN_CREDIT_MODEL_PATH,
    TEST_NAMESPACE,
};

fn drift_env(storage: TrustyAIStorage) -> EnvSpec {
    EnvSpec {
        namespace: TEST_NAMESPACE.to_string(),
        storage,
        models: vec![ModelDeployment::modelmesh(
            GAUSSIAN_CREDIT_MODEL,
            GAUSSIAN_CREDIT_MODEL_PATH,
        )],
    }
}

/// Replay the model's traffic corpus, upload its training baseline, verify
/// the service's view of the model, then for every drift metric verify the
/// basic request, the scheduling request and the resulting Prometheus
/// series.
async fn drift_story(env: &TestEnv) {
    let namespace = env.namespace.name.clone();
    wait_for_modelmesh_pods_registered(&env.client, &namespace)
        .await
        .expect("modelmesh serving pods never became ready");

    let model = env
        .model(GAUSSIAN_CREDIT_MODEL)
        .expect("gaussian credit model was not deployed");
    let data = model_data_path(GAUSSIAN_CREDIT_MODEL);
    let inferred_rows = send_data_to_inference_service(model, &data.join("data_batches"))
        .await
        .expect("failed to replay inference traffic");

    let trusty = TrustyClient::for_namespace(&namespace).expect("failed to build service client");
    let uploaded_rows = trusty
        .upload_data(&data.join("training_data.json"))
        .await
        .expect("failed to upload training data");
    trusty
        .wait_for_model_registered(GAUSSIAN_CREDIT_MODEL)
        .await
        .expect("service never registered the model's observations");
    trusty
        .verify_model_metadata(GAUSSIAN_CREDIT_MODEL, inferred_rows + uploaded_rows, &[])
        .await
        .expect("metadata verification failed");

    let prometheus =
        PrometheusVerifier::from_suite_config().expect("failed to build prometheus client");

    for metric in Metric::DRIFT {
        let payload: MetricPayload = DriftRequest::training(GAUSSIAN_CREDIT_MODEL).into();

        let response = trusty
            .verify_metric_request(metric, &payload)
            .await
            .unwrap_or_else(|e| panic!("basic {metric} request failed: {e}"));
        assert!(
            response.value.is_some(),
            "{metric} response carried no value"
        );

        trusty
            .verify_metric_scheduling(metric, &payload)
            .await
            .unwrap_or_else(|e| panic!("scheduling {metric} failed: {e}"));

        prometheus
            .verify_metric(metric, &namespace)
            .await
            .unwrap_or_else(|e| panic!("{metric} never surfaced in prometheus: {e}"));
    }
}

/// Story: all four drift metrics can be requested, scheduled and observed
/// in Prometheus when the service persists observations on a PVC.
#[tokio::test]
#[ignore = "requires an OpenShift cluster with the TrustyAI and ModelMesh operators"]
async fn test_drift_metrics_with_pvc_storage() {
    let client = cluster_client().await;
    let env = TestEnv::provision(client, drift_env(TrustyAIStorage::pvc()))
        .await
        .expect("provisioning failed");

    run_scoped(env, |env| async move { drift_story(env).await }.boxed()).await;
}

/// Story: the same drift verifications hold when observations go to a
/// MariaDB backend instead of a flat file.
#[tokio::test]
#[ignore = "requires an OpenShift cluster with the TrustyAI and ModelMesh operators"]
async fn test_drift_metrics_with_database_storage() {
    let client = cluster_client().await;
    let env = TestEnv::provision(client, drift_env(TrustyAIStorage::database()))
        .await
        .expect("provisioning failed");

    run_scoped(env, |env| async move { drift_story(env).await }.boxed()).await;
}
