//! Fairness metric stories: SPD and DIR over the loan-default models,
//! across storage backends and deployment modes.
//!
//! Fairness requests refer to attributes by their human-readable names, so
//! every story applies name mappings before the first metric request.

use std::collections::BTreeMap;

use futures::FutureExt;
use trustyai_e2e::harness::{
    send_data_to_inference_service, wait_for_modelmesh_pods_registered, PrometheusVerifier,
    TrustyClient,
};
use trustyai_e2e::metrics::{FairnessRequest, Metric, MetricPayload};
use trustyai_e2e::resources::{run_scoped, EnvSpec, ModelDeployment, TestEnv, TrustyAIStorage};

use crate::e2e_tests::helpers::{
    cluster_client, model_data_path, LOAN_MODEL_ALPHA, LOAN_MODEL_ALPHA_PATH, LOAN_MODEL_BETA,
    LOAN_MODEL_BETA_PATH, LOAN_MODEL_DATA, TEST_NAMESPACE,
};

const PROTECTED_ATTRIBUTE: &str = "Is Male-Identifying?";
const OUTCOME_NAME: &str = "Will Default?";
const BATCH_SIZE: u32 = 5000;

/// Human-readable names for the loan model's input tensor fields
fn input_mappings() -> BTreeMap<String, String> {
    [
        ("customer_data_input-0", "Number of Children"),
        ("customer_data_input-1", "Total Income"),
        ("customer_data_input-2", "Number of Total Family Members"),
        ("customer_data_input-3", PROTECTED_ATTRIBUTE),
        ("customer_data_input-4", "Owns Car?"),
        ("customer_data_input-5", "Owns Realty?"),
        ("customer_data_input-6", "Is Partnered?"),
        ("customer_data_input-7", "Is Employed?"),
        ("customer_data_input-8", "Live with Parents?"),
        ("customer_data_input-9", "Age"),
        ("customer_data_input-10", "Length of Employment?"),
    ]
    .into_iter()
    .map(|(field, name)| (field.to_string(), name.to_string()))
    .collect()
}

fn output_mappings() -> BTreeMap<String, String> {
    [("predict".to_string(), OUTCOME_NAME.to_string())]
        .into_iter()
        .collect()
}

fn fairness_payload(model_id: &str) -> MetricPayload {
    FairnessRequest {
        model_id: model_id.to_string(),
        protected_attribute: PROTECTED_ATTRIBUTE.to_string(),
        privileged_attribute: 1.0,
        unprivileged_attribute: 0.0,
        outcome_name: OUTCOME_NAME.to_string(),
        favorable_outcome: 0,
        batch_size: BATCH_SIZE,
    }
    .into()
}

fn fairness_env(storage: TrustyAIStorage) -> EnvSpec {
    EnvSpec {
        namespace: TEST_NAMESPACE.to_string(),
        storage,
        models: vec![
            ModelDeployment::modelmesh(LOAN_MODEL_ALPHA, LOAN_MODEL_ALPHA_PATH),
            ModelDeployment::modelmesh(LOAN_MODEL_BETA, LOAN_MODEL_BETA_PATH),
        ],
    }
}

/// Replay the shared loan corpus against every deployed model, apply name
/// mappings and verify the service's view of each model, then for SPD and
/// DIR verify the basic request, the scheduling request and the resulting
/// Prometheus series.
async fn fairness_story(env: &TestEnv) {
    let namespace = env.namespace.name.clone();
    let trusty = TrustyClient::for_namespace(&namespace).expect("failed to build service client");
    let data = model_data_path(LOAN_MODEL_DATA);

    for model in &env.models {
        let rows = send_data_to_inference_service(model, &data)
            .await
            .unwrap_or_else(|e| panic!("failed to replay traffic for {}: {e}", model.name));
        trusty
            .wait_for_model_registered(&model.name)
            .await
            .unwrap_or_else(|e| panic!("service never registered {}: {e}", model.name));
        trusty
            .apply_name_mappings(&model.name, &input_mappings(), &output_mappings())
            .await
            .unwrap_or_else(|e| panic!("failed to apply name mappings for {}: {e}", model.name));
        trusty
            .verify_model_metadata(&model.name, rows, &[PROTECTED_ATTRIBUTE, OUTCOME_NAME])
            .await
            .unwrap_or_else(|e| panic!("metadata verification for {} failed: {e}", model.name));
    }

    let prometheus =
        PrometheusVerifier::from_suite_config().expect("failed to build prometheus client");

    for metric in Metric::FAIRNESS {
        for model in &env.models {
            let payload = fairness_payload(&model.name);

            let response = trusty
                .verify_metric_request(metric, &payload)
                .await
                .unwrap_or_else(|e| panic!("basic {metric} request for {} failed: {e}", model.name));
            assert!(
                response.value.is_some(),
                "{metric} response for {} carried no value",
                model.name
            );

            trusty
                .verify_metric_scheduling(metric, &payload)
                .await
                .unwrap_or_else(|e| panic!("scheduling {metric} for {} failed: {e}", model.name));
        }

        prometheus
            .verify_metric(metric, &namespace)
            .await
            .unwrap_or_else(|e| panic!("{metric} never surfaced in prometheus: {e}"));
    }
}

/// Story: SPD and DIR can be requested, scheduled and observed for both
/// loan models when observations are stored on a PVC.
#[tokio::test]
#[ignore = "requires an OpenShift cluster with the TrustyAI and ModelMesh operators"]
async fn test_fairness_metrics_with_pvc_storage() {
    let client = cluster_client().await;
    let env = TestEnv::provision(client.clone(), fairness_env(TrustyAIStorage::pvc()))
        .await
        .expect("provisioning failed");

    run_scoped(env, |env| {
        async move {
            wait_for_modelmesh_pods_registered(&env.client, &env.namespace.name)
                .await
                .expect("modelmesh serving pods never became ready");
            fairness_story(env).await;
        }
        .boxed()
    })
    .await;
}

/// Story: the same fairness verifications hold over a MariaDB backend.
#[tokio::test]
#[ignore = "requires an OpenShift cluster with the TrustyAI and ModelMesh operators"]
async fn test_fairness_metrics_with_database_storage() {
    let client = cluster_client().await;
    let env = TestEnv::provision(client.clone(), fairness_env(TrustyAIStorage::database()))
        .await
        .expect("provisioning failed");

    run_scoped(env, |env| {
        async move {
            wait_for_modelmesh_pods_registered(&env.client, &env.namespace.name)
                .await
                .expect("modelmesh serving pods never became ready");
            fairness_story(env).await;
        }
        .boxed()
    })
    .await;
}

/// Story: fairness metrics also work against a KServe (serverless)
/// deployment, where inference goes through the service's own URL rather
/// than the shared ModelMesh endpoint.
#[tokio::test]
#[ignore = "requires an OpenShift cluster with the TrustyAI and KServe serverless operators"]
async fn test_fairness_metrics_with_kserve_deployment() {
    let client = cluster_client().await;
    let spec = EnvSpec {
        namespace: TEST_NAMESPACE.to_string(),
        storage: TrustyAIStorage::pvc(),
        models: vec![ModelDeployment::serverless(
            LOAN_MODEL_ALPHA,
            LOAN_MODEL_ALPHA_PATH,
        )],
    };
    let env = TestEnv::provision(client, spec)
        .await
        .expect("provisioning failed");

    run_scoped(env, |env| async move { fairness_story(env).await }.boxed()).await;
}

/// The mapping keys must match the tensor field names the deployed loan
/// models actually expose: eleven `customer_data_input-N` inputs with the
/// protected attribute at index 3, and a single output field `predict`.
/// A drifted key never applies, and every request referencing the
/// human-readable names would silently match nothing.
#[test]
fn test_name_mappings_match_loan_model_tensor_fields() {
    let inputs = input_mappings();
    assert_eq!(inputs.len(), 11);
    for i in 0..11 {
        assert!(inputs.contains_key(&format!("customer_data_input-{i}")));
    }
    assert_eq!(inputs["customer_data_input-3"], PROTECTED_ATTRIBUTE);

    let outputs = output_mappings();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs["predict"], OUTCOME_NAME);
}
