//! Verification harness
//!
//! Issues HTTP requests to the TrustyAI metric endpoints, replays inference
//! traffic against deployed models, and polls Prometheus until scheduled
//! metrics surface. Everything here distinguishes two failure modes: the
//! endpoint answered wrongly (request failure, surfaced immediately with the
//! response captured) versus the expected condition never became observable
//! (timeout, surfaced after the bounded poll).

mod inference;
mod prometheus;
mod service;

pub use inference::{send_data_to_inference_service, wait_for_modelmesh_pods_registered};
pub use prometheus::PrometheusVerifier;
pub use service::TrustyClient;
