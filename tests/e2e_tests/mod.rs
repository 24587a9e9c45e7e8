//! End-to-end test suite for the TrustyAI service
//!
//! Tests are organized by the metric family they verify:
//!
//! - `drift`: input-data drift metrics (Meanshift, FourierMMD, KSTest,
//!   ApproxKSTest) computed against uploaded training data, over PVC and
//!   database storage
//!
//! - `fairness`: group fairness metrics (SPD, DIR) computed over
//!   name-mapped protected attributes, over PVC and database storage and
//!   both ModelMesh and KServe deployment modes
//!
//! Each test provisions its own namespace with the full dependency chain
//! (storage backend, serving runtime, models, TrustyAI instance), runs its
//! verifications, and tears everything down in reverse order even when an
//! assertion fails mid-way.

mod drift;
mod fairness;
mod helpers;
