//! Bounded polling against eventually-consistent external systems.
//!
//! The monitored service computes scheduled metrics on its own timer and the
//! metrics backend scrapes on its own cadence, so verification can never be a
//! single synchronous check. The same bounded-poll pattern recurs for
//! namespace activation, inference-service readiness, ModelMesh registration
//! and Prometheus ingestion: check a condition at a fixed interval until it
//! holds or an overall deadline elapses.
//!
//! This is a blocking wait, not a retry mechanism: errors from the condition
//! are propagated immediately, only transient *absence* is tolerated.
//!
//! # Example
//!
//! ```ignore
//! use trustyai_e2e::poll::{wait_for, PollConfig};
//!
//! let ready = wait_for(&PollConfig::default(), "namespace active", || async {
//!     let ns = api.get("test-namespace").await?;
//!     Ok(ns.status.and_then(|s| s.phase) == Some("Active".into()))
//! })
//! .await?;
//! ```

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Interval and deadline for a bounded poll.
#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Fixed delay between condition checks
    pub interval: Duration,
    /// Overall deadline; the poll fails once this has elapsed
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(120),
        }
    }
}

impl PollConfig {
    /// Create a config with the given interval and deadline
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }

    /// Create a config with the default interval and the given deadline
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline,
            ..Default::default()
        }
    }
}

/// Poll a condition at a fixed interval until it holds or the deadline elapses.
///
/// Returns `Ok(true)` if the condition held, `Ok(false)` if the deadline
/// elapsed first. Errors from the condition are fatal and propagated
/// immediately; transient absence must be reported as `Ok(false)` by the
/// condition itself.
pub async fn wait_for<F, Fut>(config: &PollConfig, what: &str, mut condition: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let mut checks = 0u32;

    loop {
        checks += 1;
        if condition().await? {
            debug!(condition = %what, checks, elapsed_ms = start.elapsed().as_millis() as u64, "condition held");
            return Ok(true);
        }

        if start.elapsed() + config.interval > config.deadline {
            warn!(
                condition = %what,
                checks,
                deadline_ms = config.deadline.as_millis() as u64,
                "condition never held within deadline"
            );
            return Ok(false);
        }

        tokio::time::sleep(config.interval).await;
    }
}

/// Poll a readiness condition, mapping a missed deadline to
/// [`Error::ResourceTimeout`] for the named resource.
pub async fn wait_for_resource<F, Fut>(config: &PollConfig, resource: &str, condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    if wait_for(config, resource, condition).await? {
        Ok(())
    } else {
        Err(Error::resource_timeout(resource, config.deadline))
    }
}
