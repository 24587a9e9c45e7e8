//! Guaranteed teardown on every exit path.
//!
//! Rust has no async destructors, so "release the resources even when an
//! assertion fails" cannot be left to `Drop`. [`run_scoped`] catches the
//! unwind from the test body, runs the environment's teardown, and then
//! resumes the panic so the test still reports its original failure.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

/// A provisioned environment that can release its resources.
///
/// Implementations release in reverse acquisition order and never propagate
/// release errors.
#[async_trait]
pub trait Teardown: Send + Sized {
    /// Release all held resources, best-effort
    async fn teardown(self);
}

/// Run a test body against a provisioned environment, guaranteeing teardown
/// on normal completion, assertion failure and panic alike.
///
/// ```ignore
/// let env = TestEnv::provision(client, spec).await.expect("provisioning failed");
/// run_scoped(env, |env| {
///     async move {
///         // assertions against env
///     }
///     .boxed()
/// })
/// .await;
/// ```
pub async fn run_scoped<E, F>(env: E, body: F)
where
    E: Teardown,
    F: for<'a> FnOnce(&'a E) -> BoxFuture<'a, ()>,
{
    let outcome = AssertUnwindSafe(body(&env)).catch_unwind().await;
    env.teardown().await;
    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
