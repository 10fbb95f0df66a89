//! Blocking wait over futures, from any calling context.
//!
//! Backends are async; the agent contract is blocking. [`Bridge::block_on`]
//! drives a future to completion whether or not the caller is already inside
//! a tokio runtime:
//!
//! - no runtime: the bridge's own current-thread runtime runs it;
//! - multi-thread runtime: the caller's runtime runs it, via `block_in_place`;
//! - current-thread runtime: the bridge's runtime runs it on a scoped helper
//!   thread, since the caller's only worker cannot be parked.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tracing::trace;

use crate::error::ParleyError;

/// Owns (lazily) the runtime used when the caller has none to lend.
#[derive(Debug, Default)]
pub struct Bridge {
    runtime: OnceLock<Runtime>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` to completion and return its output.
    ///
    /// Fails only when no runtime can be built or the helper thread dies.
    pub fn block_on<F>(&self, fut: F) -> Result<F::Output, ParleyError>
    where
        F: Future + Send,
        F::Output: Send,
    {
        match Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                RuntimeFlavor::CurrentThread => {
                    trace!("bridge: current-thread caller, using helper thread");
                    self.on_helper_thread(fut)
                }
                _ => {
                    trace!("bridge: reusing caller runtime");
                    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
                }
            },
            Err(_) => {
                trace!("bridge: no caller runtime");
                Ok(self.owned_runtime()?.block_on(fut))
            }
        }
    }

    fn on_helper_thread<F>(&self, fut: F) -> Result<F::Output, ParleyError>
    where
        F: Future + Send,
        F::Output: Send,
    {
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.owned_runtime().map(|rt| rt.block_on(fut)))
                .join()
                .map_err(|_| ParleyError::ChatFailure("bridge helper thread panicked".into()))?
        })
    }

    fn owned_runtime(&self) -> Result<&Runtime, ParleyError> {
        if let Some(rt) = self.runtime.get() {
            return Ok(rt);
        }
        let rt = Builder::new_current_thread().enable_all().build()?;
        if let Err(rt) = self.runtime.set(rt) {
            rt.shutdown_background();
        }
        self.runtime
            .get()
            .ok_or_else(|| ParleyError::ChatFailure("bridge runtime unavailable".into()))
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // A runtime dropped normally inside async code panics.
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}
