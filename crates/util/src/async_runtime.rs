//! Async runtime helpers for blocking callers.
//!
//! This module provides a single entry point for executing async futures from
//! synchronous code paths, reusing the current Tokio runtime when available.

use std::{future::Future, io};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;

/// Execute an async future from synchronous code.
///
/// # Arguments
/// - `future`: The future to run to completion.
///
/// # Returns
/// Returns the future's output, or an I/O error if no runtime can be used.
///
/// # Notes
/// - Reuses the current multi-threaded runtime when available.
/// - A current-thread runtime cannot be blocked from inside itself, so that
///   case is reported as an error instead of deadlocking.
/// - Falls back to a single-threaded runtime for call sites outside Tokio.
pub fn block_on_future<F>(future: F) -> io::Result<F::Output>
where
    F: Future,
{
    if let Ok(handle) = Handle::try_current() {
        if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(io::Error::other(
                "cannot block on a future from inside a current-thread runtime",
            ));
        }
        Ok(task::block_in_place(|| handle.block_on(future)))
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(runtime.block_on(future))
    }
}
