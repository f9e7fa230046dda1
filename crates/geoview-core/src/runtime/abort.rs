// crates/geoview-core/src/runtime/abort.rs
// ============================================================================
// Module: Abort Signals
// Description: Cooperative cancellation shared by every pipeline fetch.
// Purpose: Let callers cancel in-flight resolution without dropping futures.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! An [`AbortController`] owns the right to cancel; every [`AbortSignal`]
//! cloned from it observes the cancellation. Once aborted, a signal stays
//! aborted. A default signal is never aborted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// Flag and wakeup channel shared by a controller and its signals.
#[derive(Debug, Default)]
struct AbortState {
    /// Set once the controller aborts.
    aborted: AtomicBool,
    /// Wakes tasks waiting in [`AbortSignal::aborted`].
    notify: Notify,
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Owner of a cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    /// Shared state.
    state: Arc<AbortState>,
}

impl AbortController {
    /// Creates a controller that has not been aborted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal observing this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            state: Arc::clone(&self.state),
        }
    }

    /// Aborts every signal derived from this controller.
    pub fn abort(&self) {
        self.state.aborted.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }
}

// ============================================================================
// SECTION: Signal
// ============================================================================

/// Read side of an [`AbortController`].
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    /// Shared state.
    state: Arc<AbortState>,
}

impl AbortSignal {
    /// Returns a signal that is never aborted.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Returns true once the controller has aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Completes once the controller has aborted.
    pub async fn aborted(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }

    /// Runs `future` until it completes or the signal aborts.
    ///
    /// Returns `None` when the signal aborted first.
    pub async fn run<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.is_aborted() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.aborted() => None,
            output = future => Some(output),
        }
    }
}

#[cfg(test)]
mod tests;
