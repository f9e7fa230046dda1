// crates/geoview-core/src/runtime/abort/tests.rs
// ============================================================================
// Module: Abort Signal Tests
// Description: Unit tests for cooperative cancellation.
// Purpose: Ensure aborts reach waiting and future tasks exactly once.
// Dependencies: geoview-core, tokio
// ============================================================================

//! ## Overview
//! Validates flag propagation, waking of pending waiters, and racing futures
//! against an abort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use super::AbortController;
use super::AbortSignal;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn never_signal_is_not_aborted() {
    assert!(!AbortSignal::never().is_aborted());
}

#[test]
fn abort_is_visible_to_every_clone() {
    let controller = AbortController::new();
    let first = controller.signal();
    let second = first.clone();
    controller.abort();
    assert!(first.is_aborted());
    assert!(second.is_aborted());
}

#[tokio::test]
async fn pending_waiter_wakes_on_abort() {
    let controller = AbortController::new();
    let signal = controller.signal();
    let waiter = tokio::spawn(async move { signal.aborted().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.abort();
    assert!(tokio::time::timeout(Duration::from_secs(1), waiter).await.is_ok());
}

#[tokio::test]
async fn run_returns_output_when_not_aborted() {
    let signal = AbortSignal::never();
    assert_eq!(signal.run(async { 7 }).await, Some(7));
}

#[tokio::test]
async fn run_returns_none_after_abort() {
    let controller = AbortController::new();
    let signal = controller.signal();
    controller.abort();
    let output = signal.run(std::future::pending::<u8>()).await;
    assert_eq!(output, None);
}

#[tokio::test]
async fn run_stops_pending_future_on_abort() {
    let controller = AbortController::new();
    let signal = controller.signal();
    let task = tokio::spawn(async move { signal.run(std::future::pending::<u8>()).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.abort();
    let joined = tokio::time::timeout(Duration::from_secs(1), task).await;
    assert!(matches!(joined, Ok(Ok(None))));
}
