// crates/geoview-core/src/runtime/diagnostics.rs
// ============================================================================
// Module: Diagnostic Sinks
// Description: Stderr, file, memory, and no-op diagnostic sinks.
// Purpose: Route structured pipeline diagnostics without a logging framework.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Sinks serialize [`ConfigDiagnostic`] events as JSON lines. Write failures
//! are swallowed: diagnostics never change pipeline outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::interfaces::ConfigDiagnostic;
use crate::interfaces::DiagnosticSink;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Diagnostic sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    fn record(&self, event: &ConfigDiagnostic) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Diagnostic sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileDiagnosticSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileDiagnosticSink {
    /// Opens the diagnostic log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record(&self, event: &ConfigDiagnostic) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Diagnostic sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnosticSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ConfigDiagnostic>>,
}

impl MemoryDiagnosticSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ConfigDiagnostic> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn record(&self, event: &ConfigDiagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// No-op diagnostic sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn record(&self, _event: &ConfigDiagnostic) {}
}
