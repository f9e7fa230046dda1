// crates/geoview-config/src/validator.rs
// ============================================================================
// Module: Schema Validator
// Description: Compiled input and internal schema fragments keyed by schema path.
// Purpose: Validate raw and resolved layer configs without ever failing hard.
// Dependencies: geoview-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! [`SchemaValidator`] compiles every fragment from [`crate::schema`] once at
//! construction. Validation never panics and never returns an error: an
//! invalid candidate or an unknown schema path yields `false` and a
//! [`ConfigDiagnostic`] naming the schema path, the errors, and the candidate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use geoview_core::ConfigDiagnostic;
use geoview_core::DiagnosticSink;
use geoview_core::EVENT_SCHEMA_VALIDATION_FAILED;
use geoview_core::NoopDiagnosticSink;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::input_schema;
use crate::schema::internal_schema;
use crate::schema::schema_paths;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compiled fragments for one schema path.
struct CompiledFragments {
    /// Lenient fragment for raw user JSON.
    input: Validator,
    /// Strict fragment for resolved nodes.
    internal: Validator,
}

/// Validator for every schema path of the layer configuration document.
pub struct SchemaValidator {
    /// Compiled fragments keyed by schema path.
    fragments: BTreeMap<&'static str, CompiledFragments>,
    /// Destination of validation diagnostics.
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_paths", &self.fragments.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compiles every fragment and discards diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SchemaCompile`] when a fragment fails to compile.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_sink(Arc::new(NoopDiagnosticSink))
    }

    /// Compiles every fragment and reports failures to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SchemaCompile`] when a fragment fails to compile.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Result<Self, ConfigError> {
        let mut fragments = BTreeMap::new();
        for path in schema_paths() {
            let input = input_schema(path)
                .ok_or_else(|| ConfigError::SchemaCompile(format!("missing input fragment {path}")))?;
            let internal = internal_schema(path).ok_or_else(|| {
                ConfigError::SchemaCompile(format!("missing internal fragment {path}"))
            })?;
            fragments.insert(
                path,
                CompiledFragments {
                    input: compile_schema(path, &input)?,
                    internal: compile_schema(path, &internal)?,
                },
            );
        }
        Ok(Self {
            fragments,
            sink,
        })
    }

    /// Returns true when `schema_path` names a known fragment.
    #[must_use]
    pub fn knows(&self, schema_path: &str) -> bool {
        self.fragments.contains_key(schema_path)
    }

    /// Validates `candidate` against the fragment for `schema_path`.
    ///
    /// Returns `false` for unknown schema paths and invalid candidates; every
    /// failure is recorded on the diagnostic sink.
    #[must_use]
    pub fn validate(&self, schema_path: &str, candidate: &Value, use_internal_schema: bool) -> bool {
        let errors = self.validation_errors(schema_path, candidate, use_internal_schema);
        if errors.is_empty() {
            return true;
        }
        self.sink.record(
            &ConfigDiagnostic::new(EVENT_SCHEMA_VALIDATION_FAILED, errors.join("; "))
                .with_schema_path(schema_path)
                .with_candidate(candidate.clone()),
        );
        false
    }

    /// Returns the validation messages for `candidate`; empty when valid.
    #[must_use]
    pub fn validation_errors(
        &self,
        schema_path: &str,
        candidate: &Value,
        use_internal_schema: bool,
    ) -> Vec<String> {
        let Some(fragments) = self.fragments.get(schema_path) else {
            return vec![format!("unknown schema path: {schema_path}")];
        };
        let validator =
            if use_internal_schema { &fragments.internal } else { &fragments.input };
        if validator.is_valid(candidate) {
            return Vec::new();
        }
        validator.iter_errors(candidate).map(|err| err.to_string()).collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Compiles one schema fragment.
fn compile_schema(schema_path: &str, schema: &Value) -> Result<Validator, ConfigError> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| ConfigError::SchemaCompile(format!("{schema_path}: {err}")))
}
