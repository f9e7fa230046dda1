// crates/geoview-config/src/resolver.rs
// ============================================================================
// Module: Layer Config Resolver
// Description: Async resolution pipeline for raw geoview layer configs.
// Purpose: Validate, build, fetch metadata for, layer, and settle every node.
// Dependencies: futures, geoview-core, serde_json
// ============================================================================

//! ## Overview
//! [`LayerConfigResolver`] turns raw geoview layer JSON into resolved
//! [`GeoviewLayerConfig`] trees. Each root goes through the same steps:
//! input validation, construction, one service metadata fetch, rounds of
//! concurrent per-leaf fetches (group expansion adds rounds), default
//! layering, internal validation, group aggregates, and final statuses.
//! Failures stay on their node; partial success is a normal result.
//!
//! Security posture: metadata responses are untrusted input; they only ever
//! feed the default-layering overlay and never replace user settings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use geoview_core::AbortSignal;
use geoview_core::ConfigDiagnostic;
use geoview_core::DiagnosticSink;
use geoview_core::EVENT_LAYER_ENTRY_ERROR;
use geoview_core::EVENT_METADATA_FETCH_FAILED;
use geoview_core::EVENT_RESOLUTION_CANCELLED;
use geoview_core::FetchError;
use geoview_core::GEOVIEW_LAYER_SCHEMA_PATH;
use geoview_core::GeoviewLayerId;
use geoview_core::LayerEntryError;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerPath;
use geoview_core::LayerStatus;
use geoview_core::LayerTree;
use geoview_core::MetadataBody;
use geoview_core::MetadataFetcher;
use geoview_core::MetadataRequest;
use geoview_core::NodeId;
use serde_json::Value;

use crate::error::ConfigError;
use crate::geoview_layer::GeoviewLayerConfig;
use crate::geoview_layer::parse_geoview_layer_id;
use crate::geoview_layer::parse_geoview_layer_type;
use crate::group::BuildContext;
use crate::group::compute_group_aggregates;
use crate::group::expand_metadata_group;
use crate::leaf::LeafContext;
use crate::leaf::relayer_leaf;
use crate::metadata::LeafMetadataOutcome;
use crate::metadata::LeafMetadataPlan;
use crate::metadata::interpret_leaf_metadata;
use crate::metadata::leaf_metadata_plan;
use crate::metadata::parse_leaf_metadata;
use crate::metadata::parse_service_metadata;
use crate::metadata::service_metadata_request;
use crate::settings::ResolverSettings;
use crate::validator::SchemaValidator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Error callback invoked once per reportable failure.
pub type ErrorCallback<'a> = &'a mut (dyn FnMut(&LayerEntryError) + Send);

/// Outcome of resolving one raw root.
struct RootOutcome {
    /// Resolved or errored root, when an id and type could be read.
    config: Option<GeoviewLayerConfig>,
    /// Reportable failures in pre-order.
    errors: Vec<LayerEntryError>,
}

/// Resolver for raw geoview layer configs.
pub struct LayerConfigResolver {
    /// Metadata transport.
    fetcher: Arc<dyn MetadataFetcher>,
    /// Compiled schema fragments.
    validator: SchemaValidator,
    /// Validated resolver settings.
    settings: ResolverSettings,
    /// Destination of pipeline diagnostics.
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for LayerConfigResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerConfigResolver")
            .field("validator", &self.validator)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LayerConfigResolver {
    /// Creates a resolver after validating its settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the settings are invalid or a schema
    /// fragment fails to compile.
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        settings: ResolverSettings,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let validator = SchemaValidator::with_sink(Arc::clone(&sink))?;
        Ok(Self {
            fetcher,
            validator,
            settings,
            sink,
        })
    }

    /// Returns the schema validator.
    #[must_use]
    pub const fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Returns the resolver settings.
    #[must_use]
    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves every raw root concurrently.
    ///
    /// Roots whose id and type cannot be read are reported and omitted; every
    /// other root is returned, errored or not. A root repeating an earlier
    /// `geoviewLayerId` is reported as `MalformedEntry` and omitted without
    /// being resolved. `on_error` runs once per failure after all roots
    /// settle; cancellations are not reported.
    pub async fn prevalidate_geoview_layers_config(
        &self,
        raw_list: &[Value],
        signal: &AbortSignal,
        on_error: ErrorCallback<'_>,
    ) -> Vec<GeoviewLayerConfig> {
        let duplicates = duplicate_root_ids(raw_list);
        let outcomes = join_all(raw_list.iter().zip(duplicates).enumerate().map(
            |(index, (raw, duplicate))| async move {
                match duplicate {
                    Some(id) => duplicate_root(&id),
                    None => self.resolve_root(index, raw, signal).await,
                }
            },
        ))
        .await;
        let mut configs = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            self.report(&outcome.errors, on_error);
            configs.extend(outcome.config);
        }
        configs
    }

    /// Resolves a single raw root.
    pub async fn resolve_geoview_layer(
        &self,
        raw: &Value,
        signal: &AbortSignal,
        on_error: ErrorCallback<'_>,
    ) -> Option<GeoviewLayerConfig> {
        let outcome = self.resolve_root(0, raw, signal).await;
        self.report(&outcome.errors, on_error);
        outcome.config
    }

    /// Invokes the callback and records a diagnostic per failure.
    fn report(&self, errors: &[LayerEntryError], on_error: ErrorCallback<'_>) {
        for error in errors {
            self.sink.record(
                &ConfigDiagnostic::new(EVENT_LAYER_ENTRY_ERROR, error.message.as_str())
                    .with_layer_path(error.layer_path.as_str()),
            );
            on_error(error);
        }
    }

    // ========================================================================
    // SECTION: Pipeline
    // ========================================================================

    /// Runs the whole pipeline for one root.
    async fn resolve_root(&self, index: usize, raw: &Value, signal: &AbortSignal) -> RootOutcome {
        let mut config = match self.construct_root(raw) {
            Ok(config) => config,
            Err((kind, message)) => return failed_root(index, raw, kind, message),
        };
        if config.error().is_none() {
            mark_processing(config.tree_mut());
            self.resolve_metadata(&mut config, signal).await;
            if signal.is_aborted() {
                cancel_unsettled(config.tree_mut());
                self.sink.record(
                    &ConfigDiagnostic::new(EVENT_RESOLUTION_CANCELLED, "resolution aborted")
                        .with_layer_path(config.geoview_layer_id().as_str()),
                );
            }
            if self.settings.resolution.validate_internal {
                self.validate_internal(config.tree_mut());
            }
            compute_group_aggregates(config.tree_mut());
            settle(config.tree_mut());
            if self.settings.resolution.validate_internal {
                self.validate_internal_root(&mut config);
            }
        }
        let errors = config
            .errors()
            .into_iter()
            .filter(|error| error.kind.is_reportable())
            .cloned()
            .collect();
        RootOutcome {
            config: Some(config),
            errors,
        }
    }

    /// Validates the raw root and builds its tree.
    fn construct_root(&self, raw: &Value) -> Result<GeoviewLayerConfig, (LayerEntryErrorKind, String)> {
        if !self.validator.validate(GEOVIEW_LAYER_SCHEMA_PATH, raw, false) {
            let errors = self.validator.validation_errors(GEOVIEW_LAYER_SCHEMA_PATH, raw, false);
            return Err((LayerEntryErrorKind::SchemaViolation, errors.join("; ")));
        }
        GeoviewLayerConfig::from_raw(raw, &self.validator, self.settings.resolution.max_tree_depth).map_err(
            |err| {
                let kind = match err {
                    ConfigError::MissingField(_) => LayerEntryErrorKind::MissingField,
                    _ => LayerEntryErrorKind::MalformedEntry,
                };
                (kind, err.to_string())
            },
        )
    }

    /// Fetches service and leaf metadata and layers every leaf.
    async fn resolve_metadata(&self, config: &mut GeoviewLayerConfig, signal: &AbortSignal) {
        let format = config.geoview_layer_type();
        let metadata_access_path = config.metadata_access_path().map(str::to_string);
        if let Some(request) = service_metadata_request(format, metadata_access_path.as_deref()) {
            let fetched = self.fetch_document(&request, signal).await;
            match fetched.and_then(|body| parse_service_metadata(format, body)) {
                Ok(metadata) => config.set_service_metadata(metadata),
                Err(FetchError::Cancelled) => {
                    cancel_unsettled(config.tree_mut());
                    return;
                }
                Err(err) => {
                    self.record_fetch_failure(config.geoview_layer_id().as_str(), &err);
                    let tree = config.tree_mut();
                    for id in tree.leaf_ids() {
                        if let Some(node) = tree.get_mut(id) {
                            node.mark_error(
                                LayerEntryErrorKind::MetadataFetch,
                                format!("service metadata unavailable: {err}"),
                            );
                        }
                    }
                    return;
                }
            }
        }
        let service_metadata = config.service_metadata().cloned();
        let root_settings = config.initial_settings.clone();
        let build = BuildContext {
            format,
            metadata_access_path: metadata_access_path.as_deref(),
            root_settings: &root_settings,
            validator: &self.validator,
            max_tree_depth: self.settings.resolution.max_tree_depth,
        };
        let tree = config.tree_mut();
        let mut pending = live_leaves(tree, &tree.leaf_ids());
        let mut round = 0;
        while !pending.is_empty() && round <= self.settings.resolution.max_tree_depth && !signal.is_aborted() {
            round += 1;
            let mut fetches: Vec<(NodeId, MetadataRequest)> = Vec::new();
            let mut ready: Vec<NodeId> = Vec::new();
            for id in pending {
                let Some(node) = tree.get_mut(id) else {
                    continue;
                };
                let base = metadata_access_path.clone().or_else(|| {
                    node.as_leaf().and_then(|leaf| leaf.source.data_access_path.clone())
                });
                match leaf_metadata_plan(format, &node.layer_id, base.as_deref(), service_metadata.as_ref()) {
                    LeafMetadataPlan::Fetch(request) => fetches.push((id, request)),
                    LeafMetadataPlan::FromService | LeafMetadataPlan::None => ready.push(id),
                    LeafMetadataPlan::NotFound(message) => {
                        node.mark_error(LayerEntryErrorKind::LayerNotFound, message);
                    }
                }
            }
            let results = join_all(fetches.iter().map(|(id, request)| async move {
                (*id, self.fetch_document(request, signal).await)
            }))
            .await;
            for (id, result) in results {
                let Some(node) = tree.get_mut(id) else {
                    continue;
                };
                match result.and_then(|body| parse_leaf_metadata(format, body)) {
                    Ok(metadata) => {
                        node.set_metadata(Some(metadata));
                        ready.push(id);
                    }
                    Err(FetchError::Cancelled) => {
                        node.mark_error(LayerEntryErrorKind::Cancelled, "metadata fetch cancelled");
                    }
                    Err(err) => {
                        self.record_fetch_failure(node.layer_path().as_str(), &err);
                        node.set_metadata(None);
                        node.mark_error(LayerEntryErrorKind::MetadataFetch, err.to_string());
                    }
                }
            }
            let mut expanded = Vec::new();
            for id in ready {
                expanded.extend(apply_metadata(tree, id, service_metadata.as_ref(), &build));
            }
            pending = live_leaves(tree, &expanded);
        }
    }

    /// Fetches one document, observing the abort signal.
    async fn fetch_document(
        &self,
        request: &MetadataRequest,
        signal: &AbortSignal,
    ) -> Result<MetadataBody, FetchError> {
        signal.run(self.fetcher.fetch(request, signal)).await.unwrap_or(Err(FetchError::Cancelled))
    }

    /// Records a metadata fetch failure diagnostic.
    fn record_fetch_failure(&self, layer_path: &str, err: &FetchError) {
        self.sink.record(
            &ConfigDiagnostic::new(EVENT_METADATA_FETCH_FAILED, err.to_string()).with_layer_path(layer_path),
        );
    }

    /// Validates every live node against its internal fragment.
    fn validate_internal(&self, tree: &mut LayerTree) {
        for id in tree.pre_order() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            if node.is_layer_entry_error() {
                continue;
            }
            let schema_path = node.schema_path();
            let errors = match serde_json::to_value(node) {
                Ok(candidate) if self.validator.validate(schema_path, &candidate, true) => continue,
                Ok(candidate) => self.validator.validation_errors(schema_path, &candidate, true),
                Err(err) => vec![err.to_string()],
            };
            if let Some(node) = tree.get_mut(id) {
                node.mark_error(LayerEntryErrorKind::InternalSchemaViolation, errors.join("; "));
            }
        }
    }

    /// Checks the serialized root against the internal geoview layer fragment.
    fn validate_internal_root(&self, config: &mut GeoviewLayerConfig) {
        let errors = match config.to_json() {
            Ok(candidate) if self.validator.validate(GEOVIEW_LAYER_SCHEMA_PATH, &candidate, true) => return,
            Ok(candidate) => self.validator.validation_errors(GEOVIEW_LAYER_SCHEMA_PATH, &candidate, true),
            Err(err) => vec![err.to_string()],
        };
        config.mark_error(LayerEntryErrorKind::InternalSchemaViolation, errors.join("; "));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns, per raw root, its id when an earlier root already uses it.
fn duplicate_root_ids(raw_list: &[Value]) -> Vec<Option<GeoviewLayerId>> {
    let mut seen = BTreeSet::new();
    raw_list
        .iter()
        .map(|raw| {
            let id = parse_geoview_layer_id(raw).ok()?;
            (!seen.insert(id.as_str().to_string())).then_some(id)
        })
        .collect()
}

/// Builds the outcome of a root whose id repeats an earlier root.
fn duplicate_root(id: &GeoviewLayerId) -> RootOutcome {
    RootOutcome {
        config: None,
        errors: vec![LayerEntryError::new(
            LayerPath::parse(id.as_str()),
            LayerEntryErrorKind::MalformedEntry,
            format!("duplicate geoviewLayerId {id}"),
        )],
    }
}

/// Builds the outcome of a root that failed validation or construction.
fn failed_root(index: usize, raw: &Value, kind: LayerEntryErrorKind, message: String) -> RootOutcome {
    let config = match (parse_geoview_layer_id(raw), parse_geoview_layer_type(raw)) {
        (Ok(id), Ok(layer_type)) => Some(GeoviewLayerConfig::failed(id, layer_type, kind, message.clone())),
        _ => None,
    };
    let error = config.as_ref().and_then(|config| config.error().cloned()).unwrap_or_else(|| {
        let path = parse_geoview_layer_id(raw).map_or_else(|_| index.to_string(), |id| id.as_str().to_string());
        LayerEntryError::new(LayerPath::parse(path), kind, message)
    });
    RootOutcome {
        config,
        errors: vec![error],
    }
}

/// Interprets a leaf's metadata; returns children added by group expansion.
fn apply_metadata(
    tree: &mut LayerTree,
    id: NodeId,
    service_metadata: Option<&Value>,
    build: &BuildContext<'_>,
) -> Vec<NodeId> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let outcome = interpret_leaf_metadata(build.format, &node.layer_id, node.metadata(), service_metadata);
    match outcome {
        LeafMetadataOutcome::Overlay(overlay) => {
            let context = LeafContext {
                format: build.format,
                metadata_access_path: build.metadata_access_path,
            };
            if let Some(node) = tree.get_mut(id)
                && let Err(err) = relayer_leaf(node, &overlay, context)
            {
                let kind = match err {
                    ConfigError::MissingField(_) => LayerEntryErrorKind::MissingField,
                    _ => LayerEntryErrorKind::MalformedEntry,
                };
                node.mark_error(kind, err.to_string());
            }
            Vec::new()
        }
        LeafMetadataOutcome::Group(sub_layers) => {
            match expand_metadata_group(tree, id, &sub_layers, build) {
                Ok(children) => {
                    if let Some(node) = tree.get_mut(id) {
                        node.set_status(LayerStatus::Processing);
                    }
                    mark_processing_nodes(tree, &children);
                    children
                }
                Err(err) => {
                    if let Some(node) = tree.get_mut(id) {
                        node.mark_error(LayerEntryErrorKind::MalformedEntry, err.to_string());
                    }
                    Vec::new()
                }
            }
        }
        LeafMetadataOutcome::NotFound(message) => {
            if let Some(node) = tree.get_mut(id) {
                node.mark_error(LayerEntryErrorKind::LayerNotFound, message);
            }
            Vec::new()
        }
    }
}

/// Returns the ids among `ids` that are leaves without a recorded failure.
fn live_leaves(tree: &LayerTree, ids: &[NodeId]) -> Vec<NodeId> {
    ids.iter()
        .copied()
        .filter(|id| tree.get(*id).is_some_and(|node| !node.is_group() && !node.is_layer_entry_error()))
        .collect()
}

/// Moves every live node to `processing`.
fn mark_processing(tree: &mut LayerTree) {
    let ids = tree.pre_order();
    mark_processing_nodes(tree, &ids);
}

/// Moves the given live nodes and their descendants to `processing`.
fn mark_processing_nodes(tree: &mut LayerTree, ids: &[NodeId]) {
    for id in ids {
        let mut subtree = vec![*id];
        subtree.extend(tree.descendants(*id));
        for node_id in subtree {
            if let Some(node) = tree.get_mut(node_id) {
                node.set_status(LayerStatus::Processing);
            }
        }
    }
}

/// Cancels every node that has not settled.
fn cancel_unsettled(tree: &mut LayerTree) {
    for id in tree.pre_order() {
        if let Some(node) = tree.get_mut(id)
            && !node.is_layer_entry_error()
        {
            node.mark_error(LayerEntryErrorKind::Cancelled, "resolution aborted");
        }
    }
}

/// Marks every live node as processed.
fn settle(tree: &mut LayerTree) {
    for id in tree.pre_order() {
        if let Some(node) = tree.get_mut(id) {
            node.set_status(LayerStatus::Processed);
        }
    }
}

#[cfg(test)]
mod tests;
