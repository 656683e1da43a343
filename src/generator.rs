//! Diagram generation and export orchestration.
//!
//! Stage 1 of the archdoc pipeline. A [`DiagramGenerator`] owns one
//! [`Workspace`], creates typed views bound to a root element, and exports
//! everything to the output directory:
//!
//! - `workspace.json` — the structured export of the whole workspace
//! - `<key>.puml` — one diagram description per view
//! - `<key>.png` — rendered image per view, when rendering is enabled
//! - `<key>.metadata.json` — one metadata record per exported view
//!
//! ## Failure policy
//!
//! Configuration problems abort before any export. Per-view problems do not:
//! a view that fails to export is dropped (no metadata record) and reported
//! in the batch summary, while its siblings proceed. A render failure is
//! softer still — the view's metadata is recorded without the image format,
//! and the site stage shows a placeholder.
//!
//! ## Parallelism
//!
//! Views are exported on rayon workers. Completion order never reaches the
//! output: metadata records are appended in view creation order after all
//! workers finish.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::{ConfigError, DiagramConfig};
use crate::export::{self, ExportError};
use crate::metadata::{DiagramMetadata, MetadataError, MetadataStore, SCHEMA_VERSION};
use crate::model::{ElementId, ModelError, ViewId, ViewKind, Workspace};
use crate::render::Renderer;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the workspace-level structured export.
pub const WORKSPACE_EXPORT: &str = "workspace.json";

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Style(#[from] crate::style::StyleError),
    #[error("workspace '{0}' has no views to export")]
    NoViews(String),
}

/// Options for one export run.
pub struct ExportOptions<'a> {
    /// Consult and update the render cache.
    pub use_cache: bool,
    /// External renderer for the `png` format. When `None`, views are
    /// exported without images even if `png` is configured.
    pub renderer: Option<&'a dyn Renderer>,
}

impl Default for ExportOptions<'_> {
    fn default() -> Self {
        Self {
            use_cache: true,
            renderer: None,
        }
    }
}

/// A view that failed; `error` names the violated constraint.
#[derive(Debug)]
pub struct ViewFailure {
    pub key: String,
    pub error: String,
}

/// One successfully exported view, as reported to the CLI.
#[derive(Debug)]
pub struct ExportedView {
    pub key: String,
    pub title: String,
    pub diagram_type: String,
    pub formats: Vec<String>,
}

/// Batch summary of an export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: Vec<ExportedView>,
    /// Views dropped entirely; no metadata was recorded for these.
    pub failures: Vec<ViewFailure>,
    /// Views whose image rendering failed; metadata recorded without `png`.
    pub render_failures: Vec<ViewFailure>,
    pub cache: CacheStats,
}

/// Per-view worker result, ordered by view index after the parallel phase.
struct ViewOutcome {
    outputs: BTreeMap<String, String>,
    render_failure: Option<String>,
    cache_hit: bool,
    /// (output_path, source_hash, params_hash) to insert into the manifest.
    cache_insert: Option<(String, String, String)>,
}

/// Generates architectural diagrams from a workspace owned by this instance.
pub struct DiagramGenerator {
    config: DiagramConfig,
    workspace: Workspace,
    store: MetadataStore,
}

impl DiagramGenerator {
    /// Create a generator with a fresh workspace configured from `config`.
    ///
    /// Fails on invalid configuration before anything else happens.
    pub fn new(config: DiagramConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let workspace = Workspace::new(config.name.clone(), config.description.clone());
        Ok(Self {
            config,
            workspace,
            store: MetadataStore::new(),
        })
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Metadata records collected so far, in view creation order.
    pub fn metadata(&self) -> &[DiagramMetadata] {
        self.store.records()
    }

    // -------------------------------------------------------------------
    // View creation
    // -------------------------------------------------------------------

    /// Add a system context view rooted at a software system.
    ///
    /// The view key is derived from the root element's name
    /// (`SystemContext-<Name>`); pass views with clashing names through
    /// [`Workspace::add_view`] with an explicit key instead.
    pub fn add_system_context_view(
        &mut self,
        system: ElementId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ViewId, ModelError> {
        self.add_keyed_view(ViewKind::SystemContext, "SystemContext", system, title, description)
    }

    /// Add a container view rooted at a software system.
    pub fn add_container_view(
        &mut self,
        system: ElementId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ViewId, ModelError> {
        self.add_keyed_view(ViewKind::Container, "Container", system, title, description)
    }

    /// Add a component view rooted at a container.
    pub fn add_component_view(
        &mut self,
        container: ElementId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ViewId, ModelError> {
        self.add_keyed_view(ViewKind::Component, "Component", container, title, description)
    }

    fn add_keyed_view(
        &mut self,
        kind: ViewKind,
        prefix: &str,
        root: ElementId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ViewId, ModelError> {
        let root_name = self
            .workspace
            .element(root)
            .map(|e| e.name.replace(' ', ""))
            .unwrap_or_default();
        let key = format!("{prefix}-{root_name}");
        self.workspace.add_view(kind, root, key, title, description)
    }

    /// Add elements to a view's inclusion set.
    pub fn include(&mut self, view: ViewId, elements: &[ElementId]) -> Result<(), ModelError> {
        self.workspace.include(view, elements)
    }

    // -------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------

    /// Export the workspace and every view to `output_dir`.
    ///
    /// Writes the structured export, per-view diagram descriptions, rendered
    /// images (when a renderer is supplied and `png` is configured), and one
    /// metadata record per successfully exported view.
    pub fn export_all(
        &mut self,
        output_dir: &Path,
        options: &ExportOptions<'_>,
    ) -> Result<ExportReport, GeneratorError> {
        if self.workspace.views().is_empty() {
            return Err(GeneratorError::NoViews(self.workspace.name.clone()));
        }
        fs::create_dir_all(output_dir)?;

        if self.config.wants("json") {
            let text = export::export_structured(&self.config, &self.workspace)?;
            fs::write(output_dir.join(WORKSPACE_EXPORT), text)?;
        }

        let manifest = if options.use_cache {
            CacheManifest::load(output_dir)
        } else {
            CacheManifest::empty()
        };

        let render_png = self.config.wants("png") && options.renderer.is_some();
        let want_puml = self.config.wants("plantuml") || render_png;

        // Diagram texts are pure functions of the workspace; compute them
        // up front so the parallel phase only does I/O and rendering.
        let texts: Vec<String> = self
            .workspace
            .views()
            .iter()
            .map(|view| export::export_diagram_description(&self.workspace, view))
            .collect();

        let workspace = &self.workspace;
        let config = &self.config;
        let manifest_ref = &manifest;
        let outcomes: Vec<Result<ViewOutcome, String>> = self
            .workspace
            .views()
            .par_iter()
            .zip(texts.par_iter())
            .map(|(view, text)| {
                export_view(
                    view,
                    text,
                    config,
                    output_dir,
                    want_puml,
                    render_png,
                    options.renderer,
                    manifest_ref,
                )
            })
            .collect();

        let mut report = ExportReport::default();
        let mut manifest = manifest;
        for (view, outcome) in workspace.views().iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => {
                    if outcome.cache_hit {
                        report.cache.hits += 1;
                    } else if render_png {
                        report.cache.misses += 1;
                    }
                    if let Some((path, source_hash, params_hash)) = outcome.cache_insert {
                        manifest.insert(path, source_hash, params_hash);
                    }
                    if let Some(reason) = outcome.render_failure {
                        report.render_failures.push(ViewFailure {
                            key: view.key.clone(),
                            error: reason,
                        });
                    }
                    let record = DiagramMetadata {
                        schema_version: SCHEMA_VERSION,
                        key: view.key.clone(),
                        title: view.title.clone(),
                        description: view.description.clone(),
                        diagram_type: view.kind.metadata_token().to_string(),
                        last_updated: Utc::now(),
                        source_path: WORKSPACE_EXPORT.to_string(),
                        output_files: outcome.outputs.clone(),
                    };
                    report.exported.push(ExportedView {
                        key: view.key.clone(),
                        title: view.title.clone(),
                        diagram_type: view.kind.metadata_token().to_string(),
                        formats: outcome.outputs.keys().cloned().collect(),
                    });
                    self.store.push(record);
                }
                Err(error) => {
                    report.failures.push(ViewFailure {
                        key: view.key.clone(),
                        error,
                    });
                }
            }
        }

        self.store.write_all(output_dir)?;
        if options.use_cache {
            manifest.save(output_dir)?;
        }
        Ok(report)
    }
}

/// Export one view: validate its diagram text, write artifacts, render.
///
/// Returns `Err(reason)` when the view must be dropped; render failures are
/// carried inside the `Ok` outcome because they are non-fatal.
#[allow(clippy::too_many_arguments)]
fn export_view(
    view: &crate::model::View,
    text: &str,
    config: &DiagramConfig,
    output_dir: &Path,
    want_puml: bool,
    render_png: bool,
    renderer: Option<&dyn Renderer>,
    manifest: &CacheManifest,
) -> Result<ViewOutcome, String> {
    export::validate_diagram_description(text).map_err(|e| e.to_string())?;

    let mut outcome = ViewOutcome {
        outputs: BTreeMap::new(),
        render_failure: None,
        cache_hit: false,
        cache_insert: None,
    };

    if config.wants("json") {
        outcome
            .outputs
            .insert("json".to_string(), WORKSPACE_EXPORT.to_string());
    }

    let puml_name = format!("{}.puml", view.key);
    if want_puml {
        fs::write(output_dir.join(&puml_name), text).map_err(|e| e.to_string())?;
        if config.wants("plantuml") {
            outcome.outputs.insert("plantuml".to_string(), puml_name.clone());
        }
    }

    if render_png && let Some(renderer) = renderer {
        let png_name = format!("{}.{}", view.key, renderer.extension());
        let source_hash = cache::hash_content(text);
        let params_hash = cache::hash_render_params(&renderer.describe(), renderer.extension());

        match manifest.find_cached(&source_hash, &params_hash, output_dir) {
            Some(stored) => {
                if stored != png_name {
                    // Cached under an old key — reuse the bytes at the new path.
                    fs::copy(output_dir.join(&stored), output_dir.join(&png_name))
                        .map_err(|e| e.to_string())?;
                }
                outcome.cache_hit = true;
                outcome.cache_insert = Some((png_name.clone(), source_hash, params_hash));
                outcome.outputs.insert("png".to_string(), png_name);
            }
            None => match renderer.render(&output_dir.join(&puml_name), output_dir) {
                Ok(_) => {
                    outcome.cache_insert = Some((png_name.clone(), source_hash, params_hash));
                    outcome.outputs.insert("png".to_string(), png_name);
                }
                Err(err) => {
                    outcome.render_failure = Some(err.to_string());
                }
            },
        }
    }

    Ok(outcome)
}
