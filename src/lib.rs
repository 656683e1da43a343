//! # archdoc
//!
//! Architecture-as-code documentation. Diagrams are authored as code against
//! the workspace model, exported to structured metadata and PlantUML, and
//! assembled into a browsable static HTML site.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! archdoc processes a workspace through two independent stages, joined only
//! by metadata records on disk:
//!
//! ```text
//! 1. Export    diagram code  →  docs/    (JSON + .puml + *.metadata.json)
//! 2. Site      metadata dir  →  dist/    (final HTML site + images)
//! ```
//!
//! This separation exists for three reasons:
//!
//! - **Decoupling**: the stages can run as separate processes or CI steps;
//!   the site generator never touches the workspace model, only records.
//! - **Debuggability**: every intermediate artifact is human-readable JSON
//!   or PlantUML text you can inspect.
//! - **Testability**: site generation is a pure function from records plus
//!   config to a page tree, so tests exercise it without authoring diagrams.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Workspace, elements, relationships, views — the closed C4 model with validation |
//! | [`style`] | Named themes and per-kind color/shape sheets attached to views |
//! | [`export`] | Structured JSON export (round-trippable) and deterministic PlantUML export |
//! | [`generator`] | Stage 1 — owns a workspace, exports every view, records metadata, batches failures |
//! | [`metadata`] | The `*.metadata.json` contract between stages, with versioned-schema migration |
//! | [`site`] | Stage 2 — navigation tree, maud page rendering, asset copying, sitemap |
//! | [`render`] | External PlantUML invocation behind a trait; pass/fail only |
//! | [`cache`] | Content-addressed render cache for incremental builds |
//! | [`config`] | `archdoc.toml` loading, defaults, merging, and validation |
//! | [`output`] | CLI output formatting — pure formatters over stage reports |
//! | [`demo`] | Built-in e-commerce example workspace |
//!
//! # Design Decisions
//!
//! ## Determinism Everywhere
//!
//! Exported diagram text and the generated page tree are byte-for-byte
//! reproducible from the same inputs. Elements and relationships are emitted
//! in creation order, navigation is rebuilt from scratch each run, and the
//! only timestamps in the output are the `last_updated` fields already
//! stored on each metadata record. The clock is read exactly once per view,
//! when its record is created at export time.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed HTML is a build error, template variables
//! are Rust expressions, all interpolation is auto-escaped, and there is no
//! template directory to ship or get out of sync.
//!
//! ## Closed Kind Enums
//!
//! Element and view kinds are closed enums matched exhaustively at every
//! construction and export site. The metadata record keeps the kind as a
//! string so records written by newer generators still load — unknown kinds
//! group under a trailing "other" bucket instead of failing.
//!
//! ## Rendering Is Someone Else's Problem
//!
//! Turning PlantUML text into an image is delegated to an external tool
//! behind the [`render::Renderer`] trait, reduced to a pass/fail contract.
//! A failed render never fails a build: the view's page shows a placeholder
//! and embeds the diagram source instead.

pub mod cache;
pub mod config;
pub mod demo;
pub mod export;
pub mod generator;
pub mod metadata;
pub mod model;
pub mod output;
pub mod render;
pub mod site;
pub mod style;
