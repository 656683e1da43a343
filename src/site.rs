//! HTML site generation.
//!
//! Stage 2 of the archdoc pipeline. Takes a set of diagram metadata records
//! plus a [`SiteConfig`] and produces a fully-linked static page tree:
//!
//! ```text
//! dist/
//! ├── index.html                  # Home: counts, listings, recent diagrams
//! ├── sitemap.xml                 # When base_url is configured
//! ├── diagrams/
//! │   ├── system-context.html     # One listing page per diagram kind present
//! │   ├── container.html
//! │   ├── SystemContext-Shop.html # One page per diagram
//! │   └── ...
//! └── assets/
//!     └── SystemContext-Shop.png  # Copied rendered images
//! ```
//!
//! ## Determinism
//!
//! Given identical records and config, the output tree is byte-for-byte
//! reproducible. Every date in the output comes from the records'
//! `last_updated` fields — the generator never reads the clock. Navigation
//! is rebuilt from scratch on every run.
//!
//! ## Failure policy
//!
//! A record whose page cannot be written is reported and skipped; the rest
//! of the site still generates. Zero successfully generated diagram pages
//! fails the stage. A missing rendered image is only a warning — the page
//! gets a placeholder figure.
//!
//! ## HTML generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating
//! with automatic XSS escaping. The stylesheet is embedded at compile time;
//! theme colors from the style registry are prepended as CSS custom
//! properties.

use crate::config::{ConfigError, SiteConfig};
use crate::metadata::{DiagramKind, DiagramMetadata, MetadataError};
use crate::style::{self, StyleSheet, StyleTarget};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("no diagram pages could be generated ({0} records all failed)")]
    NothingRendered(usize),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Navigation tree node, rebuilt from the record set on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: String,
    /// Href relative to the site root, e.g. `diagrams/container.html`.
    pub href: String,
    pub children: Vec<NavItem>,
}

/// Statistics shown on the home page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SiteStats {
    pub total: usize,
    pub system_contexts: usize,
    pub containers: usize,
    pub components: usize,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

impl SiteStats {
    pub fn from_records(records: &[DiagramMetadata]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.kind() {
                DiagramKind::SystemContext => stats.system_contexts += 1,
                DiagramKind::Container => stats.containers += 1,
                DiagramKind::Component => stats.components += 1,
                DiagramKind::Other => {}
            }
        }
        stats.last_updated = records.iter().map(|r| r.last_updated).max();
        stats
    }
}

/// A record whose page failed; generation of the others continued.
#[derive(Debug)]
pub struct RecordFailure {
    pub key: String,
    pub error: String,
}

/// Summary of one site generation run.
#[derive(Debug, Default)]
pub struct SiteReport {
    /// Paths written, relative to the output directory.
    pub pages: Vec<String>,
    pub assets_copied: usize,
    pub warnings: Vec<String>,
    pub failures: Vec<RecordFailure>,
}

// =============================================================================
// Navigation
// =============================================================================

/// Group records by diagram kind, in fixed kind precedence, children ordered
/// by title (case-insensitive, ties broken by source path).
fn group_by_kind(records: &[DiagramMetadata]) -> Vec<(DiagramKind, Vec<&DiagramMetadata>)> {
    DiagramKind::ORDER
        .iter()
        .filter_map(|&kind| {
            let mut group: Vec<&DiagramMetadata> =
                records.iter().filter(|r| r.kind() == kind).collect();
            if group.is_empty() {
                return None;
            }
            group.sort_by(|a, b| {
                (a.title.to_lowercase(), &a.source_path).cmp(&(b.title.to_lowercase(), &b.source_path))
            });
            Some((kind, group))
        })
        .collect()
}

/// Build the navigation tree: one top-level node per diagram kind present.
pub fn build_navigation(records: &[DiagramMetadata]) -> Vec<NavItem> {
    group_by_kind(records)
        .into_iter()
        .map(|(kind, group)| NavItem {
            label: kind.label().to_string(),
            href: listing_href(kind),
            children: group
                .iter()
                .map(|record| NavItem {
                    label: record.title.clone(),
                    href: diagram_href(record),
                    children: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

fn listing_href(kind: DiagramKind) -> String {
    format!("diagrams/{}.html", kind.slug())
}

fn diagram_href(record: &DiagramMetadata) -> String {
    format!("diagrams/{}.html", record.key)
}

fn asset_href(record: &DiagramMetadata) -> String {
    let ext = record
        .output_files
        .get("png")
        .and_then(|p| Path::new(p).extension())
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    format!("assets/{}.{}", record.key, ext)
}

// =============================================================================
// Site generation
// =============================================================================

/// Generate the complete static site from metadata records.
///
/// `metadata_dir` is where the records' relative output paths (images,
/// diagram sources) resolve from; `output_dir` receives the page tree.
pub fn generate_site(
    records: &[DiagramMetadata],
    config: &SiteConfig,
    metadata_dir: &Path,
    output_dir: &Path,
) -> Result<SiteReport, SiteError> {
    if records.is_empty() {
        return Err(SiteError::Metadata(MetadataError::NoContent(
            metadata_dir.to_path_buf(),
        )));
    }
    config.validate()?;

    // validated above, so the theme resolves
    let sheet = style::theme(&config.theme).map_err(|e| {
        SiteError::Config(ConfigError::Validation(e.to_string()))
    })?;
    let css = format!("{}\n\n{}", color_css(&sheet), CSS_STATIC);

    fs::create_dir_all(output_dir)?;
    fs::create_dir_all(output_dir.join("diagrams"))?;
    fs::create_dir_all(output_dir.join("assets"))?;

    let mut report = SiteReport::default();

    // Copy rendered images under a stable path derived from each record's
    // key. Missing sources degrade to placeholder pages.
    for record in records {
        let Some(source_rel) = record.output_files.get("png") else {
            continue;
        };
        let source = metadata_dir.join(source_rel);
        if source.exists() {
            fs::copy(&source, output_dir.join(asset_href(record)))?;
            report.assets_copied += 1;
        } else {
            report.warnings.push(format!(
                "image for '{}' not found at {} — page will use a placeholder",
                record.key,
                source.display()
            ));
        }
    }

    let nav = build_navigation(records);
    let stats = SiteStats::from_records(records);

    let home = render_home(config, records, &stats, &nav, &css);
    fs::write(output_dir.join("index.html"), home.into_string())?;
    report.pages.push("index.html".to_string());

    for (kind, group) in group_by_kind(records) {
        let listing = render_listing(config, kind, &group, &nav, &css);
        let path = listing_href(kind);
        fs::write(output_dir.join(&path), listing.into_string())?;
        report.pages.push(path);
    }

    let mut diagram_pages = 0usize;
    for record in records {
        let image_available = output_dir.join(asset_href(record)).exists();
        let source_text = diagram_source_text(record, metadata_dir);
        let page = render_diagram_page(config, record, image_available, source_text.as_deref(), &nav, &css);
        let path = diagram_href(record);
        match fs::write(output_dir.join(&path), page.into_string()) {
            Ok(()) => {
                report.pages.push(path);
                diagram_pages += 1;
            }
            Err(err) => report.failures.push(RecordFailure {
                key: record.key.clone(),
                error: err.to_string(),
            }),
        }
    }
    if diagram_pages == 0 {
        return Err(SiteError::NothingRendered(records.len()));
    }

    if !config.base_url.is_empty() {
        fs::write(output_dir.join("sitemap.xml"), sitemap_xml(records, config))?;
        report.pages.push("sitemap.xml".to_string());
    }

    Ok(report)
}

/// Load the diagram description source for embedding on the diagram page.
fn diagram_source_text(record: &DiagramMetadata, metadata_dir: &Path) -> Option<String> {
    let rel = record.output_files.get("plantuml")?;
    fs::read_to_string(metadata_dir.join(rel)).ok()
}

/// CSS custom properties generated from the site theme's color map.
fn color_css(sheet: &StyleSheet) -> String {
    let mut lines = vec![":root {".to_string()];
    for (target, color) in &sheet.colors {
        let name = match target {
            StyleTarget::Person => "person",
            StyleTarget::SoftwareSystem => "software-system",
            StyleTarget::Container => "container",
            StyleTarget::Component => "component",
            StyleTarget::External => "external",
        };
        lines.push(format!("  --color-{}: {};", name, color));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

// =============================================================================
// HTML components
// =============================================================================

/// Renders the base HTML document structure.
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css.to_string())) }
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the site header: title link, explicit nav entries, kind tree.
///
/// `rel` is the prefix from the current page back to the site root
/// (`""` for root pages, `"../"` for pages under `diagrams/`).
fn site_header(config: &SiteConfig, nav: &[NavItem], rel: &str, current: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href={ (rel) "index.html" } { (config.title) }
            nav.site-nav {
                ul {
                    @for entry in &config.navigation {
                        li {
                            @if entry.url.starts_with("http://") || entry.url.starts_with("https://") {
                                a href=(entry.url) { (entry.label) }
                            } @else {
                                a href={ (rel) (entry.url) } { (entry.label) }
                            }
                        }
                    }
                }
                (render_nav(nav, rel, current))
            }
        }
    }
}

/// Renders the diagram navigation tree (kind groups with diagram children).
pub fn render_nav(items: &[NavItem], rel: &str, current: &str) -> Markup {
    html! {
        ul.diagram-nav {
            @for item in items {
                (render_nav_item(item, rel, current))
            }
        }
    }
}

fn render_nav_item(item: &NavItem, rel: &str, current: &str) -> Markup {
    let is_current = item.href == current;
    html! {
        li class=[is_current.then_some("current")] {
            a href={ (rel) (item.href) } { (item.label) }
            @if !item.children.is_empty() {
                ul {
                    @for child in &item.children {
                        (render_nav_item(child, rel, current))
                    }
                }
            }
        }
    }
}

fn breadcrumb(parts: Markup) -> Markup {
    html! {
        nav.breadcrumb { (parts) }
    }
}

fn format_date(record: &DiagramMetadata) -> String {
    record.last_updated.format("%Y-%m-%d").to_string()
}

// =============================================================================
// Page renderers
// =============================================================================

/// Renders the home page: description, per-kind counts, recent diagrams.
fn render_home(
    config: &SiteConfig,
    records: &[DiagramMetadata],
    stats: &SiteStats,
    nav: &[NavItem],
    css: &str,
) -> Markup {
    // Markdown description
    let parser = Parser::new(&config.description);
    let mut description_html = String::new();
    md_html::push_html(&mut description_html, parser);

    // Most recently updated first; key breaks timestamp ties for stable output
    let mut recent: Vec<&DiagramMetadata> = records.iter().collect();
    recent.sort_by(|a, b| b.last_updated.cmp(&a.last_updated).then(a.key.cmp(&b.key)));
    recent.truncate(6);

    let content = html! {
        (site_header(config, nav, "", "index.html"))
        main.home-page {
            header.home-intro {
                h1 { (config.title) }
                div.site-description { (PreEscaped(description_html)) }
            }
            section.stats {
                @for (kind, group) in group_by_kind(records) {
                    a.stat-card href=(listing_href(kind)) {
                        span.stat-count { (group.len()) }
                        span.stat-label { (kind.label()) }
                    }
                }
            }
            section.recent {
                h2 { "Recently updated" }
                ul.diagram-list {
                    @for record in &recent {
                        li {
                            a href=(diagram_href(record)) { (record.title) }
                            span.diagram-date { (format_date(record)) }
                        }
                    }
                }
            }
        }
        (footer(stats))
    };
    base_document(&config.title, css, content)
}

/// Renders a listing page for one diagram kind.
fn render_listing(
    config: &SiteConfig,
    kind: DiagramKind,
    group: &[&DiagramMetadata],
    nav: &[NavItem],
    css: &str,
) -> Markup {
    let crumbs = breadcrumb(html! {
        a href="../index.html" { "Home" }
        " › "
        (kind.label())
    });

    let content = html! {
        (site_header(config, nav, "../", &listing_href(kind)))
        main.listing-page {
            (crumbs)
            h1 { (kind.label()) " diagrams" }
            ul.diagram-list {
                @for record in group {
                    li.diagram-entry {
                        a href={ (record.key) ".html" } { (record.title) }
                        span.diagram-date { (format_date(record)) }
                        @if !record.description.is_empty() {
                            p.diagram-description { (record.description) }
                        }
                    }
                }
            }
        }
    };
    let title = format!("{} diagrams - {}", kind.label(), config.title);
    base_document(&title, css, content)
}

/// Renders one diagram page: image (or placeholder), metadata, source text.
fn render_diagram_page(
    config: &SiteConfig,
    record: &DiagramMetadata,
    image_available: bool,
    source_text: Option<&str>,
    nav: &[NavItem],
    css: &str,
) -> Markup {
    let kind = record.kind();
    let crumbs = breadcrumb(html! {
        a href="../index.html" { "Home" }
        " › "
        a href={ (kind.slug()) ".html" } { (kind.label()) }
        " › "
        (record.title)
    });

    let content = html! {
        (site_header(config, nav, "../", &diagram_href(record)))
        main.diagram-page {
            (crumbs)
            h1 { (record.title) }
            @if image_available {
                figure.diagram-frame {
                    img src={ "../" (asset_href(record)) } alt=(record.title);
                }
            } @else {
                div.diagram-placeholder {
                    p { "No rendered image is available for this diagram." }
                    p.placeholder-hint { "The diagram description below is the source of record." }
                }
            }
            dl.diagram-meta {
                @if !record.description.is_empty() {
                    dt { "Description" }
                    dd { (record.description) }
                }
                dt { "Kind" }
                dd { span class={ "kind-badge kind-" (kind.slug()) } { (kind.label()) } }
                dt { "Last updated" }
                dd { (format_date(record)) }
                dt { "Source" }
                dd { code { (record.source_path) } }
            }
            @if let Some(source) = source_text {
                details.diagram-source {
                    summary { "Diagram source" }
                    pre { code { (source) } }
                }
            }
        }
    };
    let title = format!("{} - {}", record.title, config.title);
    base_document(&title, css, content)
}

fn footer(stats: &SiteStats) -> Markup {
    html! {
        footer.site-footer {
            p {
                (stats.total) " diagrams"
                @if let Some(last) = stats.last_updated {
                    ", last updated " (last.format("%Y-%m-%d"))
                }
            }
        }
    }
}

// =============================================================================
// Sitemap
// =============================================================================

/// Sitemap with lastmod values taken from record timestamps only.
fn sitemap_xml(records: &[DiagramMetadata], config: &SiteConfig) -> String {
    let base = config.base_url.trim_end_matches('/');
    let stats = SiteStats::from_records(records);
    let site_lastmod = stats
        .last_updated
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#.to_string(),
    ];
    let mut url = |loc: String, lastmod: &str, changefreq: &str, priority: &str| {
        lines.push("  <url>".to_string());
        lines.push(format!("    <loc>{loc}</loc>"));
        lines.push(format!("    <lastmod>{lastmod}</lastmod>"));
        lines.push(format!("    <changefreq>{changefreq}</changefreq>"));
        lines.push(format!("    <priority>{priority}</priority>"));
        lines.push("  </url>".to_string());
    };

    url(format!("{base}/index.html"), &site_lastmod, "weekly", "1.0");
    for (kind, group) in group_by_kind(records) {
        let kind_lastmod = group
            .iter()
            .map(|r| r.last_updated)
            .max()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        url(
            format!("{base}/{}", listing_href(kind)),
            &kind_lastmod,
            "weekly",
            "0.8",
        );
        for record in group {
            url(
                format!("{base}/{}", diagram_href(record)),
                &format_date(record),
                "monthly",
                "0.6",
            );
        }
    }
    lines.push("</urlset>".to_string());
    lines.push(String::new());
    lines.join("\n")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SCHEMA_VERSION;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(key: &str, title: &str, diagram_type: &str) -> DiagramMetadata {
        DiagramMetadata {
            schema_version: SCHEMA_VERSION,
            key: key.to_string(),
            title: title.to_string(),
            description: format!("{title} description"),
            diagram_type: diagram_type.to_string(),
            last_updated: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
            source_path: "workspace.json".to_string(),
            output_files: BTreeMap::new(),
        }
    }

    fn sample_records() -> Vec<DiagramMetadata> {
        vec![
            record("SystemContext-Shop", "Shop Context", "system_context"),
            record("Container-Shop", "Shop Containers", "container"),
        ]
    }

    #[test]
    fn navigation_groups_by_kind_in_precedence_order() {
        // container created first; system-context must still lead
        let records = vec![
            record("Container-Shop", "Shop Containers", "container"),
            record("SystemContext-Shop", "Shop Context", "system_context"),
        ];
        let nav = build_navigation(&records);
        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].label, "System Context");
        assert_eq!(nav[1].label, "Container");
        assert_eq!(nav[0].children.len(), 1);
        assert_eq!(nav[1].children.len(), 1);
    }

    #[test]
    fn navigation_is_deterministic() {
        let records = sample_records();
        assert_eq!(build_navigation(&records), build_navigation(&records));
    }

    #[test]
    fn navigation_children_sorted_case_insensitively() {
        let records = vec![
            record("b", "beta view", "container"),
            record("a", "Alpha view", "container"),
            record("c", "ALPHA view", "container"),
        ];
        let nav = build_navigation(&records);
        let labels: Vec<&str> = nav[0].children.iter().map(|c| c.label.as_str()).collect();
        // "ALPHA view" and "Alpha view" tie case-insensitively; source path
        // ("workspace.json" for both) ties too, so input order is kept by
        // the stable sort — but both sort before "beta view".
        assert_eq!(labels.last(), Some(&"beta view"));
        assert!(labels[0].to_lowercase().starts_with("alpha"));
    }

    #[test]
    fn kinds_without_records_get_no_node() {
        let records = vec![record("only", "Only", "component")];
        let nav = build_navigation(&records);
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].label, "Component");
    }

    #[test]
    fn stats_count_per_kind() {
        let records = sample_records();
        let stats = SiteStats::from_records(&records);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.system_contexts, 1);
        assert_eq!(stats.containers, 1);
        assert_eq!(stats.components, 0);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn generate_site_produces_page_tree() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let records = sample_records();
        let config = SiteConfig::default();

        let report =
            generate_site(&records, &config, metadata_dir.path(), output_dir.path()).unwrap();

        assert!(output_dir.path().join("index.html").exists());
        assert!(output_dir.path().join("diagrams/system-context.html").exists());
        assert!(output_dir.path().join("diagrams/container.html").exists());
        assert!(!output_dir.path().join("diagrams/component.html").exists());
        assert!(output_dir.path().join("diagrams/SystemContext-Shop.html").exists());
        assert!(report.failures.is_empty());
        // no base_url → no sitemap
        assert!(!output_dir.path().join("sitemap.xml").exists());
    }

    #[test]
    fn missing_image_renders_placeholder_with_warning() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let mut records = sample_records();
        records[0]
            .output_files
            .insert("png".to_string(), "SystemContext-Shop.png".to_string());
        let config = SiteConfig::default();

        let report =
            generate_site(&records, &config, metadata_dir.path(), output_dir.path()).unwrap();

        assert_eq!(report.assets_copied, 0);
        assert_eq!(report.warnings.len(), 1);
        let page =
            fs::read_to_string(output_dir.path().join("diagrams/SystemContext-Shop.html")).unwrap();
        assert!(page.contains("diagram-placeholder"));
        assert!(!page.contains("<img"));
    }

    #[test]
    fn present_image_is_copied_and_embedded() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        fs::write(metadata_dir.path().join("SystemContext-Shop.png"), b"png").unwrap();
        let mut records = sample_records();
        records[0]
            .output_files
            .insert("png".to_string(), "SystemContext-Shop.png".to_string());
        let config = SiteConfig::default();

        let report =
            generate_site(&records, &config, metadata_dir.path(), output_dir.path()).unwrap();

        assert_eq!(report.assets_copied, 1);
        assert!(output_dir.path().join("assets/SystemContext-Shop.png").exists());
        let page =
            fs::read_to_string(output_dir.path().join("diagrams/SystemContext-Shop.html")).unwrap();
        assert!(page.contains(r#"src="../assets/SystemContext-Shop.png""#));
    }

    #[test]
    fn zero_records_is_fatal_and_writes_nothing() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let target = output_dir.path().join("site");

        let err = generate_site(&[], &config, metadata_dir.path(), &target).unwrap_err();
        assert!(matches!(err, SiteError::Metadata(MetadataError::NoContent(_))));
        assert!(!target.exists());
    }

    #[test]
    fn output_is_reproducible() {
        let metadata_dir = TempDir::new().unwrap();
        let out_a = TempDir::new().unwrap();
        let out_b = TempDir::new().unwrap();
        let records = sample_records();
        let mut config = SiteConfig::default();
        config.base_url = "https://example.com/arch".to_string();

        generate_site(&records, &config, metadata_dir.path(), out_a.path()).unwrap();
        generate_site(&records, &config, metadata_dir.path(), out_b.path()).unwrap();

        for page in ["index.html", "diagrams/SystemContext-Shop.html", "sitemap.xml"] {
            let a = fs::read_to_string(out_a.path().join(page)).unwrap();
            let b = fs::read_to_string(out_b.path().join(page)).unwrap();
            assert_eq!(a, b, "{page} differs between runs");
        }
    }

    #[test]
    fn sitemap_uses_record_dates_only() {
        let records = sample_records();
        let mut config = SiteConfig::default();
        config.base_url = "https://example.com/arch/".to_string();
        let xml = sitemap_xml(&records, &config);

        assert!(xml.contains("<loc>https://example.com/arch/index.html</loc>"));
        assert!(xml.contains("<loc>https://example.com/arch/diagrams/SystemContext-Shop.html</loc>"));
        // every lastmod is the records' date, never today's
        assert!(xml.contains("<lastmod>2026-02-01</lastmod>"));
        let lastmods: Vec<&str> = xml
            .lines()
            .filter(|l| l.contains("<lastmod>"))
            .map(str::trim)
            .collect();
        assert!(lastmods.iter().all(|l| *l == "<lastmod>2026-02-01</lastmod>"));
    }

    #[test]
    fn home_page_links_listings_and_escapes() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let mut records = sample_records();
        records[0].title = "<script>alert('xss')</script>".to_string();
        let config = SiteConfig::default();

        generate_site(&records, &config, metadata_dir.path(), output_dir.path()).unwrap();
        let home = fs::read_to_string(output_dir.path().join("index.html")).unwrap();
        assert!(home.contains("diagrams/system-context.html"));
        assert!(!home.contains("<script>alert"));
        assert!(home.contains("&lt;script&gt;"));
    }

    #[test]
    fn diagram_page_embeds_source_when_available() {
        let metadata_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        fs::write(
            metadata_dir.path().join("SystemContext-Shop.puml"),
            "@startuml\ntitle T\nPerson(p, \"P\", \"\")\n@enduml\n",
        )
        .unwrap();
        let mut records = sample_records();
        records[0]
            .output_files
            .insert("plantuml".to_string(), "SystemContext-Shop.puml".to_string());
        let config = SiteConfig::default();

        generate_site(&records, &config, metadata_dir.path(), output_dir.path()).unwrap();
        let page =
            fs::read_to_string(output_dir.path().join("diagrams/SystemContext-Shop.html")).unwrap();
        assert!(page.contains("Diagram source"));
        assert!(page.contains("@startuml"));
    }
}
