//! Diagram metadata records — the contract between pipeline stages.
//!
//! Every exported view produces one [`DiagramMetadata`] record, persisted as
//! `<key>.metadata.json` in the export output directory. The site stage
//! consumes only these files; it never sees the workspace or its views. The
//! two stages may run in separate processes, so the record format is treated
//! as a versioned schema boundary.
//!
//! ## Schema versions
//!
//! - **Version 2** (current): snake_case fields with an explicit
//!   `schema_version` marker.
//! - **Version 1** (legacy): the camelCase shape written by the previous
//!   generator (`title`/`type`/`lastUpdated`/`filePath`/`outputFiles`, no
//!   version marker). Loaded through an explicit migration, not best-effort
//!   parsing.
//!
//! Records claiming a version newer than [`SCHEMA_VERSION`] are skipped with
//! a warning; a directory that yields zero loadable records is a fatal error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Current metadata schema version. Bump when the record shape changes and
/// add a migration arm in [`load_file`].
pub const SCHEMA_VERSION: u32 = 2;

/// File suffix for metadata records.
pub const METADATA_SUFFIX: &str = ".metadata.json";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported metadata schema version {found} in {path} (this build reads up to {SCHEMA_VERSION})")]
    UnsupportedVersion { found: u64, path: PathBuf },
    #[error("unparseable timestamp '{0}' in legacy metadata")]
    BadTimestamp(String),
    #[error("no loadable diagram metadata found in {0}")]
    NoContent(PathBuf),
}

/// Metadata for one exported diagram view. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramMetadata {
    pub schema_version: u32,
    /// View key; doubles as the record's file stem and asset identity.
    pub key: String,
    pub title: String,
    pub description: String,
    /// Diagram kind token: `system_context`, `container`, `component`.
    /// Kept as a string so records written by newer generators with kinds
    /// this build doesn't know still load (they group under "other").
    pub diagram_type: String,
    pub last_updated: DateTime<Utc>,
    /// The file this diagram was exported from.
    pub source_path: String,
    /// Output format name → produced file path, relative to the export dir.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_files: BTreeMap<String, String>,
}

impl DiagramMetadata {
    pub fn kind(&self) -> DiagramKind {
        DiagramKind::from_token(&self.diagram_type)
    }

    /// File name this record is stored under.
    pub fn file_name(&self) -> String {
        format!("{}{METADATA_SUFFIX}", self.key)
    }
}

/// Grouping bucket for navigation and listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagramKind {
    SystemContext,
    Container,
    Component,
    Other,
}

impl DiagramKind {
    /// Fixed navigation precedence.
    pub const ORDER: [DiagramKind; 4] = [
        DiagramKind::SystemContext,
        DiagramKind::Container,
        DiagramKind::Component,
        DiagramKind::Other,
    ];

    pub fn from_token(token: &str) -> Self {
        match token {
            "system_context" => DiagramKind::SystemContext,
            "container" => DiagramKind::Container,
            "component" => DiagramKind::Component,
            _ => DiagramKind::Other,
        }
    }

    /// Human-readable label for headings and navigation.
    pub fn label(self) -> &'static str {
        match self {
            DiagramKind::SystemContext => "System Context",
            DiagramKind::Container => "Container",
            DiagramKind::Component => "Component",
            DiagramKind::Other => "Other",
        }
    }

    /// URL slug for the kind's listing page.
    pub fn slug(self) -> &'static str {
        match self {
            DiagramKind::SystemContext => "system-context",
            DiagramKind::Container => "container",
            DiagramKind::Component => "component",
            DiagramKind::Other => "other",
        }
    }
}

/// Append-only collection of records produced during one export run.
///
/// Record order is view creation order — the generator appends in that order
/// regardless of which export worker finishes first.
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: Vec<DiagramMetadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DiagramMetadata) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DiagramMetadata] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write every record to `dir` as `<key>.metadata.json`.
    pub fn write_all(&self, dir: &Path) -> Result<(), MetadataError> {
        for record in &self.records {
            write_record(record, dir)?;
        }
        Ok(())
    }
}

/// Write one record to `dir` as `<key>.metadata.json`.
pub fn write_record(record: &DiagramMetadata, dir: &Path) -> Result<(), MetadataError> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(dir.join(record.file_name()), json)?;
    Ok(())
}

/// Load all metadata records from a directory.
///
/// Files ending in `.metadata.json` are parsed; individual failures are
/// logged and skipped. Zero loadable records is fatal. Records come back in
/// file-name order for a deterministic baseline.
pub fn load_dir(dir: &Path) -> Result<Vec<DiagramMetadata>, MetadataError> {
    let mut records = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                eprintln!("Warning: skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(METADATA_SUFFIX) {
            continue;
        }
        match load_file(entry.path()) {
            Ok(record) => records.push(record),
            Err(err) => {
                eprintln!("Warning: skipping {}: {err}", entry.path().display());
            }
        }
    }
    if records.is_empty() {
        return Err(MetadataError::NoContent(dir.to_path_buf()));
    }
    Ok(records)
}

/// Load one metadata file, migrating legacy records to the current schema.
pub fn load_file(path: &Path) -> Result<DiagramMetadata, MetadataError> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    match value.get("schema_version").and_then(serde_json::Value::as_u64) {
        Some(v) if v == u64::from(SCHEMA_VERSION) => Ok(serde_json::from_value(value)?),
        Some(v) if v > u64::from(SCHEMA_VERSION) => Err(MetadataError::UnsupportedVersion {
            found: v,
            path: path.to_path_buf(),
        }),
        // No marker or version 1: the legacy camelCase shape.
        _ => migrate_legacy(value),
    }
}

/// The version-1 record shape, as written by the previous generator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMetadata {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    diagram_type: String,
    last_updated: String,
    file_path: String,
    #[serde(default)]
    output_files: BTreeMap<String, String>,
}

fn migrate_legacy(value: serde_json::Value) -> Result<DiagramMetadata, MetadataError> {
    let legacy: LegacyMetadata = serde_json::from_value(value)?;
    let last_updated = parse_legacy_timestamp(&legacy.last_updated)?;
    let key = legacy_key(&legacy.file_path);
    Ok(DiagramMetadata {
        schema_version: SCHEMA_VERSION,
        key,
        title: legacy.title,
        description: legacy.description,
        diagram_type: legacy.diagram_type,
        last_updated,
        source_path: legacy.file_path,
        output_files: legacy.output_files,
    })
}

/// Legacy timestamps are ISO 8601, with or without a UTC offset.
fn parse_legacy_timestamp(raw: &str) -> Result<DateTime<Utc>, MetadataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| MetadataError::BadTimestamp(raw.to_string()))
}

/// Derive a record key from a legacy `filePath` value (its file stem).
fn legacy_key(file_path: &str) -> String {
    Path::new(file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(key: &str, diagram_type: &str) -> DiagramMetadata {
        DiagramMetadata {
            schema_version: SCHEMA_VERSION,
            key: key.to_string(),
            title: format!("{key} title"),
            description: "a diagram".to_string(),
            diagram_type: diagram_type.to_string(),
            last_updated: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            source_path: format!("{key}.json"),
            output_files: BTreeMap::new(),
        }
    }

    #[test]
    fn write_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = MetadataStore::new();
        store.push(record("shop-context", "system_context"));
        store.push(record("shop-containers", "container"));
        store.write_all(dir.path()).unwrap();

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        // file-name order
        assert_eq!(loaded[0].key, "shop-containers");
        assert_eq!(loaded[1].key, "shop-context");
        assert_eq!(loaded[1], store.records()[0]);
    }

    #[test]
    fn empty_dir_is_no_content() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_dir(dir.path()),
            Err(MetadataError::NoContent(_))
        ));
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_record(&record("good", "container"), dir.path()).unwrap();
        fs::write(dir.path().join("bad.metadata.json"), "{ not json").unwrap();

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "good");
    }

    #[test]
    fn only_corrupt_files_is_no_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.metadata.json"), "{ not json").unwrap();
        assert!(matches!(
            load_dir(dir.path()),
            Err(MetadataError::NoContent(_))
        ));
    }

    #[test]
    fn non_metadata_json_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_record(&record("good", "component"), dir.path()).unwrap();
        fs::write(dir.path().join("workspace.json"), "{}").unwrap();
        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn legacy_record_migrates() {
        let dir = TempDir::new().unwrap();
        let legacy = r#"{
            "title": "System Context View",
            "description": "High-level view",
            "type": "system_context",
            "lastUpdated": "2024-05-02T10:30:00",
            "filePath": "SystemContext-Shop.json",
            "outputFiles": {"plantuml": "SystemContext-Shop.puml"}
        }"#;
        let path = dir.path().join("SystemContext-Shop.metadata.json");
        fs::write(&path, legacy).unwrap();

        let migrated = load_file(&path).unwrap();
        assert_eq!(migrated.schema_version, SCHEMA_VERSION);
        assert_eq!(migrated.key, "SystemContext-Shop");
        assert_eq!(migrated.diagram_type, "system_context");
        assert_eq!(migrated.source_path, "SystemContext-Shop.json");
        assert_eq!(
            migrated.output_files.get("plantuml").map(String::as_str),
            Some("SystemContext-Shop.puml")
        );
        assert_eq!(
            migrated.last_updated,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn legacy_record_with_offset_timestamp_migrates() {
        let parsed = parse_legacy_timestamp("2024-05-02T10:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap());
    }

    #[test]
    fn future_schema_version_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_record(&record("good", "container"), dir.path()).unwrap();
        let future = serde_json::json!({
            "schema_version": SCHEMA_VERSION + 1,
            "key": "future",
            "some_new_field": true
        });
        fs::write(
            dir.path().join("future.metadata.json"),
            serde_json::to_string(&future).unwrap(),
        )
        .unwrap();

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "good");
    }

    #[test]
    fn kind_token_mapping() {
        assert_eq!(DiagramKind::from_token("system_context"), DiagramKind::SystemContext);
        assert_eq!(DiagramKind::from_token("container"), DiagramKind::Container);
        assert_eq!(DiagramKind::from_token("component"), DiagramKind::Component);
        assert_eq!(DiagramKind::from_token("deployment"), DiagramKind::Other);
    }
}
