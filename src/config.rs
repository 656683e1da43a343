//! Configuration module.
//!
//! Handles loading and validating `archdoc.toml`. One file configures both
//! pipeline stages:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [workspace]
//! name = "Architecture Diagrams"
//! description = "System architecture documentation"
//! version = "1.0.0"
//! author = "Architecture Team"
//! output_formats = ["json", "plantuml"]   # add "png" to render images
//!
//! [site]
//! title = "Architecture Diagrams"
//! description = "Explore the system architecture through its diagrams"
//! base_url = ""             # non-empty enables sitemap.xml
//! theme = "default"         # default | corporate | modern | minimal
//!
//! [[site.navigation]]
//! label = "Home"
//! url = "index.html"
//!
//! [[site.navigation]]
//! label = "All Diagrams"
//! url = "diagrams/"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [site]
//! theme = "modern"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Output formats the export stage knows how to produce.
pub const SUPPORTED_FORMATS: [&str; 3] = ["json", "plantuml", "png"];

/// Top-level configuration for both pipeline stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Workspace/export settings.
    pub workspace: DiagramConfig,
    /// Site generation settings.
    pub site: SiteConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workspace.validate()?;
        self.site.validate()
    }
}

/// Configuration for diagram generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramConfig {
    /// Name of the diagram set or project.
    pub name: String,
    /// What the diagrams represent.
    pub description: String,
    /// Version string for the diagram set.
    pub version: String,
    /// Author or team responsible for the diagrams.
    pub author: String,
    /// Formats to export, in order. Supported: `json`, `plantuml`, `png`.
    pub output_formats: Vec<String>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            name: "Architecture Diagrams".to_string(),
            description: "System architecture documentation".to_string(),
            version: "1.0.0".to_string(),
            author: "Architecture Team".to_string(),
            output_formats: vec!["json".to_string(), "plantuml".to_string()],
        }
    }
}

impl DiagramConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "workspace.name must not be empty".into(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(ConfigError::Validation(
                "workspace.description must not be empty".into(),
            ));
        }
        for format in &self.output_formats {
            if !SUPPORTED_FORMATS.contains(&format.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "unsupported output format '{format}' (supported: {})",
                    SUPPORTED_FORMATS.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn wants(&self, format: &str) -> bool {
        self.output_formats.iter().any(|f| f == format)
    }
}

/// A single explicit navigation entry in the site header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavEntry {
    pub label: String,
    pub url: String,
}

/// Configuration for static site generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, shown in the header and page titles.
    pub title: String,
    /// Site description. Rendered as markdown on the home page.
    pub description: String,
    /// Base URL for absolute links (sitemap). Empty disables the sitemap.
    pub base_url: String,
    /// Theme name, resolved through the style registry for page colors.
    pub theme: String,
    /// Explicit header navigation entries.
    pub navigation: Vec<NavEntry>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Architecture Diagrams".to_string(),
            description: "Explore the system architecture through its diagrams".to_string(),
            base_url: String::new(),
            theme: "default".to_string(),
            navigation: vec![
                NavEntry {
                    label: "Home".to_string(),
                    url: "index.html".to_string(),
                },
                NavEntry {
                    label: "All Diagrams".to_string(),
                    url: "diagrams/".to_string(),
                },
            ],
        }
    }
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        if style::theme(&self.theme).is_err() {
            return Err(ConfigError::Validation(format!(
                "site.theme '{}' is not a registered theme (available: {})",
                self.theme,
                style::THEME_NAMES.join(", ")
            )));
        }
        for entry in &self.navigation {
            if entry.label.trim().is_empty() || entry.url.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "site.navigation entries need both a label and a url".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel export workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `archdoc.toml` from `path`, merged over stock defaults and validated.
///
/// A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// A documented stock `archdoc.toml`, printed by `archdoc gen-config`.
pub fn stock_config_toml() -> String {
    let header = "\
# archdoc configuration.
#
# Every option is optional; the values below are the defaults. Delete
# anything you don't want to override. Unknown keys are rejected.

";
    let body = toml::to_string_pretty(&Config::default())
        .expect("default config must serialize");
    format!("{header}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn empty_workspace_name_rejected() {
        let mut config = Config::default();
        config.workspace.name = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unsupported_output_format_rejected() {
        let mut config = Config::default();
        config.workspace.output_formats.push("svg".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("svg"));
    }

    #[test]
    fn unknown_site_theme_rejected() {
        let mut config = Config::default();
        config.site.theme = "neon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("archdoc.toml")).unwrap();
        assert_eq!(config.workspace.name, "Architecture Diagrams");
        assert_eq!(config.site.navigation.len(), 2);
    }

    #[test]
    fn sparse_overlay_preserves_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archdoc.toml");
        std::fs::write(&path, "[site]\ntheme = \"modern\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.site.theme, "modern");
        // untouched sections keep their defaults
        assert_eq!(config.workspace.output_formats, vec!["json", "plantuml"]);
        assert_eq!(config.site.title, "Architecture Diagrams");
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archdoc.toml");
        std::fs::write(&path, "[site]\ntheem = \"modern\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_toml_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archdoc.toml");
        std::fs::write(&path, "not valid [ toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_parses_back() {
        let printed = stock_config_toml();
        let parsed: Config = toml::from_str(&printed).unwrap();
        parsed.validate().unwrap();
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(10_000),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}
