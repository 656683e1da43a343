//! Named visual themes for diagram views.
//!
//! A [`StyleSheet`] maps element kinds (plus the external-system bucket) to a
//! hex color and a shape name. Sheets come from the built-in theme registry
//! ([`theme`]) or from explicit overrides merged over a base theme
//! ([`StyleSheet::merged`]). Applying a sheet attaches it to a view's
//! rendering metadata; the diagram exporter turns it into style directives.
//!
//! Application is all-or-nothing: an unknown theme name is an error and
//! leaves the view unstyled. Reapplying the same theme or override set
//! produces the same attached sheet.

use crate::model::{ModelError, ViewId, Workspace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("unknown theme '{0}' (available: {names})", names = THEME_NAMES.join(", "))]
    UnknownTheme(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub const THEME_NAMES: [&str; 4] = ["default", "corporate", "modern", "minimal"];

/// What a style entry applies to: one element kind, or any external system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StyleTarget {
    Person,
    SoftwareSystem,
    Container,
    Component,
    External,
}

impl fmt::Display for StyleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StyleTarget::Person => "person",
            StyleTarget::SoftwareSystem => "software_system",
            StyleTarget::Container => "container",
            StyleTarget::Component => "component",
            StyleTarget::External => "external",
        };
        f.write_str(label)
    }
}

/// Per-target color and shape assignments for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleSheet {
    /// Hex colors per target, e.g. `person = "#08427b"`.
    pub colors: BTreeMap<StyleTarget, String>,
    /// Shape names per target, e.g. `container = "RoundedBox"`.
    pub shapes: BTreeMap<StyleTarget, String>,
}

impl StyleSheet {
    /// Merge explicit `overrides` over `self`; override entries win.
    pub fn merged(&self, overrides: &StyleSheet) -> StyleSheet {
        let mut out = self.clone();
        for (target, color) in &overrides.colors {
            out.colors.insert(*target, color.clone());
        }
        for (target, shape) in &overrides.shapes {
            out.shapes.insert(*target, shape.clone());
        }
        out
    }
}

fn sheet(colors: [(&str, StyleTarget); 5]) -> StyleSheet {
    let mut s = StyleSheet {
        colors: colors
            .into_iter()
            .map(|(hex, target)| (target, hex.to_string()))
            .collect(),
        shapes: BTreeMap::new(),
    };
    s.shapes.insert(StyleTarget::Person, "Person".to_string());
    s.shapes
        .insert(StyleTarget::SoftwareSystem, "RoundedBox".to_string());
    s.shapes
        .insert(StyleTarget::Container, "RoundedBox".to_string());
    s.shapes
        .insert(StyleTarget::Component, "Component".to_string());
    s
}

/// Resolve a named theme to its stylesheet.
pub fn theme(name: &str) -> Result<StyleSheet, StyleError> {
    use StyleTarget::*;
    let sheet = match name {
        "default" => sheet([
            ("#08427b", Person),
            ("#1168bd", SoftwareSystem),
            ("#438dd5", Container),
            ("#85bbf0", Component),
            ("#999999", External),
        ]),
        "corporate" => sheet([
            ("#2E4057", Person),
            ("#048A81", SoftwareSystem),
            ("#54C6EB", Container),
            ("#A8E6CF", Component),
            ("#8B8B8B", External),
        ]),
        "modern" => sheet([
            ("#6C5CE7", Person),
            ("#A29BFE", SoftwareSystem),
            ("#74B9FF", Container),
            ("#81ECEC", Component),
            ("#B2BEC3", External),
        ]),
        "minimal" => sheet([
            ("#2D3436", Person),
            ("#636E72", SoftwareSystem),
            ("#B2BEC3", Container),
            ("#DDDDDD", Component),
            ("#74B9FF", External),
        ]),
        other => return Err(StyleError::UnknownTheme(other.to_string())),
    };
    Ok(sheet)
}

/// Attach a named theme to a view.
///
/// Unknown theme names fail before the view is touched, so there is no
/// partial application.
pub fn apply_theme(ws: &mut Workspace, view: ViewId, name: &str) -> Result<(), StyleError> {
    let sheet = theme(name)?;
    let v = ws.view_mut(view).ok_or(ModelError::UnknownElement)?;
    v.style = Some(sheet);
    Ok(())
}

/// Merge explicit style entries over the view's current sheet (or the
/// default theme when the view is unstyled) and attach the result.
pub fn apply_custom(
    ws: &mut Workspace,
    view: ViewId,
    overrides: &StyleSheet,
) -> Result<(), StyleError> {
    let base = match ws.view(view) {
        Some(v) => v.style.clone(),
        None => return Err(StyleError::Model(ModelError::UnknownElement)),
    };
    let base = match base {
        Some(sheet) => sheet,
        None => theme("default")?,
    };
    let merged = base.merged(overrides);
    // view existence checked above
    if let Some(v) = ws.view_mut(view) {
        v.style = Some(merged);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewKind;

    fn workspace_with_view() -> (Workspace, ViewId) {
        let mut ws = Workspace::new("Shop", "docs");
        let shop = ws.add_software_system("Shop", "").unwrap();
        let view = ws
            .add_view(ViewKind::SystemContext, shop, "ctx", "Context", "")
            .unwrap();
        (ws, view)
    }

    #[test]
    fn all_registered_themes_resolve() {
        for name in THEME_NAMES {
            let sheet = theme(name).unwrap();
            assert_eq!(sheet.colors.len(), 5, "theme {name} is missing colors");
            assert!(!sheet.shapes.is_empty());
        }
    }

    #[test]
    fn unknown_theme_is_error() {
        let err = theme("neon").unwrap_err();
        assert!(matches!(err, StyleError::UnknownTheme(_)));
    }

    #[test]
    fn apply_theme_attaches_sheet() {
        let (mut ws, view) = workspace_with_view();
        apply_theme(&mut ws, view, "corporate").unwrap();
        let sheet = ws.view(view).unwrap().style.as_ref().unwrap();
        assert_eq!(
            sheet.colors.get(&StyleTarget::Person).map(String::as_str),
            Some("#2E4057")
        );
    }

    #[test]
    fn unknown_theme_leaves_view_unstyled() {
        let (mut ws, view) = workspace_with_view();
        assert!(apply_theme(&mut ws, view, "neon").is_err());
        assert!(ws.view(view).unwrap().style.is_none());
    }

    #[test]
    fn apply_theme_is_idempotent() {
        let (mut ws, view) = workspace_with_view();
        apply_theme(&mut ws, view, "modern").unwrap();
        let first = ws.view(view).unwrap().style.clone();
        apply_theme(&mut ws, view, "modern").unwrap();
        assert_eq!(ws.view(view).unwrap().style, first);
    }

    #[test]
    fn custom_overrides_win_over_base() {
        let (mut ws, view) = workspace_with_view();
        apply_theme(&mut ws, view, "default").unwrap();
        let mut overrides = StyleSheet::default();
        overrides
            .colors
            .insert(StyleTarget::Person, "#ff0000".to_string());
        apply_custom(&mut ws, view, &overrides).unwrap();

        let sheet = ws.view(view).unwrap().style.as_ref().unwrap();
        assert_eq!(
            sheet.colors.get(&StyleTarget::Person).map(String::as_str),
            Some("#ff0000")
        );
        // untouched entries survive from the base theme
        assert_eq!(
            sheet
                .colors
                .get(&StyleTarget::SoftwareSystem)
                .map(String::as_str),
            Some("#1168bd")
        );
    }

    #[test]
    fn custom_on_unstyled_view_starts_from_default_theme() {
        let (mut ws, view) = workspace_with_view();
        let mut overrides = StyleSheet::default();
        overrides
            .colors
            .insert(StyleTarget::External, "#123456".to_string());
        apply_custom(&mut ws, view, &overrides).unwrap();

        let sheet = ws.view(view).unwrap().style.as_ref().unwrap();
        assert_eq!(
            sheet.colors.get(&StyleTarget::External).map(String::as_str),
            Some("#123456")
        );
        assert_eq!(
            sheet.colors.get(&StyleTarget::Person).map(String::as_str),
            Some("#08427b")
        );
    }

    #[test]
    fn apply_custom_is_idempotent() {
        let (mut ws, view) = workspace_with_view();
        let mut overrides = StyleSheet::default();
        overrides
            .colors
            .insert(StyleTarget::Container, "#00ff00".to_string());
        apply_custom(&mut ws, view, &overrides).unwrap();
        let first = ws.view(view).unwrap().style.clone();
        apply_custom(&mut ws, view, &overrides).unwrap();
        assert_eq!(ws.view(view).unwrap().style, first);
    }
}
