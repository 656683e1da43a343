//! Workspace export: structured JSON and PlantUML diagram descriptions.
//!
//! Two export formats leave this module:
//!
//! - **Structured JSON** ([`export_structured`]): the whole workspace —
//!   elements, relationships, views with their inclusion sets — as a
//!   serde_json document. Lossless: [`parse_structured`] reads it back into
//!   an equal [`StructuredExport`], which is what snapshot and round-trip
//!   tests compare.
//! - **Diagram description** ([`export_diagram_description`]): one view as
//!   PlantUML C4 text, consumed by the external renderer.
//!
//! ## Determinism
//!
//! Both exports are pure functions of the workspace. Elements and
//! relationships are emitted in creation order (not inclusion order, not map
//! order), so exporting an unchanged view twice yields byte-identical text.
//! Neither format carries a timestamp.

use crate::config::DiagramConfig;
use crate::model::{Element, ElementId, ElementKind, Location, View, ViewKind, Workspace};
use crate::style::StyleTarget;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("diagram description is invalid: {0}")]
    InvalidDescription(String),
}

// =============================================================================
// Structured export
// =============================================================================

/// The full structured export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredExport {
    pub workspace: WorkspaceRecord,
    pub elements: Vec<ElementRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub views: Vec<ViewRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceRecord {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementRecord {
    pub name: String,
    pub kind: ElementKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    /// Parent element name (a container's system, a component's container).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipRecord {
    pub source: String,
    pub destination: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewRecord {
    pub key: String,
    pub kind: ViewKind,
    pub title: String,
    pub description: String,
    /// Included element names, in element creation order.
    pub elements: Vec<String>,
}

/// Build the structured export document for a workspace.
pub fn structured_document(config: &DiagramConfig, ws: &Workspace) -> StructuredExport {
    let elements = ws
        .elements()
        .map(|(_, el)| ElementRecord {
            name: el.name.clone(),
            kind: el.kind,
            description: el.description.clone(),
            technology: el.technology.clone(),
            parent: el.parent.and_then(|p| ws.element(p)).map(|p| p.name.clone()),
            location: el.location,
        })
        .collect();

    let relationships = ws
        .relationships()
        .iter()
        .map(|rel| RelationshipRecord {
            source: name_of(ws, rel.source),
            destination: name_of(ws, rel.destination),
            description: rel.description.clone(),
            technology: rel.technology.clone(),
        })
        .collect();

    let views = ws
        .views()
        .iter()
        .map(|view| ViewRecord {
            key: view.key.clone(),
            kind: view.kind,
            title: view.title.clone(),
            description: view.description.clone(),
            elements: ordered_includes(view)
                .into_iter()
                .map(|id| name_of(ws, id))
                .collect(),
        })
        .collect();

    StructuredExport {
        workspace: WorkspaceRecord {
            name: config.name.clone(),
            description: config.description.clone(),
            version: config.version.clone(),
            author: config.author.clone(),
            output_formats: config.output_formats.clone(),
        },
        elements,
        relationships,
        views,
    }
}

/// Serialize the workspace to structured JSON text.
pub fn export_structured(config: &DiagramConfig, ws: &Workspace) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&structured_document(config, ws))?)
}

/// Parse structured JSON text back into the export document.
pub fn parse_structured(text: &str) -> Result<StructuredExport, ExportError> {
    Ok(serde_json::from_str(text)?)
}

fn name_of(ws: &Workspace, id: ElementId) -> String {
    ws.element(id).map(|e| e.name.clone()).unwrap_or_default()
}

/// A view's inclusion set sorted by element creation order.
fn ordered_includes(view: &View) -> Vec<ElementId> {
    let mut ids = view.includes.clone();
    ids.sort_by_key(|id| id.0);
    ids
}

// =============================================================================
// Diagram description export (PlantUML C4)
// =============================================================================

const C4_INCLUDE_BASE: &str =
    "https://raw.githubusercontent.com/plantuml-stdlib/C4-PlantUML/master";

/// Serialize one view into PlantUML C4 text.
///
/// Output layout: `@startuml`, title, the C4 include matching the view kind,
/// node macros (boundary members inside a `*_Boundary` block for container
/// and component views), `Rel` lines, style directives from the attached
/// stylesheet, `@enduml`.
pub fn export_diagram_description(ws: &Workspace, view: &View) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("@startuml".to_string());
    lines.push(format!("title {}", view.title));
    if !view.description.is_empty() {
        lines.push(format!("' {}", view.description));
    }
    lines.push(String::new());

    let c4_file = match view.kind {
        ViewKind::SystemContext => "C4_Context.puml",
        ViewKind::Container => "C4_Container.puml",
        ViewKind::Component => "C4_Component.puml",
    };
    lines.push(format!("!include {C4_INCLUDE_BASE}/{c4_file}"));
    lines.push(String::new());

    let includes = ordered_includes(view);
    let aliases = Aliases::assign(ws, &includes, view.root);

    // For container and component views the root element is the boundary,
    // not a node; everything else splits into boundary members and outsiders.
    let (members, outsiders): (Vec<ElementId>, Vec<ElementId>) = match view.kind {
        ViewKind::SystemContext => (Vec::new(), includes.clone()),
        ViewKind::Container | ViewKind::Component => includes
            .iter()
            .copied()
            .filter(|&id| id != view.root)
            .partition(|&id| {
                ws.element(id).map(|e| e.parent == Some(view.root)).unwrap_or(false)
            }),
    };

    for id in &outsiders {
        if let Some(el) = ws.element(*id) {
            lines.push(node_macro(el, &aliases.get(*id)));
        }
    }
    if !outsiders.is_empty() {
        lines.push(String::new());
    }

    if !matches!(view.kind, ViewKind::SystemContext) {
        let root = ws.element(view.root).expect("view root element exists");
        let boundary_macro = match view.kind {
            ViewKind::Container => "System_Boundary",
            ViewKind::Component => "Container_Boundary",
            ViewKind::SystemContext => unreachable!(),
        };
        lines.push(format!(
            "{}({}, \"{}\") {{",
            boundary_macro,
            aliases.get(view.root),
            quote(&root.name)
        ));
        for id in &members {
            if let Some(el) = ws.element(*id) {
                lines.push(format!("  {}", node_macro(el, &aliases.get(*id))));
            }
        }
        lines.push("}".to_string());
        lines.push(String::new());
    }

    // Relationships between rendered nodes, in creation order. The boundary
    // element itself is not a node, so its relationships are implied rather
    // than drawn.
    let rendered: Vec<ElementId> = outsiders.iter().chain(members.iter()).copied().collect();
    let mut any_rel = false;
    for rel in ws.relationships() {
        if rendered.contains(&rel.source) && rendered.contains(&rel.destination) {
            let line = match &rel.technology {
                Some(tech) => format!(
                    "Rel({}, {}, \"{}\", \"{}\")",
                    aliases.get(rel.source),
                    aliases.get(rel.destination),
                    quote(&rel.description),
                    quote(tech)
                ),
                None => format!(
                    "Rel({}, {}, \"{}\")",
                    aliases.get(rel.source),
                    aliases.get(rel.destination),
                    quote(&rel.description)
                ),
            };
            lines.push(line);
            any_rel = true;
        }
    }
    if any_rel {
        lines.push(String::new());
    }

    if let Some(sheet) = &view.style {
        for (target, color) in &sheet.colors {
            lines.push(format!(
                "UpdateElementStyle({}, $bgColor=\"{}\")",
                style_element_name(*target),
                quote(color)
            ));
        }
        lines.push(String::new());
    }

    lines.push("@enduml".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// The C4-PlantUML element name a style target maps onto.
fn style_element_name(target: StyleTarget) -> &'static str {
    match target {
        StyleTarget::Person => "person",
        StyleTarget::SoftwareSystem => "system",
        StyleTarget::Container => "container",
        StyleTarget::Component => "component",
        StyleTarget::External => "external_system",
    }
}

fn node_macro(el: &Element, alias: &str) -> String {
    match el.kind {
        ElementKind::Person => {
            format!("Person({}, \"{}\", \"{}\")", alias, quote(&el.name), quote(&el.description))
        }
        ElementKind::SoftwareSystem => {
            let macro_name = match el.location {
                Location::Internal => "System",
                Location::External => "System_Ext",
            };
            format!(
                "{}({}, \"{}\", \"{}\")",
                macro_name,
                alias,
                quote(&el.name),
                quote(&el.description)
            )
        }
        ElementKind::Container => format!(
            "Container({}, \"{}\", \"{}\", \"{}\")",
            alias,
            quote(&el.name),
            quote(el.technology.as_deref().unwrap_or("")),
            quote(&el.description)
        ),
        ElementKind::Component => format!(
            "Component({}, \"{}\", \"{}\", \"{}\")",
            alias,
            quote(&el.name),
            quote(el.technology.as_deref().unwrap_or("")),
            quote(&el.description)
        ),
    }
}

/// PlantUML argument quoting: double quotes in names would break the macro
/// call, so they degrade to single quotes.
fn quote(s: &str) -> String {
    s.replace('"', "'")
}

/// Stable alias assignment for the elements of one view.
///
/// Aliases derive from element names (lowercased, non-alphanumerics become
/// underscores) and are disambiguated by suffix in creation order, so the
/// same view always gets the same aliases.
struct Aliases {
    by_id: Vec<(ElementId, String)>,
}

impl Aliases {
    fn assign(ws: &Workspace, includes: &[ElementId], root: ElementId) -> Self {
        let mut by_id = Vec::new();
        let mut used: Vec<String> = Vec::new();
        let mut all: Vec<ElementId> = includes.to_vec();
        if !all.contains(&root) {
            all.push(root);
        }
        all.sort_by_key(|id| id.0);
        for id in all {
            let base = ws
                .element(id)
                .map(|e| slugify(&e.name))
                .unwrap_or_default();
            let base = if base.is_empty() { "el".to_string() } else { base };
            let mut alias = base.clone();
            let mut n = 2;
            while used.contains(&alias) {
                alias = format!("{base}_{n}");
                n += 1;
            }
            used.push(alias.clone());
            by_id.push((id, alias));
        }
        Self { by_id }
    }

    fn get(&self, id: ElementId) -> String {
        self.by_id
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, a)| a.clone())
            .unwrap_or_else(|| "el".to_string())
    }
}

fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Structural validation of exported diagram description text.
///
/// Checks the directives the renderer requires: start/end markers, a title,
/// and at least one element or relationship macro.
pub fn validate_diagram_description(text: &str) -> Result<(), ExportError> {
    if text.trim().is_empty() {
        return Err(ExportError::InvalidDescription("output is empty".into()));
    }
    let lines: Vec<&str> = text.lines().collect();
    if !lines.iter().any(|l| l.trim().starts_with("@startuml")) {
        return Err(ExportError::InvalidDescription(
            "missing @startuml directive".into(),
        ));
    }
    if !lines.iter().any(|l| l.trim().starts_with("@enduml")) {
        return Err(ExportError::InvalidDescription(
            "missing @enduml directive".into(),
        ));
    }
    if !lines.iter().any(|l| l.trim().starts_with("title ")) {
        return Err(ExportError::InvalidDescription("missing title directive".into()));
    }
    let content_markers = ["Person(", "System(", "System_Ext(", "Container(", "Component(", "Rel("];
    if !content_markers.iter().any(|m| text.contains(m)) {
        return Err(ExportError::InvalidDescription(
            "no elements or relationships found".into(),
        ));
    }
    Ok(())
}
