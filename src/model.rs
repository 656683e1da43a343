//! Workspace model: elements, relationships, and views.
//!
//! A [`Workspace`] is the root aggregate for one documentation unit. It owns
//! three arenas — elements, relationships, views — and hands out index-based
//! handles ([`ElementId`], [`ViewId`]) that are only valid for the workspace
//! that issued them. There is no process-wide state: a workspace is created
//! once per generation run and passed by reference.
//!
//! ## Element hierarchy
//!
//! ```text
//! Person                       (no parent)
//! SoftwareSystem               (no parent)
//! └── Container                (parent: a software system)
//!     └── Component            (parent: a container)
//! ```
//!
//! Element kinds are a closed enum — every construction and export site
//! matches exhaustively. Identity is (kind, parent, name); creating the same
//! triple twice is an error.
//!
//! ## Views
//!
//! A view is a named projection anchored at a root element:
//!
//! - system-context and container views root at a [`ElementKind::SoftwareSystem`]
//! - component views root at a [`ElementKind::Container`]
//!
//! Each view carries an explicit inclusion set. Inclusion is scope-checked:
//! a container view may include the root system's containers and the actors
//! that interact with them, but not containers of unrelated systems.
//!
//! ## Validation
//!
//! The model enforces these rules at mutation time, so a workspace that
//! exists is always exportable:
//! - No duplicate (kind, parent, name) elements
//! - Relationship endpoints must exist; no self-relationships
//! - View roots must match the view kind
//! - Included elements must be in scope for the view

use crate::style::StyleSheet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{kind} '{name}' already exists{}", parent_context(.parent))]
    DuplicateElement {
        kind: ElementKind,
        name: String,
        parent: Option<String>,
    },
    #[error("handle does not belong to this workspace")]
    UnknownElement,
    #[error("no element named '{0}' in the workspace")]
    UnknownName(String),
    #[error("'{parent}' is a {kind}, not a valid parent for {child}")]
    InvalidParent {
        parent: String,
        kind: ElementKind,
        child: String,
    },
    #[error("relationship from '{0}' to itself is not allowed")]
    SelfRelationship(String),
    #[error("{view_kind} view '{key}' cannot be rooted at {root_kind} '{root}'")]
    InvalidViewRoot {
        view_kind: ViewKind,
        key: String,
        root_kind: ElementKind,
        root: String,
    },
    #[error("view key '{0}' already exists in the workspace")]
    DuplicateViewKey(String),
    #[error("'{element}' ({kind}) is out of scope for {view_kind} view '{view}'")]
    OutOfScope {
        element: String,
        kind: ElementKind,
        view_kind: ViewKind,
        view: String,
    },
}

fn parent_context(parent: &Option<String>) -> String {
    match parent {
        Some(p) => format!(" under '{p}'"),
        None => String::new(),
    }
}

/// The closed set of element kinds in the C4 hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Person,
    SoftwareSystem,
    Container,
    Component,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElementKind::Person => "person",
            ElementKind::SoftwareSystem => "software system",
            ElementKind::Container => "container",
            ElementKind::Component => "component",
        };
        f.write_str(label)
    }
}

/// Whether an element belongs to the documented organization or is an
/// external collaborator (rendered as `System_Ext` in diagram output).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    #[default]
    Internal,
    External,
}

/// The closed set of view kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    SystemContext,
    Container,
    Component,
}

impl ViewKind {
    /// The token stored in `DiagramMetadata.diagram_type`.
    pub fn metadata_token(self) -> &'static str {
        match self {
            ViewKind::SystemContext => "system_context",
            ViewKind::Container => "container",
            ViewKind::Component => "component",
        }
    }

    /// The element kind required for this view kind's root.
    pub fn required_root(self) -> ElementKind {
        match self {
            ViewKind::SystemContext | ViewKind::Container => ElementKind::SoftwareSystem,
            ViewKind::Component => ElementKind::Container,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewKind::SystemContext => "system-context",
            ViewKind::Container => "container",
            ViewKind::Component => "component",
        };
        f.write_str(label)
    }
}

/// Handle to an element in one workspace's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) usize);

/// Handle to a view in one workspace's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) usize);

/// A named node in the architecture model.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub description: String,
    pub technology: Option<String>,
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub location: Location,
}

/// A directed edge between two elements.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub source: ElementId,
    pub destination: ElementId,
    pub description: String,
    pub technology: Option<String>,
}

/// A named visual projection of a subset of the workspace.
#[derive(Debug, Clone)]
pub struct View {
    pub key: String,
    pub kind: ViewKind,
    pub root: ElementId,
    pub title: String,
    pub description: String,
    /// Included element ids, deduplicated, in insertion order. Export sorts
    /// by creation order, so insertion order never reaches the output.
    pub includes: Vec<ElementId>,
    /// Attached rendering style, if a theme was applied.
    pub style: Option<StyleSheet>,
}

/// Root container for one documentation unit.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub name: String,
    pub description: String,
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    views: Vec<View>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            elements: Vec::new(),
            relationships: Vec::new(),
            views: Vec::new(),
        }
    }

    // -------------------------------------------------------------------
    // Element construction
    // -------------------------------------------------------------------

    pub fn add_person(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ElementId, ModelError> {
        self.add_element(ElementKind::Person, None, name, description, None, Location::Internal)
    }

    pub fn add_software_system(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ElementId, ModelError> {
        self.add_element(
            ElementKind::SoftwareSystem,
            None,
            name,
            description,
            None,
            Location::Internal,
        )
    }

    /// A software system outside the documented organization.
    pub fn add_external_system(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ElementId, ModelError> {
        self.add_element(
            ElementKind::SoftwareSystem,
            None,
            name,
            description,
            None,
            Location::External,
        )
    }

    pub fn add_container(
        &mut self,
        system: ElementId,
        name: impl Into<String>,
        description: impl Into<String>,
        technology: impl Into<String>,
    ) -> Result<ElementId, ModelError> {
        let name = name.into();
        let parent = self.element_checked(system)?;
        if parent.kind != ElementKind::SoftwareSystem {
            return Err(ModelError::InvalidParent {
                parent: parent.name.clone(),
                kind: parent.kind,
                child: name,
            });
        }
        self.add_element(
            ElementKind::Container,
            Some(system),
            name,
            description,
            some_nonempty(technology.into()),
            Location::Internal,
        )
    }

    pub fn add_component(
        &mut self,
        container: ElementId,
        name: impl Into<String>,
        description: impl Into<String>,
        technology: impl Into<String>,
    ) -> Result<ElementId, ModelError> {
        let name = name.into();
        let parent = self.element_checked(container)?;
        if parent.kind != ElementKind::Container {
            return Err(ModelError::InvalidParent {
                parent: parent.name.clone(),
                kind: parent.kind,
                child: name,
            });
        }
        self.add_element(
            ElementKind::Component,
            Some(container),
            name,
            description,
            some_nonempty(technology.into()),
            Location::Internal,
        )
    }

    fn add_element(
        &mut self,
        kind: ElementKind,
        parent: Option<ElementId>,
        name: impl Into<String>,
        description: impl Into<String>,
        technology: Option<String>,
        location: Location,
    ) -> Result<ElementId, ModelError> {
        let name = name.into();
        let duplicate = self
            .elements
            .iter()
            .any(|e| e.kind == kind && e.parent == parent && e.name == name);
        if duplicate {
            return Err(ModelError::DuplicateElement {
                kind,
                name,
                parent: parent.map(|p| self.elements[p.0].name.clone()),
            });
        }
        self.elements.push(Element {
            name,
            description: description.into(),
            technology,
            kind,
            parent,
            location,
        });
        Ok(ElementId(self.elements.len() - 1))
    }

    // -------------------------------------------------------------------
    // Relationships
    // -------------------------------------------------------------------

    pub fn relate(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.relate_via(source, destination, description, "")
    }

    /// Relate two elements with a technology/protocol tag.
    pub fn relate_via(
        &mut self,
        source: ElementId,
        destination: ElementId,
        description: impl Into<String>,
        technology: impl Into<String>,
    ) -> Result<(), ModelError> {
        self.element_checked(source)?;
        self.element_checked(destination)?;
        if source == destination {
            return Err(ModelError::SelfRelationship(
                self.elements[source.0].name.clone(),
            ));
        }
        self.relationships.push(Relationship {
            source,
            destination,
            description: description.into(),
            technology: some_nonempty(technology.into()),
        });
        Ok(())
    }

    // -------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------

    pub fn add_view(
        &mut self,
        kind: ViewKind,
        root: ElementId,
        key: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ViewId, ModelError> {
        let key = key.into();
        let root_el = self.element_checked(root)?;
        if root_el.kind != kind.required_root() {
            return Err(ModelError::InvalidViewRoot {
                view_kind: kind,
                key,
                root_kind: root_el.kind,
                root: root_el.name.clone(),
            });
        }
        if self.views.iter().any(|v| v.key == key) {
            return Err(ModelError::DuplicateViewKey(key));
        }
        self.views.push(View {
            key,
            kind,
            root,
            title: title.into(),
            description: description.into(),
            includes: Vec::new(),
            style: None,
        });
        Ok(ViewId(self.views.len() - 1))
    }

    /// Add elements to a view's inclusion set.
    ///
    /// Every element is scope-checked against the view's root before any of
    /// them is added, so a failed call leaves the view unchanged.
    pub fn include(&mut self, view: ViewId, elements: &[ElementId]) -> Result<(), ModelError> {
        let v = self.views.get(view.0).ok_or(ModelError::UnknownElement)?;
        for &id in elements {
            let el = self.element_checked(id)?;
            if !self.in_scope(v, id, el) {
                return Err(ModelError::OutOfScope {
                    element: el.name.clone(),
                    kind: el.kind,
                    view_kind: v.kind,
                    view: v.key.clone(),
                });
            }
        }
        let v = &mut self.views[view.0];
        for &id in elements {
            if !v.includes.contains(&id) {
                v.includes.push(id);
            }
        }
        Ok(())
    }

    fn in_scope(&self, view: &View, id: ElementId, el: &Element) -> bool {
        match view.kind {
            // People and systems only, including the root system itself.
            ViewKind::SystemContext => {
                matches!(el.kind, ElementKind::Person | ElementKind::SoftwareSystem)
            }
            // The root system's own containers, plus the actors and systems
            // they interact with.
            ViewKind::Container => match el.kind {
                ElementKind::Person | ElementKind::SoftwareSystem => true,
                ElementKind::Container => el.parent == Some(view.root),
                ElementKind::Component => false,
            },
            // The root container's components, plus sibling containers of the
            // same parent system and outside actors.
            ViewKind::Component => match el.kind {
                ElementKind::Person | ElementKind::SoftwareSystem => true,
                ElementKind::Container => {
                    id == view.root || el.parent == self.elements[view.root.0].parent
                }
                ElementKind::Component => el.parent == Some(view.root),
            },
        }
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    fn element_checked(&self, id: ElementId) -> Result<&Element, ModelError> {
        self.elements.get(id.0).ok_or(ModelError::UnknownElement)
    }

    /// Look up an element by name (unique names only; first match wins for
    /// same-named elements under different parents).
    pub fn find(&self, name: &str) -> Result<ElementId, ModelError> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(ElementId)
            .ok_or_else(|| ModelError::UnknownName(name.to_string()))
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().enumerate().map(|(i, e)| (ElementId(i), e))
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(id.0)
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(id.0)
    }
}

fn some_nonempty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new("Shop", "Online shop documentation")
    }

    #[test]
    fn add_elements_of_each_kind() {
        let mut ws = workspace();
        let person = ws.add_person("Customer", "Buys things").unwrap();
        let system = ws.add_software_system("Shop", "Sells things").unwrap();
        let container = ws.add_container(system, "API", "REST API", "Rust").unwrap();
        let component = ws
            .add_component(container, "Orders", "Order handling", "axum")
            .unwrap();

        assert_eq!(ws.element(person).unwrap().kind, ElementKind::Person);
        assert_eq!(ws.element(container).unwrap().parent, Some(system));
        assert_eq!(ws.element(component).unwrap().parent, Some(container));
    }

    #[test]
    fn duplicate_element_rejected() {
        let mut ws = workspace();
        ws.add_person("Customer", "first").unwrap();
        let err = ws.add_person("Customer", "second").unwrap_err();
        assert!(matches!(err, ModelError::DuplicateElement { .. }));
        // Nothing was added
        assert_eq!(ws.elements().count(), 1);
    }

    #[test]
    fn same_name_under_different_parents_allowed() {
        let mut ws = workspace();
        let a = ws.add_software_system("A", "").unwrap();
        let b = ws.add_software_system("B", "").unwrap();
        ws.add_container(a, "API", "", "Rust").unwrap();
        ws.add_container(b, "API", "", "Go").unwrap();
        assert_eq!(ws.elements().count(), 4);
    }

    #[test]
    fn container_parent_must_be_system() {
        let mut ws = workspace();
        let person = ws.add_person("Customer", "").unwrap();
        let err = ws.add_container(person, "API", "", "").unwrap_err();
        assert!(matches!(err, ModelError::InvalidParent { .. }));
    }

    #[test]
    fn relationship_to_unknown_element_rejected() {
        let mut ws = workspace();
        let customer = ws.add_person("Customer", "").unwrap();
        let stale = ElementId(42);
        let err = ws.relate(customer, stale, "Uses").unwrap_err();
        assert!(matches!(err, ModelError::UnknownElement));
        assert!(ws.relationships().is_empty());
    }

    #[test]
    fn self_relationship_rejected() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let err = ws.relate(shop, shop, "Talks to itself").unwrap_err();
        assert!(matches!(err, ModelError::SelfRelationship(_)));
        assert!(ws.relationships().is_empty());
    }

    #[test]
    fn view_root_kind_enforced() {
        let mut ws = workspace();
        let person = ws.add_person("Customer", "").unwrap();
        let err = ws
            .add_view(ViewKind::Component, person, "bad", "Bad", "")
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidViewRoot { .. }));
        assert!(ws.views().is_empty());
    }

    #[test]
    fn duplicate_view_key_rejected() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        ws.add_view(ViewKind::SystemContext, shop, "ctx", "Context", "")
            .unwrap();
        let err = ws
            .add_view(ViewKind::Container, shop, "ctx", "Containers", "")
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateViewKey(_)));
    }

    #[test]
    fn context_view_rejects_containers() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let api = ws.add_container(shop, "API", "", "Rust").unwrap();
        let view = ws
            .add_view(ViewKind::SystemContext, shop, "ctx", "Context", "")
            .unwrap();
        let err = ws.include(view, &[api]).unwrap_err();
        assert!(matches!(err, ModelError::OutOfScope { .. }));
        assert!(ws.view(view).unwrap().includes.is_empty());
    }

    #[test]
    fn container_view_rejects_foreign_containers() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let other = ws.add_software_system("Warehouse", "").unwrap();
        let foreign = ws.add_container(other, "WMS", "", "Java").unwrap();
        let view = ws
            .add_view(ViewKind::Container, shop, "containers", "Containers", "")
            .unwrap();
        let err = ws.include(view, &[foreign]).unwrap_err();
        assert!(matches!(err, ModelError::OutOfScope { .. }));
    }

    #[test]
    fn component_view_accepts_sibling_containers() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let api = ws.add_container(shop, "API", "", "Rust").unwrap();
        let db = ws.add_container(shop, "Database", "", "PostgreSQL").unwrap();
        let orders = ws.add_component(api, "Orders", "", "axum").unwrap();
        let view = ws
            .add_view(ViewKind::Component, api, "api-components", "API Components", "")
            .unwrap();
        ws.include(view, &[orders, db]).unwrap();
        assert_eq!(ws.view(view).unwrap().includes.len(), 2);
    }

    #[test]
    fn include_deduplicates() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let customer = ws.add_person("Customer", "").unwrap();
        let view = ws
            .add_view(ViewKind::SystemContext, shop, "ctx", "Context", "")
            .unwrap();
        ws.include(view, &[customer, shop]).unwrap();
        ws.include(view, &[customer]).unwrap();
        assert_eq!(ws.view(view).unwrap().includes.len(), 2);
    }

    #[test]
    fn failed_include_adds_nothing() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        let customer = ws.add_person("Customer", "").unwrap();
        let api = ws.add_container(shop, "API", "", "Rust").unwrap();
        let view = ws
            .add_view(ViewKind::SystemContext, shop, "ctx", "Context", "")
            .unwrap();
        // customer is fine, api is out of scope — neither may land
        let err = ws.include(view, &[customer, api]).unwrap_err();
        assert!(matches!(err, ModelError::OutOfScope { .. }));
        assert!(ws.view(view).unwrap().includes.is_empty());
    }

    #[test]
    fn find_by_name() {
        let mut ws = workspace();
        let shop = ws.add_software_system("Shop", "").unwrap();
        assert_eq!(ws.find("Shop").unwrap(), shop);
        assert!(matches!(ws.find("Nope"), Err(ModelError::UnknownName(_))));
    }
}
