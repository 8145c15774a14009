//! Identifier and kind types for scene elements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a scene element.
///
/// Identifiers are never reused within one scene, so a stale id held by an
/// interaction can always be detected by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Raw numeric value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The closed set of element kinds a scene can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Node,
    Compartment,
    Reaction,
    Handle,
}

impl ElementKind {
    /// Whether elements of this kind follow the pointer in a body drag.
    pub fn is_draggable(self) -> bool {
        matches!(self, ElementKind::Node | ElementKind::Compartment)
    }

    /// Whether elements of this kind expose resize handles.
    pub fn is_resizable(self) -> bool {
        matches!(self, ElementKind::Node | ElementKind::Compartment)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Node => "node",
            ElementKind::Compartment => "compartment",
            ElementKind::Reaction => "reaction",
            ElementKind::Handle => "handle",
        };
        f.write_str(name)
    }
}

/// An entry of a selection-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedElement {
    pub id: ElementId,
    pub kind: ElementKind,
}
