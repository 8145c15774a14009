//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so observers can log or replay them.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point};
use crate::types::{ElementId, SelectedElement};

/// Events published by the canvas engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasEvent {
    /// The selected set changed; carries every selected id with its kind
    SelectionChanged { selected: Vec<SelectedElement> },
    /// A drag committed new positions for these elements
    ElementsMoved { ids: Vec<ElementId> },
    /// A resize committed new bounds
    ElementResized { id: ElementId, bounds: Bounds },
    /// A reaction handle drag committed
    HandleMoved {
        edge: ElementId,
        handle: ElementId,
        position: Point,
    },
    /// The main viewport panned or zoomed
    ViewportChanged { origin: Point, scale: f64 },
    /// Elements were deleted, including cascaded removals
    ElementsRemoved { ids: Vec<ElementId> },
    /// Dropped nodes moved into a compartment, or onto the base canvas when `None`
    CompartmentChanged {
        nodes: Vec<ElementId>,
        compartment: Option<ElementId>,
    },
    /// An external batch replaced or merged scene contents
    SceneImported {
        mode: String,
        nodes: usize,
        compartments: usize,
        reactions: usize,
    },
    /// An active interaction was rolled back
    InteractionCancelled { state: String },
    /// The scene must be repainted
    RedrawRequested,
}

impl CanvasEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            CanvasEvent::SelectionChanged { .. } => EventCategory::Selection,
            CanvasEvent::ElementsMoved { .. }
            | CanvasEvent::ElementResized { .. }
            | CanvasEvent::HandleMoved { .. } => EventCategory::Geometry,
            CanvasEvent::ViewportChanged { .. } => EventCategory::Viewport,
            CanvasEvent::ElementsRemoved { .. }
            | CanvasEvent::CompartmentChanged { .. }
            | CanvasEvent::SceneImported { .. } => EventCategory::Scene,
            CanvasEvent::InteractionCancelled { .. } | CanvasEvent::RedrawRequested => {
                EventCategory::Interaction
            }
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            CanvasEvent::SelectionChanged { selected } => {
                format!("Selection changed ({} selected)", selected.len())
            }
            CanvasEvent::ElementsMoved { ids } => format!("Moved {} element(s)", ids.len()),
            CanvasEvent::ElementResized { id, bounds } => format!("Resized {} to {}", id, bounds),
            CanvasEvent::HandleMoved {
                edge,
                handle,
                position,
            } => format!("Handle {} of {} moved to {}", handle, edge, position),
            CanvasEvent::ViewportChanged { origin, scale } => {
                format!("Viewport at {} scale {:.3}", origin, scale)
            }
            CanvasEvent::ElementsRemoved { ids } => format!("Removed {} element(s)", ids.len()),
            CanvasEvent::CompartmentChanged { nodes, compartment } => match compartment {
                Some(cid) => format!("Moved {} node(s) into {}", nodes.len(), cid),
                None => format!("Moved {} node(s) onto the base canvas", nodes.len()),
            },
            CanvasEvent::SceneImported {
                mode,
                nodes,
                compartments,
                reactions,
            } => format!(
                "Imported ({}) {} nodes, {} compartments, {} reactions",
                mode, nodes, compartments, reactions
            ),
            CanvasEvent::InteractionCancelled { state } => format!("Cancelled {}", state),
            CanvasEvent::RedrawRequested => "Redraw requested".to_string(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Selection-change notifications.
    Selection,
    /// Committed element geometry changes.
    Geometry,
    /// Pan and zoom of the main viewport.
    Viewport,
    /// Structural scene changes.
    Scene,
    /// Interaction lifecycle and repaint requests.
    Interaction,
}
