use std::fmt;

use rxnview_core::{Bounds, ElementId, Point};

use super::cursor::ResizeHandle;
use crate::scene::Snapshot;
use crate::viewport::CoordinateSpace;

/// Where a pan gesture started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanSource {
    /// Middle button or Alt+drag on the canvas.
    Canvas,
    /// Dragging in the minimap; `grab` is the pointer offset from the
    /// indicator's top-left corner.
    Minimap { grab: Point },
}

/// State of the pointer interaction state machine.
///
/// Every active state carries what is needed to roll it back.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Marquee selection in progress (logical corners).
    Selecting {
        origin: Point,
        current: Point,
        additive: bool,
        previous: Vec<ElementId>,
    },
    DraggingElements {
        start_pointer: Point,
        /// Dragged ids with their positions at drag start.
        targets: Vec<(ElementId, Point)>,
        snapshot: Snapshot,
        moved: bool,
    },
    DraggingHandle {
        handle: ElementId,
        edge: ElementId,
        grab_offset: Point,
        snapshot: Snapshot,
        moved: bool,
    },
    ResizingElement {
        id: ElementId,
        handle: ResizeHandle,
        start_rect: Bounds,
        start_pointer: Point,
        current: Bounds,
        snapshot: Snapshot,
    },
    Panning {
        source: PanSource,
        /// Last pointer position in device space.
        last: Point,
        previous: CoordinateSpace,
    },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "Idle",
            InteractionState::Selecting { .. } => "Selecting",
            InteractionState::DraggingElements { .. } => "DraggingElements",
            InteractionState::DraggingHandle { .. } => "DraggingHandle",
            InteractionState::ResizingElement { .. } => "ResizingElement",
            InteractionState::Panning { .. } => "Panning",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Whether this state holds the scene's structure lock.
    pub fn locks_structure(&self) -> bool {
        matches!(
            self,
            InteractionState::DraggingElements { .. }
                | InteractionState::DraggingHandle { .. }
                | InteractionState::ResizingElement { .. }
        )
    }

    /// Marquee rectangle in logical space while selecting.
    pub fn marquee(&self) -> Option<Bounds> {
        match self {
            InteractionState::Selecting {
                origin, current, ..
            } => Some(Bounds::from_points(*origin, *current)),
            _ => None,
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
