//! Scene element variants and their capability traits.
//!
//! The element set is closed: nodes, compartments, reactions and reaction
//! handles. Capabilities are expressed as traits implemented per variant,
//! and `SceneElement` dispatches to them by `match`.

use rxnview_core::{Bounds, CanvasError, ElementId, ElementKind, Point};

mod compartment;
mod handle;
mod node;
mod reaction;

pub use compartment::CompartmentBox;
pub use handle::{HandleRole, ReactionHandle};
pub use node::NodeElement;
pub use reaction::{EdgeLayout, ReactionEdge, SpeciesCurve};

/// Geometry every element exposes to hit-testing and the spatial index.
pub trait HitTestable {
    /// Logical bounding box.
    fn bounds(&self) -> Bounds;

    /// Exact containment test against the element's geometry.
    ///
    /// `tolerance` is a logical distance; area shapes ignore it.
    fn hit_test(&self, point: &Point, tolerance: f64) -> bool;
}

/// Elements that can be moved by a drag.
pub trait Draggable {
    /// Logical anchor of the element (top-left corner or center point).
    fn position(&self) -> Point;

    /// Moves the anchor to `position`. Variants may clamp the request.
    fn set_position(&mut self, position: Point);
}

/// Elements whose rectangle can be resized.
pub trait Resizable {
    /// Replaces the element's rectangle. Zero-area rectangles are rejected
    /// and leave the element unchanged.
    fn resize(&mut self, bounds: Bounds) -> Result<(), CanvasError>;
}

/// Paint layer of an element. Higher values are drawn later and picked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZOrder(pub i32);

impl ZOrder {
    pub const COMPARTMENT: ZOrder = ZOrder(0);
    pub const NODE: ZOrder = ZOrder(10);
    pub const REACTION: ZOrder = ZOrder(20);
    pub const HANDLE: ZOrder = ZOrder(30);

    /// Default layer for a kind.
    pub fn for_kind(kind: ElementKind) -> ZOrder {
        match kind {
            ElementKind::Compartment => ZOrder::COMPARTMENT,
            ElementKind::Node => ZOrder::NODE,
            ElementKind::Reaction => ZOrder::REACTION,
            ElementKind::Handle => ZOrder::HANDLE,
        }
    }
}

/// One of the element variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneElement {
    Node(NodeElement),
    Compartment(CompartmentBox),
    Reaction(ReactionEdge),
    Handle(ReactionHandle),
}

impl SceneElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            SceneElement::Node(_) => ElementKind::Node,
            SceneElement::Compartment(_) => ElementKind::Compartment,
            SceneElement::Reaction(_) => ElementKind::Reaction,
            SceneElement::Handle(_) => ElementKind::Handle,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            SceneElement::Node(n) => n.bounds(),
            SceneElement::Compartment(c) => c.bounds(),
            SceneElement::Reaction(r) => r.bounds(),
            SceneElement::Handle(h) => h.bounds(),
        }
    }

    pub fn hit_test(&self, point: &Point, tolerance: f64) -> bool {
        match self {
            SceneElement::Node(n) => n.hit_test(point, tolerance),
            SceneElement::Compartment(c) => c.hit_test(point, tolerance),
            SceneElement::Reaction(r) => r.hit_test(point, tolerance),
            SceneElement::Handle(h) => h.hit_test(point, tolerance),
        }
    }

    /// Position of draggable variants; reactions have none.
    pub fn position(&self) -> Option<Point> {
        self.as_draggable().map(|d| d.position())
    }

    pub fn as_draggable(&self) -> Option<&dyn Draggable> {
        match self {
            SceneElement::Node(n) => Some(n),
            SceneElement::Compartment(c) => Some(c),
            SceneElement::Handle(h) => Some(h),
            SceneElement::Reaction(_) => None,
        }
    }

    pub fn as_resizable_mut(&mut self) -> Option<&mut dyn Resizable> {
        match self {
            SceneElement::Node(n) => Some(n),
            SceneElement::Compartment(c) => Some(c),
            _ => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SceneElement::Node(n) => &n.label,
            SceneElement::Compartment(c) => &c.label,
            SceneElement::Reaction(r) => &r.label,
            SceneElement::Handle(_) => "",
        }
    }

    pub fn as_node(&self) -> Option<&NodeElement> {
        match self {
            SceneElement::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_compartment(&self) -> Option<&CompartmentBox> {
        match self {
            SceneElement::Compartment(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&ReactionEdge> {
        match self {
            SceneElement::Reaction(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&ReactionHandle> {
        match self {
            SceneElement::Handle(h) => Some(h),
            _ => None,
        }
    }
}

/// An element stored in the scene with its identity and view state.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ElementId,
    pub element: SceneElement,
    pub z_order: ZOrder,
    pub selected: bool,
    pub hovered: bool,
    /// Creation counter; later elements win z-order ties.
    pub sequence: u64,
}

impl SceneObject {
    pub fn new(id: ElementId, element: SceneElement, sequence: u64) -> Self {
        let z_order = ZOrder::for_kind(element.kind());
        Self {
            id,
            element,
            z_order,
            selected: false,
            hovered: false,
            sequence,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    pub fn bounds(&self) -> Bounds {
        self.element.bounds()
    }

    /// Sort key for paint order; pick order is the reverse.
    pub fn paint_key(&self) -> (ZOrder, u64) {
        (self.z_order, self.sequence)
    }
}
