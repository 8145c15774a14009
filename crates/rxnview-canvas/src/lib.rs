//! # rxnview Canvas
//!
//! Interactive canvas engine for reaction-network diagrams. It holds the
//! diagram elements, answers hit-tests, and turns pointer input into
//! selection, drag, resize and pan operations. Painting and the window are
//! left to the host toolkit.
//!
//! ## Core Components
//!
//! - **CoordinateSpace**: logical/device transforms with pan, zoom and DPI scale
//! - **Elements**: nodes, compartments, reaction edges and their handles
//! - **SpatialIndex**: quadtree over element bounds
//! - **SceneGraph**: element ownership, cascades, selection and clipboard
//! - **InteractionController**: the pointer/keyboard state machine
//! - **Minimap**: overview with a draggable indicator of the main view
//! - **Render**: the per-frame item list handed to a `PaintSurface`
//!
//! ## Architecture
//!
//! ```text
//! InteractionController
//!   ├── SceneGraph
//!   │     ├── ElementStore (id -> SceneObject)
//!   │     ├── SpatialIndex (quadtree)
//!   │     └── SelectionManager
//!   ├── CoordinateSpace (main view)
//!   └── Minimap (own CoordinateSpace)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rxnview_canvas::{InteractionController, PointerEvent};
//! use rxnview_core::{Bounds, CanvasConfig};
//!
//! let mut canvas = InteractionController::new(CanvasConfig::default(), 800.0, 600.0).unwrap();
//! let node = canvas
//!     .scene_mut()
//!     .add_node("glucose", Bounds::from_origin_size(0.0, 0.0, 50.0, 30.0))
//!     .unwrap();
//!
//! canvas.pointer_down(PointerEvent::primary(10.0, 10.0));
//! canvas.pointer_up(PointerEvent::primary(40.0, 20.0));
//!
//! let moved = canvas.scene().get(node).unwrap().bounds();
//! assert_eq!(moved.min_x, 30.0);
//! ```

pub mod element;
pub mod import;
pub mod interaction;
pub mod minimap;
pub mod render;
pub mod scene;
pub mod selection_manager;
pub mod spatial_index;
pub mod store;
pub mod viewport;

pub use element::{
    CompartmentBox, Draggable, HandleRole, HitTestable, NodeElement, ReactionEdge,
    ReactionHandle, Resizable, SceneElement, SceneObject, SpeciesCurve, ZOrder,
};
pub use import::{
    ImportBatch, ImportCompartment, ImportHandle, ImportMode, ImportNode, ImportReaction,
    ImportSummary,
};
pub use interaction::{
    CursorHint, InteractionController, InteractionState, Key, KeyEvent, Modifiers, PanSource,
    PointerButton, PointerEvent, ResizeHandle,
};
pub use minimap::Minimap;
pub use render::{MinimapElement, MinimapView, PaintSurface, RenderItem, RenderList, RenderShape};
pub use scene::{Clipboard, ClipboardEntry, HitTolerance, SceneGraph, Snapshot};
pub use selection_manager::SelectionManager;
pub use spatial_index::{SpatialIndex, SpatialIndexStats};
pub use store::ElementStore;
pub use viewport::CoordinateSpace;
