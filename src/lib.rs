//! # rxnview
//!
//! Interactive canvas engine for reaction-network diagrams:
//! - Species nodes, compartments and reaction edges with draggable handles
//! - Zoom, pan and DPI-aware coordinate transforms
//! - Quadtree hit-testing and marquee selection
//! - Minimap overview with a draggable view indicator
//!
//! ## Architecture
//!
//! rxnview is organized as a workspace with multiple crates:
//!
//! 1. **rxnview-core** - Geometry, identifiers, errors, configuration, events
//! 2. **rxnview-canvas** - Scene graph, spatial index, interaction, minimap, render list
//! 3. **rxnview** - This crate; re-exports both and sets up logging
//!
//! The engine does not draw or own a window. A host toolkit forwards
//! pointer and keyboard input to an [`InteractionController`] and paints the
//! [`RenderList`] it returns through a [`PaintSurface`].

use std::path::Path;

pub use rxnview_canvas::{
    Clipboard, ClipboardEntry, CompartmentBox, CoordinateSpace, CursorHint, Draggable,
    HandleRole, HitTestable, HitTolerance, ImportBatch, ImportCompartment, ImportHandle,
    ImportMode, ImportNode, ImportReaction, ImportSummary, InteractionController,
    InteractionState, Key, KeyEvent, Minimap, MinimapElement, MinimapView, Modifiers, NodeElement, PaintSurface,
    PanSource, PointerButton, PointerEvent, ReactionEdge, ReactionHandle, RenderItem, RenderList,
    RenderShape, Resizable, ResizeHandle, SceneElement, SceneGraph, SceneObject, SelectionManager,
    Snapshot, SpatialIndex, SpeciesCurve, ZOrder,
};

pub use rxnview_core::{
    Bounds, CanvasConfig, CanvasError, CanvasEvent, ConfigError, ElementId, ElementKind, Error,
    EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, Point, Result,
    SelectedElement, SubscriptionId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Console output with pretty formatting, filtered by `RUST_LOG` on top of
/// an INFO default.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Initialize logging as JSON lines on stderr, for hosts that collect logs.
pub fn init_logging_json() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Creates a canvas for a `width` x `height` viewport.
///
/// The configuration is read from `config_path` when given, otherwise the
/// defaults apply. An `EventBus` is attached so hosts can subscribe right
/// away.
pub fn open_canvas(
    config_path: Option<&Path>,
    width: f64,
    height: f64,
) -> anyhow::Result<InteractionController> {
    let config = match config_path {
        Some(path) => CanvasConfig::load(path)?,
        None => CanvasConfig::default(),
    };
    tracing::info!(
        "rxnview {} ({}): opening {}x{} canvas",
        VERSION,
        BUILD_DATE,
        width,
        height
    );
    let bus = std::sync::Arc::new(EventBus::new());
    Ok(InteractionController::new(config, width, height)?.with_event_bus(bus))
}
