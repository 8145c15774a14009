//! # rxnview Core
//!
//! Core types shared by the rxnview canvas engine.
//! Provides logical-space geometry, element identifiers, the error
//! taxonomy, canvas configuration and the synchronous event bus.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod geometry;
pub mod types;

pub use config::{
    CanvasConfig, HandleConfig, MinimapConfig, ReactionConfig, ResizeConfig, SceneConfig,
    ViewportConfig,
};

pub use error::{CanvasError, ConfigError, Error, Result};

// Re-export event bus for convenience
pub use event_bus::{
    CanvasEvent, EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter,
    SubscriptionId,
};

pub use geometry::{cubic_bezier, distance_to_segment, ray_exit, Bounds, Point};

pub use types::{ElementId, ElementKind, SelectedElement};
