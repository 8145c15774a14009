//! # Event Bus Module
//!
//! Publish/subscribe channel between the canvas engine and its observers
//! (property forms, status bars, the paint surface).
//!
//! ## Overview
//!
//! - The interaction controller publishes typed `CanvasEvent`s
//! - Subscribers filter by `EventCategory` and are called synchronously
//!   on the publishing thread
//!
//! ## Usage
//!
//! ```rust
//! use rxnview_core::event_bus::{CanvasEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Selection]),
//!     |event| {
//!         if let CanvasEvent::SelectionChanged { selected } = event {
//!             println!("{} element(s) selected", selected.len());
//!         }
//!     },
//! );
//!
//! let _ = bus.publish(CanvasEvent::SelectionChanged { selected: Vec::new() });
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
