//! Pointer and keyboard interaction.
//!
//! [`InteractionController`] runs the state machine; the other modules hold
//! its input types, states and cursor hints.

mod controller;
mod cursor;
mod input;
mod state;

pub use controller::InteractionController;
pub use cursor::{CursorHint, ResizeHandle};
pub use input::{Key, KeyEvent, Modifiers, PointerButton, PointerEvent};
pub use state::{InteractionState, PanSource};
