//! Keyboard input mapped to movement flags and player actions.
//!
//! # Invariants
//! - Flags are edge-triggered: only key-down/key-up transitions touch them.
//! - A transition equal to the recorded state for that key is dropped.

pub mod action;
pub mod keys;

pub use action::{Action, MoveFlag};
pub use keys::{InputRouter, KeyBindings, KeyTracker, MoveInput};
pub use winit::keyboard::KeyCode;
