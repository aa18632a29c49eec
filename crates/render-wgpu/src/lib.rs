//! wgpu render backend for the crime-scene walkthrough.
//!
//! Draws the ground with a grid overlay and every room mesh at its physics
//! pose, lit by the hemispheric ambient light and the player's flashlight.
//! Meshes flagged for alpha blending are drawn last, farthest first.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Physics stepping is separate from render frame rate.

mod frame;
mod gpu;
mod shaders;

pub use frame::{FrameLights, FrameUniforms, back_to_front, grid_lines};
pub use gpu::WgpuRenderer;
