//! rapier-backed rigid-body world.
//!
//! [`RapierWorld`] implements [`PhysicsBackend`] so the player and scene code
//! never touch rapier types directly.
//!
//! # Invariants
//! - Before-step hooks run strictly before the simulation advance of that step.
//! - Forces added through the backend act for one step only.
//! - Raycasts report the nearest hit and never the excluded body.
//!
//! [`PhysicsBackend`]: crimescene_common::PhysicsBackend

pub mod convert;
pub mod world;

pub use world::{BodyDesc, DEFAULT_GRAVITY, FIXED_TIMESTEP, RapierWorld, Shape};
