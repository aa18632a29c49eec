//! Shared types and math for the crime scene walkthrough.
//!
//! # Invariants
//! - Core math runs in double precision (`DVec3`/`DQuat`).
//! - Quaternions handed to [`vecmath`] are unit length.
//! - Bodies are referenced only through [`BodyId`]; the physics backend owns them.

pub mod physics;
pub mod types;
pub mod vecmath;

pub use physics::{BeforeStep, PhysicsBackend, PhysicsError, TargetDirectory};
pub use types::{BodyId, BodyKind, Pose, RayHit, TargetDescriptor};
pub use vecmath::{apply_local_force, apply_local_force_at_origin, local_point_to_world, rotate_vector};
