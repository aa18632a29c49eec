use crate::types::{BodyId, Pose, RayHit, TargetDescriptor};
use glam::DVec3;

/// Errors raised by the physics collaborator.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PhysicsError {
    #[error("body {0} has no physics representation")]
    UnknownBody(BodyId),
    #[error("invalid collision shape: {0}")]
    InvalidShape(String),
}

/// The subset of a rigid-body engine the player and scene code rely on.
///
/// All vectors are world space. Implementations own the bodies; callers hold
/// only [`BodyId`]s.
pub trait PhysicsBackend {
    /// Current absolute pose, or `None` if the body does not exist.
    fn pose(&self, body: BodyId) -> Option<Pose>;

    fn linear_velocity(&self, body: BodyId) -> Option<DVec3>;

    fn set_linear_velocity(&mut self, body: BodyId, velocity: DVec3) -> Result<(), PhysicsError>;

    fn angular_velocity(&self, body: BodyId) -> Option<DVec3>;

    fn set_angular_velocity(&mut self, body: BodyId, velocity: DVec3)
    -> Result<(), PhysicsError>;

    /// Instantaneous change of momentum at a world-space point.
    fn apply_impulse_at_point(
        &mut self,
        body: BodyId,
        impulse: DVec3,
        point: DVec3,
    ) -> Result<(), PhysicsError>;

    /// Force acting during the next simulation step only.
    fn apply_force_at_point(
        &mut self,
        body: BodyId,
        force: DVec3,
        point: DVec3,
    ) -> Result<(), PhysicsError>;

    /// Nearest hit along `direction` within `max_distance`, ignoring `exclude`.
    fn cast_ray(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        exclude: Option<BodyId>,
    ) -> Option<RayHit>;
}

/// Per-body hook run by the physics collaborator before each simulation advance.
pub trait BeforeStep {
    fn before_step(&mut self, physics: &mut dyn PhysicsBackend);
}

/// Resolves bodies hit by raycasts into human-readable descriptors.
pub trait TargetDirectory {
    fn describe(&self, body: BodyId) -> Option<TargetDescriptor>;
}
