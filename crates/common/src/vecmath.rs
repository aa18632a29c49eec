//! Local/world frame conversions for rigid bodies.
//!
//! Physics engines typically expose only a world-space "apply force at point"
//! primitive. These helpers let callers express forces in a body's own frame
//! ("push forward relative to where the object is facing").

use crate::physics::{PhysicsBackend, PhysicsError};
use crate::types::BodyId;
use glam::{DQuat, DVec3};

/// Rotate `v` by the unit quaternion `q` (`q * (v, 0) * q⁻¹`, vector part).
///
/// Expanded form of the sandwich product: `q * v` first, then multiplied by
/// the conjugate. `q` must already be unit length; the conjugate stands in for
/// the inverse.
pub fn rotate_vector(v: DVec3, q: DQuat) -> DVec3 {
    let (x, y, z) = (v.x, v.y, v.z);
    let (qx, qy, qz, qw) = (q.x, q.y, q.z, q.w);

    // q * v
    let ix = qw * x + qy * z - qz * y;
    let iy = qw * y + qz * x - qx * z;
    let iz = qw * z + qx * y - qy * x;
    let iw = -qx * x - qy * y - qz * z;

    DVec3::new(
        ix * qw + iw * -qx + iy * -qz - iz * -qy,
        iy * qw + iw * -qy + iz * -qx - ix * -qz,
        iz * qw + iw * -qz + ix * -qy - iy * -qx,
    )
}

/// Transform a point from a body's local frame into world space.
pub fn local_point_to_world(p_local: DVec3, q: DQuat, origin: DVec3) -> DVec3 {
    rotate_vector(p_local, q) + origin
}

/// Apply a force expressed in `body`'s local frame at a local-frame point.
///
/// Fails with [`PhysicsError::UnknownBody`] when the body has no pose.
pub fn apply_local_force(
    physics: &mut dyn PhysicsBackend,
    body: BodyId,
    f_local: DVec3,
    p_local: DVec3,
) -> Result<(), PhysicsError> {
    let pose = physics.pose(body).ok_or(PhysicsError::UnknownBody(body))?;
    let world_force = rotate_vector(f_local, pose.orientation);
    let world_point = local_point_to_world(p_local, pose.orientation, pose.position);
    tracing::trace!(%body, ?world_force, ?world_point, "applying local force");
    physics.apply_force_at_point(body, world_force, world_point)
}

/// [`apply_local_force`] at the body's own origin.
pub fn apply_local_force_at_origin(
    physics: &mut dyn PhysicsBackend,
    body: BodyId,
    f_local: DVec3,
) -> Result<(), PhysicsError> {
    apply_local_force(physics, body, f_local, DVec3::ZERO)
}
