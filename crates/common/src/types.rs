use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Opaque handle of a body owned by the physics collaborator.
///
/// Packs the backend's slot index and generation so stale handles never
/// alias a newer body in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl BodyId {
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    pub fn index(self) -> u32 {
        self.0 as u32
    }

    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}v{}", self.index(), self.generation())
    }
}

/// Absolute position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Pose {
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: DVec3) -> Self {
        Self::new(position, DQuat::IDENTITY)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves; mass is ignored.
    Fixed,
    Dynamic,
}

/// Nearest intersection reported by a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    /// Distance along the (normalized) ray direction.
    pub distance: f64,
    pub point: DVec3,
}

/// What the HUD knows about a looked-at body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub mass: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_packs_index_and_generation() {
        let id = BodyId::from_parts(7, 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
        assert_ne!(id, BodyId::from_parts(7, 4));
    }

    #[test]
    fn body_id_display() {
        assert_eq!(BodyId::from_parts(2, 1).to_string(), "body#2v1");
    }

    #[test]
    fn pose_default_is_identity() {
        let p = Pose::default();
        assert_eq!(p.position, DVec3::ZERO);
        assert_eq!(p.orientation, DQuat::IDENTITY);
    }
}
