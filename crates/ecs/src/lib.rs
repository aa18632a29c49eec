//! Per-body component storage for scene objects.
//!
//! Components are stored in BTreeMap keyed by [`BodyId`], one map per
//! component type, so listings come out in a stable order.
//!
//! # Invariants
//! - Every stored body has a [`Name`]; other components are optional.

pub use crimescene_common::BodyKind;
use crimescene_common::{BodyId, TargetDescriptor, TargetDirectory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mesh or node name as imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

/// Name of the node this body hangs under; absent once detached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent(pub String);

/// Mass properties. A mass of zero means the body never moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub kind: BodyKind,
    pub mass: f64,
    pub friction: f64,
    pub restitution: f64,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            kind: BodyKind::Fixed,
            mass: 0.0,
            friction: 0.6,
            restitution: 0.0,
        }
    }
}

/// Collision shape summary, kept for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Cuboid { half_extents: [f64; 3] },
    Cylinder { half_height: f64, radius: f64 },
    TriMesh { triangles: usize },
    ConvexHull { points: usize },
}

/// How the body's mesh is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub alpha_blend: bool,
}

/// Component storage for every scene body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneObjects {
    names: BTreeMap<BodyId, Name>,
    parents: BTreeMap<BodyId, Parent>,
    rigid_bodies: BTreeMap<BodyId, RigidBody>,
    colliders: BTreeMap<BodyId, Collider>,
    renderables: BTreeMap<BodyId, Renderable>,
}

impl SceneObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body under `name`, replacing any previous name.
    pub fn insert(&mut self, body: BodyId, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(%body, %name, "scene object registered");
        self.names.insert(body, Name(name));
    }

    pub fn get_name(&self, body: BodyId) -> Option<&Name> {
        self.names.get(&body)
    }

    pub fn set_parent(&mut self, body: BodyId, parent: impl Into<String>) {
        self.parents.insert(body, Parent(parent.into()));
    }

    pub fn get_parent(&self, body: BodyId) -> Option<&Parent> {
        self.parents.get(&body)
    }

    pub fn set_rigid_body(&mut self, body: BodyId, rigid_body: RigidBody) {
        self.rigid_bodies.insert(body, rigid_body);
    }

    pub fn get_rigid_body(&self, body: BodyId) -> Option<&RigidBody> {
        self.rigid_bodies.get(&body)
    }

    pub fn set_collider(&mut self, body: BodyId, collider: Collider) {
        self.colliders.insert(body, collider);
    }

    pub fn get_collider(&self, body: BodyId) -> Option<&Collider> {
        self.colliders.get(&body)
    }

    pub fn set_renderable(&mut self, body: BodyId, renderable: Renderable) {
        self.renderables.insert(body, renderable);
    }

    pub fn get_renderable(&self, body: BodyId) -> Option<&Renderable> {
        self.renderables.get(&body)
    }
}

impl TargetDirectory for SceneObjects {
    fn describe(&self, body: BodyId) -> Option<TargetDescriptor> {
        let name = self.names.get(&body)?;
        Some(TargetDescriptor {
            name: name.0.clone(),
            parent: self.parents.get(&body).map(|p| p.0.clone()),
            mass: self.rigid_bodies.get(&body).map(|rb| rb.mass),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> BodyId {
        BodyId::from_parts(i, 0)
    }

    #[test]
    fn describe_collects_name_parent_mass() {
        let mut objects = SceneObjects::new();
        objects.insert(id(1), "knife");
        objects.set_parent(id(1), "__root__");
        objects.set_rigid_body(id(1), RigidBody::default());

        let d = objects.describe(id(1)).unwrap();
        assert_eq!(d.name, "knife");
        assert_eq!(d.parent.as_deref(), Some("__root__"));
        assert_eq!(d.mass, Some(0.0));
    }

    #[test]
    fn describe_unknown_body_is_none() {
        let objects = SceneObjects::new();
        assert!(objects.describe(id(9)).is_none());
    }

    #[test]
    fn dynamic_body_without_parent_reports_mass() {
        let mut objects = SceneObjects::new();
        objects.insert(id(2), "chair");
        objects.set_rigid_body(
            id(2),
            RigidBody {
                kind: BodyKind::Dynamic,
                mass: 10.0,
                ..RigidBody::default()
            },
        );
        let d = objects.describe(id(2)).unwrap();
        assert!(d.parent.is_none());
        assert_eq!(d.mass, Some(10.0));
    }

    #[test]
    fn components_are_optional_beyond_name() {
        let mut objects = SceneObjects::new();
        objects.insert(id(3), "bed");
        objects.set_collider(id(3), Collider::TriMesh { triangles: 12 });
        objects.set_renderable(id(3), Renderable { alpha_blend: true });

        assert_eq!(objects.get_name(id(3)), Some(&Name("bed".into())));
        assert!(objects.get_parent(id(3)).is_none());
        assert!(objects.get_rigid_body(id(3)).is_none());
        assert_eq!(
            objects.get_collider(id(3)),
            Some(&Collider::TriMesh { triangles: 12 })
        );
        assert!(objects.get_renderable(id(3)).is_some_and(|r| r.alpha_blend));
        assert!(objects.describe(id(3)).unwrap().mass.is_none());
    }

    #[test]
    fn insert_replaces_name() {
        let mut objects = SceneObjects::new();
        objects.insert(id(1), "mesh_a");
        objects.insert(id(1), "mesh_b");
        assert_eq!(objects.describe(id(1)).unwrap().name, "mesh_b");
    }
}
