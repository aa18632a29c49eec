use crate::convert::{from_rotation, from_vector, to_point, to_rotation, to_vector};
use crimescene_common::{
    BeforeStep, BodyId, BodyKind, PhysicsBackend, PhysicsError, Pose, RayHit,
};
use glam::DVec3;
use rapier3d::prelude::*;

/// Simulation rate used by the application loop.
pub const FIXED_TIMESTEP: f64 = 1.0 / 60.0;

pub const DEFAULT_GRAVITY: DVec3 = DVec3::new(0.0, -9.81, 0.0);

/// Collision geometry of a body, in the body's local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Cuboid { half_extents: DVec3 },
    /// Y-aligned cylinder.
    Cylinder { half_height: f64, radius: f64 },
    TriMesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
    ConvexHull { points: Vec<[f32; 3]> },
}

/// Everything needed to create one rigid body with a single collider.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub pose: Pose,
    pub shape: Shape,
    /// Collider mass; ignored for fixed bodies.
    pub mass: f64,
    pub friction: f64,
    pub restitution: f64,
    /// Keep the body upright regardless of contact torques.
    pub lock_rotations: bool,
}

impl BodyDesc {
    pub fn fixed(pose: Pose, shape: Shape) -> Self {
        Self {
            kind: BodyKind::Fixed,
            pose,
            shape,
            mass: 0.0,
            friction: 0.5,
            restitution: 0.0,
            lock_rotations: false,
        }
    }

    pub fn dynamic(pose: Pose, shape: Shape, mass: f64) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass,
            ..Self::fixed(pose, shape)
        }
    }

    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn lock_rotations(mut self) -> Self {
        self.lock_rotations = true;
        self
    }
}

fn handle_of(id: BodyId) -> RigidBodyHandle {
    RigidBodyHandle::from_raw_parts(id.index(), id.generation())
}

fn id_of(handle: RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId::from_parts(index, generation)
}

fn collider_builder(shape: &Shape) -> Result<ColliderBuilder, PhysicsError> {
    match shape {
        Shape::Cuboid { half_extents: h } => {
            Ok(ColliderBuilder::cuboid(h.x as Real, h.y as Real, h.z as Real))
        }
        Shape::Cylinder {
            half_height,
            radius,
        } => Ok(ColliderBuilder::cylinder(*half_height as Real, *radius as Real)),
        Shape::TriMesh { vertices, indices } => {
            if indices.is_empty() || vertices.len() < 3 {
                return Err(PhysicsError::InvalidShape("empty triangle mesh".into()));
            }
            let out_of_range = indices.iter().flatten().any(|&i| i as usize >= vertices.len());
            if out_of_range {
                return Err(PhysicsError::InvalidShape(
                    "triangle index out of range".into(),
                ));
            }
            let points = vertices.iter().map(|v| point![v[0], v[1], v[2]]).collect();
            Ok(ColliderBuilder::trimesh(points, indices.clone()))
        }
        Shape::ConvexHull { points } => {
            if points.len() < 4 {
                return Err(PhysicsError::InvalidShape(format!(
                    "convex hull needs at least 4 points, got {}",
                    points.len()
                )));
            }
            let points: Vec<Point<Real>> = points.iter().map(|v| point![v[0], v[1], v[2]]).collect();
            ColliderBuilder::convex_hull(&points)
                .ok_or_else(|| PhysicsError::InvalidShape("degenerate convex hull".into()))
        }
    }
}

/// A rapier rigid-body world.
///
/// User forces are one-shot: they act during the next [`RapierWorld::step`]
/// and are cleared afterwards.
pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    queries: QueryPipeline,
    steps: u64,
}

impl RapierWorld {
    pub fn new(gravity: DVec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            queries: QueryPipeline::new(),
            steps: 0,
        }
    }

    pub fn gravity(&self) -> DVec3 {
        from_vector(&self.gravity)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of completed simulation steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Create a body and its collider. Queries see it after the next step or
    /// [`RapierWorld::update_queries`].
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError> {
        let collider = collider_builder(&desc.shape)?
            .friction(desc.friction as Real)
            .restitution(desc.restitution as Real);
        let collider = match desc.kind {
            BodyKind::Fixed => collider,
            BodyKind::Dynamic => collider.mass(desc.mass as Real),
        };

        let position = Isometry::from_parts(
            to_vector(desc.pose.position).into(),
            to_rotation(desc.pose.orientation),
        );
        let mut builder = match desc.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        }
        .position(position);
        if desc.lock_rotations {
            builder = builder.lock_rotations();
        }
        let body = builder.build();

        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        let id = id_of(handle);
        tracing::debug!(body = %id, kind = ?desc.kind, mass = desc.mass, "body added");
        Ok(id)
    }

    /// Rebuild the raycast acceleration structure from current colliders.
    pub fn update_queries(&mut self) {
        self.queries.update(&self.colliders);
    }

    /// Run every hook, then advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64, hooks: &mut [&mut dyn BeforeStep]) {
        for hook in hooks.iter_mut() {
            hook.before_step(self);
        }

        self.params.dt = dt as Real;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.queries),
            &(),
            &(),
        );

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
        self.steps += 1;
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(handle_of(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody, PhysicsError> {
        self.bodies
            .get_mut(handle_of(id))
            .ok_or(PhysicsError::UnknownBody(id))
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl PhysicsBackend for RapierWorld {
    fn pose(&self, body: BodyId) -> Option<Pose> {
        self.body(body).map(|b| {
            Pose::new(from_vector(b.translation()), from_rotation(b.rotation()))
        })
    }

    fn linear_velocity(&self, body: BodyId) -> Option<DVec3> {
        self.body(body).map(|b| from_vector(b.linvel()))
    }

    fn set_linear_velocity(&mut self, body: BodyId, velocity: DVec3) -> Result<(), PhysicsError> {
        self.body_mut(body)?.set_linvel(to_vector(velocity), true);
        Ok(())
    }

    fn angular_velocity(&self, body: BodyId) -> Option<DVec3> {
        self.body(body).map(|b| from_vector(b.angvel()))
    }

    fn set_angular_velocity(
        &mut self,
        body: BodyId,
        velocity: DVec3,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?.set_angvel(to_vector(velocity), true);
        Ok(())
    }

    fn apply_impulse_at_point(
        &mut self,
        body: BodyId,
        impulse: DVec3,
        point: DVec3,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?
            .apply_impulse_at_point(to_vector(impulse), to_point(point), true);
        Ok(())
    }

    fn apply_force_at_point(
        &mut self,
        body: BodyId,
        force: DVec3,
        point: DVec3,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?
            .add_force_at_point(to_vector(force), to_point(point), true);
        Ok(())
    }

    fn cast_ray(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        exclude: Option<BodyId>,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == DVec3::ZERO {
            return None;
        }
        let ray = Ray::new(to_point(origin), to_vector(direction));
        let filter = match exclude {
            Some(id) => QueryFilter::default().exclude_rigid_body(handle_of(id)),
            None => QueryFilter::default(),
        };
        let (collider, toi) = self.queries.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance as Real,
            true,
            filter,
        )?;
        let parent = self.colliders.get(collider)?.parent()?;
        let distance = toi as f64;
        Some(RayHit {
            body: id_of(parent),
            distance,
            point: origin + direction * distance,
        })
    }
}
