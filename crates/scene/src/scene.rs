use crate::config::{AmbientLight, SceneConfig};
use crate::error::SceneError;
use crate::loader::RoomLoader;
use crimescene_assets::RoomAsset;
use crimescene_common::{BodyId, PhysicsBackend, Pose};
use crimescene_ecs::{BodyKind, Collider, Renderable, RigidBody, SceneObjects};
use crimescene_input::{KeyBindings, KeyCode};
use crimescene_kernel::{Player, Session, SessionCommand};
use crimescene_physics::{BodyDesc, RapierWorld, Shape};
use glam::{DVec3, Mat4};
use std::path::Path;
use std::time::{Duration, Instant};

/// Vertical speed below which a grounded player counts as standing still.
const SETTLED_SPEED: f64 = 0.05;

/// Load state of the room. Per-frame hooks only act once `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed,
}

/// One room mesh to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Index into [`RoomAsset::meshes`].
    pub mesh_index: usize,
    pub model: Mat4,
    pub alpha_blend: bool,
}

pub struct Scene {
    config: SceneConfig,
    physics: RapierWorld,
    objects: SceneObjects,
    session: Session,
    ground: BodyId,
    readiness: Readiness,
    failure: Option<String>,
    loader: Option<RoomLoader>,
    room: Option<RoomAsset>,
    /// Body per room mesh, parallel to `room.meshes`.
    room_bodies: Vec<Option<BodyId>>,
    player: Option<Player>,
}

impl Scene {
    /// Build physics, ground and lighting. The room and player come later,
    /// see [`Scene::start_loading`].
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        let mut physics = RapierWorld::new(config.gravity);
        let mut objects = SceneObjects::new();

        let ground_cfg = &config.ground;
        let half = ground_cfg.size / 2.0;
        let half_thickness = ground_cfg.thickness / 2.0;
        let ground = physics.add_body(
            BodyDesc::fixed(
                Pose::from_position(DVec3::new(0.0, ground_cfg.top - half_thickness, 0.0)),
                Shape::Cuboid {
                    half_extents: DVec3::new(half, half_thickness, half),
                },
            )
            .friction(config.friction)
            .restitution(ground_cfg.restitution),
        )?;
        objects.insert(ground, "ground");
        objects.set_rigid_body(
            ground,
            RigidBody {
                friction: config.friction,
                restitution: ground_cfg.restitution,
                ..RigidBody::default()
            },
        );
        objects.set_collider(
            ground,
            Collider::Cuboid {
                half_extents: [half, half_thickness, half],
            },
        );
        physics.update_queries();

        tracing::info!(
            size = ground_cfg.size,
            top = ground_cfg.top,
            ambient = config.ambient.intensity,
            "scene created"
        );

        Ok(Self {
            config,
            physics,
            objects,
            session: Session::new(),
            ground,
            readiness: Readiness::Loading,
            failure: None,
            loader: None,
            room: None,
            room_bodies: Vec::new(),
            player: None,
        })
    }

    /// Begin importing the room at `source` on a background thread.
    pub fn start_loading(&mut self, source: impl AsRef<Path>) -> Result<(), SceneError> {
        if self.readiness != Readiness::Loading || self.loader.is_some() {
            tracing::warn!(readiness = ?self.readiness, "room load already started");
            return Ok(());
        }
        self.loader = Some(RoomLoader::spawn(source)?);
        Ok(())
    }

    /// Collect a finished import, if any, and report the load state.
    pub fn poll(&mut self) -> Readiness {
        if let Some(loader) = self.loader.as_mut() {
            if let Some(result) = loader.poll() {
                self.loader = None;
                let outcome = result.and_then(|room| self.finish_loading(room));
                if let Err(error) = outcome {
                    self.fail(&error);
                }
            }
        }
        self.readiness
    }

    /// Import the room on the calling thread.
    pub fn load_blocking(&mut self, source: impl AsRef<Path>) -> Result<(), SceneError> {
        self.start_loading(source)?;
        let Some(loader) = self.loader.take() else {
            return Ok(());
        };
        let outcome = loader.wait().and_then(|room| self.finish_loading(room));
        if let Err(error) = &outcome {
            self.fail(error);
        }
        outcome
    }

    fn fail(&mut self, error: &SceneError) {
        tracing::error!(%error, "room failed to load");
        self.failure = Some(error.to_string());
        self.readiness = Readiness::Failed;
    }

    fn finish_loading(&mut self, room: RoomAsset) -> Result<(), SceneError> {
        let mut bodies = Vec::with_capacity(room.meshes.len());
        for mesh in &room.meshes {
            let mass = self.config.mass_of(&mesh.name);
            let pose = Pose::new(mesh.translation, mesh.rotation);
            let (desc, collider) = if mass > 0.0 {
                (
                    BodyDesc::dynamic(
                        pose,
                        Shape::ConvexHull {
                            points: mesh.positions.clone(),
                        },
                        mass,
                    ),
                    Collider::ConvexHull {
                        points: mesh.vertex_count(),
                    },
                )
            } else {
                (
                    BodyDesc::fixed(
                        pose,
                        Shape::TriMesh {
                            vertices: mesh.positions.clone(),
                            indices: mesh.triangles(),
                        },
                    ),
                    Collider::TriMesh {
                        triangles: mesh.triangle_count(),
                    },
                )
            };
            let kind = desc.kind;

            let body = match self.physics.add_body(desc.friction(self.config.friction)) {
                Ok(body) => body,
                Err(error) => {
                    tracing::warn!(mesh = %mesh.name, %error, "mesh skipped, no collider");
                    bodies.push(None);
                    continue;
                }
            };

            self.objects.insert(body, mesh.name.clone());
            if kind == BodyKind::Dynamic {
                tracing::debug!(mesh = %mesh.name, parent = %mesh.parent, mass, "mesh detached");
            } else {
                self.objects.set_parent(body, mesh.parent.clone());
            }
            self.objects.set_rigid_body(
                body,
                RigidBody {
                    kind,
                    mass,
                    friction: self.config.friction,
                    restitution: 0.0,
                },
            );
            self.objects.set_collider(body, collider);
            self.objects.set_renderable(
                body,
                Renderable {
                    alpha_blend: self.config.alpha_blend.contains(&mesh.name),
                },
            );
            bodies.push(Some(body));
        }

        let unmatched = self.config.unmatched_keys(room.mesh_names());
        for key in &unmatched.info {
            tracing::warn!(mesh = %key, "info entry names no mesh in the room");
        }
        for key in unmatched.masses.iter().chain(&unmatched.alpha_blend) {
            tracing::warn!(mesh = %key, "config names a mesh the room does not have");
        }

        let player = self.spawn_player()?;
        self.physics.update_queries();

        tracing::info!(
            source = %room.source.display(),
            meshes = room.meshes.len(),
            bodies = self.physics.body_count(),
            "room ready"
        );
        self.room_bodies = bodies;
        self.room = Some(room);
        self.player = Some(player);
        self.readiness = Readiness::Ready;
        Ok(())
    }

    fn spawn_player(&mut self) -> Result<Player, SceneError> {
        let cfg = &self.config.player;
        let body = self.physics.add_body(
            BodyDesc::dynamic(
                Pose::from_position(cfg.spawn),
                Shape::Cylinder {
                    half_height: cfg.body_height / 2.0,
                    radius: cfg.body_diameter / 2.0,
                },
                cfg.mass,
            )
            .friction(cfg.friction)
            .lock_rotations(),
        )?;
        self.objects.insert(body, "player");
        self.objects.set_rigid_body(
            body,
            RigidBody {
                kind: BodyKind::Dynamic,
                mass: cfg.mass,
                friction: cfg.friction,
                restitution: 0.0,
            },
        );
        self.objects.set_collider(
            body,
            Collider::Cylinder {
                half_height: cfg.body_height / 2.0,
                radius: cfg.body_diameter / 2.0,
            },
        );
        tracing::info!(%body, spawn = %cfg.spawn, "player spawned");
        Ok(Player::new(
            cfg.clone(),
            body,
            KeyBindings::default(),
            self.config.info.clone(),
        ))
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Why the load failed, once `Failed`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn apply(&mut self, command: SessionCommand) {
        self.session.apply(command);
    }

    pub fn handle_key(&mut self, code: KeyCode, down: bool) {
        if let Some(player) = self.player.as_mut() {
            player.handle_key(code, down, &mut self.physics, &mut self.session);
        }
    }

    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if let Some(player) = self.player.as_mut() {
            player.handle_mouse_motion(dx, dy);
        }
    }

    /// Advance physics by `dt`, running the player's before-step hook.
    pub fn step(&mut self, dt: f64) {
        if let Some(player) = self.player.as_mut() {
            self.physics.step(dt, &mut [player]);
        }
    }

    /// Per-frame update: rays, flashlight and HUD.
    pub fn before_render(&mut self, now: Instant, delta: Duration) {
        if let Some(player) = self.player.as_mut() {
            player.before_render(&self.physics, &self.objects, &self.session, now, delta);
        }
    }

    /// Step and sense until the player stands still on something, at most
    /// `max_steps` times. Returns the steps taken; `None` if it never comes
    /// to rest or the room is not loaded.
    pub fn settle(&mut self, dt: f64, max_steps: usize) -> Option<usize> {
        let delta = Duration::from_secs_f64(dt);
        for taken in 0..max_steps {
            self.before_render(Instant::now(), delta);
            let player = self.player.as_ref()?;
            let resting = self
                .physics
                .linear_velocity(player.body())
                .is_some_and(|v| v.y.abs() < SETTLED_SPEED);
            if player.grounded() && resting {
                tracing::debug!(steps = taken, "player settled");
                return Some(taken);
            }
            self.step(dt);
        }
        None
    }

    /// Model matrices for every room mesh that has a body.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.room_bodies
            .iter()
            .enumerate()
            .filter_map(|(mesh_index, body)| {
                let body = (*body)?;
                let pose = self.physics.pose(body)?;
                let alpha_blend = self
                    .objects
                    .get_renderable(body)
                    .is_some_and(|r| r.alpha_blend);
                Some(DrawItem {
                    mesh_index,
                    model: Mat4::from_rotation_translation(
                        pose.orientation.as_quat(),
                        pose.position.as_vec3(),
                    ),
                    alpha_blend,
                })
            })
            .collect()
    }

    /// Body created for the named room mesh.
    pub fn body_of(&self, mesh: &str) -> Option<BodyId> {
        let room = self.room.as_ref()?;
        let index = room.meshes.iter().position(|m| m.name == mesh)?;
        self.room_bodies.get(index).copied().flatten()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn physics(&self) -> &RapierWorld {
        &self.physics
    }

    pub fn objects(&self) -> &SceneObjects {
        &self.objects
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ambient(&self) -> &AmbientLight {
        &self.config.ambient
    }

    pub fn ground(&self) -> BodyId {
        self.ground
    }

    pub fn room(&self) -> Option<&RoomAsset> {
        self.room.as_ref()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimescene_common::TargetDirectory;
    use crimescene_physics::FIXED_TIMESTEP;
    use std::path::PathBuf;

    fn room_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/models/full_room.gltf")
    }

    fn loaded() -> Scene {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.load_blocking(room_path()).unwrap();
        scene
    }

    fn wait_until_settled(scene: &mut Scene) -> Readiness {
        let deadline = Instant::now() + Duration::from_secs(30);
        loop {
            let state = scene.poll();
            if state != Readiness::Loading || Instant::now() > deadline {
                return state;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn new_scene_has_ground_and_waits_for_room() {
        let scene = Scene::new(SceneConfig::default()).unwrap();
        assert_eq!(scene.readiness(), Readiness::Loading);
        assert_eq!(scene.objects().get_name(scene.ground()).unwrap().0, "ground");
        assert!(scene.player().is_none());

        let hit = scene
            .physics()
            .cast_ray(DVec3::new(0.0, 5.0, 0.0), -DVec3::Y, 10.0, None)
            .unwrap();
        assert!((hit.point.y + 1.0).abs() < 1e-4);
    }

    #[test]
    fn hooks_do_nothing_before_ready() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.handle_key(KeyCode::KeyB, true);
        scene.handle_mouse_motion(100.0, 50.0);
        scene.step(FIXED_TIMESTEP);
        scene.before_render(Instant::now(), Duration::from_millis(16));

        assert_eq!(scene.physics().steps(), 0);
        assert!(!scene.session().debug_enabled());
        assert!(scene.draw_list().is_empty());
        assert_eq!(scene.poll(), Readiness::Loading);
    }

    #[test]
    fn background_load_becomes_ready() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.start_loading(room_path()).unwrap();
        assert_eq!(wait_until_settled(&mut scene), Readiness::Ready);
        assert!(scene.player().is_some());
        assert!(scene.failure().is_none());
    }

    #[test]
    fn missing_room_fails_and_stays_failed() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        scene.start_loading("/no/such/room.gltf").unwrap();
        assert_eq!(wait_until_settled(&mut scene), Readiness::Failed);
        assert!(scene.failure().is_some());
        assert!(scene.player().is_none());

        scene.step(FIXED_TIMESTEP);
        assert_eq!(scene.physics().steps(), 0);
        assert_eq!(scene.poll(), Readiness::Failed);
    }

    #[test]
    fn blocking_load_reports_error() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        assert!(scene.load_blocking("/no/such/room.gltf").is_err());
        assert_eq!(scene.readiness(), Readiness::Failed);
    }

    #[test]
    fn room_meshes_get_bodies_and_components() {
        let scene = loaded();
        let room = scene.room().unwrap();
        assert_eq!(scene.draw_list().len(), room.meshes.len());

        let knife = scene.body_of("knife").unwrap();
        let d = scene.objects().describe(knife).unwrap();
        assert_eq!(d.parent.as_deref(), Some("__root__"));
        assert_eq!(d.mass, Some(0.0));
        assert!(matches!(
            scene.objects().get_collider(knife),
            Some(Collider::TriMesh { .. })
        ));

        let foot = scene.body_of("right_foot").unwrap();
        assert_eq!(scene.objects().get_parent(foot).unwrap().0, "body");
    }

    #[test]
    fn chair_is_detached_and_dynamic() {
        let scene = loaded();
        let chair = scene.body_of("chair").unwrap();
        let rb = scene.objects().get_rigid_body(chair).unwrap();
        assert_eq!(rb.kind, BodyKind::Dynamic);
        assert_eq!(rb.mass, 10.0);
        assert!(scene.objects().get_parent(chair).is_none());
        assert!(matches!(
            scene.objects().get_collider(chair),
            Some(Collider::ConvexHull { .. })
        ));
    }

    #[test]
    fn listed_windows_blend() {
        let scene = loaded();
        let blended: Vec<&str> = scene
            .draw_list()
            .iter()
            .filter(|d| d.alpha_blend)
            .map(|d| scene.room().unwrap().meshes[d.mesh_index].name.as_str())
            .collect();
        assert_eq!(blended.len(), 2, "blended meshes: {blended:?}");
        assert!(blended.contains(&"inner_window_primitive1"));
        assert!(blended.contains(&"outer_window_primitive1"));
    }

    #[test]
    fn ready_scene_steps_and_toggles_debug() {
        let mut scene = loaded();
        scene.step(FIXED_TIMESTEP);
        assert_eq!(scene.physics().steps(), 1);

        scene.handle_key(KeyCode::KeyB, true);
        assert!(scene.session().debug_enabled());
        scene.apply(SessionCommand::ToggleDebug);
        assert!(!scene.session().debug_enabled());

        scene.before_render(Instant::now(), Duration::from_millis(16));
        let hud = scene.player().unwrap().hud();
        assert!(hud.crosshair_visible());
        assert!(!hud.debug_panel().visible);
    }

    #[test]
    fn unknown_info_keys_do_not_block_loading() {
        let mut config = SceneConfig::from_yaml_str("info:\n  ghost: \"Nothing here.\"\n").unwrap();
        config.masses.clear();
        let mut scene = Scene::new(config).unwrap();
        scene.load_blocking(room_path()).unwrap();
        assert!(scene.is_ready());
        let chair = scene.body_of("chair").unwrap();
        assert_eq!(
            scene.objects().get_rigid_body(chair).unwrap().kind,
            BodyKind::Fixed
        );
    }

    #[test]
    fn player_lands_then_jumps() {
        let mut scene = loaded();
        scene.before_render(Instant::now(), Duration::from_millis(16));
        assert!(!scene.player().unwrap().grounded());

        scene.handle_key(KeyCode::Space, true);
        scene.handle_key(KeyCode::Space, false);
        let body = scene.player().unwrap().body();
        assert!(scene.physics().linear_velocity(body).unwrap().y <= 0.0);

        let taken = scene.settle(FIXED_TIMESTEP, 300).unwrap();
        assert!(taken > 0);
        assert!(scene.player().unwrap().grounded());

        scene.handle_key(KeyCode::Space, true);
        assert!(scene.physics().linear_velocity(body).unwrap().y > 1.0);
    }

    #[test]
    fn settle_without_room_is_none() {
        let mut scene = Scene::new(SceneConfig::default()).unwrap();
        assert_eq!(scene.settle(FIXED_TIMESTEP, 10), None);
        assert_eq!(scene.physics().steps(), 0);
    }
}
