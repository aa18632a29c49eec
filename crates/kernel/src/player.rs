use crate::camera::{CameraConfig, FirstPersonCamera};
use crate::flashlight::{Flashlight, FlashlightConfig};
use crate::session::{Session, SessionCommand};
use crimescene_common::{BeforeStep, BodyId, PhysicsBackend, TargetDescriptor, TargetDirectory};
use crimescene_hud::{DebugSnapshot, Hud, InfoTable};
use crimescene_input::{Action, InputRouter, KeyBindings, KeyCode, MoveInput};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Movement, body and sensor tuning of the player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub sprint_speed: f64,
    pub walk_speed: f64,
    pub jump_impulse: f64,
    /// Physics steps during which movement input is ignored after spawn.
    pub teleport_cooldown: u32,
    pub spawn: DVec3,
    pub body_diameter: f64,
    pub body_height: f64,
    pub mass: f64,
    pub friction: f64,
    pub ground_ray_length: f64,
    pub interaction_ray_length: f64,
    pub camera: CameraConfig,
    pub flashlight: FlashlightConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sprint_speed: 7.5,
            walk_speed: 3.5,
            jump_impulse: 15.0,
            teleport_cooldown: 30,
            spawn: DVec3::new(1.5, 1.5, -3.0),
            body_diameter: 0.5,
            body_height: 2.0,
            mass: 3.0,
            friction: 0.6,
            ground_ray_length: 1.2,
            interaction_ray_length: 100.0,
            camera: CameraConfig::default(),
            flashlight: FlashlightConfig::default(),
        }
    }
}

/// Desired horizontal velocity from held keys and the camera basis.
///
/// Both basis vectors are flattened onto the XZ plane before combining; the
/// result has length `walk` or `sprint`, or is zero when no direction is held.
pub fn horizontal_velocity(
    input: &MoveInput,
    right: DVec3,
    forward: DVec3,
    walk: f64,
    sprint: f64,
) -> DVec3 {
    let (x, z) = input.axes();
    let flat = (right * x + forward * z) * DVec3::new(1.0, 0.0, 1.0);
    let speed = if input.sprinting { sprint } else { walk };
    flat.normalize_or_zero() * speed
}

/// First-person character: a physics body steered by held keys, a camera on
/// top, a flashlight and the HUD.
pub struct Player {
    config: PlayerConfig,
    body: BodyId,
    input: InputRouter,
    camera: FirstPersonCamera,
    flashlight: Flashlight,
    hud: Hud,
    grounded: bool,
    velocity: DVec3,
    teleport_cooldown: u32,
    visual_rotation: DQuat,
    target: Option<TargetDescriptor>,
}

impl Player {
    pub fn new(config: PlayerConfig, body: BodyId, bindings: KeyBindings, info: InfoTable) -> Self {
        let camera = FirstPersonCamera::new(config.camera.clone());
        let flashlight = Flashlight::new(&config.flashlight);
        let teleport_cooldown = config.teleport_cooldown;
        tracing::info!(%body, spawn = ?config.spawn, "player created");
        Self {
            config,
            body,
            input: InputRouter::new(bindings),
            camera,
            flashlight,
            hud: Hud::new(info),
            grounded: false,
            velocity: DVec3::ZERO,
            teleport_cooldown,
            visual_rotation: DQuat::IDENTITY,
            target: None,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    /// Last velocity written by the movement integrator.
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    pub fn teleport_cooldown(&self) -> u32 {
        self.teleport_cooldown
    }

    pub fn move_input(&self) -> MoveInput {
        self.input.move_input()
    }

    pub fn camera(&self) -> &FirstPersonCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FirstPersonCamera {
        &mut self.camera
    }

    pub fn flashlight(&self) -> &Flashlight {
        &self.flashlight
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    /// Orientation the character mesh is drawn with; reset every frame.
    pub fn visual_rotation(&self) -> DQuat {
        self.visual_rotation
    }

    /// Body under the crosshair as of the last rendered frame.
    pub fn target(&self) -> Option<&TargetDescriptor> {
        self.target.as_ref()
    }

    pub fn handle_key(
        &mut self,
        code: KeyCode,
        down: bool,
        physics: &mut dyn PhysicsBackend,
        session: &mut Session,
    ) {
        match self.input.handle_key(code, down) {
            Some(Action::Jump) => self.jump(physics),
            Some(Action::ToggleDebug) => session.apply(SessionCommand::ToggleDebug),
            Some(Action::Move(..)) | None => {}
        }
    }

    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.camera.rotate(dx, dy);
    }

    fn jump(&mut self, physics: &mut dyn PhysicsBackend) {
        if !self.grounded {
            tracing::debug!("jump ignored while airborne");
            return;
        }
        let Some(pose) = physics.pose(self.body) else {
            tracing::warn!(body = %self.body, "jump skipped: body missing");
            return;
        };
        let impulse = DVec3::new(0.0, self.config.jump_impulse, 0.0);
        if let Err(e) = physics.apply_impulse_at_point(self.body, impulse, pose.position) {
            tracing::warn!("jump skipped: {e}");
        }
    }

    /// Per-frame sensing: grounded check, crosshair target, HUD refresh.
    pub fn before_render(
        &mut self,
        physics: &dyn PhysicsBackend,
        directory: &dyn TargetDirectory,
        session: &Session,
        now: Instant,
        frame_delta: Duration,
    ) {
        self.visual_rotation = DQuat::IDENTITY;

        let Some(pose) = physics.pose(self.body) else {
            tracing::warn!(body = %self.body, "player body missing, frame skipped");
            self.grounded = false;
            return;
        };

        self.grounded = physics
            .cast_ray(
                pose.position,
                DVec3::NEG_Y,
                self.config.ground_ray_length,
                Some(self.body),
            )
            .is_some();

        let eye = self.camera.eye_position(pose.position);
        let forward = self.camera.forward();
        self.flashlight.follow(eye, forward);

        self.target = physics
            .cast_ray(
                eye,
                forward,
                self.config.interaction_ray_length,
                Some(self.body),
            )
            .and_then(|hit| directory.describe(hit.body));

        self.hud
            .update_context_info(self.target.as_ref().map(|t| t.name.as_str()));

        let snapshot = DebugSnapshot {
            position: pose.position,
            camera_pitch: self.camera.pitch,
            camera_yaw: self.camera.yaw,
            character_orientation: self.visual_rotation,
            linear_velocity: physics.linear_velocity(self.body).unwrap_or_default(),
            target: self.target.clone(),
        };
        self.hud
            .update_debug_info(&snapshot, session.debug_enabled(), now, frame_delta);
    }
}

impl BeforeStep for Player {
    fn before_step(&mut self, physics: &mut dyn PhysicsBackend) {
        if let Err(e) = physics.set_angular_velocity(self.body, DVec3::ZERO) {
            tracing::warn!("movement step skipped: {e}");
            return;
        }

        self.teleport_cooldown = self.teleport_cooldown.saturating_sub(1);
        if self.teleport_cooldown > 0 {
            return;
        }

        let current = physics.linear_velocity(self.body).unwrap_or_default();
        let horizontal = horizontal_velocity(
            &self.input.move_input(),
            self.camera.right(),
            self.camera.forward(),
            self.config.walk_speed,
            self.config.sprint_speed,
        );
        let velocity = DVec3::new(0.0, current.y, 0.0) + horizontal;
        match physics.set_linear_velocity(self.body, velocity) {
            Ok(()) => self.velocity = velocity,
            Err(e) => tracing::warn!("movement step skipped: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimescene_common::{PhysicsError, Pose, RayHit};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeBody {
        pose: Pose,
        linvel: DVec3,
        angvel: DVec3,
    }

    /// Bodies plus infinite planes `(owner, normal, offset)` for raycasts.
    #[derive(Default)]
    struct FakePhysics {
        bodies: HashMap<BodyId, FakeBody>,
        planes: Vec<(BodyId, DVec3, f64)>,
        impulses: Vec<(BodyId, DVec3, DVec3)>,
    }

    impl FakePhysics {
        fn body_mut(&mut self, body: BodyId) -> Result<&mut FakeBody, PhysicsError> {
            self.bodies
                .get_mut(&body)
                .ok_or(PhysicsError::UnknownBody(body))
        }
    }

    impl PhysicsBackend for FakePhysics {
        fn pose(&self, body: BodyId) -> Option<Pose> {
            self.bodies.get(&body).map(|b| b.pose)
        }

        fn linear_velocity(&self, body: BodyId) -> Option<DVec3> {
            self.bodies.get(&body).map(|b| b.linvel)
        }

        fn set_linear_velocity(&mut self, body: BodyId, v: DVec3) -> Result<(), PhysicsError> {
            self.body_mut(body)?.linvel = v;
            Ok(())
        }

        fn angular_velocity(&self, body: BodyId) -> Option<DVec3> {
            self.bodies.get(&body).map(|b| b.angvel)
        }

        fn set_angular_velocity(&mut self, body: BodyId, w: DVec3) -> Result<(), PhysicsError> {
            self.body_mut(body)?.angvel = w;
            Ok(())
        }

        fn apply_impulse_at_point(
            &mut self,
            body: BodyId,
            impulse: DVec3,
            point: DVec3,
        ) -> Result<(), PhysicsError> {
            self.body_mut(body)?;
            self.impulses.push((body, impulse, point));
            Ok(())
        }

        fn apply_force_at_point(
            &mut self,
            body: BodyId,
            _force: DVec3,
            _point: DVec3,
        ) -> Result<(), PhysicsError> {
            self.body_mut(body).map(|_| ())
        }

        fn cast_ray(
            &self,
            origin: DVec3,
            direction: DVec3,
            max_distance: f64,
            exclude: Option<BodyId>,
        ) -> Option<RayHit> {
            self.planes
                .iter()
                .filter(|(owner, _, _)| Some(*owner) != exclude)
                .filter_map(|&(owner, normal, offset)| {
                    let denom = normal.dot(direction);
                    if denom >= 0.0 {
                        return None;
                    }
                    let t = (offset - normal.dot(origin)) / denom;
                    (0.0..=max_distance).contains(&t).then(|| RayHit {
                        body: owner,
                        distance: t,
                        point: origin + direction * t,
                    })
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }
    }

    #[derive(Default)]
    struct FakeDirectory(HashMap<BodyId, TargetDescriptor>);

    impl TargetDirectory for FakeDirectory {
        fn describe(&self, body: BodyId) -> Option<TargetDescriptor> {
            self.0.get(&body).cloned()
        }
    }

    const PLAYER: BodyId = BodyId(1);
    const FLOOR: BodyId = BodyId(2);
    const WALL: BodyId = BodyId(3);

    fn player(cooldown: u32) -> Player {
        let config = PlayerConfig {
            teleport_cooldown: cooldown,
            ..PlayerConfig::default()
        };
        Player::new(config, PLAYER, KeyBindings::default(), InfoTable::default())
    }

    fn world_with_player_at(y: f64) -> FakePhysics {
        let mut physics = FakePhysics::default();
        physics.bodies.insert(
            PLAYER,
            FakeBody {
                pose: Pose::from_position(DVec3::new(1.5, y, -3.0)),
                ..FakeBody::default()
            },
        );
        // Floor top face at y = -1.
        physics.planes.push((FLOOR, DVec3::Y, -1.0));
        physics
    }

    fn render(player: &mut Player, physics: &FakePhysics, dir: &FakeDirectory, session: &Session) {
        player.before_render(physics, dir, session, Instant::now(), Duration::from_millis(16));
    }

    fn held(forward: bool, right: bool, sprinting: bool) -> MoveInput {
        MoveInput {
            forward,
            right,
            sprinting,
            ..MoveInput::default()
        }
    }

    #[test]
    fn no_input_gives_zero_velocity() {
        let v = horizontal_velocity(&MoveInput::default(), DVec3::NEG_X, DVec3::Z, 3.5, 7.5);
        assert_eq!(v, DVec3::ZERO);
    }

    #[test]
    fn walking_forward_follows_camera() {
        let v = horizontal_velocity(&held(true, false, false), DVec3::NEG_X, DVec3::Z, 3.5, 7.5);
        assert!((v - DVec3::new(0.0, 0.0, 3.5)).length() < 1e-12);
    }

    #[test]
    fn diagonal_is_normalized() {
        let v = horizontal_velocity(&held(true, true, false), DVec3::NEG_X, DVec3::Z, 3.5, 7.5);
        assert!((v.length() - 3.5).abs() < 1e-12);
        assert!(v.x < 0.0 && v.z > 0.0);
    }

    #[test]
    fn sprint_uses_sprint_speed() {
        let v = horizontal_velocity(&held(true, false, true), DVec3::NEG_X, DVec3::Z, 3.5, 7.5);
        assert!((v.length() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn pitched_forward_is_flattened() {
        let forward = DVec3::new(0.0, 0.8, 0.6);
        let v = horizontal_velocity(&held(true, false, false), DVec3::NEG_X, forward, 3.5, 7.5);
        assert_eq!(v.y, 0.0);
        assert!((v.length() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = MoveInput {
            left: true,
            right: true,
            ..MoveInput::default()
        };
        let v = horizontal_velocity(&input, DVec3::NEG_X, DVec3::Z, 3.5, 7.5);
        assert_eq!(v, DVec3::ZERO);
    }

    #[test]
    fn cooldown_suppresses_movement_then_releases() {
        let mut physics = world_with_player_at(0.0);
        let mut session = Session::new();
        let mut p = player(30);
        p.handle_key(KeyCode::KeyW, true, &mut physics, &mut session);
        physics.bodies.get_mut(&PLAYER).unwrap().linvel = DVec3::new(0.0, -2.0, 0.0);

        for _ in 0..29 {
            physics.bodies.get_mut(&PLAYER).unwrap().angvel = DVec3::ONE;
            p.before_step(&mut physics);
            let body = &physics.bodies[&PLAYER];
            assert_eq!(body.angvel, DVec3::ZERO);
            assert_eq!(body.linvel, DVec3::new(0.0, -2.0, 0.0));
        }
        assert_eq!(p.teleport_cooldown(), 1);

        p.before_step(&mut physics);
        let v = physics.bodies[&PLAYER].linvel;
        assert_eq!(v.y, -2.0);
        assert!((v.z - 3.5).abs() < 1e-12);
        assert_eq!(p.velocity(), v);
        assert_eq!(p.teleport_cooldown(), 0);
    }

    #[test]
    fn released_keys_stop_horizontal_motion() {
        let mut physics = world_with_player_at(0.0);
        let mut session = Session::new();
        let mut p = player(0);
        p.handle_key(KeyCode::KeyD, true, &mut physics, &mut session);
        p.before_step(&mut physics);
        assert!(physics.bodies[&PLAYER].linvel.x < 0.0);

        p.handle_key(KeyCode::KeyD, false, &mut physics, &mut session);
        physics.bodies.get_mut(&PLAYER).unwrap().linvel.y = 1.0;
        p.before_step(&mut physics);
        assert_eq!(physics.bodies[&PLAYER].linvel, DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn grounded_follows_ground_ray() {
        let mut physics = world_with_player_at(0.0);
        let dir = FakeDirectory::default();
        let session = Session::new();
        let mut p = player(0);

        render(&mut p, &physics, &dir, &session);
        assert!(p.grounded());

        physics.bodies.get_mut(&PLAYER).unwrap().pose.position.y = 0.5;
        render(&mut p, &physics, &dir, &session);
        assert!(!p.grounded());
    }

    #[test]
    fn jump_only_when_grounded() {
        let mut physics = world_with_player_at(3.0);
        let dir = FakeDirectory::default();
        let mut session = Session::new();
        let mut p = player(30);

        render(&mut p, &physics, &dir, &session);
        p.handle_key(KeyCode::Space, true, &mut physics, &mut session);
        p.handle_key(KeyCode::Space, false, &mut physics, &mut session);
        assert!(physics.impulses.is_empty());

        physics.bodies.get_mut(&PLAYER).unwrap().pose.position.y = 0.0;
        render(&mut p, &physics, &dir, &session);
        p.handle_key(KeyCode::Space, true, &mut physics, &mut session);
        assert_eq!(
            physics.impulses,
            vec![(PLAYER, DVec3::new(0.0, 15.0, 0.0), DVec3::new(1.5, 0.0, -3.0))]
        );
    }

    #[test]
    fn held_space_does_not_jump_twice() {
        let mut physics = world_with_player_at(0.0);
        let dir = FakeDirectory::default();
        let mut session = Session::new();
        let mut p = player(0);
        render(&mut p, &physics, &dir, &session);

        p.handle_key(KeyCode::Space, true, &mut physics, &mut session);
        p.handle_key(KeyCode::Space, true, &mut physics, &mut session);
        assert_eq!(physics.impulses.len(), 1);
    }

    #[test]
    fn looked_at_body_drives_hud() {
        let mut physics = world_with_player_at(0.0);
        // The player's own collider would be hit first if not excluded.
        physics.planes.push((PLAYER, DVec3::NEG_Z, 2.0));
        physics.planes.push((WALL, DVec3::NEG_Z, -2.0));
        let mut dir = FakeDirectory::default();
        dir.0.insert(
            WALL,
            TargetDescriptor {
                name: "knife".into(),
                parent: Some("__root__".into()),
                mass: Some(0.0),
            },
        );
        let session = Session::new();
        let mut p = player(0);

        render(&mut p, &physics, &dir, &session);
        assert_eq!(p.target().map(|t| t.name.as_str()), Some("knife"));
        assert!(p.hud().info_panel().visible);
        assert!(p.hud().info_panel().text.starts_with("Knife"));
        assert!(!p.hud().debug_panel().visible);
    }

    #[test]
    fn nothing_in_view_hides_info() {
        let physics = world_with_player_at(0.0);
        let dir = FakeDirectory::default();
        let session = Session::new();
        let mut p = player(0);
        render(&mut p, &physics, &dir, &session);
        assert!(p.target().is_none());
        assert!(!p.hud().info_panel().visible);
    }

    #[test]
    fn debug_key_toggles_session_and_panel() {
        let mut physics = world_with_player_at(0.0);
        let dir = FakeDirectory::default();
        let mut session = Session::new();
        let mut p = player(0);

        p.handle_key(KeyCode::KeyB, true, &mut physics, &mut session);
        assert!(session.debug_enabled());
        render(&mut p, &physics, &dir, &session);
        let panel = p.hud().debug_panel();
        assert!(panel.visible);
        assert!(panel.text.starts_with("Position: 1.50,0.00,-3.00\n"));
        assert!(panel.text.contains("  Name: Null\n"));

        p.handle_key(KeyCode::KeyB, false, &mut physics, &mut session);
        p.handle_key(KeyCode::KeyB, true, &mut physics, &mut session);
        render(&mut p, &physics, &dir, &session);
        assert!(!p.hud().debug_panel().visible);
    }

    #[test]
    fn flashlight_follows_eye() {
        let physics = world_with_player_at(0.0);
        let dir = FakeDirectory::default();
        let session = Session::new();
        let mut p = player(0);
        p.handle_mouse_motion(100.0, 0.0);
        render(&mut p, &physics, &dir, &session);
        assert_eq!(p.flashlight().position, DVec3::new(1.5, 1.0, -3.0));
        assert_eq!(p.flashlight().direction, p.camera().forward());
        assert_eq!(p.visual_rotation(), DQuat::IDENTITY);
    }

    #[test]
    fn missing_body_is_tolerated() {
        let mut physics = FakePhysics::default();
        let dir = FakeDirectory::default();
        let mut session = Session::new();
        let mut p = player(0);
        p.before_step(&mut physics);
        render(&mut p, &physics, &dir, &session);
        assert!(!p.grounded());
        p.handle_key(KeyCode::Space, true, &mut physics, &mut session);
        assert!(physics.impulses.is_empty());
    }

    #[test]
    fn config_defaults_fill_partial_yaml_shape() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.sprint_speed, 7.5);
        assert_eq!(cfg.walk_speed, 3.5);
        assert_eq!(cfg.jump_impulse, 15.0);
        assert_eq!(cfg.teleport_cooldown, 30);
        assert_eq!(cfg.spawn, DVec3::new(1.5, 1.5, -3.0));
    }
}
