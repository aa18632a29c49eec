use glam::{DVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Camera tuning, loadable from the scene config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position relative to the body origin.
    pub eye_offset: DVec3,
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Pixels of mouse travel per radian of rotation.
    pub angular_sensibility: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye_offset: DVec3::new(0.0, 1.0, 0.0),
            fov_degrees: 60.0,
            near: 0.4,
            far: 1000.0,
            angular_sensibility: 4000.0,
        }
    }
}

/// Mouse-look camera riding on the player body.
///
/// Yaw 0 and pitch 0 look down `+Z`. Positive pitch looks up.
#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    pub yaw: f64,
    pub pitch: f64,
    pub aspect: f64,
    config: CameraConfig,
}

const PITCH_LIMIT_DEGREES: f64 = 89.0;

impl FirstPersonCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            aspect: 16.0 / 9.0,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn forward(&self) -> DVec3 {
        DVec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Horizontal right vector; independent of pitch.
    pub fn right(&self) -> DVec3 {
        DVec3::new(-self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Apply a mouse delta in pixels.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let sensitivity = 1.0 / self.config.angular_sensibility;
        self.yaw -= dx * sensitivity;
        self.pitch -= dy * sensitivity;
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    /// World-space eye position for a body at `body_position`.
    pub fn eye_position(&self, body_position: DVec3) -> DVec3 {
        body_position + self.config.eye_offset
    }

    pub fn view_matrix(&self, eye: DVec3) -> Mat4 {
        let eye = eye.as_vec3();
        Mat4::look_at_rh(eye, eye + self.forward().as_vec3(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_degrees.to_radians() as f32,
            self.aspect as f32,
            self.config.near as f32,
            self.config.far as f32,
        )
    }

    pub fn view_projection(&self, eye: DVec3) -> Mat4 {
        self.projection_matrix() * self.view_matrix(eye)
    }
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-12;

    #[test]
    fn default_looks_down_positive_z() {
        let cam = FirstPersonCamera::default();
        assert!((cam.forward() - DVec3::Z).length() < EPS);
        assert!((cam.right() - DVec3::NEG_X).length() < EPS);
    }

    #[test]
    fn right_is_forward_cross_up() {
        let mut cam = FirstPersonCamera::default();
        cam.yaw = 0.8;
        let expected = cam.forward().cross(DVec3::Y).normalize();
        assert!((cam.right() - expected).length() < EPS);
    }

    #[test]
    fn right_ignores_pitch() {
        let mut cam = FirstPersonCamera::default();
        cam.yaw = 1.1;
        let flat = cam.right();
        cam.pitch = 0.7;
        assert!((cam.right() - flat).length() < EPS);
        assert_eq!(cam.right().y, 0.0);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut cam = FirstPersonCamera::default();
        let right_before = cam.right();
        cam.rotate(4000.0 * FRAC_PI_2, 0.0);
        assert!((cam.forward() - right_before).length() < 1e-9);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FirstPersonCamera::default();
        cam.rotate(0.0, -1.0e7);
        assert!((cam.pitch - 89f64.to_radians()).abs() < EPS);
        cam.rotate(0.0, 1.0e7);
        assert!((cam.pitch + 89f64.to_radians()).abs() < EPS);
    }

    #[test]
    fn eye_is_offset_from_body() {
        let cam = FirstPersonCamera::default();
        let eye = cam.eye_position(DVec3::new(1.5, 0.0, -3.0));
        assert_eq!(eye, DVec3::new(1.5, 1.0, -3.0));
        let vp = cam.view_projection(eye);
        assert!(!vp.col(0).x.is_nan());
    }
}
