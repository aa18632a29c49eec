use glam::DVec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashlightConfig {
    /// Full cone angle.
    pub angle_degrees: f64,
    pub exponent: f64,
    pub intensity: f64,
}

impl Default for FlashlightConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 45.0,
            exponent: 0.25,
            intensity: 0.5,
        }
    }
}

/// Spot light carried at the camera, pointing where the camera looks.
#[derive(Debug, Clone, PartialEq)]
pub struct Flashlight {
    pub position: DVec3,
    pub direction: DVec3,
    pub angle: f64,
    pub exponent: f64,
    pub intensity: f64,
}

impl Flashlight {
    pub fn new(config: &FlashlightConfig) -> Self {
        Self {
            position: DVec3::ZERO,
            direction: DVec3::Z,
            angle: config.angle_degrees.to_radians(),
            exponent: config.exponent,
            intensity: config.intensity,
        }
    }

    pub fn follow(&mut self, eye: DVec3, forward: DVec3) {
        self.position = eye;
        self.direction = forward;
    }
}
