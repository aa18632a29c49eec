use bytemuck::{Pod, Zeroable};
use crimescene_kernel::Flashlight;
use crimescene_scene::AmbientLight;
use glam::{Mat4, Vec3};

/// Lighting inputs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLights {
    pub ambient: AmbientLight,
    /// `None` until the player exists.
    pub flashlight: Option<Flashlight>,
}

/// Per-frame uniform block shared by every pipeline. Every member is a
/// vec4 so the layout matches WGSL without padding rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz eye position.
    pub eye: [f32; 4],
    /// xyz sky direction, w intensity.
    pub ambient: [f32; 4],
    /// xyz position, w intensity.
    pub spot_position: [f32; 4],
    /// xyz direction, w falloff exponent.
    pub spot_direction: [f32; 4],
    /// x cosine of the half cone angle.
    pub spot_cone: [f32; 4],
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, eye: Vec3, lights: &FrameLights) -> Self {
        let sky = lights.ambient.direction.as_vec3().normalize_or(Vec3::Y);
        let (spot_position, spot_direction, spot_cone) = match &lights.flashlight {
            Some(f) => {
                let dir = f.direction.as_vec3().normalize_or(Vec3::Z);
                (
                    f.position.as_vec3().extend(f.intensity as f32),
                    dir.extend(f.exponent as f32),
                    [(f.angle as f32 / 2.0).cos(), 0.0, 0.0, 0.0],
                )
            }
            None => (
                glam::Vec4::ZERO,
                Vec3::Z.extend(1.0),
                [1.0, 0.0, 0.0, 0.0],
            ),
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            ambient: sky.extend(lights.ambient.intensity as f32).to_array(),
            spot_position: spot_position.to_array(),
            spot_direction: spot_direction.to_array(),
            spot_cone,
        }
    }
}

/// Indices of `centers` ordered farthest-from-`eye` first.
pub fn back_to_front(eye: Vec3, centers: &[Vec3]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..centers.len()).collect();
    order.sort_by(|&a, &b| {
        let da = centers[a].distance_squared(eye);
        let db = centers[b].distance_squared(eye);
        db.total_cmp(&da)
    });
    order
}

/// Line-list endpoints for a square grid of `half_extent` cells each side,
/// lying in the plane `y`.
pub fn grid_lines(half_extent: i32, spacing: f32, y: f32) -> Vec<[f32; 3]> {
    let extent = half_extent as f32 * spacing;
    let mut points = Vec::with_capacity((half_extent as usize * 2 + 1) * 4);
    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        points.push([-extent, y, offset]);
        points.push([extent, y, offset]);
        points.push([offset, y, -extent]);
        points.push([offset, y, extent]);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimescene_kernel::FlashlightConfig;
    use glam::DVec3;

    #[test]
    fn uniforms_carry_ambient_and_spot() {
        let mut torch = Flashlight::new(&FlashlightConfig::default());
        torch.follow(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 0.0, 2.0));
        let lights = FrameLights {
            ambient: AmbientLight::default(),
            flashlight: Some(torch),
        };
        let u = FrameUniforms::new(Mat4::IDENTITY, Vec3::new(1.0, 2.0, 3.0), &lights);

        assert_eq!(u.ambient, [0.0, 1.0, 0.0, 0.25]);
        assert_eq!(u.spot_position, [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(u.spot_direction, [0.0, 0.0, 1.0, 0.25]);
        let half = std::f32::consts::FRAC_PI_8.cos();
        assert!((u.spot_cone[0] - half).abs() < 1e-6);
    }

    #[test]
    fn no_flashlight_means_dark_spot() {
        let lights = FrameLights {
            ambient: AmbientLight::default(),
            flashlight: None,
        };
        let u = FrameUniforms::new(Mat4::IDENTITY, Vec3::ZERO, &lights);
        assert_eq!(u.spot_position[3], 0.0);
    }

    #[test]
    fn uniform_block_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }

    #[test]
    fn transparent_meshes_sort_far_to_near() {
        let eye = Vec3::ZERO;
        let centers = [
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 8.0),
            Vec3::new(4.0, 0.0, 0.0),
        ];
        assert_eq!(back_to_front(eye, &centers), vec![1, 2, 0]);
    }

    #[test]
    fn grid_has_two_lines_per_offset() {
        let lines = grid_lines(2, 1.0, -1.0);
        assert_eq!(lines.len(), 5 * 4);
        assert!(lines.iter().all(|p| p[1] == -1.0));
        assert_eq!(lines[0], [-2.0, -1.0, -2.0]);
    }
}
