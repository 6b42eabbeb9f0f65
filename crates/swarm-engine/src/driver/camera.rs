use glam::{Mat4, Vec2, Vec3};

use crate::shader::{UniformLayout, Uniforms};

/// Perspective camera looking at a fixed point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,

    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 8.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60.0,
            near: 1.0,
            far: 20.0,
            aspect: 1.0,
        }
    }
}

impl Camera {
    /// Updates the aspect ratio; a zero-sized viewport keeps the previous one.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Inverse of the camera's look-at transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    /// Camera uniforms, limited to the names `layout` declares.
    ///
    /// Provides `uWorldMatrix`, `uViewMatrix`, `uProjectionMatrix` and
    /// `uCameraPosition`.
    pub fn uniforms(&self, world: Mat4, layout: &UniformLayout) -> Uniforms {
        let mut out = Uniforms::new();
        let all = Uniforms::new()
            .with("uWorldMatrix", world)
            .with("uViewMatrix", self.view_matrix())
            .with("uProjectionMatrix", self.projection_matrix())
            .with("uCameraPosition", self.position);
        for (name, value) in all.iter() {
            if layout.find(name).is_some() {
                out.set(name, value.clone());
            }
        }
        out
    }
}

/// Window pixel coordinates to `[-1, 1]` on both axes, +Y down.
pub fn pointer_ndc(x: f32, y: f32, width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(x / width as f32 * 2.0 - 1.0, y / height as f32 * 2.0 - 1.0)
}

/// Camera position that follows the pointer.
pub fn camera_position_for(ndc: Vec2) -> Vec3 {
    Vec3::new(ndc.x * 4.0, -ndc.y * 4.0 + 2.0, 8.0)
}

/// Point on the z = 0 plane under the pointer that the swarm chases.
pub fn chase_target_for(ndc: Vec2) -> Vec3 {
    Vec3::new(ndc.x * 4.0, -ndc.y * 4.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_maps_to_ndc() {
        assert_eq!(pointer_ndc(0.0, 0.0, 200, 100), Vec2::new(-1.0, -1.0));
        assert_eq!(pointer_ndc(100.0, 50.0, 200, 100), Vec2::ZERO);
        assert_eq!(pointer_ndc(200.0, 100.0, 200, 100), Vec2::new(1.0, 1.0));
        assert_eq!(pointer_ndc(10.0, 10.0, 0, 0), Vec2::ZERO);
    }

    #[test]
    fn centered_pointer_keeps_camera_raised() {
        assert_eq!(camera_position_for(Vec2::ZERO), Vec3::new(0.0, 2.0, 8.0));
        assert_eq!(camera_position_for(Vec2::new(1.0, -1.0)), Vec3::new(4.0, 6.0, 8.0));
        assert_eq!(chase_target_for(Vec2::new(-0.5, 0.5)), Vec3::new(-2.0, -2.0, 0.0));
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = Camera {
            position: Vec3::new(1.0, 2.0, 8.0),
            ..Camera::default()
        };
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.length() < 1e-5);

        let target = camera.view_matrix().transform_point3(camera.look_at);
        assert!(target.z < 0.0);
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport_size(1600, 800);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport_size(0, 800);
        assert_eq!(camera.aspect, 2.0);
    }
}
