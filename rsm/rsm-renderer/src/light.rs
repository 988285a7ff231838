//! The single directional light: look-at from its direction toward the origin plus a
//! fixed orthographic projection.

use glam::{Mat4, Vec3};

use crate::config::RsmConfig;

#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    /// Configured direction, unnormalized. Both the look-at eye and the shading vector.
    direction: Vec3,
    /// left, right, bottom, top, near, far
    ortho: [f32; 6],
}

impl DirectionalLight {
    pub fn new(direction: [f32; 3], ortho: [f32; 6]) -> Self {
        Self { direction: Vec3::from(direction), ortho }
    }

    pub fn from_config(config: &RsmConfig) -> Self {
        Self::new(config.light_direction, config.light_ortho)
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn view(&self) -> Mat4 {
        // A light straight along +Y makes +Y a degenerate up vector.
        let up = if self.direction.cross(Vec3::Y).length_squared() < 1e-8 { Vec3::Z } else { Vec3::Y };
        Mat4::look_at_rh(self.direction, Vec3::ZERO, up)
    }

    pub fn projection(&self) -> Mat4 {
        let [left, right, bottom, top, near, far] = self.ortho;
        Mat4::orthographic_rh(left, right, bottom, top, near, far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_light_has_finite_view() {
        let light = DirectionalLight::new([0.0, 1.0, 0.0], [-1.0, 1.0, -1.0, 1.0, -10.0, 10.0]);
        assert!(light.view().is_finite());
        assert_eq!(light.direction(), Vec3::Y);
        // The origin sits one unit in front of the eye.
        let origin = light.view().transform_point3(Vec3::ZERO);
        assert!((origin.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn default_light_projects_scene_into_clip_volume() {
        let light = DirectionalLight::from_config(&RsmConfig::default());
        let vp = light.view_proj();
        for p in [Vec3::ZERO, Vec3::new(25.0, 0.0, 25.0), Vec3::new(30.0, 10.0, 0.0)] {
            let clip = vp.project_point3(p);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{p:?} -> {clip:?}");
            assert!((0.0..=1.0).contains(&clip.z), "{p:?} -> {clip:?}");
        }
    }

    #[test]
    fn shading_direction_keeps_configured_length() {
        let config = RsmConfig::default();
        let light = DirectionalLight::from_config(&config);
        assert_eq!(light.direction(), Vec3::from(config.light_direction));
        assert!((light.direction().length() - 0.9897).abs() < 1e-4);
    }
}
