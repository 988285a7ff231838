//! Shared pieces of the demo programs: the orbit camera and the reference scene.

use glam::{Mat4, Vec3};
use render_api::{CameraMatrices, CameraRig, FrameInput, MeshSource, SceneDescription, SceneObject, TransformParams};

/// Orbit camera around a fixed center. `theta` is the azimuth in the XZ plane, `phi` the
/// elevation; both in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub center: Vec3,
    pub distance: f32,
    pub theta: f32,
    pub phi: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            distance: 140.0,
            theta: 0.17,
            phi: 0.7,
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.01,
            far: 1000.0,
        }
    }
}

const MAX_PHI: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let (sin_p, cos_p) = self.phi.sin_cos();
        self.center + self.distance * Vec3::new(cos_t * cos_p, sin_p, sin_t * cos_p)
    }

    /// Drag in radians. Elevation stops just short of the poles.
    pub fn rotate(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi = (self.phi + d_phi).clamp(-MAX_PHI, MAX_PHI);
    }

    /// Scale the distance by `exp(amount)`, so zoom steps feel even at any range.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * amount.exp()).clamp(self.near * 10.0, self.far * 0.5);
    }
}

impl CameraRig for OrbitCamera {
    fn matrices(&self, input: &FrameInput) -> CameraMatrices {
        let view = Mat4::look_at_rh(self.eye(), self.center, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fov_y, input.aspect(), self.near, self.far);
        CameraMatrices { view: view.to_cols_array(), projection: projection.to_cols_array() }
    }
}

/// The built-in plane as an asset source with its explicit normals.
pub fn plane_source() -> (MeshSource, Vec<[f32; 3]>) {
    let plane = rsm_renderer::mesh::plane();
    (MeshSource { cells: plane.indices, positions: plane.positions }, plane.normals)
}

/// Bunny and lucy on a white floor between a red and a blue wall.
pub fn demo_scene(bunny: MeshSource, lucy: MeshSource) -> SceneDescription {
    let grey = [0.6; 3];
    let with_normals = |source: MeshSource| {
        let normals = render_api::compute_normals(&source.cells, &source.positions);
        (source, normals)
    };
    let meshes = vec![with_normals(bunny), with_normals(lucy), plane_source()];
    let (bunny, lucy, plane) = (0, 1, 2);
    let (ax, az) = (25.0, 25.0);
    let objects = vec![
        SceneObject {
            mesh: bunny,
            transform: TransformParams { scale: 2.0, translate: [0.0, 8.0, 30.0], rotation: [0.0, 0.8, 0.0], color: grey },
        },
        SceneObject {
            mesh: lucy,
            transform: TransformParams { scale: 1.0, translate: [30.0, 0.0, 0.0], rotation: [0.0; 3], color: grey },
        },
        SceneObject {
            mesh: plane,
            transform: TransformParams { scale: 50.0, translate: [ax, 0.0, az], rotation: [0.0; 3], color: [1.0; 3] },
        },
        SceneObject {
            mesh: plane,
            transform: TransformParams {
                scale: 50.0,
                translate: [ax, 50.0, -50.0 + az],
                rotation: [1.57, 0.0, 0.0],
                color: [1.0, 0.0, 0.0],
            },
        },
        SceneObject {
            mesh: plane,
            transform: TransformParams {
                scale: 50.0,
                translate: [-50.0 + ax, 50.0, az],
                rotation: [0.0, 0.0, 1.57],
                color: [0.0, 0.0, 1.0],
            },
        },
    ];
    SceneDescription { meshes, objects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> MeshSource {
        MeshSource {
            cells: vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    #[test]
    fn default_eye_sits_at_distance() {
        let camera = OrbitCamera::default();
        assert!((camera.eye().length() - 140.0).abs() < 1e-3);
        assert!(camera.eye().y > 0.0);
    }

    #[test]
    fn rotate_clamps_elevation() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.5, 10.0);
        assert_eq!(camera.phi, MAX_PHI);
        assert!((camera.theta - 0.67).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_multiplicative() {
        let mut camera = OrbitCamera::default();
        camera.zoom(std::f32::consts::LN_2);
        assert!((camera.distance - 280.0).abs() < 1e-2);
    }

    #[test]
    fn matrices_follow_viewport_aspect() {
        let camera = OrbitCamera::default();
        let wide = camera.matrices(&FrameInput { tick: 0, viewport_width: 200, viewport_height: 100 });
        let square = camera.matrices(&FrameInput { tick: 0, viewport_width: 100, viewport_height: 100 });
        assert_eq!(wide.view, square.view);
        assert!((square.projection[0] / wide.projection[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn with_camera_hands_matrices_to_the_draw() {
        let mut camera = OrbitCamera::default();
        let input = FrameInput { tick: 3, viewport_width: 64, viewport_height: 32 };
        let expected = camera.matrices(&input);
        let seen = camera.with_camera(&input, |m| *m);
        assert_eq!(seen, expected);
    }

    #[test]
    fn demo_scene_layout() {
        let scene = demo_scene(tetra(), tetra());
        assert_eq!(scene.meshes.len(), 3);
        assert_eq!(scene.objects.len(), 5);
        for (source, normals) in &scene.meshes {
            assert_eq!(source.positions.len(), normals.len());
        }
        assert_eq!(scene.objects[3].transform.color, [1.0, 0.0, 0.0]);
        assert!(scene.objects.iter().all(|o| o.mesh < scene.meshes.len()));
    }
}
