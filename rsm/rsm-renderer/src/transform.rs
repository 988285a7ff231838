//! Model and normal matrices for per-draw transform parameters.

use glam::{Mat4, Quat, Vec3, Vec4Swizzles};
use render_api::TransformParams;

/// Rotation for Euler angles applied as successive local rotations about X, then Y, then Z.
pub fn rotation_quat(rotation: [f32; 3]) -> Quat {
    Quat::from_rotation_x(rotation[0]) * Quat::from_rotation_y(rotation[1]) * Quat::from_rotation_z(rotation[2])
}

/// `T * R * S` for the given parameters (uniform scale).
pub fn model_matrix(params: &TransformParams) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(params.scale),
        rotation_quat(params.rotation),
        Vec3::from(params.translate),
    )
}

/// Inverse-transpose of the model matrix. Keeps normals perpendicular to surfaces under
/// non-uniform scale.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model.inverse().transpose()
}

/// Same computation as the scene vertex shader: transform as a direction, then renormalize.
/// A zero-length result stays zero.
pub fn transform_normal(normal_matrix: &Mat4, normal: Vec3) -> Vec3 {
    (*normal_matrix * normal.extend(0.0)).xyz().normalize_or_zero()
}
