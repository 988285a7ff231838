//! CPU mirror of the resolver math in `lighting.wgsl`, evaluated for a single pixel.
//! Used to check shading laws without a GPU and to compare against readbacks.

use glam::{Mat4, Vec2, Vec3};

use crate::light_pass::LightingUniform;
use crate::samples::Sample;

/// Offsets of the 4-tap shadow filter, in RSM texels.
pub const PCF_TAPS: [Vec2; 4] = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)];

/// Light-space buffer contents as read by the resolvers.
#[derive(Clone, Debug)]
pub struct CpuRsm {
    resolution: u32,
    pub depth: Vec<f32>,
    pub normal: Vec<Vec3>,
    pub flux: Vec<Vec3>,
    pub world_pos: Vec<Vec3>,
}

impl CpuRsm {
    /// Every texel holds the same VPL.
    pub fn filled(resolution: u32, depth: f32, normal: Vec3, flux: Vec3, world_pos: Vec3) -> Self {
        let n = (resolution * resolution) as usize;
        Self {
            resolution,
            depth: vec![depth; n],
            normal: vec![normal; n],
            flux: vec![flux; n],
            world_pos: vec![world_pos; n],
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Nearest texel index for `uv`, clamped to the edge.
    pub fn texel(&self, uv: Vec2) -> usize {
        let res = self.resolution as f32;
        let t = (uv * res).floor().clamp(Vec2::ZERO, Vec2::splat(res - 1.0));
        t.y as usize * self.resolution as usize + t.x as usize
    }

    /// Center of texel `(x, y)` in uv space.
    pub fn texel_center(&self, x: u32, y: u32) -> Vec2 {
        (Vec2::new(x as f32, y as f32) + 0.5) / self.resolution as f32
    }
}

pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len2 = v.length_squared();
    if len2 <= 1e-20 {
        Vec3::ZERO
    } else {
        v / len2.sqrt()
    }
}

pub fn shadow_bias(cos_theta: f32, min_bias: f32, max_bias: f32) -> f32 {
    (max_bias * (1.0 - cos_theta)).max(min_bias)
}

/// World position to (u, v, depth) in the RSM.
pub fn light_space(light_view_proj: &Mat4, p: Vec3) -> Vec3 {
    let ndc = light_view_proj.project_point3(p);
    Vec3::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, ndc.z)
}

/// Inverse of [`light_space`]: the world point that lands on `uv` at `depth`.
pub fn unproject_light(light_view_proj: &Mat4, uv: Vec2, depth: f32) -> Vec3 {
    let ndc = Vec3::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, depth);
    light_view_proj.inverse().project_point3(ndc)
}

/// Map a stored `[0, 1]` depth to the `[-1, 1]` range the shadow biases are tuned for.
pub fn gl_depth(z: f32) -> f32 {
    z * 2.0 - 1.0
}

fn view_proj(lighting: &LightingUniform) -> Mat4 {
    Mat4::from_cols_array_2d(&lighting.light_view_proj)
}

/// Fraction of the 4 taps that see the light.
pub fn visibility(lighting: &LightingUniform, rsm: &CpuRsm, n: Vec3, p: Vec3) -> f32 {
    let cos_theta = n.dot(Vec3::from(lighting.light_dir));
    let bias = shadow_bias(cos_theta, lighting.min_bias, lighting.max_bias);
    let s = light_space(&view_proj(lighting), p);
    let lit: f32 = PCF_TAPS
        .iter()
        .map(|tap| {
            let stored = gl_depth(rsm.depth[rsm.texel(s.truncate() + *tap * lighting.texel_size)]);
            if stored >= gl_depth(s.z) - bias { 1.0 } else { 0.0 }
        })
        .sum();
    lit * 0.25
}

pub fn direct(lighting: &LightingUniform, rsm: &CpuRsm, n: Vec3, albedo: Vec3, p: Vec3) -> Vec3 {
    let cos_theta = n.dot(Vec3::from(lighting.light_dir));
    let ambient = lighting.ambient_amount * albedo;
    let diffuse = lighting.diffuse_amount * albedo * cos_theta.clamp(0.0, 1.0);
    ambient + diffuse * visibility(lighting, rsm, n, p)
}

/// One-bounce gather over the first `num_samples` entries of `samples`; missing entries
/// read as the zero padding of the sample texture.
pub fn indirect(lighting: &LightingUniform, rsm: &CpuRsm, samples: &[Sample], n: Vec3, p: Vec3) -> Vec3 {
    let tex_pos = light_space(&view_proj(lighting), p).truncate();
    let count = lighting.num_samples as usize;
    let zero = Sample { x: 0.0, y: 0.0, weight: 0.0 };
    let mut sum = Vec3::ZERO;
    for sample in samples.iter().copied().chain(std::iter::repeat(zero)).take(count) {
        let offset = Vec2::new(sample.x, sample.y);
        let i = rsm.texel(tex_pos + offset * lighting.sample_radius * lighting.texel_size);
        let (vpl_pos, vpl_normal) = (rsm.world_pos[i], rsm.normal[i]);
        let emitted = vpl_normal.dot(safe_normalize(p - vpl_pos)).max(0.0);
        let received = n.dot(safe_normalize(vpl_pos - p)).max(0.0);
        sum += rsm.flux[i] * (emitted * received) * (sample.weight * sample.weight) / count as f32;
    }
    (sum * lighting.indirect_amount).clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RsmConfig;
    use crate::light::DirectionalLight;

    fn overhead(num_samples: u32) -> (RsmConfig, LightingUniform) {
        let config = RsmConfig {
            num_samples,
            rsm_resolution: 64,
            light_direction: [0.0, 1.0, 0.0],
            light_ortho: [-2.0, 2.0, -2.0, 2.0, -10.0, 10.0],
            ..RsmConfig::default()
        };
        let uniform = LightingUniform::from_light(&config, &DirectionalLight::from_config(&config));
        (config, uniform)
    }

    /// The RSM of a large floor at y = 0 seen by the overhead light.
    fn floor_rsm(lighting: &LightingUniform, albedo: Vec3) -> CpuRsm {
        let vp = view_proj(lighting);
        let depth = light_space(&vp, Vec3::ZERO).z;
        let mut rsm = CpuRsm::filled(lighting.rsm_resolution, depth, Vec3::Y, albedo, Vec3::ZERO);
        for y in 0..rsm.resolution() {
            for x in 0..rsm.resolution() {
                let uv = rsm.texel_center(x, y);
                let i = rsm.texel(uv);
                rsm.world_pos[i] = unproject_light(&vp, uv, depth);
            }
        }
        rsm
    }

    #[test]
    fn unoccluded_fragment_is_fully_visible() {
        let (_, lighting) = overhead(4);
        // Cleared RSM: everything reads as far away.
        let rsm = CpuRsm::filled(64, 1.0, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(visibility(&lighting, &rsm, Vec3::Y, Vec3::new(0.3, 0.0, -0.2)), 1.0);
    }

    #[test]
    fn occluded_fragment_is_dark() {
        let (_, lighting) = overhead(4);
        let p = Vec3::new(0.1, 0.0, 0.1);
        let z = light_space(&view_proj(&lighting), p).z;
        let rsm = CpuRsm::filled(64, z - lighting.max_bias - 0.01, Vec3::Y, Vec3::ONE, Vec3::Y);
        // Grazing normal gives the largest bias; still occluded.
        assert_eq!(visibility(&lighting, &rsm, Vec3::X, p), 0.0);
    }

    #[test]
    fn default_biases_catch_occluder_within_a_world_unit() {
        let config = RsmConfig::default();
        let lighting = LightingUniform::from_light(&config, &DirectionalLight::from_config(&config));
        let vp = view_proj(&lighting);
        let toward_light = Vec3::from(config.light_direction).normalize();
        // Receiver at the origin facing the light, so the bias is the minimum.
        let visibility_with_gap = |gap: f32| {
            let occluder = toward_light * gap;
            let rsm = CpuRsm::filled(64, light_space(&vp, occluder).z, toward_light, Vec3::ONE, occluder);
            visibility(&lighting, &rsm, toward_light, Vec3::ZERO)
        };
        assert_eq!(visibility_with_gap(0.6), 0.0);
        assert_eq!(visibility_with_gap(0.3), 1.0);
    }

    #[test]
    fn lit_floor_gets_ambient_plus_diffuse_and_no_bounce() {
        let (_, lighting) = overhead(4);
        let albedo = Vec3::splat(0.5);
        let rsm = floor_rsm(&lighting, albedo);
        let samples = crate::samples::generate_samples(4, "myseed");
        let p = Vec3::new(0.25, 0.0, -0.5);

        let d = direct(&lighting, &rsm, Vec3::Y, albedo, p);
        let expected = lighting.ambient_amount * 0.5 + lighting.diffuse_amount * 0.5;
        assert!((d - Vec3::splat(expected)).abs().max_element() < 1e-5, "{d:?}");

        let ind = indirect(&lighting, &rsm, &samples, Vec3::Y, p);
        assert!(ind.max_element() < 1e-5, "{ind:?}");
    }

    #[test]
    fn facing_vpl_bounces_weighted_flux() {
        let (_, lighting) = overhead(4);
        let rsm = CpuRsm::filled(64, 1.0, Vec3::Z, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -5.0));
        let samples = [
            Sample { x: 0.1, y: 0.0, weight: 0.5 },
            Sample { x: 0.0, y: 0.2, weight: 1.0 },
        ];
        // Two of four samples are padding.
        let ind = indirect(&lighting, &rsm, &samples, Vec3::NEG_Z, Vec3::ZERO);
        let expected = (0.25 + 1.0) / 4.0 * lighting.indirect_amount;
        assert!((ind.x - expected).abs() < 1e-5, "{ind:?}");
        assert_eq!(ind.y, 0.0);
    }

    #[test]
    fn coincident_vpl_contributes_nothing() {
        let (_, lighting) = overhead(1);
        let p = Vec3::new(0.5, 0.0, 0.5);
        let rsm = CpuRsm::filled(64, 1.0, Vec3::Y, Vec3::ONE, p);
        let samples = [Sample { x: 0.0, y: 0.0, weight: 1.0 }];
        let ind = indirect(&lighting, &rsm, &samples, Vec3::Y, p);
        assert!(!ind.is_nan());
        assert_eq!(ind, Vec3::ZERO);
    }

    #[test]
    fn bias_grows_toward_grazing() {
        assert_eq!(shadow_bias(1.0, 0.005, 0.03), 0.005);
        assert!((shadow_bias(0.0, 0.005, 0.03) - 0.03).abs() < 1e-7);
        assert!((shadow_bias(-1.0, 0.005, 0.03) - 0.06).abs() < 1e-7);
    }

    #[test]
    fn texel_fetch_clamps_to_edge() {
        let rsm = CpuRsm::filled(4, 1.0, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(rsm.texel(Vec2::new(-0.5, -3.0)), 0);
        assert_eq!(rsm.texel(Vec2::new(1.5, 1.0)), 15);
        assert_eq!(rsm.texel(Vec2::new(0.3, 0.6)), 2 * 4 + 1);
    }
}
