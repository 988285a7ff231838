//! Renderer configuration: sample set, RSM resolution, light and lighting amounts.
//! Defaults reproduce the reference scene; any subset can be overridden from JSON.

use crate::error::{RsmError, RsmResult};

/// Which lighting resolvers run. Disabling one leaves the other's contribution alone in
/// the output target, which is how the additive composition is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct LightingToggles {
    pub direct: bool,
    pub indirect: bool,
}

impl Default for LightingToggles {
    fn default() -> Self {
        Self { direct: true, indirect: true }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct RsmConfig {
    /// Number of VPL samples gathered per pixel.
    pub num_samples: u32,
    /// Square resolution of the RSM buffer.
    pub rsm_resolution: u32,
    pub sample_seed: String,
    pub ambient_light_amount: f32,
    pub diffuse_light_amount: f32,
    pub indirect_light_amount: f32,
    /// Radius of the sampling disk, in RSM texels. Scene dependent.
    pub sample_radius: f32,
    pub min_bias: f32,
    pub max_bias: f32,
    pub light_direction: [f32; 3],
    /// Light orthographic bounds: left, right, bottom, top, near, far.
    pub light_ortho: [f32; 6],
    pub lighting: LightingToggles,
    /// Format of the lit output target (must be blendable).
    #[serde(skip)]
    pub output_format: wgpu::TextureFormat,
    /// Format the present pass writes (e.g. the swapchain's).
    #[serde(skip)]
    pub swapchain_format: wgpu::TextureFormat,
}

impl Default for RsmConfig {
    fn default() -> Self {
        Self {
            num_samples: 64,
            rsm_resolution: 1024,
            sample_seed: "myseed".to_string(),
            ambient_light_amount: 0.3,
            diffuse_light_amount: 0.7,
            indirect_light_amount: 3.0,
            sample_radius: 300.0,
            min_bias: 0.005,
            max_bias: 0.03,
            light_direction: [0.23, 0.79, 0.55],
            light_ortho: [-60.0, 90.0, -80.0, 90.0, -130.0, 30.0],
            lighting: LightingToggles::default(),
            output_format: wgpu::TextureFormat::Rgba16Float,
            swapchain_format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

impl RsmConfig {
    pub fn validate(&self) -> RsmResult<()> {
        if self.num_samples == 0 {
            return Err(RsmError::Config("num_samples must be > 0".into()));
        }
        if self.rsm_resolution == 0 {
            return Err(RsmError::Config("rsm_resolution must be > 0".into()));
        }
        if !(self.min_bias >= 0.0 && self.min_bias <= self.max_bias) {
            return Err(RsmError::Config(format!(
                "bias range [{}, {}] is not ordered",
                self.min_bias, self.max_bias
            )));
        }
        let [l, r, b, t, n, f] = self.light_ortho;
        if l == r || b == t || n == f {
            return Err(RsmError::Config(format!("degenerate light projection {:?}", self.light_ortho)));
        }
        if self.light_direction.iter().all(|c| *c == 0.0) {
            return Err(RsmError::Config("light_direction must be non-zero".into()));
        }
        Ok(())
    }

    pub fn texel_size(&self) -> f32 {
        1.0 / self.rsm_resolution as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RsmConfig::default();
        config.validate().unwrap();
        assert_eq!(config.num_samples, 64);
        assert_eq!(config.texel_size(), 1.0 / 1024.0);
    }

    #[test]
    fn rejects_zero_samples() {
        let config = RsmConfig { num_samples: 0, ..RsmConfig::default() };
        assert!(matches!(config.validate(), Err(RsmError::Config(_))));
    }

    #[test]
    fn rejects_inverted_bias() {
        let config = RsmConfig { min_bias: 0.1, max_bias: 0.01, ..RsmConfig::default() };
        assert!(config.validate().is_err());
    }
}
