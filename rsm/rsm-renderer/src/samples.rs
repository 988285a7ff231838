//! Importance-sampled disk offsets for the VPL gather, packed into a 1xP float texture.
//!
//! Each sample draws (xi1, xi2) uniformly and maps them to the polar point
//! `xi1 * (sin 2pi xi2, cos 2pi xi2)`. The density is therefore higher near the
//! centre of the disk; `xi1` travels with the sample so the gather can weight by
//! `xi1^2` to compensate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{RsmError, RsmResult};

pub const SAMPLE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

/// Stable 64-bit seed for a textual seed.
pub fn seed_from_str(seed: &str) -> u64 {
    fxhash::hash64(seed)
}

/// Exactly `count` samples; the same seed always gives the same set. ChaCha8 keeps the
/// stream fixed across rand releases.
pub fn generate_samples(count: usize, seed: &str) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed_from_str(seed));
    (0..count)
        .map(|_| {
            let xi1: f32 = rng.gen();
            let xi2: f32 = rng.gen();
            let angle = std::f32::consts::TAU * xi2;
            Sample {
                x: xi1 * angle.sin(),
                y: xi1 * angle.cos(),
                weight: xi1,
            }
        })
        .collect()
}

/// Smallest power of two >= `count` (1 for an empty set).
pub fn texture_size(count: usize) -> usize {
    count.max(1).next_power_of_two()
}

/// RGBA texels for the sample texture: (x, y, weight, 0), zero-filled past `samples.len()`.
pub fn pack_samples(samples: &[Sample]) -> Vec<[f32; 4]> {
    let size = texture_size(samples.len());
    assert!(samples.len() <= size);
    let mut texels = vec![[0.0f32; 4]; size];
    for (texel, s) in texels.iter_mut().zip(samples) {
        *texel = [s.x, s.y, s.weight, 0.0];
    }
    texels
}

/// GPU copy of a packed sample set. Immutable after creation.
pub struct SampleTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    count: u32,
    size: u32,
}

impl SampleTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, samples: &[Sample]) -> RsmResult<Self> {
        if samples.is_empty() {
            return Err(RsmError::resource("sample texture needs at least one sample"));
        }
        let texels = pack_samples(samples);
        let size = texels.len() as u32;
        if size > device.limits().max_texture_dimension_1d.min(device.limits().max_texture_dimension_2d) {
            return Err(RsmError::resource(format!("{size} samples exceed the texture size limit")));
        }
        let extent = wgpu::Extent3d { width: size, height: 1, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("rsm_samples"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SAMPLE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size * 16),
                rows_per_image: Some(1),
            },
            extent,
        );
        let view = texture.create_view(&Default::default());
        log::info!("sample texture: {} samples in {} texels", samples.len(), size);
        Ok(Self { texture, view, count: samples.len() as u32, size })
    }

    pub fn texture(&self) -> &wgpu::Texture { &self.texture }
    pub fn view(&self) -> &wgpu::TextureView { &self.view }
    /// Declared sample count (entries past it are padding).
    pub fn count(&self) -> u32 { self.count }
    pub fn size(&self) -> u32 { self.size }
}
