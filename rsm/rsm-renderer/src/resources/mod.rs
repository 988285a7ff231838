//! Frame resources: RSM buffer (4 RTs + depth), G-buffer (3 RTs + depth) and the lit output target.
//! Attachments are reached by name; nothing downstream indexes them by position.

use wgpu::TextureView;

use crate::error::{RsmError, RsmResult};

pub mod formats {
    use wgpu::TextureFormat;
    /// Light-space depth (clip z/w), read back as the shadow map.
    pub const LINEAR_DEPTH: TextureFormat = TextureFormat::R32Float;
    /// Normals, flux/albedo and world positions.
    pub const GEOMETRY: TextureFormat = TextureFormat::Rgba32Float;
    pub const DEPTH: TextureFormat = TextureFormat::Depth32Float;
}

/// Bytes per sample written by the widest MRT pass (the RSM pass: R32Float + 3 x Rgba32Float).
pub const MAX_COLOR_BYTES_PER_SAMPLE: u32 = 4 + 3 * 16;
pub const RSM_TARGET_COUNT: u32 = 4;
pub const GBUFFER_TARGET_COUNT: u32 = 3;

struct Target {
    texture: wgpu::Texture,
    view: TextureView,
}

fn make_target(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    extra_usage: wgpu::TextureUsages,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | extra_usage,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    Target { texture, view }
}

fn check_size(device: &wgpu::Device, what: &str, width: u32, height: u32) -> RsmResult<()> {
    if width == 0 || height == 0 {
        return Err(RsmError::resource(format!("{what}: width and height must be > 0")));
    }
    let max = device.limits().max_texture_dimension_2d;
    if width > max || height > max {
        return Err(RsmError::resource(format!("{what}: {width}x{height} exceeds the {max} texture limit")));
    }
    Ok(())
}

/// Light-space buffer. Every texel is a VPL: position, normal and flux, plus its depth.
pub struct RsmBuffer {
    linear_depth: Target,
    normal: Target,
    flux: Target,
    world_pos: Target,
    depth: Target,
    resolution: u32,
}

impl RsmBuffer {
    pub fn new(device: &wgpu::Device, resolution: u32) -> RsmResult<Self> {
        check_size(device, "RsmBuffer", resolution, resolution)?;
        let geometry = |label| make_target(device, label, resolution, resolution, formats::GEOMETRY, wgpu::TextureUsages::empty());
        Ok(Self {
            linear_depth: make_target(device, "rsm_linear_depth", resolution, resolution, formats::LINEAR_DEPTH, wgpu::TextureUsages::empty()),
            normal: geometry("rsm_normal"),
            flux: geometry("rsm_flux"),
            world_pos: geometry("rsm_world_pos"),
            depth: make_target(device, "rsm_depth", resolution, resolution, formats::DEPTH, wgpu::TextureUsages::empty()),
            resolution,
        })
    }

    pub fn resolution(&self) -> u32 { self.resolution }
    pub fn linear_depth_view(&self) -> &TextureView { &self.linear_depth.view }
    /// The linear-depth target in its role as the direct pass's shadow map.
    pub fn shadow_map(&self) -> &TextureView { &self.linear_depth.view }
    pub fn normal_view(&self) -> &TextureView { &self.normal.view }
    pub fn flux_view(&self) -> &TextureView { &self.flux.view }
    pub fn world_pos_view(&self) -> &TextureView { &self.world_pos.view }
    pub fn depth_view(&self) -> &TextureView { &self.depth.view }

    /// Colour attachments in shader output order (location 0..3).
    pub fn color_views(&self) -> [&TextureView; RSM_TARGET_COUNT as usize] {
        [self.linear_depth_view(), self.normal_view(), self.flux_view(), self.world_pos_view()]
    }
}

/// Camera-space buffer for the deferred resolve.
pub struct GBuffer {
    normal: Target,
    albedo: Target,
    world_pos: Target,
    depth: Target,
    width: u32,
    height: u32,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> RsmResult<Self> {
        check_size(device, "GBuffer", width, height)?;
        let geometry = |label| make_target(device, label, width, height, formats::GEOMETRY, wgpu::TextureUsages::empty());
        Ok(Self {
            normal: geometry("gbuffer_normal"),
            albedo: geometry("gbuffer_albedo"),
            world_pos: geometry("gbuffer_world_pos"),
            depth: make_target(device, "gbuffer_depth", width, height, formats::DEPTH, wgpu::TextureUsages::empty()),
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn normal_view(&self) -> &TextureView { &self.normal.view }
    pub fn albedo_view(&self) -> &TextureView { &self.albedo.view }
    pub fn world_pos_view(&self) -> &TextureView { &self.world_pos.view }
    pub fn depth_view(&self) -> &TextureView { &self.depth.view }

    pub fn color_views(&self) -> [&TextureView; GBUFFER_TARGET_COUNT as usize] {
        [self.normal_view(), self.albedo_view(), self.world_pos_view()]
    }
}

/// Lit colour: direct light written first, indirect blended on top.
pub struct OutputTarget {
    target: Target,
    width: u32,
    height: u32,
}

impl OutputTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> RsmResult<Self> {
        check_size(device, "OutputTarget", width, height)?;
        Ok(Self {
            target: make_target(device, "lit_output", width, height, format, wgpu::TextureUsages::COPY_SRC),
            width,
            height,
        })
    }

    pub fn texture(&self) -> &wgpu::Texture { &self.target.texture }
    pub fn view(&self) -> &TextureView { &self.target.view }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
}

pub struct FrameResources {
    pub rsm: RsmBuffer,
    pub gbuffer: GBuffer,
    pub output: OutputTarget,
}

impl FrameResources {
    pub fn new(
        device: &wgpu::Device,
        rsm_resolution: u32,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> RsmResult<Self> {
        log::info!("allocating RSM buffer {rsm_resolution}x{rsm_resolution}, G-buffer {width}x{height}");
        Ok(Self {
            rsm: RsmBuffer::new(device, rsm_resolution)?,
            gbuffer: GBuffer::new(device, width, height)?,
            output: OutputTarget::new(device, width, height, output_format)?,
        })
    }

    /// Reallocate only the targets whose size changed. Formats and attachment counts never
    /// change. Replacements are built before any is swapped in, so on error every current
    /// target stays in place.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        rsm_resolution: u32,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> RsmResult<()> {
        let rsm = if self.rsm.resolution() != rsm_resolution {
            Some(RsmBuffer::new(device, rsm_resolution)?)
        } else {
            None
        };
        let viewport = if self.width() != width || self.height() != height {
            Some((GBuffer::new(device, width, height)?, OutputTarget::new(device, width, height, output_format)?))
        } else {
            None
        };
        if let Some(rsm) = rsm {
            log::info!("reallocated RSM buffer {rsm_resolution}x{rsm_resolution}");
            self.rsm = rsm;
        }
        if let Some((gbuffer, output)) = viewport {
            log::info!("reallocated G-buffer {width}x{height}");
            self.gbuffer = gbuffer;
            self.output = output;
        }
        Ok(())
    }

    pub fn width(&self) -> u32 { self.gbuffer.width() }
    pub fn height(&self) -> u32 { self.gbuffer.height() }
}
