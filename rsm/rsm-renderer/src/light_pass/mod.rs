//! Light pass: two fullscreen resolvers over the G-buffer and RSM buffer.
//! `fs_direct` writes ambient + shadowed diffuse; `fs_indirect` adds the one-bounce gather
//! with One/One blending, so the output ends up as the sum of both.

use glam::Mat4;
use wgpu::CommandEncoder;

use crate::config::RsmConfig;
use crate::error::{RsmError, RsmResult};
use crate::light::DirectionalLight;
use crate::resources::FrameResources;
use crate::samples::SampleTexture;

const LIGHTING_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/lighting.wgsl"));

/// Mirror of `Lighting` in lighting.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub light_view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub ambient_amount: f32,
    pub diffuse_amount: f32,
    pub indirect_amount: f32,
    pub sample_radius: f32,
    pub texel_size: f32,
    pub min_bias: f32,
    pub max_bias: f32,
    pub num_samples: u32,
    pub rsm_resolution: u32,
}

impl LightingUniform {
    pub fn new(config: &RsmConfig, light_view_proj: &Mat4, light_dir: glam::Vec3) -> Self {
        Self {
            light_view_proj: light_view_proj.to_cols_array_2d(),
            light_dir: light_dir.to_array(),
            ambient_amount: config.ambient_light_amount,
            diffuse_amount: config.diffuse_light_amount,
            indirect_amount: config.indirect_light_amount,
            sample_radius: config.sample_radius,
            texel_size: config.texel_size(),
            min_bias: config.min_bias,
            max_bias: config.max_bias,
            num_samples: config.num_samples,
            rsm_resolution: config.rsm_resolution,
        }
    }

    pub fn from_light(config: &RsmConfig, light: &DirectionalLight) -> Self {
        Self::new(config, &light.view_proj(), light.direction())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolver {
    Direct,
    Indirect,
}

pub struct LightPass {
    direct_pipeline: wgpu::RenderPipeline,
    indirect_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buf: wgpu::Buffer,
    num_samples: u32,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn additive() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: add, alpha: add }
}

impl LightPass {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, num_samples: u32) -> RsmResult<Self> {
        if num_samples == 0 {
            return Err(RsmError::Config("light pass needs at least one sample".into()));
        }
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lighting_shader"),
            source: wgpu::ShaderSource::Wgsl(LIGHTING_SHADER.into()),
        });
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: std::num::NonZeroU64::new(std::mem::size_of::<LightingUniform>() as u64),
            },
            count: None,
        }];
        entries.extend((1..=8).map(texture_entry));
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light_pass_bind_group_layout"),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("light_pass_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let make_pipeline = |label: &str, entry_point: &str, blend: Option<wgpu::BlendState>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: output_format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let direct_pipeline = make_pipeline("direct_light_pipeline", "fs_direct", None);
        let indirect_pipeline = make_pipeline("indirect_light_pipeline", "fs_indirect", Some(additive()));
        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lighting_uniform"),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Self { direct_pipeline, indirect_pipeline, bind_group_layout, uniform_buf, num_samples })
    }

    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    /// Upload the lighting parameters for this frame. Both resolvers read the same values.
    pub fn update(&self, queue: &wgpu::Queue, uniform: &LightingUniform) -> RsmResult<()> {
        if uniform.num_samples != self.num_samples {
            return Err(RsmError::Config(format!(
                "lighting uniform has {} samples, pass was built for {}",
                uniform.num_samples, self.num_samples
            )));
        }
        queue.write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(uniform));
        Ok(())
    }

    fn bind_group(
        &self,
        device: &wgpu::Device,
        frame: &FrameResources,
        samples: &SampleTexture,
    ) -> wgpu::BindGroup {
        let views = [
            frame.gbuffer.normal_view(),
            frame.gbuffer.albedo_view(),
            frame.gbuffer.world_pos_view(),
            frame.rsm.shadow_map(),
            frame.rsm.normal_view(),
            frame.rsm.flux_view(),
            frame.rsm.world_pos_view(),
            samples.view(),
        ];
        let mut entries = vec![wgpu::BindGroupEntry { binding: 0, resource: self.uniform_buf.as_entire_binding() }];
        entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(view),
        }));
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light_pass_bind_group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    /// Ambient plus shadowed diffuse, written over whatever the output holds.
    pub fn encode_direct(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        frame: &FrameResources,
        samples: &SampleTexture,
    ) -> RsmResult<()> {
        self.encode(encoder, device, frame, samples, Resolver::Direct)
    }

    /// One-bounce gather over the sample set, added to the output.
    pub fn encode_indirect(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        frame: &FrameResources,
        samples: &SampleTexture,
    ) -> RsmResult<()> {
        if samples.count() < self.num_samples {
            return Err(RsmError::Resource(format!(
                "sample texture holds {} samples, gather needs {}",
                samples.count(),
                self.num_samples
            )));
        }
        self.encode(encoder, device, frame, samples, Resolver::Indirect)
    }

    fn encode(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        frame: &FrameResources,
        samples: &SampleTexture,
        resolver: Resolver,
    ) -> RsmResult<()> {
        let bind_group = self.bind_group(device, frame, samples);
        let (label, pipeline) = match resolver {
            Resolver::Direct => ("direct_light_pass", &self.direct_pipeline),
            Resolver::Indirect => ("indirect_light_pass", &self.indirect_pipeline),
        };
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: frame.output.view(),
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_pipeline(pipeline);
        rp.set_bind_group(0, &bind_group, &[]);
        rp.draw(0..3, 0..1);
        Ok(())
    }
}

/// Clear the output target to black. Runs before either resolver each frame.
pub fn clear_output(encoder: &mut CommandEncoder, frame: &FrameResources) {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear_output"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: frame.output.view(),
            resolve_target: None,
            ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::BLACK), store: wgpu::StoreOp::Store },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<LightingUniform>(), 112);
    }

    #[test]
    fn uniform_takes_config_amounts() {
        let config = RsmConfig { num_samples: 4, ..RsmConfig::default() };
        let light = DirectionalLight::from_config(&config);
        let u = LightingUniform::from_light(&config, &light);
        assert_eq!(u.num_samples, 4);
        assert_eq!(u.rsm_resolution, 1024);
        assert_eq!(u.ambient_amount, 0.3);
        assert_eq!(u.indirect_amount, 3.0);
        assert_eq!(u.texel_size, 1.0 / 1024.0);
        assert_eq!(u.light_dir, config.light_direction);
    }
}
