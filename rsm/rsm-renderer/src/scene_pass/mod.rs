//! Scene writers: rasterize every object into the RSM buffer (light matrices) or the
//! G-buffer (camera matrices). Same vertex stage; the fragment stage picks the target layout.

use glam::Mat4;
use render_api::TransformParams;
use wgpu::CommandEncoder;

use crate::error::RsmResult;
use crate::mesh::{Mesh, Vertex};
use crate::resources::{formats, FrameResources};
use crate::transform::{model_matrix, normal_matrix};

const SCENE_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/scene.wgsl"));

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ObjectUniform {
    pub fn from_params(params: &TransformParams) -> Self {
        let model = model_matrix(params);
        let [r, g, b] = params.color;
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix(&model).to_cols_array_2d(),
            color: [r, g, b, 1.0],
        }
    }
}

/// One object to draw this frame.
#[derive(Clone, Copy)]
pub struct MeshDraw<'a> {
    pub mesh: &'a Mesh,
    pub params: TransformParams,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneTarget {
    Rsm,
    GBuffer,
}

impl SceneTarget {
    fn label(self) -> &'static str {
        match self {
            SceneTarget::Rsm => "rsm_pass",
            SceneTarget::GBuffer => "gbuffer_pass",
        }
    }

    fn entry_point(self) -> &'static str {
        match self {
            SceneTarget::Rsm => "fs_rsm",
            SceneTarget::GBuffer => "fs_gbuffer",
        }
    }

    fn color_formats(self) -> &'static [wgpu::TextureFormat] {
        match self {
            SceneTarget::Rsm => &[formats::LINEAR_DEPTH, formats::GEOMETRY, formats::GEOMETRY, formats::GEOMETRY],
            SceneTarget::GBuffer => &[formats::GEOMETRY, formats::GEOMETRY, formats::GEOMETRY],
        }
    }
}

pub struct SceneWriter {
    target: SceneTarget,
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    view_proj_buf: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
}

fn uniform_entry(binding: u32, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: std::num::NonZeroU64::new(size),
        },
        count: None,
    }
}

impl SceneWriter {
    /// `drawRsm`: light-space writer into the 4 RSM targets.
    pub fn rsm(device: &wgpu::Device) -> RsmResult<Self> {
        Self::new(device, SceneTarget::Rsm)
    }

    /// `drawGbuffer`: camera-space writer into the 3 G-buffer targets.
    pub fn gbuffer(device: &wgpu::Device) -> RsmResult<Self> {
        Self::new(device, SceneTarget::GBuffer)
    }

    pub fn new(device: &wgpu::Device, target: SceneTarget) -> RsmResult<Self> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_frame_layout"),
            entries: &[uniform_entry(0, std::mem::size_of::<FrameUniform>() as u64)],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_object_layout"),
            entries: &[uniform_entry(0, std::mem::size_of::<ObjectUniform>() as u64)],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let targets: Vec<Option<wgpu::ColorTargetState>> =
            target.color_formats().iter().map(|&format| Some(format.into())).collect();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(target.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(target.entry_point()),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: formats::DEPTH,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let view_proj_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_view_proj"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: view_proj_buf.as_entire_binding() }],
        });
        Ok(Self { target, pipeline, object_layout, view_proj_buf, frame_bind_group })
    }

    pub fn target(&self) -> SceneTarget {
        self.target
    }

    /// Clear the writer's buffer (colour and depth) and draw every object into it.
    pub fn encode(
        &self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &FrameResources,
        draws: &[MeshDraw<'_>],
        view_proj: &Mat4,
    ) -> RsmResult<()> {
        let uniform = FrameUniform { view_proj: view_proj.to_cols_array_2d() };
        queue.write_buffer(&self.view_proj_buf, 0, bytemuck::bytes_of(&uniform));

        let (color_views, depth_view, width, height): (Vec<&wgpu::TextureView>, _, _, _) = match self.target {
            SceneTarget::Rsm => (
                frame.rsm.color_views().to_vec(),
                frame.rsm.depth_view(),
                frame.rsm.resolution(),
                frame.rsm.resolution(),
            ),
            SceneTarget::GBuffer => (
                frame.gbuffer.color_views().to_vec(),
                frame.gbuffer.depth_view(),
                frame.gbuffer.width(),
                frame.gbuffer.height(),
            ),
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_views
            .iter()
            .enumerate()
            .map(|(i, view)| {
                // Empty light-space texels read as far away, i.e. unoccluded.
                let clear = if self.target == SceneTarget::Rsm && i == 0 {
                    wgpu::Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
                } else {
                    wgpu::Color::TRANSPARENT
                };
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(clear), store: wgpu::StoreOp::Store },
                })
            })
            .collect();
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.target.label()),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_pipeline(&self.pipeline);
        rp.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        rp.set_bind_group(0, &self.frame_bind_group, &[]);
        for draw in draws {
            render_mesh(&mut rp, self, device, queue, draw.mesh, &draw.params);
        }
        drop(rp);
        Ok(())
    }
}

/// Draw one mesh with its transform into an open scene pass. The writer's pipeline and
/// frame bind group must already be set on `rp`.
pub fn render_mesh(
    rp: &mut wgpu::RenderPass<'_>,
    writer: &SceneWriter,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mesh: &Mesh,
    params: &TransformParams,
) {
    let object_buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scene_object"),
        size: std::mem::size_of::<ObjectUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    queue.write_buffer(&object_buf, 0, bytemuck::bytes_of(&ObjectUniform::from_params(params)));
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_object_bind_group"),
        layout: &writer.object_layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: object_buf.as_entire_binding() }],
    });
    rp.set_bind_group(1, &bind_group, &[]);
    rp.set_vertex_buffer(0, mesh.vertex_buf().slice(..));
    rp.set_index_buffer(mesh.index_buf().slice(..), wgpu::IndexFormat::Uint32);
    rp.draw_indexed(0..mesh.index_count(), 0, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_uniform_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 64);
    }

    #[test]
    fn object_uniform_carries_color_and_matrices() {
        let params = TransformParams { scale: 2.0, translate: [1.0, 2.0, 3.0], rotation: [0.0; 3], color: [0.6, 0.5, 0.4] };
        let u = ObjectUniform::from_params(&params);
        assert_eq!(u.color, [0.6, 0.5, 0.4, 1.0]);
        assert_eq!(u.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.model[0][0], 2.0);
        assert!((u.normal_matrix[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn target_layouts() {
        assert_eq!(SceneTarget::Rsm.color_formats().len(), 4);
        assert_eq!(SceneTarget::Rsm.color_formats()[0], formats::LINEAR_DEPTH);
        assert_eq!(SceneTarget::GBuffer.color_formats().len(), 3);
    }
}
