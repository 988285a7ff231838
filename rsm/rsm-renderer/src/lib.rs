//! RSM renderer: reflective shadow maps with one-bounce indirect light on wgpu.
//! Scene writers fill the RSM buffer and G-buffer, two fullscreen resolvers light the
//! output target, and the present pass clamps it into the display format.

pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod light;
pub mod light_pass;
pub mod mesh;
pub mod present;
#[cfg(test)]
mod reference;
pub mod resources;
pub mod samples;
pub mod scene;
pub mod scene_pass;
pub mod transform;

use glam::Mat4;
use render_api::{CameraMatrices, FrameInput};

pub use config::{LightingToggles, RsmConfig};
pub use error::{RsmError, RsmResult};
pub use graph::{FrameGraph, FramePass, NodeId};
pub use light::DirectionalLight;
pub use light_pass::{LightPass, LightingUniform};
pub use mesh::{Mesh, MeshData, Vertex};
pub use present::PresentPass;
pub use resources::FrameResources;
pub use samples::{Sample, SampleTexture};
pub use scene::Scene;
pub use scene_pass::{render_mesh, MeshDraw, SceneWriter};
pub use transform::model_matrix;

/// One encoded frame, ready to submit.
pub struct FrameOutput {
    pub commands: wgpu::CommandBuffer,
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    /// Passes in the order they were encoded.
    pub passes: Vec<FramePass>,
}

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: RsmConfig,
    light: DirectionalLight,
    rsm_writer: SceneWriter,
    gbuffer_writer: SceneWriter,
    light_pass: LightPass,
    present_pass: PresentPass,
    samples: SampleTexture,
    frame_resources: Option<FrameResources>,
    schedule: Vec<FramePass>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> RsmResult<Self> {
        Self::new_with_config(device, queue, RsmConfig::default())
    }

    /// Build every pass and the sample texture. Fails when the configuration is invalid or
    /// the device cannot hold the float render targets.
    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: RsmConfig) -> RsmResult<Self> {
        config.validate()?;
        device::check_limits(&device.limits())?;
        device::check_rsm_resolution(&device.limits(), config.rsm_resolution)?;
        let samples = samples::generate_samples(config.num_samples as usize, &config.sample_seed);
        let samples = SampleTexture::new(&device, &queue, &samples)?;
        let rsm_writer = SceneWriter::rsm(&device)?;
        let gbuffer_writer = SceneWriter::gbuffer(&device)?;
        let light_pass = LightPass::new(&device, config.output_format, config.num_samples)?;
        let present_pass = PresentPass::new(&device, config.swapchain_format)?;
        let schedule = FrameGraph::standard(config.lighting).topological_order()?;
        log::info!(
            "RSM renderer ready: {} samples, {}x{} RSM, output {:?}",
            config.num_samples,
            config.rsm_resolution,
            config.rsm_resolution,
            config.output_format
        );
        Ok(Self {
            device,
            queue,
            light: DirectionalLight::from_config(&config),
            config,
            rsm_writer,
            gbuffer_writer,
            light_pass,
            present_pass,
            samples,
            frame_resources: None,
            schedule,
        })
    }

    pub fn device(&self) -> &wgpu::Device { &self.device }
    pub fn queue(&self) -> &wgpu::Queue { &self.queue }
    pub fn config(&self) -> &RsmConfig { &self.config }
    pub fn light(&self) -> &DirectionalLight { &self.light }
    pub fn samples(&self) -> &SampleTexture { &self.samples }
    pub fn schedule(&self) -> &[FramePass] { &self.schedule }
    pub fn frame_resources(&self) -> Option<&FrameResources> { self.frame_resources.as_ref() }

    /// Enable or disable the lighting resolvers. The pass order is rebuilt from the graph.
    pub fn set_lighting(&mut self, lighting: LightingToggles) -> RsmResult<()> {
        self.schedule = FrameGraph::standard(lighting).topological_order()?;
        self.config.lighting = lighting;
        log::debug!("frame schedule: {:?}", self.schedule);
        Ok(())
    }

    /// RSM at its fixed resolution; G-buffer and output at the viewport size.
    pub fn ensure_frame_resources(&mut self, width: u32, height: u32) -> RsmResult<()> {
        let (rsm_resolution, format) = (self.config.rsm_resolution, self.config.output_format);
        if let Some(frame) = self.frame_resources.as_mut() {
            return frame.resize(&self.device, rsm_resolution, width, height, format);
        }
        self.frame_resources = Some(FrameResources::new(&self.device, rsm_resolution, width, height, format)?);
        Ok(())
    }

    /// Encode one frame into `encoder`: resize, then every scheduled pass in order.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        camera: &CameraMatrices,
        input: &FrameInput,
    ) -> RsmResult<Vec<FramePass>> {
        self.ensure_frame_resources(input.viewport_width, input.viewport_height)?;
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or_else(|| RsmError::resource("frame resources missing after resize"))?;

        let light_view_proj = self.light.view_proj();
        let camera_view_proj = Mat4::from_cols_array(&camera.projection) * Mat4::from_cols_array(&camera.view);
        self.light_pass.update(&self.queue, &LightingUniform::new(&self.config, &light_view_proj, self.light.direction()))?;

        let draws = scene.draws();
        for pass in &self.schedule {
            match pass {
                FramePass::ClearOutput => light_pass::clear_output(encoder, frame),
                FramePass::Rsm => {
                    self.rsm_writer.encode(encoder, &self.device, &self.queue, frame, &draws, &light_view_proj)?
                }
                FramePass::GBuffer => {
                    self.gbuffer_writer.encode(encoder, &self.device, &self.queue, frame, &draws, &camera_view_proj)?
                }
                FramePass::DirectLighting => self.light_pass.encode_direct(encoder, &self.device, frame, &self.samples)?,
                FramePass::IndirectLighting => {
                    self.light_pass.encode_indirect(encoder, &self.device, frame, &self.samples)?
                }
            }
        }
        log::debug!(
            "frame {} encoded at {}x{}: {} objects, passes {:?}",
            input.tick,
            input.viewport_width,
            input.viewport_height,
            draws.len(),
            self.schedule
        );
        Ok(self.schedule.clone())
    }

    /// Present pass: lit output -> `output_view` (e.g. the swapchain), in the configured
    /// swapchain format. Call after `encode_frame` in the same encoder.
    pub fn encode_present_to(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
    ) -> RsmResult<()> {
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or_else(|| RsmError::resource("encode_present_to: no frame encoded yet"))?;
        self.present_pass.encode(encoder, &self.device, frame.output.view(), output_view);
        Ok(())
    }

    pub fn render_frame(&mut self, scene: &Scene, camera: &CameraMatrices, input: &FrameInput) -> RsmResult<FrameOutput> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("rsm_frame") });
        let passes = self.encode_frame(&mut encoder, scene, camera, input)?;
        Ok(FrameOutput {
            commands: encoder.finish(),
            tick: input.tick,
            width: input.viewport_width,
            height: input.viewport_height,
            passes,
        })
    }

    pub fn submit(&self, command_buffers: impl IntoIterator<Item = wgpu::CommandBuffer>) {
        self.queue.submit(command_buffers);
    }
}
