//! RSM plugin: implements RenderBackend for the host.

use render_api::{CameraMatrices, FrameInput, RenderBackend, SceneDescription};
use rsm_renderer::{FrameOutput, Renderer, RsmConfig, RsmError, RsmResult, Scene};

/// Owns the renderer and the uploaded scene. Frames before `prepare` render an empty scene.
pub struct RsmPlugin {
    renderer: Renderer,
    scene: Scene,
}

impl RsmPlugin {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> RsmResult<Self> {
        Self::new_with_config(device, queue, RsmConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: RsmConfig) -> RsmResult<Self> {
        let renderer = Renderer::new_with_config(device, queue, config)?;
        Ok(Self { renderer, scene: Scene::new() })
    }

    pub fn device(&self) -> &wgpu::Device {
        self.renderer.device()
    }
    pub fn queue(&self) -> &wgpu::Queue {
        self.renderer.queue()
    }
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Render one frame and present it into `target_view` (swapchain or offscreen).
    pub fn render_frame_to_view(
        &mut self,
        camera: &CameraMatrices,
        input: &FrameInput,
        target_view: &wgpu::TextureView,
    ) -> RsmResult<()> {
        self.render_frame_impl(camera, input, Some(target_view))
    }

    fn render_frame_impl(
        &mut self,
        camera: &CameraMatrices,
        input: &FrameInput,
        target_view: Option<&wgpu::TextureView>,
    ) -> RsmResult<()> {
        let mut encoder = self.renderer.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("rsm_plugin_frame"),
        });
        self.renderer.encode_frame(&mut encoder, &self.scene, camera, input)?;
        if let Some(view) = target_view {
            self.renderer.encode_present_to(&mut encoder, view)?;
        }
        self.renderer.submit([encoder.finish()]);
        Ok(())
    }

    /// Encode a frame without submitting it.
    pub fn encode(&mut self, camera: &CameraMatrices, input: &FrameInput) -> RsmResult<FrameOutput> {
        self.renderer.render_frame(&self.scene, camera, input)
    }
}

impl RenderBackend for RsmPlugin {
    type Error = RsmError;

    fn prepare(&mut self, scene: &SceneDescription) -> RsmResult<()> {
        self.scene = Scene::upload(self.renderer.device(), self.renderer.queue(), scene)?;
        Ok(())
    }

    fn render_frame(&mut self, camera: &CameraMatrices, input: &FrameInput) -> RsmResult<()> {
        self.render_frame_impl(camera, input, None)
    }
}
