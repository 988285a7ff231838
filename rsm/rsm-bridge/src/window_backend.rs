//! Window-capable backend: created from a window, implements RenderBackendWindow.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use render_api::{CameraMatrices, FrameInput, RenderBackend, RenderBackendWindow, SceneDescription};
use rsm_renderer::present::preferred_surface_format;
use rsm_renderer::{RsmConfig, RsmError, RsmResult};
use wgpu::SurfaceTargetUnsafe;

use crate::plugin::RsmPlugin;

/// Backend that owns the wgpu instance and an [`RsmPlugin`]; presents to a window.
/// The surface is recreated every frame from the raw handles, configured to the frame's
/// viewport size, so resizes need no extra bookkeeping.
pub struct RsmWindowBackend {
    instance: wgpu::Instance,
    plugin: RsmPlugin,
}

impl RsmWindowBackend {
    /// Create a backend for `window`. The window only provides handles for adapter
    /// selection here; the host must keep it alive and pass its handles every frame.
    pub fn from_window(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        config: RsmConfig,
    ) -> RsmResult<Box<dyn RenderBackendWindow<Error = RsmError>>> {
        let (raw_window, raw_display) = {
            let wh = window.window_handle().map_err(RsmError::surface)?;
            let dh = window.display_handle().map_err(RsmError::surface)?;
            (wh.as_raw(), dh.as_raw())
        };
        let backend = pollster::block_on(Self::from_raw_handles_async(raw_window, raw_display, config))?;
        Ok(Box::new(backend))
    }

    fn create_surface(
        instance: &wgpu::Instance,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> RsmResult<wgpu::Surface<'static>> {
        let target = SurfaceTargetUnsafe::RawHandle { raw_window_handle, raw_display_handle };
        // Safety: the host keeps the window alive while its handles are in use.
        unsafe { instance.create_surface_unsafe(target) }.map_err(RsmError::surface)
    }

    async fn from_raw_handles_async(
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
        config: RsmConfig,
    ) -> RsmResult<Self> {
        let instance = wgpu::Instance::default();
        let surface = Self::create_surface(&instance, raw_window_handle, raw_display_handle)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RsmError::device("no adapter compatible with the window surface"))?;
        let (device, queue) = rsm_renderer::device::request_device(&adapter).await?;
        let caps = surface.get_capabilities(&adapter);
        let format = preferred_surface_format(&caps.formats)
            .ok_or_else(|| RsmError::surface("surface reports no formats"))?;
        log::info!("window surface format {format:?}");
        let config = RsmConfig { swapchain_format: format, ..config };
        let plugin = RsmPlugin::new_with_config(device, queue, config)?;
        drop(surface);
        Ok(Self { instance, plugin })
    }

    fn surface_config(format: wgpu::TextureFormat, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }
}

impl RenderBackend for RsmWindowBackend {
    type Error = RsmError;

    fn prepare(&mut self, scene: &SceneDescription) -> RsmResult<()> {
        self.plugin.prepare(scene)
    }

    fn render_frame(&mut self, camera: &CameraMatrices, input: &FrameInput) -> RsmResult<()> {
        self.plugin.render_frame(camera, input)
    }
}

impl RenderBackendWindow for RsmWindowBackend {
    fn render_frame_to_window(
        &mut self,
        camera: &CameraMatrices,
        input: &FrameInput,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> RsmResult<()> {
        if input.viewport_width == 0 || input.viewport_height == 0 {
            log::debug!("skipping frame {}: window is minimized", input.tick);
            return Ok(());
        }
        let surface = Self::create_surface(&self.instance, raw_window_handle, raw_display_handle)?;
        let config = Self::surface_config(
            self.plugin.renderer().config().swapchain_format,
            input.viewport_width,
            input.viewport_height,
        );
        surface.configure(self.plugin.device(), &config);

        let frame = match surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                log::warn!("surface outdated or lost, reconfiguring");
                surface.configure(self.plugin.device(), &config);
                surface.get_current_texture().map_err(RsmError::surface)?
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, dropping frame {}", input.tick);
                return Ok(());
            }
            Err(e) => return Err(RsmError::surface(e)),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.plugin.render_frame_to_view(camera, input, &view)?;
        frame.present();
        Ok(())
    }
}
