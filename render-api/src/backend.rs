//! Trait for render backends. Host uses this to call prepare/render_frame uniformly.

use crate::{CameraMatrices, FrameInput, SceneDescription};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// Render backend the host drives once per display refresh.
pub trait RenderBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Upload the scene's meshes to the GPU. Called once, before the frame loop.
    fn prepare(&mut self, scene: &SceneDescription) -> Result<(), Self::Error>;

    /// Render one frame offscreen and submit it.
    fn render_frame(&mut self, camera: &CameraMatrices, input: &FrameInput) -> Result<(), Self::Error>;
}

/// Extension for backends that can present to a window. Host passes raw handles (e.g. from winit);
/// the backend owns the surface and performs get_current_texture + present internally.
pub trait RenderBackendWindow: RenderBackend {
    /// Render one frame and present it. The surface is configured from the input's viewport size.
    fn render_frame_to_window(
        &mut self,
        camera: &CameraMatrices,
        input: &FrameInput,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> Result<(), Self::Error>;
}
