//! Headless smoke test: device, renderer and one frame of a lit floor, no window.
//! Run: cargo run -p debug --bin minimal_wgpu

use anyhow::Context;
use debug::{plane_source, OrbitCamera};
use render_api::{CameraRig, FrameInput, RenderBackend, SceneDescription, SceneObject, TransformParams};
use rsm_bridge::RsmPlugin;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (adapter, device, queue) =
        pollster::block_on(rsm_renderer::device::request_headless()).context("no GPU device for the RSM renderer")?;
    log::info!("adapter: {:?}", adapter.get_info());

    let mut plugin = RsmPlugin::new(device, queue)?;
    let scene = SceneDescription {
        meshes: vec![plane_source()],
        objects: vec![SceneObject {
            mesh: 0,
            transform: TransformParams { scale: 50.0, ..TransformParams::default() },
        }],
    };
    plugin.prepare(&scene)?;

    let mut camera = OrbitCamera::default();
    let input = FrameInput { tick: 0, viewport_width: 256, viewport_height: 256 };
    let frame = camera.with_camera(&input, |matrices| plugin.encode(matrices, &input))?;
    log::info!("encoded {}x{} frame: {:?}", frame.width, frame.height, frame.passes);
    plugin.renderer().submit([frame.commands]);
    plugin.device().poll(wgpu::Maintain::Wait);
    println!("RSM minimal_wgpu: OK");
    Ok(())
}
