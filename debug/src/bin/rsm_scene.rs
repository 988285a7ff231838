//! Windowed demo: bunny and lucy between coloured walls, lit by one directional light with
//! one bounce of indirect light. Drag to orbit, scroll to zoom.
//!
//! Run: cargo run -p debug --bin rsm_scene -- [bunny.json] [lucy.json]
//! Set RSM_CONFIG=path/to/config.json to override renderer settings.

use std::path::PathBuf;

use anyhow::Context;
use debug::{demo_scene, OrbitCamera};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use render_api::{CameraRig, FrameInput, RenderBackend, RenderBackendWindow, SceneDescription};
use rsm_bridge::{RsmConfig, RsmError, RsmWindowBackend};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

const ORBIT_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.1;

struct App {
    config: RsmConfig,
    scene: SceneDescription,
    camera: OrbitCamera,
    window: Option<winit::window::Window>,
    backend: Option<Box<dyn RenderBackendWindow<Error = RsmError>>>,
    tick: u64,
    dragging: bool,
    cursor: Option<(f64, f64)>,
    /// First fatal error; the loop exits and `main` reports it.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RsmConfig, scene: SceneDescription) -> Self {
        Self {
            config,
            scene,
            camera: OrbitCamera::default(),
            window: None,
            backend: None,
            tick: 0,
            dragging: false,
            cursor: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let Some(window) = &self.window else { return Ok(()) };
        if self.backend.is_none() {
            let mut backend = RsmWindowBackend::from_window(window, self.config.clone())?;
            backend.prepare(&self.scene)?;
            self.backend = Some(backend);
        }
        let size = window.inner_size();
        let input = FrameInput { tick: self.tick, viewport_width: size.width, viewport_height: size.height };
        let raw_window = window.window_handle()?.as_raw();
        let raw_display = window.display_handle()?.as_raw();
        let Some(backend) = self.backend.as_mut() else { return Ok(()) };
        self.camera
            .with_camera(&input, |camera| backend.render_frame_to_window(camera, &input, raw_window, raw_display))?;
        self.tick += 1;
        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = winit::window::WindowAttributes::default()
            .with_title("RSM: one-bounce indirect lighting")
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("create window")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some((x, y))) = (self.dragging, self.cursor) {
                    let dx = (position.x - x) as f32;
                    let dy = (position.y - y) as f32;
                    self.camera.rotate(dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                }
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.camera.zoom(-lines * ZOOM_SPEED);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }
}

fn load_config() -> anyhow::Result<RsmConfig> {
    let Some(path) = std::env::var_os("RSM_CONFIG") else {
        return Ok(RsmConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("read config {}", path.to_string_lossy()))?;
    let config: RsmConfig = serde_json::from_str(&text).context("parse RSM_CONFIG")?;
    config.validate()?;
    log::info!("config loaded from {}", path.to_string_lossy());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let bunny_path = args.next().unwrap_or_else(|| PathBuf::from("bunny.json"));
    let lucy_path = args.next().unwrap_or_else(|| PathBuf::from("lucy.json"));
    let bunny = render_api::load_mesh_source(&bunny_path)?;
    let lucy = render_api::load_mesh_source(&lucy_path)?;
    let config = load_config()?;

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config, demo_scene(bunny, lucy));
    event_loop.run_app(&mut app)?;
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
