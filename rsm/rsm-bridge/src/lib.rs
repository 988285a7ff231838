//! RSM bridge: implements render_api::RenderBackend using rsm-renderer.

mod plugin;
mod window_backend;

pub use plugin::RsmPlugin;
pub use rsm_renderer::{RsmConfig, RsmError};
pub use window_backend::RsmWindowBackend;
