//! Shared render contracts for the RSM renderer.
//! Defines the scene/frame data the host hands to a backend (mesh assets, per-object
//! transforms, frame input, camera matrices) plus the backend traits, so demo hosts
//! never touch wgpu directly.

mod assets;
mod backend;
mod camera;
mod extract;
mod normals;

pub use assets::{load_mesh_source, parse_mesh_source, AssetError};
pub use backend::{RenderBackend, RenderBackendWindow};
pub use camera::CameraRig;
pub use extract::{CameraMatrices, FrameInput, MeshSource, SceneDescription, SceneObject, TransformParams};
pub use normals::compute_normals;
pub use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
