//! Data types handed from the host to the render world.
//! Matrices are column-major 4x4 (WGSL/wgpu convention): index [col*4+row].

/// Raw mesh asset: triangle index triples and vertex positions, as read from disk.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct MeshSource {
    pub cells: Vec<[u32; 3]>,
    pub positions: Vec<[f32; 3]>,
}

impl MeshSource {
    /// Every cell must reference an existing position.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.positions.len();
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(&bad) = cell.iter().find(|&&v| v as usize >= n) {
                return Err(format!("cell {i} references vertex {bad}, mesh has {n} positions"));
            }
        }
        Ok(())
    }
}

/// Per-draw parameters: uniform scale, translation, Euler XYZ rotation (radians), flat color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParams {
    pub scale: f32,
    pub translate: [f32; 3],
    pub rotation: [f32; 3],
    pub color: [f32; 3],
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: [0.0; 3],
            rotation: [0.0; 3],
            color: [1.0; 3],
        }
    }
}

/// One drawn instance: index into `SceneDescription::meshes` plus its transform.
#[derive(Clone, Copy, Debug)]
pub struct SceneObject {
    pub mesh: usize,
    pub transform: TransformParams,
}

/// Static scene: meshes (with normals already computed) and the objects drawing them.
/// Objects are drawn in order every frame; a mesh may be drawn any number of times.
#[derive(Clone, Debug, Default)]
pub struct SceneDescription {
    /// (source, per-vertex normals). `normals.len()` must equal `source.positions.len()`.
    pub meshes: Vec<(MeshSource, Vec<[f32; 3]>)>,
    pub objects: Vec<SceneObject>,
}

/// Per-frame input from the display loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInput {
    pub tick: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl FrameInput {
    pub fn aspect(&self) -> f32 {
        if self.viewport_height > 0 {
            self.viewport_width as f32 / self.viewport_height as f32
        } else {
            1.0
        }
    }
}

/// Camera matrices for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    pub view: [f32; 16],
    pub projection: [f32; 16],
}

impl Default for CameraMatrices {
    fn default() -> Self {
        let identity = [
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ];
        Self { view: identity, projection: identity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_cell() {
        let source = MeshSource {
            cells: vec![[0, 1, 2], [1, 2, 3]],
            positions: vec![[0.0; 3]; 3],
        };
        let err = source.validate().unwrap_err();
        assert!(err.contains("vertex 3"), "{err}");
    }

    #[test]
    fn aspect_handles_zero_height() {
        let input = FrameInput { tick: 0, viewport_width: 640, viewport_height: 0 };
        assert_eq!(input.aspect(), 1.0);
    }
}
