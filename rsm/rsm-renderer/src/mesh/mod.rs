//! Geometry registry: validated CPU mesh data and its uploaded GPU buffers.

use crate::error::{RsmError, RsmResult};

/// Interleaved vertex as consumed by the scene writers (stride 24).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
            wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
        ],
    };
}

/// Triangle list with one normal per position.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub indices: Vec<[u32; 3]>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl MeshData {
    pub fn new(indices: Vec<[u32; 3]>, positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>) -> RsmResult<Self> {
        let data = Self { indices, positions, normals };
        data.validate()?;
        Ok(data)
    }

    /// From an asset source plus normals computed for it.
    pub fn from_source(source: &render_api::MeshSource, normals: Vec<[f32; 3]>) -> RsmResult<Self> {
        Self::new(source.cells.clone(), source.positions.clone(), normals)
    }

    pub fn validate(&self) -> RsmResult<()> {
        if self.indices.is_empty() {
            return Err(RsmError::Mesh("mesh has no triangles".into()));
        }
        if self.normals.len() != self.positions.len() {
            return Err(RsmError::Mesh(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            )));
        }
        let n = self.positions.len();
        if let Some(bad) = self.indices.iter().flatten().find(|&&i| i as usize >= n) {
            return Err(RsmError::Mesh(format!("index {bad} out of range for {n} vertices")));
        }
        Ok(())
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect()
    }
}

/// Unit plane in XZ spanning [-1, 1], with separate up- and down-facing sheets so it is
/// visible from both sides with back-face culling on.
pub fn plane() -> MeshData {
    let corners = [[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [-1.0, 0.0, 1.0], [1.0, 0.0, 1.0]];
    let mut positions = corners.to_vec();
    positions.extend_from_slice(&corners);
    let mut normals = vec![[0.0, 1.0, 0.0]; 4];
    normals.extend_from_slice(&[[0.0, -1.0, 0.0]; 4]);
    MeshData {
        indices: vec![[3, 1, 0], [0, 2, 3], [4, 5, 7], [7, 6, 4]],
        positions,
        normals,
    }
}

/// Uploaded mesh. Immutable; drawn any number of times with per-draw transforms.
pub struct Mesh {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
    vertex_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, data: &MeshData) -> RsmResult<Self> {
        data.validate()?;
        let vertices = data.vertices();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);
        let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rsm_mesh_vertex"),
            size: vertex_bytes.len() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buf, 0, vertex_bytes);
        let index_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rsm_mesh_index"),
            size: index_bytes.len() as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buf, 0, index_bytes);
        Ok(Self {
            vertex_buf,
            index_buf,
            index_count: (data.indices.len() * 3) as u32,
            vertex_count: vertices.len() as u32,
        })
    }

    pub fn vertex_buf(&self) -> &wgpu::Buffer { &self.vertex_buf }
    pub fn index_buf(&self) -> &wgpu::Buffer { &self.index_buf }
    pub fn index_count(&self) -> u32 { self.index_count }
    pub fn vertex_count(&self) -> u32 { self.vertex_count }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_is_valid_and_double_sided() {
        let plane = plane();
        plane.validate().unwrap();
        assert_eq!(plane.positions.len(), 8);
        assert_eq!(plane.normals[0], [0.0, 1.0, 0.0]);
        assert_eq!(plane.normals[7], [0.0, -1.0, 0.0]);
    }

    #[test]
    fn normal_count_must_match_positions() {
        let err = MeshData::new(vec![[0, 1, 2]], vec![[0.0; 3]; 3], vec![[0.0; 3]; 2]).unwrap_err();
        assert!(matches!(err, RsmError::Mesh(_)));
    }

    #[test]
    fn indices_must_reference_vertices() {
        let err = MeshData::new(vec![[0, 1, 3]], vec![[0.0; 3]; 3], vec![[0.0; 3]; 3]).unwrap_err();
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn vertices_interleave_position_and_normal() {
        let data = plane();
        let vertices = data.vertices();
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(vertices[5], Vertex { position: [1.0, 0.0, -1.0], normal: [0.0, -1.0, 0.0] });
    }
}
