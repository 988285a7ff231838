//! Uploaded scene: the mesh registry plus the ordered list of objects drawn each frame.

use render_api::{SceneDescription, TransformParams};

use crate::error::{RsmError, RsmResult};
use crate::mesh::{Mesh, MeshData};
use crate::scene_pass::MeshDraw;

struct Object {
    mesh: usize,
    transform: TransformParams,
}

#[derive(Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    objects: Vec<Object>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload every mesh of the description and record its objects. Fails on the first
    /// invalid mesh or dangling mesh reference.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, desc: &SceneDescription) -> RsmResult<Self> {
        let mut scene = Self::new();
        for (source, normals) in &desc.meshes {
            let data = MeshData::from_source(source, normals.clone())?;
            scene.add_mesh(Mesh::upload(device, queue, &data)?);
        }
        for object in &desc.objects {
            scene.add_object(object.mesh, object.transform)?;
        }
        log::info!("scene uploaded: {} meshes, {} objects", scene.meshes.len(), scene.objects.len());
        Ok(scene)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_object(&mut self, mesh: usize, transform: TransformParams) -> RsmResult<()> {
        if mesh >= self.meshes.len() {
            return Err(RsmError::Mesh(format!("object references mesh {mesh}, scene has {}", self.meshes.len())));
        }
        self.objects.push(Object { mesh, transform });
        Ok(())
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Draw list for one frame, in object order.
    pub fn draws(&self) -> Vec<MeshDraw<'_>> {
        self.objects
            .iter()
            .map(|o| MeshDraw { mesh: &self.meshes[o.mesh], params: o.transform })
            .collect()
    }
}
