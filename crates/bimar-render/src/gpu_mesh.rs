//! GPU buffers for scene geometry, cached by geometry id.

use std::collections::HashMap;

use bimar_core::{Geometry, GeometryId};
use wgpu::util::DeviceExt;

/// Frames a cached mesh may go unused before its buffers are released.
pub const EVICT_AFTER_FRAMES: u64 = 120;

/// Interleaved vertex layout of `shaders/scene.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Uploaded vertex and index buffers of one geometry.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    last_used: u64,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, geometry: &Geometry, frame: u64) -> Self {
        let vertices: Vec<MeshVertex> = geometry
            .positions()
            .iter()
            .zip(geometry.normals())
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh indices"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices().len() as u32,
            last_used: frame,
        }
    }
}

/// Geometry buffers keyed by [`GeometryId`].
///
/// Geometry is immutable once shared, so an id uploads once. Entries not drawn for
/// [`EVICT_AFTER_FRAMES`] frames are dropped, which releases the buffers of removed
/// annotations and unloaded models.
#[derive(Default)]
pub struct GpuMeshCache {
    meshes: HashMap<GeometryId, GpuMesh>,
}

impl GpuMeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `geometry` if needed and marks it used in `frame`.
    pub fn prepare(&mut self, device: &wgpu::Device, geometry: &Geometry, frame: u64) {
        self.meshes
            .entry(geometry.id())
            .and_modify(|mesh| mesh.last_used = frame)
            .or_insert_with(|| {
                log::debug!(
                    "uploading geometry {:?} ({} triangles)",
                    geometry.id(),
                    geometry.num_triangles()
                );
                GpuMesh::upload(device, geometry, frame)
            });
    }

    pub fn get(&self, id: GeometryId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    /// Drops meshes unused since `frame - EVICT_AFTER_FRAMES`.
    pub fn evict_stale(&mut self, frame: u64) {
        let before = self.meshes.len();
        self.meshes
            .retain(|_, mesh| frame.saturating_sub(mesh.last_used) <= EVICT_AFTER_FRAMES);
        let evicted = before - self.meshes.len();
        if evicted > 0 {
            log::debug!("evicted {evicted} stale GPU meshes");
        }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
