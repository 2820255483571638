//! Mesh data and procedural hull generation.

use crate::vertex::Vertex;
use glam::Vec3;
use wgpu::util::DeviceExt;

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Flat-shaded unit ship hull: a dart pointing along +X (the facing
    /// convention for rotation 0), with a raised spine. Scaled per instance
    /// by each ship's bounding radius.
    pub fn ship(device: &wgpu::Device) -> Self {
        let nose = Vec3::new(1.2, 0.0, 0.0);
        let wing_l = Vec3::new(-0.9, 0.8, 0.0);
        let wing_r = Vec3::new(-0.9, -0.8, 0.0);
        let tail = Vec3::new(-0.6, 0.0, 0.0);
        let spine = Vec3::new(-0.2, 0.0, 0.35);
        let keel = Vec3::new(-0.2, 0.0, -0.22);

        let triangles = [
            // Upper surface
            [nose, wing_l, spine],
            [nose, spine, wing_r],
            [spine, wing_l, tail],
            [spine, tail, wing_r],
            // Lower surface
            [nose, keel, wing_l],
            [nose, wing_r, keel],
            [keel, tail, wing_l],
            [keel, wing_r, tail],
        ];
        Self::from_flat_triangles(device, &triangles)
    }

    /// Build a mesh from triangles with flat per-face normals. Vertices are
    /// duplicated per face so the shading stays faceted.
    fn from_flat_triangles(device: &wgpu::Device, triangles: &[[Vec3; 3]]) -> Self {
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        let mut indices = Vec::with_capacity(triangles.len() * 3);
        for tri in triangles {
            let normal = (tri[1] - tri[0])
                .cross(tri[2] - tri[0])
                .normalize_or_zero();
            for p in tri {
                indices.push(vertices.len() as u32);
                vertices.push(Vertex::new(p.to_array(), normal.to_array()));
            }
        }
        Self::new(device, &vertices, &indices)
    }
}
