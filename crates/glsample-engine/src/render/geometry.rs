//! Vertex formats, procedural meshes and the GPU-side [`GeometryObject`].

use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{RenderCtx, Tracked};

/// Implemented by vertex structs that can be bound at slot 0.
pub trait VertexLayout: Pod {
    fn layout() -> wgpu::VertexBufferLayout<'static>;
}

// ── vertex formats ────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl ColorVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];
}

impl VertexLayout for ColorVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
}

impl VertexLayout for MeshVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Position-only vertex (shadow volumes, depth-only passes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
}

impl VertexLayout for PositionVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── CPU meshes ────────────────────────────────────────────────────────────

/// Indexed triangle list on the CPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> MeshData<V> {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl MeshData<MeshVertex> {
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices
            .iter()
            .map(|v| Vec3::from_array(v.position))
            .collect()
    }
}

pub fn triangle() -> MeshData<ColorVertex> {
    MeshData {
        vertices: vec![
            ColorVertex { position: [-0.5, -0.5], color: [1.0, 0.0, 0.0] },
            ColorVertex { position: [0.5, -0.5], color: [0.0, 1.0, 0.0] },
            ColorVertex { position: [0.0, 0.5], color: [0.0, 0.0, 1.0] },
        ],
        indices: vec![0, 1, 2],
    }
}

/// Axis-aligned cube centered at the origin: 4 vertices per face, CCW outward.
pub fn cube(half_extent: f32) -> MeshData<MeshVertex> {
    // (normal, u, v) with u x v == normal
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(24),
        indices: Vec::with_capacity(36),
    };

    for (n, u, v) in FACES {
        let (n, u, v) = (Vec3::from(n), Vec3::from(u), Vec3::from(v));
        let base = mesh.vertices.len() as u32;
        for (s, t) in CORNERS {
            let p = (n + u * s + v * t) * half_extent;
            mesh.vertices.push(MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: [(s + 1.0) * 0.5, 1.0 - (t + 1.0) * 0.5],
            });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}

/// Horizontal quad at height `y`, facing +Y.
pub fn plane(half_extent: f32, y: f32) -> MeshData<MeshVertex> {
    let h = half_extent;
    let corner = |x: f32, z: f32, u: f32, v: f32| MeshVertex {
        position: [x, y, z],
        normal: [0.0, 1.0, 0.0],
        uv: [u, v],
    };
    MeshData {
        vertices: vec![
            corner(-h, h, 0.0, 1.0),
            corner(h, h, 1.0, 1.0),
            corner(h, -h, 1.0, 0.0),
            corner(-h, -h, 0.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Loads an STL model, rescaled to fit the `[-1, 1]` cube.
///
/// STL has no texture coordinates; UVs are a planar XZ projection.
pub fn load_stl(path: &Path) -> Result<MeshData<MeshVertex>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open model {}", path.display()))?;
    let mut reader = std::io::BufReader::new(file);
    let stl = stl_io::read_stl(&mut reader)
        .with_context(|| format!("failed to parse STL {}", path.display()))?;

    let positions: Vec<Vec3> = stl
        .vertices
        .iter()
        .map(|v| {
            let p: [f32; 3] = (*v).into();
            Vec3::from(p)
        })
        .collect();
    anyhow::ensure!(
        !stl.faces.is_empty(),
        "model {} contains no triangles",
        path.display()
    );

    let mut faces = Vec::with_capacity(stl.faces.len());
    for face in &stl.faces {
        for &i in &face.vertices {
            anyhow::ensure!(
                i < positions.len(),
                "model {} references vertex {i} out of range",
                path.display()
            );
        }
        faces.push(face.vertices.map(|i| positions[i]));
    }

    Ok(mesh_from_triangles(&faces))
}

/// Flat-shaded mesh from raw triangles, centered and rescaled to `[-1, 1]`.
pub fn mesh_from_triangles(triangles: &[[Vec3; 3]]) -> MeshData<MeshVertex> {
    let (min, max) = triangles
        .iter()
        .flatten()
        .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
    let center = (min + max) * 0.5;
    let size = (max - min).max_element();
    let scale = if size > 0.0 { 2.0 / size } else { 1.0 };
    let extent = (max - min).max(Vec3::splat(f32::EPSILON));

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(triangles.len() * 3),
        indices: Vec::with_capacity(triangles.len() * 3),
    };

    for tri in triangles {
        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
        for p in tri {
            let uv = (*p - min) / extent;
            mesh.indices.push(mesh.vertices.len() as u32);
            mesh.vertices.push(MeshVertex {
                position: ((*p - center) * scale).to_array(),
                normal: normal.to_array(),
                uv: [uv.x, uv.z],
            });
        }
    }

    mesh
}

// ── GPU geometry ──────────────────────────────────────────────────────────

/// Vertex buffer and index buffer of one drawable mesh.
pub struct GeometryObject {
    vertex_buffer: Tracked<wgpu::Buffer>,
    index_buffer: Tracked<wgpu::Buffer>,
    index_count: u32,
    vertex_capacity: u64,
    index_capacity: u64,
}

impl GeometryObject {
    pub fn upload<V: VertexLayout>(ctx: &RenderCtx<'_>, label: &str, mesh: &MeshData<V>) -> Self {
        use wgpu::util::BufferInitDescriptor;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);

        let vertex_buffer = ctx.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = ctx.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            vertex_capacity: vertex_bytes.len() as u64,
            index_capacity: index_bytes.len() as u64,
        }
    }

    /// Preallocated, rewritable geometry of at most `max_vertices` / `max_indices`.
    pub fn dynamic<V: VertexLayout>(
        ctx: &RenderCtx<'_>,
        label: &str,
        max_vertices: usize,
        max_indices: usize,
    ) -> Self {
        let vertex_capacity = (max_vertices.max(1) * std::mem::size_of::<V>()) as u64;
        let index_capacity = (max_indices.max(1) * std::mem::size_of::<u32>()) as u64;

        let vertex_buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} vertices")),
            size: wgpu::util::align_to(vertex_capacity, wgpu::COPY_BUFFER_ALIGNMENT),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} indices")),
            size: wgpu::util::align_to(index_capacity, wgpu::COPY_BUFFER_ALIGNMENT),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: 0,
            vertex_capacity,
            index_capacity,
        }
    }

    /// Replaces the contents of a [`GeometryObject::dynamic`] object.
    pub fn write<V: VertexLayout>(&mut self, queue: &wgpu::Queue, mesh: &MeshData<V>) -> Result<()> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
        anyhow::ensure!(
            vertex_bytes.len() as u64 <= self.vertex_capacity
                && index_bytes.len() as u64 <= self.index_capacity,
            "mesh of {} vertices / {} indices exceeds geometry capacity",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        // write_buffer needs 4-byte multiples; every vertex format here is f32-based.
        if !vertex_bytes.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, vertex_bytes);
        }
        if !index_bytes.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, index_bytes);
        }
        self.index_count = mesh.indices.len() as u32;
        Ok(())
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
