//! CPU silhouette detection and shadow volume construction for a directional light.

use std::collections::HashMap;

use glam::Vec3;
use glsample_engine::render::geometry::{MeshData, PositionVertex};

/// Triangle mesh welded by position, with per-edge neighbor triangles.
#[derive(Debug, Clone)]
pub struct Occluder {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    // neighbors[t][e] is the triangle across edge (tri[e], tri[(e + 1) % 3]).
    neighbors: Vec<[Option<u32>; 3]>,
}

/// A silhouette edge, oriented as in the lit triangle that owns it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: u32,
    pub to: u32,
}

fn weld_key(p: Vec3) -> [u32; 3] {
    // + 0.0 maps -0.0 onto 0.0
    (p + Vec3::ZERO).to_array().map(f32::to_bits)
}

impl Occluder {
    /// Builds the occluder from an indexed triangle list, merging equal positions.
    pub fn new(positions: &[Vec3], indices: &[u32]) -> Self {
        let mut welded_index: HashMap<[u32; 3], u32> = HashMap::new();
        let mut welded = Vec::new();
        let remap: Vec<u32> = positions
            .iter()
            .map(|&p| {
                *welded_index.entry(weld_key(p)).or_insert_with(|| {
                    welded.push(p);
                    (welded.len() - 1) as u32
                })
            })
            .collect();

        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
            .collect();

        let mut edge_owner: HashMap<(u32, u32), u32> = HashMap::new();
        for (t, tri) in triangles.iter().enumerate() {
            for e in 0..3 {
                edge_owner.insert((tri[e], tri[(e + 1) % 3]), t as u32);
            }
        }
        let neighbors = triangles
            .iter()
            .map(|tri| {
                std::array::from_fn(|e| edge_owner.get(&(tri[(e + 1) % 3], tri[e])).copied())
            })
            .collect();

        Self {
            positions: welded,
            triangles,
            neighbors,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Upper bound on volume vertices: one near and one far copy per position.
    pub fn max_volume_vertices(&self) -> usize {
        2 * self.positions.len()
    }

    /// Upper bound on volume indices: both caps plus two side triangles per edge.
    pub fn max_volume_indices(&self) -> usize {
        24 * self.triangles.len()
    }

    fn face_normal(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.triangles[t].map(|i| self.positions[i as usize]);
        (b - a).cross(c - a)
    }

    /// Whether each triangle faces `to_light` (unit vector pointing at the light).
    pub fn lit_faces(&self, to_light: Vec3) -> Vec<bool> {
        (0..self.triangles.len())
            .map(|t| self.face_normal(t).dot(to_light) > 0.0)
            .collect()
    }

    /// Edges between a lit triangle and an unlit or missing neighbor.
    pub fn silhouette(&self, to_light: Vec3) -> Vec<Edge> {
        let lit = self.lit_faces(to_light);
        let mut edges = Vec::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            if !lit[t] {
                continue;
            }
            for e in 0..3 {
                let open = match self.neighbors[t][e] {
                    Some(n) => !lit[n as usize],
                    None => true,
                };
                if open {
                    edges.push(Edge {
                        from: tri[e],
                        to: tri[(e + 1) % 3],
                    });
                }
            }
        }
        edges
    }

    /// Closed volume swept by the lit side away from the light.
    ///
    /// Near copies sit `near_offset` behind the surface, far copies `extrusion`
    /// units away from the light. All triangles face out of the volume.
    pub fn volume(
        &self,
        to_light: Vec3,
        near_offset: f32,
        extrusion: f32,
    ) -> MeshData<PositionVertex> {
        let n = self.positions.len() as u32;
        let mut vertices = Vec::with_capacity(self.max_volume_vertices());
        vertices.extend(self.positions.iter().map(|&p| PositionVertex {
            position: (p - to_light * near_offset).to_array(),
        }));
        vertices.extend(self.positions.iter().map(|&p| PositionVertex {
            position: (p - to_light * extrusion).to_array(),
        }));

        let lit = self.lit_faces(to_light);
        let mut indices = Vec::new();
        for (tri, &is_lit) in self.triangles.iter().zip(&lit) {
            if !is_lit {
                continue;
            }
            let [a, b, c] = *tri;
            indices.extend_from_slice(&[a, b, c]);
            indices.extend_from_slice(&[c + n, b + n, a + n]);
        }
        for Edge { from: a, to: b } in self.silhouette(to_light) {
            indices.extend_from_slice(&[a, a + n, b + n]);
            indices.extend_from_slice(&[a, b + n, b]);
        }

        MeshData { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glsample_engine::render::geometry;

    fn cube_occluder() -> Occluder {
        let mesh = geometry::cube(0.5);
        Occluder::new(&mesh.positions(), &mesh.indices)
    }

    fn oblique() -> Vec3 {
        Vec3::new(1.0, 2.0, 3.0).normalize()
    }

    #[test]
    fn cube_welds_to_eight_corners() {
        let occ = cube_occluder();
        assert_eq!(occ.vertex_count(), 8);
        assert_eq!(occ.triangle_count(), 12);
        assert!(occ.neighbors.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn oblique_light_gives_six_silhouette_edges() {
        let occ = cube_occluder();
        let lit = occ.lit_faces(oblique()).iter().filter(|&&l| l).count();
        assert_eq!(lit, 6);
        assert_eq!(occ.silhouette(oblique()).len(), 6);
    }

    #[test]
    fn axis_light_gives_square_silhouette() {
        let occ = cube_occluder();
        assert_eq!(occ.silhouette(Vec3::Y).len(), 4);
    }

    #[test]
    fn volume_is_closed() {
        let occ = cube_occluder();
        let volume = occ.volume(oblique(), 0.01, 50.0);
        assert_eq!(volume.triangle_count(), 24);

        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        for t in volume.indices.chunks_exact(3) {
            for e in 0..3 {
                *directed.entry((t[e], t[(e + 1) % 3])).or_default() += 1;
            }
        }
        for (&(a, b), &count) in &directed {
            assert_eq!(count, 1, "edge {a}->{b} used {count} times");
            assert_eq!(directed.get(&(b, a)), Some(&1), "edge {a}->{b} has no twin");
        }
    }

    #[test]
    fn volume_faces_point_outward() {
        let occ = cube_occluder();
        let light = oblique();
        let volume = occ.volume(light, 0.01, 10.0);
        let pos: Vec<Vec3> = volume
            .vertices
            .iter()
            .map(|v| Vec3::from_array(v.position))
            .collect();
        // The volume is convex, so every face normal points away from its centroid.
        let center = pos.iter().copied().sum::<Vec3>() / pos.len() as f32;
        for t in volume.indices.chunks_exact(3) {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| pos[i as usize]);
            let normal = (b - a).cross(c - a);
            let mid = (a + b + c) / 3.0;
            assert!(normal.dot(mid - center) > 0.0);
        }
    }

    #[test]
    fn volume_fits_preallocated_bounds() {
        let occ = cube_occluder();
        for light in [oblique(), Vec3::Y, Vec3::new(-0.3, 0.8, 0.1).normalize()] {
            let volume = occ.volume(light, 0.01, 50.0);
            assert!(volume.vertices.len() <= occ.max_volume_vertices());
            assert!(volume.indices.len() <= occ.max_volume_indices());
        }
    }

    #[test]
    fn open_mesh_edges_count_as_silhouette() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Z];
        // Normal (X x Z) = -Y.
        let occ = Occluder::new(&positions, &[0, 1, 2]);
        assert!(occ.silhouette(Vec3::Y).is_empty());
        assert_eq!(occ.silhouette(-Vec3::Y).len(), 3);
    }
}
