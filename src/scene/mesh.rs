use crate::renderer::buffer::Vertex;
use nalgebra_glm::{Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Converts one `tobj` object into interleaved vertices. Expects the model
    /// to have been loaded with `single_index` so all attributes share indices.
    pub fn from_obj(model: &tobj::Model) -> Self {
        let mesh = &model.mesh;

        let positions = mesh.positions.as_slice();
        let normals = mesh.normals.as_slice();
        let texcoords = mesh.texcoords.as_slice();

        let vertex_count = positions.len() / 3;
        let mut vertices = Vec::with_capacity(vertex_count);

        for i in 0..vertex_count {
            let position = Vec4::new(
                positions[i * 3],
                positions[i * 3 + 1],
                positions[i * 3 + 2],
                1.0,
            );
            let normal = if normals.len() >= (i + 1) * 3 {
                Vec4::new(normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2], 0.0)
            } else {
                Vec4::new(0.0, 1.0, 0.0, 0.0)
            };
            let tex_coords = if texcoords.len() >= (i + 1) * 2 {
                Vec2::new(texcoords[i * 2], texcoords[i * 2 + 1])
            } else {
                Vec2::zeros()
            };
            vertices.push(Vertex {
                position,
                normal,
                tex_coords,
                ..Default::default()
            });
        }

        if normals.is_empty() {
            compute_flat_normals(&mut vertices, &mesh.indices);
        }

        Self {
            vertices,
            indices: mesh.indices.clone(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Radius of the sphere centred at the origin that encloses every vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| nalgebra_glm::length(&v.position.xyz()))
            .fold(0.0, f32::max)
    }
}

/// Accumulates face normals into shared vertices for meshes exported without
/// normals.
fn compute_flat_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accumulated = vec![Vec3::zeros(); vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let pa = vertices[a].position.xyz();
        let pb = vertices[b].position.xyz();
        let pc = vertices[c].position.xyz();
        let face = nalgebra_glm::cross(&(pb - pa), &(pc - pa));
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    vertices
        .iter_mut()
        .zip(accumulated)
        .for_each(|(vertex, normal)| {
            if nalgebra_glm::length(&normal) > f32::EPSILON {
                let n = nalgebra_glm::normalize(&normal);
                vertex.normal = Vec4::new(n.x, n.y, n.z, 0.0);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_normals_point_out_of_a_ccw_triangle() {
        let mut vertices = [
            Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
        ]
        .map(|position| Vertex {
            position,
            ..Default::default()
        });
        compute_flat_normals(&mut vertices, &[0, 1, 2]);

        for vertex in &vertices {
            assert_eq!(vertex.normal, Vec4::new(0.0, 0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn bounding_radius_is_farthest_vertex() {
        let vertices = [
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, -3.0, 4.0, 1.0),
        ]
        .map(|position| Vertex {
            position,
            ..Default::default()
        })
        .to_vec();
        let mesh = MeshData::new(vertices, vec![]);
        assert!((mesh.bounding_radius() - 5.0).abs() < 1e-6);
    }
}
