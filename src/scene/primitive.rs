//! Procedural geometry for the built-in shape kinds.
//!
//! Vertices use a right-handed, y-up frame with counter-clockwise front faces.
//! UVs follow the same layout as the common web 3D libraries so a texture
//! wraps the shapes the same way: V = 1 at the top of each face, wall and
//! sphere pole.

use super::mesh::MeshData;
use crate::renderer::buffer::Vertex;
use nalgebra_glm::{Vec2, Vec3};
use std::f32::consts::PI;

fn vertex(position: Vec3, normal: Vec3, uv: Vec2) -> Vertex {
    Vertex::new(position, normal, uv)
}

/// Axis-aligned box centred at the origin, four vertices per face.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let half = Vec3::new(width, height, depth) * 0.5;
    // (normal, right, up) with right x up == normal
    let faces = [
        (Vec3::x(), -Vec3::z(), Vec3::y()),
        (-Vec3::x(), Vec3::z(), Vec3::y()),
        (Vec3::y(), Vec3::x(), -Vec3::z()),
        (-Vec3::y(), Vec3::x(), Vec3::z()),
        (Vec3::z(), Vec3::x(), Vec3::y()),
        (-Vec3::z(), -Vec3::x(), Vec3::y()),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let centre = normal.component_mul(&half);
        let right = right.component_mul(&half);
        let up = up.component_mul(&half);
        let base = vertices.len() as u32;

        vertices.push(vertex(centre - right - up, normal, Vec2::new(0.0, 0.0)));
        vertices.push(vertex(centre + right - up, normal, Vec2::new(1.0, 0.0)));
        vertices.push(vertex(centre + right + up, normal, Vec2::new(1.0, 1.0)));
        vertices.push(vertex(centre - right + up, normal, Vec2::new(0.0, 1.0)));

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::new(vertices, indices)
}

/// UV sphere with `width_segments` around the equator and `height_segments`
/// from pole to pole.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let position = Vec3::new(
                -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            let normal = if radius > 0.0 {
                position / radius
            } else {
                Vec3::y()
            };
            // v runs from the north pole down, V = 1 is the top of the image.
            vertices.push(vertex(position, normal, Vec2::new(u, 1.0 - v)));
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // The pole rows collapse to a point, so only one triangle is emitted there.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData::new(vertices, indices)
}

/// Capped cylinder along the y axis, centred at the origin.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> MeshData {
    let radial_segments = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = if height != 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Side wall: one ring at the top, one at the bottom.
    for (row, (radius, y)) in [(radius_top, half_height), (radius_bottom, -half_height)]
        .into_iter()
        .enumerate()
    {
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            let normal = nalgebra_glm::normalize(&Vec3::new(sin, slope, cos));
            vertices.push(vertex(
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                Vec2::new(u, 1.0 - row as f32),
            ));
        }
    }
    let row = radial_segments + 1;
    for x in 0..radial_segments {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    push_cap(&mut vertices, &mut indices, radius_top, half_height, radial_segments, true);
    push_cap(&mut vertices, &mut indices, radius_bottom, -half_height, radial_segments, false);

    MeshData::new(vertices, indices)
}

fn push_cap(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    radial_segments: u32,
    top: bool,
) {
    let normal = if top { Vec3::y() } else { -Vec3::y() };
    let centre = vertices.len() as u32;
    vertices.push(vertex(Vec3::new(0.0, y, 0.0), normal, Vec2::new(0.5, 0.5)));

    let ring = vertices.len() as u32;
    let sign = if top { 1.0 } else { -1.0 };
    for x in 0..=radial_segments {
        let theta = x as f32 / radial_segments as f32 * 2.0 * PI;
        let (sin, cos) = theta.sin_cos();
        vertices.push(vertex(
            Vec3::new(radius * sin, y, radius * cos),
            normal,
            Vec2::new(cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5),
        ));
    }

    for x in 0..radial_segments {
        if top {
            indices.extend_from_slice(&[centre, ring + x, ring + x + 1]);
        } else {
            indices.extend_from_slice(&[centre, ring + x + 1, ring + x]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh
            .indices
            .iter()
            .all(|&index| (index as usize) < mesh.vertices.len()));
        for vertex in &mesh.vertices {
            let length = nalgebra_glm::length(&vertex.normal.xyz());
            assert!((length - 1.0).abs() < 1e-4, "normal length {length}");
            assert_eq!(vertex.position.w, 1.0);
        }
    }

    /// Front faces wind counter-clockwise, so each face normal should agree
    /// with the vertex normals of its corners.
    fn assert_outward_winding(mesh: &MeshData) {
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| &mesh.vertices[tri[i] as usize]);
            let face = nalgebra_glm::cross(
                &(b.position.xyz() - a.position.xyz()),
                &(c.position.xyz() - a.position.xyz()),
            );
            if nalgebra_glm::length(&face) < 1e-9 {
                continue;
            }
            let avg = a.normal.xyz() + b.normal.xyz() + c.normal.xyz();
            assert!(nalgebra_glm::dot(&face, &avg) > 0.0);
        }
    }

    #[test]
    fn unit_cube() {
        let mesh = cuboid(1.0, 1.0, 1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_well_formed(&mesh);
        assert_outward_winding(&mesh);
        for vertex in &mesh.vertices {
            assert!(vertex.position.xyz().iter().all(|c| c.abs() == 0.5));
        }
    }

    /// V of the highest vertex among those selected by `keep`.
    fn top_v(mesh: &MeshData, keep: impl Fn(&Vertex) -> bool) -> f32 {
        mesh.vertices
            .iter()
            .filter(|vertex| keep(vertex))
            .max_by(|a, b| a.position.y.total_cmp(&b.position.y))
            .map(|vertex| vertex.tex_coords.y)
            .unwrap()
    }

    #[test]
    fn textures_stand_upright() {
        let cube = cuboid(1.0, 1.0, 1.0);
        assert_eq!(top_v(&cube, |v| v.normal.z == 1.0), 1.0);
        assert_eq!(top_v(&cube, |v| v.normal.x == -1.0), 1.0);

        let ball = sphere(0.7, 32, 32);
        assert_eq!(top_v(&ball, |_| true), 1.0);
        let equator = &ball.vertices[(16 * 33) as usize];
        assert!((equator.tex_coords.y - 0.5).abs() < 1e-6);

        let tube = cylinder(0.5, 0.5, 1.5, 32);
        let wall = |v: &Vertex| v.normal.y.abs() < 0.5;
        assert_eq!(top_v(&tube, wall), 1.0);
        let bottom = tube
            .vertices
            .iter()
            .filter(|v| wall(v))
            .min_by(|a, b| a.position.y.total_cmp(&b.position.y))
            .unwrap();
        assert_eq!(bottom.tex_coords.y, 0.0);
    }

    #[test]
    fn sphere_counts_and_radius() {
        let mesh = sphere(0.7, 32, 32);
        assert_eq!(mesh.vertices.len(), 33 * 33);
        assert_eq!(mesh.indices.len(), (32 * 32 * 2 - 2 * 32) * 3);
        assert_well_formed(&mesh);
        assert_outward_winding(&mesh);
        assert!((mesh.bounding_radius() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn cylinder_counts_and_extent() {
        let mesh = cylinder(0.5, 0.5, 1.5, 32);
        assert_eq!(mesh.vertices.len(), 2 * 33 + 2 * (1 + 33));
        assert_eq!(mesh.indices.len(), 32 * 6 + 2 * 32 * 3);
        assert_well_formed(&mesh);
        assert_outward_winding(&mesh);

        let (min_y, max_y) = mesh
            .vertices
            .iter()
            .map(|v| v.position.y)
            .fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
        assert_eq!((min_y, max_y), (-0.75, 0.75));
    }
}
