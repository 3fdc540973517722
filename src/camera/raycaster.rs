use super::Camera;
use crate::scene::Shape;
use nalgebra_glm::{Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the first intersection with a sphere, if
    /// the sphere is in front of the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let to_center = center - self.origin;
        let along = nalgebra_glm::dot(&to_center, &self.direction);
        let distance2 = nalgebra_glm::length2(&to_center) - along * along;
        let radius2 = radius * radius;
        if distance2 > radius2 {
            return None;
        }

        let half_chord = (radius2 - distance2).sqrt();
        let near = along - half_chord;
        let far = along + half_chord;
        if far < 0.0 {
            None
        } else if near < 0.0 {
            Some(far)
        } else {
            Some(near)
        }
    }
}

/// Maps a pointer position in pixels to normalised device coordinates with
/// +Y up.
pub fn pointer_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

/// Picks shapes under the pointer by their bounding spheres.
#[derive(Debug, Default, Clone)]
pub struct Raycaster {
    ray: Option<Ray>,
}

impl Raycaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ray(&self) -> Option<Ray> {
        self.ray
    }

    pub fn set_from_camera(&mut self, ndc: Vec2, camera: &Camera) {
        let inverse = nalgebra_glm::inverse(&camera.view_projection());
        let unproject = |depth: f32| {
            let point = inverse * Vec4::new(ndc.x, ndc.y, depth, 1.0);
            point.xyz() / point.w
        };

        let near = unproject(0.0);
        let far = unproject(1.0);
        self.ray = Some(Ray {
            origin: camera.position(),
            direction: nalgebra_glm::normalize(&(far - near)),
        });
    }

    /// Index and distance of the closest shape hit by the current ray.
    pub fn nearest(&self, shapes: &[Shape]) -> Option<(usize, f32)> {
        let ray = self.ray?;
        shapes
            .iter()
            .enumerate()
            .filter_map(|(i, shape)| {
                let scale = shape.transform.scale.max();
                ray.intersect_sphere(shape.transform.position, shape.bounding_radius * scale)
                    .map(|distance| (i, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetHandle;
    use crate::scene::{Material, ShapeKind, Transform};

    fn sphere_at(position: Vec3) -> Shape {
        Shape {
            kind: ShapeKind::Sphere,
            mesh: AssetHandle::new(),
            material: Material::palette(0),
            transform: Transform::from_position(position),
            rotation_speed: Vec3::zeros(),
            bounding_radius: 0.7,
        }
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 15.0), Vec3::zeros(), 75.0, 800.0, 800.0, 0.1, 1000.0)
    }

    #[test]
    fn centre_click_hits_sphere_in_front() {
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(pointer_to_ndc(400.0, 400.0, 800.0, 800.0), &camera());

        let shapes = [sphere_at(Vec3::new(4.0, 0.0, 0.0)), sphere_at(Vec3::zeros())];
        let (index, distance) = raycaster.nearest(&shapes).unwrap();
        assert_eq!(index, 1);
        assert!((distance - 14.3).abs() < 1e-3);
    }

    #[test]
    fn nearest_of_overlapping_hits_wins() {
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(Vec2::zeros(), &camera());
        let shapes = [sphere_at(Vec3::zeros()), sphere_at(Vec3::new(0.0, 0.0, 5.0))];
        assert_eq!(raycaster.nearest(&shapes).map(|hit| hit.0), Some(1));
    }

    #[test]
    fn corner_click_misses() {
        let mut raycaster = Raycaster::new();
        raycaster.set_from_camera(pointer_to_ndc(0.0, 0.0, 800.0, 800.0), &camera());
        assert_eq!(raycaster.nearest(&[sphere_at(Vec3::zeros())]), None);
    }

    #[test]
    fn spheres_behind_the_ray_are_ignored() {
        let ray = Ray {
            origin: Vec3::zeros(),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert_eq!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 5.0), 1.0), None);
        assert_eq!(ray.intersect_sphere(Vec3::zeros(), 1.0), Some(1.0));
    }

    #[test]
    fn pointer_maps_to_ndc() {
        assert_eq!(pointer_to_ndc(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
    }
}
