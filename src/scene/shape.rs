use super::{material::Material, model::Transform};
use crate::assets::AssetHandle;
use nalgebra_glm::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
        }
    }
}

/// A spinning primitive.
#[derive(Debug, Clone)]
pub struct Shape {
    pub kind: ShapeKind,
    pub mesh: AssetHandle,
    pub material: Material,
    pub transform: Transform,
    /// Radians added to each rotation axis per frame.
    pub rotation_speed: Vec3,
    /// Radius of the sphere enclosing the unscaled mesh, for picking.
    pub bounding_radius: f32,
}

impl Shape {
    pub fn advance(&mut self) {
        self.transform.rotation += self.rotation_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_adds_speed_per_axis() {
        let mut shape = Shape {
            kind: ShapeKind::Sphere,
            mesh: AssetHandle::new(),
            material: Material::palette(0),
            transform: Transform::default(),
            rotation_speed: Vec3::new(0.01, 0.02, 0.0),
            bounding_radius: 0.7,
        };
        shape.advance();
        shape.advance();
        assert_eq!(shape.transform.rotation, Vec3::new(0.02, 0.04, 0.0));
    }
}
