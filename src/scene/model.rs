use crate::assets::AssetHandle;
use nalgebra_glm::{Mat4, Vec3};

/// Position, Euler rotation in radians (applied X, then Y, then Z) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let matrix = nalgebra_glm::translate(&Mat4::identity(), &self.position);
        let matrix = nalgebra_glm::rotate_x(&matrix, self.rotation.x);
        let matrix = nalgebra_glm::rotate_y(&matrix, self.rotation.y);
        let matrix = nalgebra_glm::rotate_z(&matrix, self.rotation.z);
        nalgebra_glm::scale(&matrix, &self.scale)
    }
}

/// A group of meshes loaded from one external file, sharing one transform.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<AssetHandle>,
    pub transform: Transform,

    pub visible: bool,
}

impl Model {
    pub fn new(name: String, meshes: Vec<AssetHandle>, transform: Option<Transform>) -> Self {
        Self {
            name,
            meshes,
            transform: transform.unwrap_or_default(),
            visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn matrix_applies_scale_rotation_then_translation() {
        let transform = Transform::from_position(Vec3::new(2.0, 5.0, 0.0))
            .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0))
            .with_uniform_scale(0.1);
        let point = transform.matrix() * nalgebra_glm::vec4(10.0, 0.0, 0.0, 1.0);

        // (10,0,0) -> scaled (1,0,0) -> yaw 90 degrees (0,0,-1) -> translated
        assert!((point.x - 2.0).abs() < 1e-5);
        assert!((point.y - 5.0).abs() < 1e-5);
        assert!((point.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn identity_by_default() {
        assert_eq!(Transform::default().matrix(), Mat4::identity());
    }
}
