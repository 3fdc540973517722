//! Light definitions for the scene.

use bytemuck::{Pod, Zeroable};
use nalgebra_glm::{Vec3, Vec4};

/// Converts a packed `0xRRGGBB` colour into linear-ish float components.
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Sun-like light shining from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub visible: bool,
}

impl DirectionalLight {
    pub fn new(color: u32, intensity: f32) -> Self {
        Self {
            color: hex_color(color),
            intensity,
            position: Vec3::y(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
    pub visible: bool,
}

impl AmbientLight {
    pub fn new(color: u32, intensity: f32) -> Self {
        Self {
            color: hex_color(color),
            intensity,
            visible: true,
        }
    }
}

/// Omnidirectional light with a cut-off `distance` (0 means unlimited).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
    pub visible: bool,
}

impl PointLight {
    pub fn new(color: u32, intensity: f32, distance: f32) -> Self {
        Self {
            color: hex_color(color),
            intensity,
            distance,
            decay: 2.0,
            position: Vec3::zeros(),
            visible: true,
        }
    }
}

/// The fixed light rig of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub directional: DirectionalLight,
    pub ambient: AmbientLight,
    pub point: PointLight,
}

impl Default for Lights {
    fn default() -> Self {
        let mut directional = DirectionalLight::new(0xffffff, 1.0);
        directional.position = Vec3::new(5.0, 5.0, 5.0);

        let ambient = AmbientLight::new(0x404040, 0.5);

        let mut point = PointLight::new(0xff00ff, 1.0, 100.0);
        point.position = Vec3::new(-5.0, 5.0, 5.0);

        Self {
            directional,
            ambient,
            point,
        }
    }
}

/// std140 layout of the light block read by the scene shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightsUniform {
    /// rgb colour premultiplied by intensity, w unused
    pub ambient: Vec4,
    /// xyz direction towards the light, w = 1 when enabled
    pub directional_direction: Vec4,
    pub directional_color: Vec4,
    /// xyz world position, w = 1 when enabled
    pub point_position: Vec4,
    pub point_color: Vec4,
    /// x distance, y decay
    pub point_params: Vec4,
    /// xyz camera position
    pub camera_position: Vec4,
}

impl LightsUniform {
    pub fn new(lights: &Lights, camera_position: Vec3) -> Self {
        let enabled = |visible: bool| if visible { 1.0 } else { 0.0 };

        let ambient = lights.ambient.color * lights.ambient.intensity * enabled(lights.ambient.visible);

        let direction = if nalgebra_glm::length(&lights.directional.position) > 0.0 {
            nalgebra_glm::normalize(&lights.directional.position)
        } else {
            Vec3::y()
        };
        let directional_color = lights.directional.color * lights.directional.intensity;

        let point_color = lights.point.color * lights.point.intensity;

        Self {
            ambient: Vec4::new(ambient.x, ambient.y, ambient.z, 0.0),
            directional_direction: Vec4::new(
                direction.x,
                direction.y,
                direction.z,
                enabled(lights.directional.visible),
            ),
            directional_color: Vec4::new(
                directional_color.x,
                directional_color.y,
                directional_color.z,
                0.0,
            ),
            point_position: Vec4::new(
                lights.point.position.x,
                lights.point.position.y,
                lights.point.position.z,
                enabled(lights.point.visible),
            ),
            point_color: Vec4::new(point_color.x, point_color.y, point_color.z, 0.0),
            point_params: Vec4::new(lights.point.distance, lights.point.decay, 0.0, 0.0),
            camera_position: Vec4::new(camera_position.x, camera_position.y, camera_position.z, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig() {
        let lights = Lights::default();
        assert_eq!(lights.directional.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(lights.directional.intensity, 1.0);
        assert_eq!(lights.ambient.intensity, 0.5);
        assert_eq!(lights.ambient.color, hex_color(0x404040));
        assert_eq!(lights.point.position, Vec3::new(-5.0, 5.0, 5.0));
        assert_eq!(lights.point.color, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(lights.point.distance, 100.0);
        assert!(lights.point.visible);
    }

    #[test]
    fn hidden_point_light_is_disabled_in_uniform() {
        let mut lights = Lights::default();
        lights.point.visible = false;
        let uniform = LightsUniform::new(&lights, Vec3::new(0.0, 0.0, 15.0));
        assert_eq!(uniform.point_position.w, 0.0);
        assert_eq!(uniform.directional_direction.w, 1.0);
    }

    #[test]
    fn uniform_is_std140_sized() {
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }
}
