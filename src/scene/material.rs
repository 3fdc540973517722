use super::light::hex_color;
use crate::assets::AssetHandle;
use nalgebra_glm::Vec3;
use rand::Rng;

/// Flat colours handed out to untextured shapes, indexed by `i % PALETTE.len()`.
pub const PALETTE: [u32; 6] = [
    0xff0000, // red
    0x00ff00, // green
    0x0000ff, // blue
    0xffff00, // yellow
    0xff00ff, // magenta
    0x00ffff, // cyan
];

/// Phong surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Color(Vec3),
    /// Samples the texture behind the handle, which may still be loading.
    Textured(AssetHandle),
}

impl Material {
    pub fn palette(index: usize) -> Self {
        Self::Color(hex_color(PALETTE[index % PALETTE.len()]))
    }

    /// Unweighted coin flip between the shared textured material and the
    /// palette colour for `index`.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R, index: usize, texture: AssetHandle) -> Self {
        if rng.random::<f64>() > 0.5 {
            Self::Textured(texture)
        } else {
            Self::palette(index)
        }
    }

    pub fn base_color(&self) -> Vec3 {
        match self {
            Self::Color(color) => *color,
            Self::Textured(_) => Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn texture(&self) -> Option<AssetHandle> {
        match self {
            Self::Color(_) => None,
            Self::Textured(handle) => Some(*handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn palette_wraps() {
        assert_eq!(Material::palette(0), Material::palette(6));
        assert_eq!(Material::palette(4), Material::Color(Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn coin_flip_uses_both_sides() {
        let texture = AssetHandle::new();
        let mut rng = StdRng::seed_from_u64(7);
        let picks = (0..200)
            .map(|i| Material::pick(&mut rng, i, texture))
            .collect::<Vec<_>>();

        let textured = picks.iter().filter(|m| m.texture().is_some()).count();
        assert!(textured > 50 && textured < 150, "textured {textured}");
        for (i, pick) in picks.iter().enumerate() {
            if pick.texture().is_none() {
                assert_eq!(*pick, Material::palette(i));
            }
        }
    }
}
