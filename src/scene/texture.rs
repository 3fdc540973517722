#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Sampling settings. How a texture is mapped follows from where the scene
/// uses it: the background is always an equirectangular panorama.
pub struct TextureSettings {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub srgb: bool,
}

impl TextureSettings {
    pub fn background() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            srgb: true,
        }
    }

    pub fn surface() -> Self {
        Self {
            srgb: true,
            ..Default::default()
        }
    }
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub settings: TextureSettings,
}

impl TextureData {
    pub fn from_image(image: image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
            settings: TextureSettings::default(),
        }
    }

    /// 1x1 opaque white, bound wherever a texture is missing.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![255; 4],
            settings: TextureSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TextureSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_decode_as_srgb() {
        let background = TextureSettings::background();
        assert!(background.srgb);
        assert_eq!(background.min_filter, TextureFilter::Linear);
        assert_eq!(background.mag_filter, TextureFilter::Linear);
        assert_eq!(TextureSettings::surface(), background);
        assert!(!TextureData::white().settings.srgb);
    }
}
