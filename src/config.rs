use std::path::PathBuf;

/// Relative locations of the external assets, resolved against the asset root.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    pub skin_texture: PathBuf,
    pub tiger: PathBuf,
    pub plane: PathBuf,
    pub skybox: PathBuf,
    pub click_sound: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            skin_texture: "img/tiger_skin.jpg".into(),
            tiger: "obj/Mesh_BengalTiger.obj".into(),
            plane: "obj/1405 Plane.obj".into(),
            skybox: "img/skybox.jpeg".into(),
            click_sound: "audio/tiger-sound.mp3".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.25,
            screen_space_panning: false,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub asset_root: PathBuf,
    pub assets: AssetPaths,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub validation: bool,
    pub shader_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: "assets".into(),
            assets: AssetPaths::default(),
            title: "lightbox".to_owned(),
            width: 800,
            height: 800,
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            validation: cfg!(debug_assertions),
            shader_dir: default_shader_dir(),
        }
    }
}

impl Config {
    /// `lightbox [ASSET_ROOT]`; the program name must already be stripped.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = args.next() {
            config.asset_root = root.into();
        }
        config
    }
}

/// `shaders/` next to the running executable, where build.rs puts SPIR-V.
fn default_shader_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("shaders")))
        .unwrap_or_else(|| PathBuf::from("shaders"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_root_defaults_to_assets() {
        let config = Config::from_args(std::iter::empty());
        assert_eq!(config.asset_root, PathBuf::from("assets"));
        assert_eq!((config.width, config.height), (800, 800));
    }

    #[test]
    fn first_argument_is_asset_root() {
        let config = Config::from_args(["/srv/scene".to_owned(), "ignored".to_owned()].into_iter());
        assert_eq!(config.asset_root, PathBuf::from("/srv/scene"));
    }
}
