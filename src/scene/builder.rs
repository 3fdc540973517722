use super::{
    material::Material,
    model::{Model, Transform},
    primitive,
    shape::{Shape, ShapeKind},
    texture::TextureSettings,
    Scene,
};
use crate::assets::{AssetData, AssetHandle, AssetLoader, AssetType, LoadEvent};
use crate::audio::SoundBoard;
use crate::config::AssetPaths;
use nalgebra_glm::Vec3;
use rand::Rng;
use std::{collections::HashMap, f32::consts::FRAC_PI_2, path::Path, time::Duration};

struct ShapeRow {
    kind: ShapeKind,
    count: usize,
    y: f32,
    rotation_speed: Vec3,
}

/// What a finished load turns into.
#[derive(Debug, Clone)]
enum AssetRole {
    SkinTexture,
    Background,
    Model {
        name: &'static str,
        transform: Transform,
        /// Appended to progress and error lines.
        label: &'static str,
    },
    ClickSound,
}

/// Populates a [`Scene`] with the primitive rows and streams the external
/// assets in, applying each one as its load event is drained.
///
/// A failed load is logged and skipped; the rest of the scene is unaffected.
pub struct SceneBuilder {
    loader: AssetLoader,
    roles: HashMap<AssetHandle, AssetRole>,
}

impl SceneBuilder {
    pub fn new(loader: AssetLoader) -> Self {
        Self {
            loader,
            roles: HashMap::new(),
        }
    }

    /// Adds the 20 shapes and queues every external asset.
    pub fn build<R: Rng + ?Sized>(&mut self, scene: &mut Scene, paths: &AssetPaths, rng: &mut R) {
        let skin = scene
            .registry
            .reserve(paths.skin_texture.clone(), AssetType::Texture);
        self.queue(skin, &paths.skin_texture, AssetType::Texture, AssetRole::SkinTexture);

        let rows = [
            ShapeRow {
                kind: ShapeKind::Box,
                count: 8,
                y: 4.0,
                rotation_speed: Vec3::new(0.01, 0.01, 0.0),
            },
            ShapeRow {
                kind: ShapeKind::Sphere,
                count: 6,
                y: 0.0,
                rotation_speed: Vec3::new(0.01, 0.01, 0.01),
            },
            ShapeRow {
                kind: ShapeKind::Cylinder,
                count: 6,
                y: -4.0,
                rotation_speed: Vec3::new(0.01, 0.01, 0.0),
            },
        ];

        for row in rows {
            for i in 0..row.count {
                let mesh = match row.kind {
                    ShapeKind::Box => primitive::cuboid(1.0, 1.0, 1.0),
                    ShapeKind::Sphere => primitive::sphere(0.7, 32, 32),
                    ShapeKind::Cylinder => primitive::cylinder(0.5, 0.5, 1.5, 32),
                };
                let bounding_radius = mesh.bounding_radius();
                let x = (i as f32 - (row.count / 2) as f32) * 2.0;
                let mesh = scene
                    .registry
                    .add_mesh(&format!("{}{i}", row.kind.name()), mesh);

                scene.add_shape(Shape {
                    kind: row.kind,
                    mesh,
                    material: Material::pick(rng, i, skin),
                    transform: Transform::from_position(Vec3::new(x, row.y, 0.0)),
                    rotation_speed: row.rotation_speed,
                    bounding_radius,
                });
            }
        }

        let tiger = AssetRole::Model {
            name: "tiger",
            transform: Transform::from_position(Vec3::new(-1.0, -1.5, 4.0))
                .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0))
                .with_uniform_scale(0.01),
            label: "",
        };
        let plane = AssetRole::Model {
            name: "plane",
            transform: Transform::from_position(Vec3::new(2.0, 5.0, 0.0))
                .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0))
                .with_uniform_scale(0.1),
            label: " for plane",
        };
        for (path, role) in [(&paths.tiger, tiger), (&paths.plane, plane)] {
            let handle = scene.registry.reserve(path.clone(), AssetType::Mesh);
            self.queue(handle, path, AssetType::Mesh, role);
        }

        let skybox = scene
            .registry
            .reserve(paths.skybox.clone(), AssetType::Texture);
        self.queue(skybox, &paths.skybox, AssetType::Texture, AssetRole::Background);

        let sound = scene
            .registry
            .reserve(paths.click_sound.clone(), AssetType::Sound);
        self.queue(sound, &paths.click_sound, AssetType::Sound, AssetRole::ClickSound);

        log::info!(
            "Scene built with {} shapes, {} assets loading",
            scene.shapes.len(),
            self.loader.pending()
        );
    }

    /// Applies everything the loader has delivered since the last call.
    pub fn update(&mut self, scene: &mut Scene, sound_board: &mut SoundBoard) {
        for event in self.loader.poll() {
            self.apply(event, scene, sound_board);
        }
    }

    /// Blocks until every queued asset has finished or `timeout` passes.
    pub fn finish(&mut self, scene: &mut Scene, sound_board: &mut SoundBoard, timeout: Duration) {
        for event in self.loader.wait_idle(timeout) {
            self.apply(event, scene, sound_board);
        }
    }

    pub fn pending(&self) -> usize {
        self.loader.pending()
    }

    fn queue(&mut self, handle: AssetHandle, path: &Path, asset_type: AssetType, role: AssetRole) {
        self.roles.insert(handle, role);
        self.loader.load(handle, path, asset_type);
    }

    fn apply(&mut self, event: LoadEvent, scene: &mut Scene, sound_board: &mut SoundBoard) {
        let handle = event.handle();
        let Some(role) = self.roles.get(&handle).cloned() else {
            log::warn!("Dropping load event for unknown asset {:?}", handle);
            return;
        };

        match event {
            LoadEvent::Progress { loaded, total, .. } => match role {
                AssetRole::Model { label, .. } if total > 0 => {
                    log::info!("{}% loaded{}", loaded as f64 / total as f64 * 100.0, label);
                }
                _ => log::trace!("{:?}: {loaded}/{total} bytes", handle),
            },
            LoadEvent::Failed { error, .. } => {
                self.roles.remove(&handle);
                match role {
                    AssetRole::Model { label: "", .. } => log::error!("An error happened {error}"),
                    AssetRole::Model { name, .. } => {
                        log::error!("An error happened loading {name} {error}")
                    }
                    _ => log::error!("An error happened loading {:?}: {error}", role),
                }
            }
            LoadEvent::Loaded { data, .. } => {
                self.roles.remove(&handle);
                match (role, data) {
                    (AssetRole::SkinTexture, AssetData::Texture(texture)) => {
                        scene
                            .registry
                            .insert_texture(handle, texture.with_settings(TextureSettings::surface()));
                    }
                    (AssetRole::Background, AssetData::Texture(texture)) => {
                        scene.registry.insert_texture(
                            handle,
                            texture.with_settings(TextureSettings::background()),
                        );
                        scene.background = Some(handle);
                    }
                    (AssetRole::Model { name, transform, .. }, AssetData::Meshes(meshes)) => {
                        let meshes = meshes
                            .into_iter()
                            .enumerate()
                            .map(|(i, mesh)| {
                                scene.registry.add_mesh(&format!("{name}#{i}"), mesh)
                            })
                            .collect();
                        scene.add_model(Model::new(name.to_owned(), meshes, Some(transform)));
                    }
                    (AssetRole::ClickSound, AssetData::Sound(buffer)) => {
                        sound_board.set_buffer(buffer);
                    }
                    (role, _) => log::error!("Unexpected asset data for {:?}", role),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentBackend;
    use rand::{rngs::StdRng, SeedableRng};

    fn build_without_assets() -> Scene {
        let mut scene = Scene::new();
        let mut builder = SceneBuilder::new(AssetLoader::new("missing-asset-root"));
        let mut sound_board = SoundBoard::new(Box::new(SilentBackend));
        builder.build(&mut scene, &AssetPaths::default(), &mut StdRng::seed_from_u64(1));
        builder.finish(&mut scene, &mut sound_board, Duration::from_secs(10));
        assert_eq!(builder.pending(), 0);
        scene
    }

    #[test]
    fn shape_rows_are_laid_out_left_to_right() {
        let scene = build_without_assets();
        let positions = scene
            .shapes
            .iter()
            .map(|shape| (shape.kind, shape.transform.position))
            .collect::<Vec<_>>();

        assert_eq!(positions.len(), 20);
        assert_eq!(positions[0], (ShapeKind::Box, Vec3::new(-8.0, 4.0, 0.0)));
        assert_eq!(positions[7], (ShapeKind::Box, Vec3::new(6.0, 4.0, 0.0)));
        assert_eq!(positions[8], (ShapeKind::Sphere, Vec3::new(-6.0, 0.0, 0.0)));
        assert_eq!(positions[19], (ShapeKind::Cylinder, Vec3::new(4.0, -4.0, 0.0)));
    }

    #[test]
    fn failed_loads_leave_scene_without_assets() {
        let scene = build_without_assets();
        assert!(scene.models.is_empty());
        assert!(scene.background.is_none());
        for shape in &scene.shapes {
            assert!(scene.registry.get_mesh(shape.mesh).is_some());
            if let Some(texture) = shape.material.texture() {
                assert!(scene.registry.get_texture(texture).is_none());
            }
        }
    }

    #[test]
    fn textured_shapes_share_one_texture() {
        let scene = build_without_assets();
        let mut textures = scene
            .shapes
            .iter()
            .filter_map(|shape| shape.material.texture())
            .collect::<Vec<_>>();
        textures.dedup();
        assert!(textures.len() <= 1);
    }
}
