mod error;
mod loader;

pub use error::{AssetError, AssetResult};
pub use loader::{AssetData, AssetLoader, LoadEvent};

use crate::scene::{mesh::MeshData, texture::TextureData};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};
use uuid::Uuid;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssetHandle(Uuid);

impl AssetHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssetType {
    Mesh,
    Texture,
    Sound,
}

#[derive(Clone, Debug)]
pub struct AssetMetadata {
    handle: AssetHandle,
    asset_type: AssetType,
    path: PathBuf,
}

impl AssetMetadata {
    pub fn handle(&self) -> AssetHandle {
        self.handle
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// CPU side store of meshes and textures, keyed by handle.
///
/// Handles are handed out by [`AssetRegistry::reserve`] before the data
/// exists, so anything holding one must cope with `get_*` returning `None`
/// until the load completes.
#[derive(Default)]
pub struct AssetRegistry {
    metadatas: RwLock<HashMap<AssetHandle, AssetMetadata>>,
    loaded_meshes: RwLock<HashMap<AssetHandle, Arc<MeshData>>>,
    loaded_textures: RwLock<HashMap<AssetHandle, Arc<TextureData>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle already registered for `path`, or registers a new
    /// one without any data behind it.
    pub fn reserve(&self, path: impl Into<PathBuf>, asset_type: AssetType) -> AssetHandle {
        let path = path.into();
        if let Some(handle) = self.find_asset_by_path(&path) {
            return handle;
        }

        let handle = AssetHandle::new();
        self.metadatas
            .write()
            .expect("Failed to lock metadata for write.")
            .insert(
                handle,
                AssetMetadata {
                    handle,
                    asset_type,
                    path,
                },
            );
        handle
    }

    /// Registers mesh data that does not come from a file.
    pub fn add_mesh(&self, name: &str, mesh: MeshData) -> AssetHandle {
        let handle = AssetHandle::new();
        self.metadatas
            .write()
            .expect("Failed to lock metadata for write.")
            .insert(
                handle,
                AssetMetadata {
                    handle,
                    asset_type: AssetType::Mesh,
                    path: PathBuf::from(name),
                },
            );
        self.insert_mesh(handle, mesh);
        handle
    }

    pub fn insert_mesh(&self, handle: AssetHandle, mesh: MeshData) {
        self.loaded_meshes
            .write()
            .expect("Failed to lock mesh assets for write")
            .insert(handle, Arc::new(mesh));
    }

    pub fn insert_texture(&self, handle: AssetHandle, texture: TextureData) {
        self.loaded_textures
            .write()
            .expect("Failed to lock texture assets for write")
            .insert(handle, Arc::new(texture));
    }

    pub fn get_mesh(&self, handle: AssetHandle) -> Option<Arc<MeshData>> {
        match self.get_metadata(handle)?.asset_type {
            AssetType::Mesh => self
                .loaded_meshes
                .read()
                .expect("Failed to lock mesh assets for read")
                .get(&handle)
                .cloned(),
            AssetType::Texture | AssetType::Sound => None,
        }
    }

    pub fn get_texture(&self, handle: AssetHandle) -> Option<Arc<TextureData>> {
        match self.get_metadata(handle)?.asset_type {
            AssetType::Texture => self
                .loaded_textures
                .read()
                .expect("Failed to lock texture assets for read")
                .get(&handle)
                .cloned(),
            AssetType::Mesh | AssetType::Sound => None,
        }
    }

    pub fn get_metadata(&self, handle: AssetHandle) -> Option<AssetMetadata> {
        self.metadatas
            .read()
            .expect("Failed to lock metadatas for read.")
            .get(&handle)
            .cloned()
    }

    pub fn find_asset_by_path(&self, path: &Path) -> Option<AssetHandle> {
        self.metadatas
            .read()
            .expect("Failed to lock metadata for read")
            .values()
            .find(|val| val.path == path)
            .map(|val| val.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_texture_is_empty_until_inserted() {
        let registry = AssetRegistry::new();
        let handle = registry.reserve("img/tiger_skin.jpg", AssetType::Texture);
        assert!(registry.get_texture(handle).is_none());

        registry.insert_texture(handle, TextureData::white());
        assert_eq!(registry.get_texture(handle).map(|t| t.width), Some(1));
    }

    #[test]
    fn reserving_the_same_path_twice_shares_the_handle() {
        let registry = AssetRegistry::new();
        let first = registry.reserve("img/skybox.jpeg", AssetType::Texture);
        let second = registry.reserve("img/skybox.jpeg", AssetType::Texture);
        assert_eq!(first, second);
        assert_ne!(first, registry.reserve("img/other.jpeg", AssetType::Texture));
    }

    #[test]
    fn lookups_respect_asset_type() {
        let registry = AssetRegistry::new();
        let mesh = registry.add_mesh("box", MeshData::default());
        assert!(registry.get_mesh(mesh).is_some());
        assert!(registry.get_texture(mesh).is_none());
        assert!(registry.get_mesh(AssetHandle::new()).is_none());
    }
}
