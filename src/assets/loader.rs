use super::{AssetError, AssetHandle, AssetResult, AssetType};
use crate::audio::SoundBuffer;
use crate::scene::{mesh::MeshData, texture::TextureData};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::{
    collections::HashSet,
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const READ_CHUNK: usize = 64 * 1024;

/// Parsed payload of a finished load.
#[derive(Debug)]
pub enum AssetData {
    /// One mesh per object in the source file.
    Meshes(Vec<MeshData>),
    Texture(TextureData),
    Sound(SoundBuffer),
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress {
        handle: AssetHandle,
        loaded: u64,
        total: u64,
    },
    Loaded {
        handle: AssetHandle,
        data: AssetData,
    },
    Failed {
        handle: AssetHandle,
        error: AssetError,
    },
}

impl LoadEvent {
    pub fn handle(&self) -> AssetHandle {
        match self {
            Self::Progress { handle, .. }
            | Self::Loaded { handle, .. }
            | Self::Failed { handle, .. } => *handle,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Reads and parses assets on worker threads.
///
/// Workers only ever talk to the owner through the event channel; nothing is
/// delivered until [`AssetLoader::poll`] is called, so every event is handled
/// on the thread that owns the loader.
pub struct AssetLoader {
    root: PathBuf,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    pending: HashSet<AssetHandle>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            root: root.into(),
            sender,
            receiver,
            pending: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts loading `path` (relative to the root) in the background. The
    /// result is reported under `handle`.
    pub fn load(&mut self, handle: AssetHandle, path: &Path, asset_type: AssetType) {
        let full_path = self.root.join(path);
        let sender = self.sender.clone();
        self.pending.insert(handle);

        log::debug!("Loading {:?} as {:?}", full_path, asset_type);

        let spawned = thread::Builder::new()
            .name(format!("asset-{}", path.display()))
            .spawn(move || {
                let event = match load_asset(handle, &full_path, asset_type, &sender) {
                    Ok(data) => LoadEvent::Loaded { handle, data },
                    Err(error) => LoadEvent::Failed { handle, error },
                };
                // The receiver is gone when the loader was dropped mid-load.
                let _ = sender.send(event);
            });

        if let Err(source) = spawned {
            let _ = self.sender.send(LoadEvent::Failed {
                handle,
                error: AssetError::Io {
                    path: self.root.join(path),
                    source,
                },
            });
        }
    }

    /// Number of loads that have not reported success or failure yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drains every event delivered so far without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events = self.receiver.try_iter().collect::<Vec<_>>();
        self.retire(&events);
        events
    }

    /// Blocks until all pending loads have finished or `timeout` elapses,
    /// returning every event received meanwhile.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<LoadEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();

        while !self.pending.is_empty() {
            match self.receiver.recv_deadline(deadline) {
                Ok(event) => {
                    self.retire(std::slice::from_ref(&event));
                    events.push(event);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        events.extend(self.poll());
        events
    }

    fn retire(&mut self, events: &[LoadEvent]) {
        for event in events.iter().filter(|event| event.is_final()) {
            self.pending.remove(&event.handle());
        }
    }
}

fn load_asset(
    handle: AssetHandle,
    path: &Path,
    asset_type: AssetType,
    sender: &Sender<LoadEvent>,
) -> AssetResult<AssetData> {
    let bytes = read_with_progress(handle, path, sender).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match asset_type {
        AssetType::Mesh => parse_obj(path, &bytes).map(AssetData::Meshes),
        AssetType::Texture => {
            let image = image::load_from_memory(&bytes)?;
            Ok(AssetData::Texture(TextureData::from_image(image)))
        }
        AssetType::Sound => SoundBuffer::decode(bytes).map(AssetData::Sound),
    }
}

fn read_with_progress(
    handle: AssetHandle,
    path: &Path,
    sender: &Sender<LoadEvent>,
) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0; READ_CHUNK];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        let _ = sender.send(LoadEvent::Progress {
            handle,
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}

/// Parses OBJ geometry. Material libraries are not consulted; surfaces get
/// the renderer's default material.
fn parse_obj(path: &Path, bytes: &[u8]) -> AssetResult<Vec<MeshData>> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut Cursor::new(bytes),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok(Default::default()),
    )?;

    let meshes = models
        .iter()
        .map(MeshData::from_obj)
        .filter(|mesh| !mesh.indices.is_empty())
        .collect::<Vec<_>>();

    if meshes.is_empty() {
        return Err(AssetError::NoMeshes(path.to_path_buf()));
    }
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

    #[test]
    fn parses_inline_obj() {
        let meshes = parse_obj(Path::new("tri.obj"), TRIANGLE_OBJ.as_bytes()).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].triangle_count(), 1);
        assert_eq!(meshes[0].vertices[0].normal.z, 1.0);
    }

    #[test]
    fn obj_without_faces_has_no_meshes() {
        let result = parse_obj(Path::new("points.obj"), b"v 0 0 0\n");
        assert!(matches!(result, Err(AssetError::NoMeshes(_))));
    }

    #[test]
    fn missing_file_reports_failure() {
        let mut loader = AssetLoader::new("does/not/exist");
        let handle = AssetHandle::new();
        loader.load(handle, Path::new("img/tiger_skin.jpg"), AssetType::Texture);
        assert_eq!(loader.pending(), 1);

        let events = loader.wait_idle(Duration::from_secs(10));
        assert_eq!(loader.pending(), 0);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed { handle: h, error: AssetError::Io { .. } }) if *h == handle
        ));
    }

    #[test]
    fn reports_progress_before_completion() {
        let dir = std::env::temp_dir().join(format!("lightbox-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.obj"), TRIANGLE_OBJ).unwrap();

        let mut loader = AssetLoader::new(&dir);
        let handle = AssetHandle::new();
        loader.load(handle, Path::new("tri.obj"), AssetType::Mesh);
        let events = loader.wait_idle(Duration::from_secs(10));
        std::fs::remove_dir_all(&dir).ok();

        let total = TRIANGLE_OBJ.len() as u64;
        assert!(matches!(
            events.first(),
            Some(LoadEvent::Progress { loaded, total: t, .. }) if *loaded == total && *t == total
        ));
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Loaded { data: AssetData::Meshes(meshes), .. }) if meshes.len() == 1
        ));
    }
}
