use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to decode audio: {0}")]
    Audio(String),

    #[error("'{0}' contains no meshes")]
    NoMeshes(PathBuf),
}

pub type AssetResult<T> = Result<T, AssetError>;
