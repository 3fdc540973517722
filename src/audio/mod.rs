//! Click-to-play sound board.

#[cfg(feature = "audio")]
mod rodio_backend;
#[cfg(feature = "audio")]
pub use rodio_backend::RodioBackend;

use crate::assets::{AssetError, AssetResult};
use std::sync::Arc;

/// Encoded sound file kept in memory; every voice decodes its own copy.
#[derive(Clone, Debug)]
pub struct SoundBuffer {
    bytes: Arc<[u8]>,
}

impl SoundBuffer {
    pub fn decode(bytes: Vec<u8>) -> AssetResult<Self> {
        if bytes.is_empty() {
            return Err(AssetError::Audio("empty sound file".to_owned()));
        }
        let buffer = Self {
            bytes: bytes.into(),
        };

        #[cfg(feature = "audio")]
        rodio::Decoder::new(buffer.reader()).map_err(|e| AssetError::Audio(e.to_string()))?;

        Ok(buffer)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reader(&self) -> std::io::Cursor<Arc<[u8]>> {
        std::io::Cursor::new(self.bytes.clone())
    }
}

/// One playing instance of a sound buffer.
pub trait Voice {
    fn is_playing(&self) -> bool;
}

pub trait AudioBackend {
    /// Starts a new, independent voice for `buffer`.
    fn play(&mut self, buffer: &SoundBuffer) -> anyhow::Result<Box<dyn Voice>>;
}

/// Backend used when no audio device is available. Voices are tracked but
/// produce no sound.
#[derive(Default)]
pub struct SilentBackend;

struct SilentVoice;

impl Voice for SilentVoice {
    fn is_playing(&self) -> bool {
        false
    }
}

impl AudioBackend for SilentBackend {
    fn play(&mut self, buffer: &SoundBuffer) -> anyhow::Result<Box<dyn Voice>> {
        log::trace!("Silent voice for {} byte sound", buffer.bytes().len());
        Ok(Box::new(SilentVoice))
    }
}

/// Picks the system output device when built with the `audio` feature.
pub fn default_backend() -> Box<dyn AudioBackend> {
    #[cfg(feature = "audio")]
    match RodioBackend::new() {
        Ok(backend) => return Box::new(backend),
        Err(e) => log::warn!("No audio output, clicks will be silent: {e:#}"),
    }
    Box::new(SilentBackend)
}

pub struct SoundBoard {
    backend: Box<dyn AudioBackend>,
    buffer: Option<SoundBuffer>,
    voices: Vec<Box<dyn Voice>>,
}

impl SoundBoard {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            buffer: None,
            voices: Vec::new(),
        }
    }

    pub fn set_buffer(&mut self, buffer: SoundBuffer) {
        self.buffer = Some(buffer);
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// Spawns one more voice from the loaded buffer. Does nothing until the
    /// buffer has arrived. Finished voices are never reclaimed.
    pub fn click(&mut self) {
        let Some(buffer) = &self.buffer else {
            return;
        };
        match self.backend.play(buffer) {
            Ok(voice) => self.voices.push(voice),
            Err(e) => log::error!("Failed to start sound: {e:#}"),
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn playing_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_playing()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_before_load_does_nothing() {
        let mut board = SoundBoard::new(Box::new(SilentBackend));
        board.click();
        assert_eq!(board.voice_count(), 0);
    }

    #[test]
    fn empty_sound_is_rejected() {
        assert!(matches!(SoundBuffer::decode(Vec::new()), Err(AssetError::Audio(_))));
    }

    #[cfg(feature = "audio")]
    #[test]
    fn undecodable_sound_is_rejected() {
        let result = SoundBuffer::decode(b"this is not an mp3".to_vec());
        assert!(matches!(result, Err(AssetError::Audio(_))));
    }
}
