#![allow(dead_code)]

use lightbox::{
    audio::{AudioBackend, SoundBuffer, Voice},
    renderer::{Frame, FrameState, Renderer},
};
use nalgebra_glm::Vec3;
use std::{cell::Cell, rc::Rc};

/// Renderer that keeps what it was asked to draw instead of drawing it.
pub struct RecordingRenderer {
    pub output_size: [u32; 2],
    pub frames: usize,
    /// Shape rotations seen by the most recent frame.
    pub rotations: Vec<Vec3>,
    pub point_light_visible: Option<bool>,
}

impl RecordingRenderer {
    pub fn new(output_size: [u32; 2]) -> Self {
        Self {
            output_size,
            frames: 0,
            rotations: Vec::new(),
            point_light_visible: None,
        }
    }
}

impl Renderer for RecordingRenderer {
    fn start_frame(&mut self) -> anyhow::Result<FrameState> {
        Ok(FrameState::Ready)
    }

    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.frames += 1;
        self.rotations = frame
            .scene
            .shapes
            .iter()
            .map(|shape| shape.transform.rotation)
            .collect();
        self.point_light_visible = Some(frame.scene.lights.point.visible);
        Ok(())
    }

    fn end_frame(&mut self) -> anyhow::Result<FrameState> {
        Ok(FrameState::Ready)
    }

    fn resized(&mut self, dims: [u32; 2]) -> anyhow::Result<()> {
        self.output_size = dims;
        Ok(())
    }

    fn output_size(&self) -> [u32; 2] {
        self.output_size
    }
}

/// Audio backend whose voices play until the test says otherwise.
#[derive(Default)]
pub struct CountingBackend {
    pub started: Rc<Cell<usize>>,
}

struct CountingVoice;

impl Voice for CountingVoice {
    fn is_playing(&self) -> bool {
        true
    }
}

impl AudioBackend for CountingBackend {
    fn play(&mut self, buffer: &SoundBuffer) -> anyhow::Result<Box<dyn Voice>> {
        assert!(!buffer.bytes().is_empty());
        self.started.set(self.started.get() + 1);
        Ok(Box::new(CountingVoice))
    }
}

/// Fresh directory under the system temp dir, removed on drop.
pub struct TempDir(pub std::path::PathBuf);

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("lightbox-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// A 16-bit mono PCM WAV of `samples` silent frames.
pub fn silent_wav(samples: u32) -> Vec<u8> {
    let sample_rate: u32 = 8000;
    let data_len = samples * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    bytes
}
