use crate::camera::{Camera, OrbitControls};
use crate::renderer::{Frame, FrameState, Renderer};
use crate::scene::Scene;

/// Drives one frame at a time: orbit damping, shape rotation, one render.
/// Rotation is per frame, not per second.
#[derive(Debug, Default)]
pub struct AnimationLoop {
    frames: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(
        &mut self,
        controls: &mut OrbitControls,
        camera: &mut Camera,
        scene: &mut Scene,
        renderer: &mut dyn Renderer,
        ui: Option<&imgui::DrawData>,
    ) -> anyhow::Result<FrameState> {
        controls.update(camera);
        scene.advance();

        let state = renderer.render(&Frame { scene, camera, ui })?;
        self.frames += 1;
        Ok(state)
    }
}
