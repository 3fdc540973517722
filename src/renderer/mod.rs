pub mod buffer;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod scene_renderer;
pub mod surface;
pub mod swapchain;
pub mod vulkan_context;

use crate::camera::Camera;
use crate::scene::Scene;

/// Outcome of acquiring or presenting a swapchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Ready,
    /// The output no longer matches the window; nothing was drawn.
    OutOfDate,
}

/// Everything one frame draws.
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub ui: Option<&'a imgui::DrawData>,
}

pub trait Renderer {
    fn start_frame(&mut self) -> anyhow::Result<FrameState>;
    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()>;
    fn end_frame(&mut self) -> anyhow::Result<FrameState>;

    /// Sets the output size in pixels.
    fn resized(&mut self, dims: [u32; 2]) -> anyhow::Result<()>;
    fn output_size(&self) -> [u32; 2];

    fn render(&mut self, frame: &Frame) -> anyhow::Result<FrameState> {
        if self.start_frame()? == FrameState::OutOfDate {
            return Ok(FrameState::OutOfDate);
        }
        self.draw(frame)?;
        self.end_frame()
    }
}
